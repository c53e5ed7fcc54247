//! Why a script is being run.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum TriggerType {
    /// Witness verification.
    Verification = 0x00,
    /// Verification of a transfer into a contract.
    VerificationR = 0x01,
    /// Invocation transaction execution.
    Application = 0x10,
    /// Execution triggered by receiving a transfer.
    ApplicationR = 0x11,
}

impl TriggerType {
    /// Storage writes are only allowed under application triggers.
    pub fn is_application(self) -> bool {
        matches!(self, Self::Application | Self::ApplicationR)
    }
}

impl Default for TriggerType {
    fn default() -> Self {
        Self::Application
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Verification => "verification",
            Self::VerificationR => "verificationr",
            Self::Application => "application",
            Self::ApplicationR => "applicationr",
        };
        f.write_str(name)
    }
}

impl FromStr for TriggerType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "verification" => Ok(Self::Verification),
            "verificationr" => Ok(Self::VerificationR),
            "application" => Ok(Self::Application),
            "applicationr" => Ok(Self::ApplicationR),
            _ => Err(Error::InvalidTrigger(s.to_string())),
        }
    }
}
