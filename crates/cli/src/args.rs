use clap::{Args, Parser, Subcommand, ValueEnum};
use neo_smart_contract::TriggerType;
use std::path::PathBuf;

/// Command-line arguments for neovm
#[derive(Parser, Debug, Clone)]
#[command(
    name = "neovm",
    version = env!("CARGO_PKG_VERSION"),
    about = "Run and disassemble Neo 2.x scripts"
)]
pub struct CliArgs {
    /// Log output format
    #[arg(long = "log-format", value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Execute a hex-encoded script and print the outcome as JSON
    Run(RunArgs),
    /// Print one decoded instruction per line
    Disasm {
        /// Hex-encoded script
        #[arg(value_name = "HEX")]
        script: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Hex-encoded script
    #[arg(value_name = "HEX")]
    pub script: String,

    /// Gas paid on top of the free allowance, in the smallest unit
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub gas: i64,

    /// Lift the gas budget and cap the instruction count instead
    #[arg(long = "test-mode")]
    pub test_mode: bool,

    /// Trigger the script runs under
    #[arg(long, value_enum, default_value = "application")]
    pub trigger: Trigger,

    /// TOML file with VM limits and gas settings
    #[arg(short = 'c', long = "config", value_name = "FILE", env = "NEOVM_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Application,
    Verification,
}

impl From<Trigger> for TriggerType {
    fn from(trigger: Trigger) -> Self {
        match trigger {
            Trigger::Application => TriggerType::Application,
            Trigger::Verification => TriggerType::Verification,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults() {
        let args = CliArgs::parse_from(["neovm", "run", "5152"]);
        let Command::Run(run) = args.command else {
            panic!("expected run");
        };
        assert_eq!(run.script, "5152");
        assert_eq!(run.gas, 0);
        assert!(!run.test_mode);
        assert_eq!(run.trigger, Trigger::Application);
        assert_eq!(args.log_format, LogFormat::Text);
    }

    #[test]
    fn trigger_conversion() {
        assert_eq!(TriggerType::from(Trigger::Verification), TriggerType::Verification);
        assert_eq!(TriggerType::from(Trigger::Application), TriggerType::Application);
    }
}
