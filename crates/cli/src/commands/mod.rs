//! Subcommand implementations.

mod disasm;
mod run;

pub use disasm::disasm;
pub use run::{run, stack_item_to_json, RunReport, MAX_RENDERED_ITEMS};

use anyhow::{Context, Result};

/// Accepts an optional `0x` prefix and surrounding whitespace.
pub fn decode_hex(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    let text = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    hex::decode(text).context("script is not valid hex")
}
