use anyhow::{Context, Result};
use neo_vm::Script;

/// Decodes `hex` front to back, one line per instruction.
pub fn disasm(hex: &str) -> Result<Vec<String>> {
    let script = Script::new(super::decode_hex(hex)?);
    let instructions = script
        .instructions()
        .context("script does not decode")?;
    Ok(instructions.iter().map(ToString::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_operands() {
        let lines = disasm("0x02abcd51").unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("0xabcd"), "{}", lines[0]);
        assert!(lines[1].starts_with("0003"), "{}", lines[1]);
    }

    #[test]
    fn truncated_operands_fail() {
        assert!(disasm("05ff").is_err());
    }
}
