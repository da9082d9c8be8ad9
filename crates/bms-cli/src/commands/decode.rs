//! Decode command - explain a fault bitmask

use anyhow::{Context, Result};
use bms_core::fault_bit;
use bms_core::FaultFlags;

use crate::output::{FlagRow, OutputContext};

/// Parse a bitmask given as decimal, `0x` hex or `0b` binary
pub fn parse_flags(input: &str) -> Result<i64> {
    let input = input.trim();
    let (digits, radix) = if let Some(hex) = input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        (hex, 16)
    } else if let Some(bin) = input.strip_prefix("0b") {
        (bin, 2)
    } else {
        (input, 10)
    };
    i64::from_str_radix(digits, radix).with_context(|| format!("Invalid fault flags: '{}'", input))
}

/// Print the conditions set in a bitmask
pub fn decode(input: &str, ctx: &OutputContext) -> Result<()> {
    let raw = parse_flags(input)?;
    let flags = FaultFlags::from_raw(raw);

    if raw & !i64::from(fault_bit::ALL_MASK) != 0 {
        ctx.warn(&format!(
            "Ignoring undefined bits in {} (0x{:X})",
            raw,
            raw & !i64::from(fault_bit::ALL_MASK)
        ));
    }

    if flags.is_empty() {
        ctx.info("No fault");
        return Ok(());
    }

    let rows: Vec<FlagRow> = flags.types().map(FlagRow::from).collect();
    ctx.print(&rows);
    Ok(())
}
