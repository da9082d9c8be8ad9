//! Flags command - print the fault bit table

use bms_core::FAULT_TYPES;

use crate::output::{FlagRow, OutputContext};

/// Print every defined fault bit
pub fn flags(ctx: &OutputContext) {
    let rows: Vec<FlagRow> = FAULT_TYPES.iter().map(FlagRow::from).collect();
    ctx.print(&rows);
}
