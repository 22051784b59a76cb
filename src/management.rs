//! Management surface towards the invoking protocol layer.
//!
//! The only contractual output of an operation is a single 4-byte status
//! integer on the caller-provided result channel; the channel is closed by
//! the caller dropping it. Detailed diagnostics go to the log, never over
//! the channel.

use std::io::Write;

use crate::error::Result;
use crate::workflow::OperationKind;

/// Status code written on success.
pub const STATUS_OK: i32 = 0;
/// Status code written on failure.
pub const STATUS_ERROR: i32 = 1;

/// Write the operation outcome to the result channel: exactly one 4-byte
/// big-endian integer, 0 for success and 1 for failure.
pub fn write_result<W: Write>(mut channel: W, success: bool) -> Result<()> {
    let code = if success { STATUS_OK } else { STATUS_ERROR };
    channel.write_all(&code.to_be_bytes())?;
    channel.flush()?;
    Ok(())
}

/// Observability label reported before an operation runs, e.g. as a process
/// title. Advisory only.
pub fn operation_label(kind: OperationKind, server: &str) -> String {
    format!("{kind} {server}")
}
