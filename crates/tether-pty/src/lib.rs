//! portable-pty implementation of the terminal bridge.
//!
//! Each remote session gets its own PTY with a background reader thread.
//! Output and exit flow back to the relay manager as bridge events; input,
//! resize, and close arrive through the `TerminalBridge` trait.

mod bridge;
mod spawn;

pub use bridge::PtyBridge;
pub use spawn::{default_shell, DEFAULT_COLS, DEFAULT_ROWS};
