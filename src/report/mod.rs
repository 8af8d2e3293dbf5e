//! Presentation of engine events.
//!
//! - [`terminal`] — colored lines, removal progress bar and a summary table; respects `--quiet`.
//! - [`json`] — one JSON object per event, then the outcome.
//! - [`prompt`] — stdin confirmation gate.

pub mod json;
pub mod prompt;
pub mod terminal;
