//! Pieces shared by the application loops

use tracing::info;

use crate::error::InputError;

/// Why an application loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The user asked to quit
    Quit,
    /// The key source hit EOF or failed; treated as a quit
    InputClosed,
}

/// Log an input failure and turn it into an exit reason
pub(crate) fn input_closed(app: &str, err: InputError) -> ExitReason {
    match err {
        InputError::Closed => info!("{}: input closed", app),
        InputError::Read(e) => info!("{}: input failed: {}", app, e),
        InputError::Interrupted => info!("{}: input interrupted", app),
    }
    ExitReason::InputClosed
}

/// Rows available to content given the terminal height
pub(crate) fn content_rows(height: u16) -> usize {
    (height as usize).saturating_sub(2).max(1)
}
