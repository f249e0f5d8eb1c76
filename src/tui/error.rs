use std::io;

use thiserror::Error;

/// Failures that end a TUI session
#[derive(Debug, Error)]
pub enum TuiError {
    #[error("Terminal error: {0}")]
    Terminal(#[from] io::Error),

    #[error(
        "Terminal is {width}x{height} but garagebook needs at least {min_width}x{min_height}. Resize the window and try again."
    )]
    TooSmall {
        width: u16,
        height: u16,
        min_width: u16,
        min_height: u16,
    },
}
