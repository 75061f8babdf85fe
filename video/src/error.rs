//! Display core error types

use core::fmt;

use crate::command::ParseError;
use crate::device::{MapError, WindowError};

/// Errors surfaced by the display core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoError {
    /// A hardware region could not be mapped; the display never opened
    Map(MapError),
    /// A register window rejected an access
    Window(WindowError),
    /// Coordinate outside the current geometry (checked mode only)
    OutOfBounds { x: i32, y: i32 },
    /// The controller never acknowledged the swap within the poll limit
    SwapTimeout { polls: u32 },
    /// A swap is still in flight; wait for it before drawing
    SwapPending,
    /// Malformed textual command
    Parse(ParseError),
}

impl fmt::Display for VideoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoError::Map(e) => write!(f, "{}", e),
            VideoError::Window(e) => write!(f, "register window: {}", e),
            VideoError::OutOfBounds { x, y } => write!(f, "({}, {}) is off screen", x, y),
            VideoError::SwapTimeout { polls } => {
                write!(f, "buffer swap not acknowledged after {} polls", polls)
            }
            VideoError::SwapPending => write!(f, "buffer swap still pending"),
            VideoError::Parse(e) => write!(f, "{}", e),
        }
    }
}

impl From<MapError> for VideoError {
    fn from(e: MapError) -> Self {
        VideoError::Map(e)
    }
}

impl From<WindowError> for VideoError {
    fn from(e: WindowError) -> Self {
        VideoError::Window(e)
    }
}

impl From<ParseError> for VideoError {
    fn from(e: ParseError) -> Self {
        VideoError::Parse(e)
    }
}

impl embedded_io::Error for VideoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        use embedded_io::ErrorKind;
        match self {
            VideoError::Map(_) => ErrorKind::NotConnected,
            VideoError::Window(_) => ErrorKind::Other,
            VideoError::OutOfBounds { .. } | VideoError::Parse(_) => ErrorKind::InvalidInput,
            VideoError::SwapTimeout { .. } => ErrorKind::TimedOut,
            VideoError::SwapPending => ErrorKind::Interrupted,
        }
    }
}
