//! Rendering error types

use std::fmt;

/// Errors that can occur while rendering text onto an image
#[derive(Debug, Clone)]
pub enum RenderError {
    /// Input bytes could not be decoded as an image
    DecodeFailed { message: String },
    /// Encoding the finished image failed
    EncodeFailed { format: String, message: String },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::DecodeFailed { message } => {
                write!(f, "Failed to decode image: {}", message)
            }
            RenderError::EncodeFailed { format, message } => {
                write!(f, "Failed to encode to {}: {}", format, message)
            }
        }
    }
}

impl std::error::Error for RenderError {}

impl RenderError {
    pub fn decode_failed(message: impl Into<String>) -> Self {
        RenderError::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn encode_failed(format: impl Into<String>, message: impl Into<String>) -> Self {
        RenderError::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }
}
