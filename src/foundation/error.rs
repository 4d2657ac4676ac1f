/// Convenience result type used across gifstamp.
pub type StampResult<T> = Result<T, StampError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum StampError {
    /// Source bytes could not be obtained from the fetch collaborator.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Malformed source bitstream.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// A required overlay field or the QR raster is absent or undecodable.
    #[error("missing required input: {0}")]
    MissingRequiredInput(String),

    /// Frame count, dimensions or decoded pixel volume is over the configured cap.
    #[error("resource limit exceeded: {0}")]
    ResourceLimitExceeded(String),

    /// The output consumer failed or disconnected mid-stream.
    #[error("sink write error: {0}")]
    SinkWrite(#[source] std::io::Error),

    /// The request was cancelled at a frame boundary.
    #[error("request cancelled")]
    Cancelled,

    /// Invalid options or inconsistent API usage.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Ways a source GIF bitstream can be malformed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The stream does not start with `GIF87a` or `GIF89a`.
    #[error("bad signature")]
    BadSignature,

    /// The stream ended inside the named structure.
    #[error("truncated {0}")]
    Truncated(&'static str),

    /// Block structure ended without the `0x3B` trailer.
    #[error("missing trailer")]
    MissingTrailer,

    /// A frame rectangle does not fit inside the logical screen.
    #[error(
        "frame {frame} rect {width}x{height}+{left}+{top} exceeds logical screen {screen_width}x{screen_height}"
    )]
    FrameOutOfBounds {
        /// 0-based frame index.
        frame: usize,
        /// Frame left offset.
        left: u16,
        /// Frame top offset.
        top: u16,
        /// Frame width.
        width: u16,
        /// Frame height.
        height: u16,
        /// Logical screen width.
        screen_width: u16,
        /// Logical screen height.
        screen_height: u16,
    },

    /// Neither a local nor a global colour table is available for a frame.
    #[error("frame {frame} has no colour table")]
    MissingPalette {
        /// 0-based frame index.
        frame: usize,
    },

    /// LZW minimum code size outside `1..=11`.
    #[error("invalid lzw minimum code size {0}")]
    InvalidCodeSize(u8),

    /// LZW code that is neither in the table nor the next free slot.
    #[error("invalid lzw code {code}")]
    InvalidCode {
        /// Offending code value.
        code: u16,
    },

    /// Logical screen declared with a zero width or height.
    #[error("empty logical screen")]
    EmptyScreen,

    /// The stream holds no image blocks.
    #[error("no frames")]
    NoFrames,

    /// Unknown block introducer byte.
    #[error("unknown block introducer 0x{0:02x}")]
    UnknownBlock(u8),
}

impl StampError {
    /// Build a [`StampError::Fetch`] value.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Build a [`StampError::MissingRequiredInput`] value.
    pub fn missing_input(msg: impl Into<String>) -> Self {
        Self::MissingRequiredInput(msg.into())
    }

    /// Build a [`StampError::ResourceLimitExceeded`] value.
    pub fn limit(msg: impl Into<String>) -> Self {
        Self::ResourceLimitExceeded(msg.into())
    }

    /// Build a [`StampError::SinkWrite`] value.
    pub fn sink(err: std::io::Error) -> Self {
        Self::SinkWrite(err)
    }

    /// Build a [`StampError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// `true` when the failure class leaves nothing half-written if it happens before the
    /// first output byte, so the caller may retry or report it cleanly.
    pub fn is_retryable_before_output(&self) -> bool {
        !matches!(self, Self::SinkWrite(_) | Self::Cancelled)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
