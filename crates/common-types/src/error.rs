use thiserror::Error;

/// Structured error taxonomy for decode and encode failures.
///
/// All variants are fatal to the call that produced them; there is no
/// retry path inside the codec. Each variant carries enough context to be
/// useful in a log line without a caller having to re-derive it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GifError {
    #[error("E_BAD_MAGIC: not a GIF87a/GIF89a stream (got {found:?})")]
    BadMagic { found: [u8; 6] },

    #[error("E_TRUNCATED: unexpected end of input while reading {context}")]
    Truncated { context: String },

    #[error("E_BAD_BLOCK_TAG: unrecognized block introducer 0x{tag:02X} at offset {offset}")]
    BadBlockTag { tag: u8, offset: usize },

    #[error("E_LZW_DECODE: {message}")]
    LzwDecodeError { message: String },

    #[error("E_MISSING_COLOR_TABLE: image at ({left},{top}) has neither a local nor a global color table")]
    MissingColorTable { left: u16, top: u16 },

    #[error("E_UNKNOWN_DISPOSAL: disposal method {method} is not one of 0,1,2,3")]
    UnknownDisposalMethod { method: u8 },

    #[error("E_PALETTE_TOO_LARGE: {count} unique colors exceed the 256-entry limit")]
    PaletteTooLarge { count: usize },

    #[error("E_INVALID_FRAME_SIZE: frame {index} has {actual} pixels, expected {expected}")]
    InvalidFrameSize {
        index: usize,
        actual: usize,
        expected: usize,
    },

    #[error("E_INVALID_ALPHA: frame {index} pixel {pixel_index} has alpha {alpha}, expected 0 or 255")]
    InvalidAlpha {
        index: usize,
        pixel_index: usize,
        alpha: u8,
    },

    #[error("E_IMAGE_OUT_OF_BOUNDS: image rect ({left},{top},{width},{height}) exceeds logical screen {screen_width}x{screen_height}")]
    ImageOutOfBounds {
        left: u16,
        top: u16,
        width: u16,
        height: u16,
        screen_width: u16,
        screen_height: u16,
    },
}

impl GifError {
    /// Stable string code for logging and monitoring, mirroring the
    /// `#error` message prefix on each variant.
    pub fn code(&self) -> &'static str {
        match self {
            GifError::BadMagic { .. } => "E_BAD_MAGIC",
            GifError::Truncated { .. } => "E_TRUNCATED",
            GifError::BadBlockTag { .. } => "E_BAD_BLOCK_TAG",
            GifError::LzwDecodeError { .. } => "E_LZW_DECODE",
            GifError::MissingColorTable { .. } => "E_MISSING_COLOR_TABLE",
            GifError::UnknownDisposalMethod { .. } => "E_UNKNOWN_DISPOSAL",
            GifError::PaletteTooLarge { .. } => "E_PALETTE_TOO_LARGE",
            GifError::InvalidFrameSize { .. } => "E_INVALID_FRAME_SIZE",
            GifError::InvalidAlpha { .. } => "E_INVALID_ALPHA",
            GifError::ImageOutOfBounds { .. } => "E_IMAGE_OUT_OF_BOUNDS",
        }
    }
}
