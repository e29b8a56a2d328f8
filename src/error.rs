use core::fmt::{self, Display};

use crate::consts::{QOI_MAGIC, QOI_PIXELS_MAX};

/// Coarse classification of [`Error`], for callers that branch on what went
/// wrong rather than on the exact variant.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ErrorKind {
    /// Bad magic, zero or oversized dimensions, disallowed channels or color space.
    InvalidDescriptor,
    /// Caller-supplied buffers have the wrong size or content.
    InvalidInput,
    /// An output allocation could not be satisfied.
    OutOfMemory,
    /// The byte source ran dry before the image or its end marker was complete.
    TruncatedStream,
    /// The end marker was present but did not match.
    CorruptPadding,
    /// The underlying reader or writer failed.
    Io,
}

#[derive(Debug)]
pub enum Error {
    InvalidMagic {
        magic: u32,
    },
    EmptyImage {
        width: u32,
        height: u32,
    },
    ImageTooLarge {
        width: u32,
        height: u32,
    },
    InvalidChannels {
        channels: u8,
    },
    InvalidColorSpace {
        colorspace: u8,
    },
    InvalidImageLength {
        size: usize,
        width: u32,
        height: u32,
    },
    OutputBufferTooSmall {
        size: usize,
        required: usize,
    },
    OutOfMemory {
        size: usize,
    },
    NoPixels,
    UnexpectedBufferEnd,
    InvalidPadding,
    IoError(std::io::Error),
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    pub const fn kind(&self) -> ErrorKind {
        match *self {
            Self::InvalidMagic { .. }
            | Self::EmptyImage { .. }
            | Self::ImageTooLarge { .. }
            | Self::InvalidChannels { .. }
            | Self::InvalidColorSpace { .. } => ErrorKind::InvalidDescriptor,
            Self::InvalidImageLength { .. }
            | Self::OutputBufferTooSmall { .. }
            | Self::NoPixels => ErrorKind::InvalidInput,
            Self::OutOfMemory { .. } => ErrorKind::OutOfMemory,
            Self::UnexpectedBufferEnd => ErrorKind::TruncatedStream,
            Self::InvalidPadding => ErrorKind::CorruptPadding,
            Self::IoError(_) => ErrorKind::Io,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::InvalidMagic { magic } => {
                let (expected, magic) = (QOI_MAGIC.to_be_bytes(), magic.to_be_bytes());
                write!(f, "invalid magic: expected {:?}, got {:?}", expected, magic)
            }
            Self::EmptyImage { width, height } => {
                write!(f, "image contains no pixels: {}x{}", width, height)
            }
            Self::ImageTooLarge { width, height } => {
                let mp = QOI_PIXELS_MAX / 1_000_000;
                write!(f, "image is too large: {}x{} (max={}Mp)", width, height, mp)
            }
            Self::InvalidChannels { channels } => {
                write!(f, "invalid number of channels: {} (expected 3 or 4)", channels)
            }
            Self::InvalidColorSpace { colorspace } => {
                write!(f, "invalid color space: {} (expected 0 or 1)", colorspace)
            }
            Self::InvalidImageLength { size, width, height } => {
                write!(f, "invalid image length: {} bytes for {}x{} rgba", size, width, height)
            }
            Self::OutputBufferTooSmall { size, required } => {
                write!(f, "output buffer size too small: {} (minimum required: {})", size, required)
            }
            Self::OutOfMemory { size } => {
                write!(f, "failed to allocate {} bytes", size)
            }
            Self::NoPixels => {
                write!(f, "bitmap was loaded without pixel data")
            }
            Self::UnexpectedBufferEnd => {
                write!(f, "unexpected input buffer end while decoding")
            }
            Self::InvalidPadding => {
                write!(f, "invalid padding (stream end marker)")
            }
            Self::IoError(ref err) => {
                write!(f, "i/o error: {}", err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Self::IoError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err)
    }
}
