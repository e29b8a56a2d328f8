use core::convert::TryInto;

use crate::consts::{QOI_HEADER_SIZE, QOI_MAGIC, QOI_PIXELS_MAX};
use crate::encode::encode_max_len;
use crate::error::{Error, Result};
use crate::types::{Channels, ColorSpace};
use crate::utils::unlikely;

/// Image header: dimensions, channels, color space.
///
/// ### Notes
/// A valid image header must satisfy the following conditions:
/// * Both width and height must be non-zero.
/// * `height < 400_000_000 / width`, i.e. fewer than 400 million pixels in total.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Number of 8-bit channels per pixel
    pub channels: Channels,
    /// Color space (informative field, doesn't affect encoding)
    pub colorspace: ColorSpace,
}

impl Default for Header {
    #[inline]
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            channels: Channels::default(),
            colorspace: ColorSpace::default(),
        }
    }
}

#[inline(always)]
const fn u32_from_be(v: &[u8]) -> u32 {
    u32::from_be_bytes([v[0], v[1], v[2], v[3]])
}

/// Checks the dimension envelope shared by the encoder and the decoder.
///
/// The division form avoids overflowing `width * height` in 32 bits.
#[inline]
pub fn validate_dimensions(width: u32, height: u32) -> Result<()> {
    if unlikely(width == 0 || height == 0) {
        return Err(Error::EmptyImage { width, height });
    }
    if unlikely(height as usize >= QOI_PIXELS_MAX / width as usize) {
        return Err(Error::ImageTooLarge { width, height });
    }
    Ok(())
}

impl Header {
    /// Size of the encoded header in bytes.
    pub const SIZE: usize = QOI_HEADER_SIZE;

    /// Creates a new header and validates image dimensions.
    #[inline]
    pub fn try_new(
        width: u32, height: u32, channels: Channels, colorspace: ColorSpace,
    ) -> Result<Self> {
        validate_dimensions(width, height)?;
        Ok(Self { width, height, channels, colorspace })
    }

    /// Creates a new header with modified channels.
    #[inline]
    pub const fn with_channels(mut self, channels: Channels) -> Self {
        self.channels = channels;
        self
    }

    /// Creates a new header with modified color space.
    #[inline]
    pub const fn with_colorspace(mut self, colorspace: ColorSpace) -> Self {
        self.colorspace = colorspace;
        self
    }

    /// Serializes the header into a bytes array.
    #[inline]
    pub fn encode(&self) -> [u8; QOI_HEADER_SIZE] {
        let mut out = [0; QOI_HEADER_SIZE];
        out[..4].copy_from_slice(&QOI_MAGIC.to_be_bytes());
        out[4..8].copy_from_slice(&self.width.to_be_bytes());
        out[8..12].copy_from_slice(&self.height.to_be_bytes());
        out[12] = self.channels.into();
        out[13] = self.colorspace.into();
        out
    }

    /// Deserializes the header from a byte array.
    ///
    /// Checks the magic first, then channels, color space and dimensions, so
    /// nothing gets allocated for a header that would be rejected anyway.
    #[inline]
    pub fn decode(data: impl AsRef<[u8]>) -> Result<Self> {
        let data = data.as_ref();
        if unlikely(data.len() < QOI_HEADER_SIZE) {
            return Err(Error::UnexpectedBufferEnd);
        }
        let v: [u8; QOI_HEADER_SIZE] = data[..QOI_HEADER_SIZE]
            .try_into()
            .map_err(|_| Error::UnexpectedBufferEnd)?;
        let magic = u32_from_be(&v[..4]);
        let width = u32_from_be(&v[4..8]);
        let height = u32_from_be(&v[8..12]);
        let channels = v[12];
        let colorspace = v[13];
        if unlikely(magic != QOI_MAGIC) {
            return Err(Error::InvalidMagic { magic });
        }
        let channels = channels.try_into()?;
        let colorspace = colorspace.try_into()?;
        Self::try_new(width, height, channels, colorspace)
    }

    /// Returns a number of pixels in the image.
    #[inline]
    pub const fn n_pixels(&self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    /// Returns the number of bytes needed to hold the decoded image.
    ///
    /// Decoded pixels are always RGBA, whatever `channels` says.
    #[inline]
    pub const fn n_bytes(&self) -> usize {
        self.n_pixels().saturating_mul(4)
    }

    /// Byte length of one decoded row.
    #[inline]
    pub const fn stride(&self) -> usize {
        (self.width as usize).saturating_mul(4)
    }

    /// The maximum number of bytes the encoded image will take.
    #[inline]
    pub fn encode_max_len(&self) -> usize {
        encode_max_len(self.width, self.height)
    }
}
