//! The capability interface a host image library registers formats through,
//! and its QOI implementation.

use std::io::{Read, Write};

use crate::bitmap::Bitmap;
use crate::consts::QOI_MAGIC;
use crate::decode::{decode_impl, read_header};
use crate::encode::encode_rows_to_vec;
use crate::error::{Error, Result};
use crate::header::Header;
use crate::log::{debug, warn};
use crate::stream::StreamBuf;
use crate::types::{Channels, ColorSpace};

/// Metadata key under which the `channels` header field is kept.
pub const TAG_CHANNELS: &str = "channels";
/// Metadata key under which the `colorspace` header field is kept.
pub const TAG_COLORSPACE: &str = "colorspace";

/// Options for [`ImageFormat::load`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadFlags {
    /// Read the header only; the returned bitmap has no pixel storage.
    pub header_only: bool,
}

impl LoadFlags {
    pub const fn header_only() -> Self {
        Self { header_only: true }
    }
}

/// What a host needs from an image format: identification, probing, loading
/// and saving.
pub trait ImageFormat {
    /// Short format name, e.g. `"QOI"`.
    fn format(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Canonical file extension, without the dot.
    fn extension(&self) -> &'static str;

    /// Regular expression matching the start of a file in this format.
    fn regexpr(&self) -> Option<&'static str> {
        None
    }

    fn mime_type(&self) -> &'static str;

    /// Returns true if the stream looks like this format. Consumes some bytes
    /// from `reader`; callers rewind if they need to.
    fn validate(&self, reader: &mut dyn Read) -> bool;

    fn supports_export_depth(&self, depth: u32) -> bool;

    /// Whether [`LoadFlags::header_only`] is honoured.
    fn supports_no_pixels(&self) -> bool {
        false
    }

    fn load(&self, reader: &mut dyn Read, flags: LoadFlags) -> Result<Bitmap>;

    fn save(&self, bitmap: &Bitmap, writer: &mut dyn Write) -> Result<()>;
}

/// The QOI format.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct QoiFormat;

impl ImageFormat for QoiFormat {
    fn format(&self) -> &'static str {
        "QOI"
    }

    fn description(&self) -> &'static str {
        "Quite Okay Image"
    }

    fn extension(&self) -> &'static str {
        "qoi"
    }

    fn regexpr(&self) -> Option<&'static str> {
        Some("^qoif")
    }

    fn mime_type(&self) -> &'static str {
        "image/qoi"
    }

    fn validate(&self, reader: &mut dyn Read) -> bool {
        let mut signature = [0_u8; 4];
        reader.read_exact(&mut signature).is_ok() && signature == QOI_MAGIC.to_be_bytes()
    }

    fn supports_export_depth(&self, depth: u32) -> bool {
        depth == Bitmap::BPP
    }

    fn supports_no_pixels(&self) -> bool {
        true
    }

    fn load(&self, reader: &mut dyn Read, flags: LoadFlags) -> Result<Bitmap> {
        let header = read_header(reader)?;

        let mut bitmap = if flags.header_only {
            Bitmap::header_only(header.width, header.height)
        } else {
            Bitmap::new(header.width, header.height)?
        };
        let metadata = bitmap.metadata_mut();
        metadata.set(TAG_CHANNELS, [header.channels.as_u8()]);
        metadata.set(TAG_COLORSPACE, [header.colorspace.as_u8()]);

        if let Some(rows) = bitmap.top_down_rows_mut() {
            let mut stream = StreamBuf::new(reader)?;
            decode_impl(&mut stream, rows)?;
            debug!("qoi: loaded {}x{} bitmap", header.width, header.height);
        }
        Ok(bitmap)
    }

    fn save(&self, bitmap: &Bitmap, writer: &mut dyn Write) -> Result<()> {
        let metadata = bitmap.metadata();
        let colorspace = metadata.get_u8(TAG_COLORSPACE).unwrap_or_else(|| {
            warn!("qoi: no {} tag, saving as sRGB", TAG_COLORSPACE);
            ColorSpace::Srgb.as_u8()
        });
        let channels = metadata.get_u8(TAG_CHANNELS).unwrap_or_else(|| {
            warn!("qoi: no {} tag, saving as RGBA", TAG_CHANNELS);
            Channels::Rgba.as_u8()
        });

        let header = Header::try_new(
            bitmap.width(),
            bitmap.height(),
            Channels::try_from(channels)?,
            ColorSpace::try_from(colorspace)?,
        )?;
        let rows = bitmap.top_down_rows().ok_or(Error::NoPixels)?;
        let encoded = encode_rows_to_vec(&header, rows)?;
        writer.write_all(&encoded)?;
        debug!("qoi: saved {}x{} bitmap, {} bytes", header.width, header.height, encoded.len());
        Ok(())
    }
}
