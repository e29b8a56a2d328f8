use std::io::Write;

use bytemuck::cast_slice;

use crate::cache::ColorCache;
use crate::consts::{
    QOI_HEADER_SIZE, QOI_OP_DIFF, QOI_OP_INDEX, QOI_OP_LUMA, QOI_OP_RGB, QOI_OP_RGBA, QOI_OP_RUN,
    QOI_PADDING, QOI_PADDING_SIZE, QOI_RUN_MAX,
};
use crate::error::{Error, Result};
use crate::header::Header;
use crate::log::trace;
use crate::pixel::Pixel;
use crate::types::{Channels, ColorSpace};
use crate::utils::{try_alloc_zeroed, unlikely, BytesMut};

/// Encodes `header.n_pixels()` RGBA pixels, handed over row by row in wire
/// order, into `out`. Returns the number of bytes written.
///
/// Runs are counted across row boundaries; a pending run is flushed on the
/// last pixel of the image.
pub(crate) fn encode_impl<'a, I>(out: &mut [u8], header: &Header, rows: I) -> Result<usize>
where
    I: Iterator<Item = &'a [u8]>,
{
    let max_len = header.encode_max_len();
    if unlikely(out.len() < max_len) {
        return Err(Error::OutputBufferTooSmall { size: out.len(), required: max_len });
    }

    let out_size = out.len();
    let mut buf = BytesMut::new(out);
    buf = buf.write_many(&header.encode());

    let mut index = ColorCache::new();
    let mut px_prev = Pixel::start();
    let mut run = 0_u8;
    let n_pixels = header.n_pixels();
    let mut i = 0_usize;

    for row in rows {
        for &rgba in cast_slice::<u8, [u8; 4]>(row) {
            let px = Pixel::from(rgba);
            i += 1;

            if px.same_as(px_prev) {
                run += 1;
                if run == QOI_RUN_MAX || unlikely(i == n_pixels) {
                    buf = buf.write_one(QOI_OP_RUN | (run - 1));
                    run = 0;
                }
                continue;
            }

            if run != 0 {
                buf = buf.write_one(QOI_OP_RUN | (run - 1));
                run = 0;
            }

            let (index_pos, hit) = index.lookup(px);
            if hit {
                buf = buf.write_one(QOI_OP_INDEX | index_pos);
            } else {
                index.insert(px);

                if px.a() == px_prev.a() {
                    let vr = px.r().wrapping_sub(px_prev.r());
                    let vg = px.g().wrapping_sub(px_prev.g());
                    let vb = px.b().wrapping_sub(px_prev.b());

                    let vg_r = vr.wrapping_sub(vg);
                    let vg_b = vb.wrapping_sub(vg);

                    // biased deltas fit in 2 bits iff the signed delta is in -2..=1
                    let (vr_2, vg_2, vb_2) =
                        (vr.wrapping_add(2), vg.wrapping_add(2), vb.wrapping_add(2));
                    if vr_2 | vg_2 | vb_2 | 3 == 3 {
                        buf = buf.write_one(QOI_OP_DIFF | vr_2 << 4 | vg_2 << 2 | vb_2);
                    } else {
                        let (vg_32, vg_r_8, vg_b_8) =
                            (vg.wrapping_add(32), vg_r.wrapping_add(8), vg_b.wrapping_add(8));
                        if vg_r_8 | vg_b_8 | 15 == 15 && vg_32 | 63 == 63 {
                            buf = buf.write_many(&[QOI_OP_LUMA | vg_32, vg_r_8 << 4 | vg_b_8]);
                        } else {
                            buf = buf.write_many(&[QOI_OP_RGB, px.r(), px.g(), px.b()]);
                        }
                    }
                } else {
                    buf = buf.write_many(&[QOI_OP_RGBA, px.r(), px.g(), px.b(), px.a()]);
                }
            }
            px_prev = px;
        }
    }

    buf = buf.write_many(&QOI_PADDING);
    let written = out_size.saturating_sub(buf.len());
    trace!("qoi: encoded {}x{} into {} bytes", header.width, header.height, written);
    Ok(written)
}

/// Allocates the worst-case output up front and encodes into it.
pub(crate) fn encode_rows_to_vec<'a, I>(header: &Header, rows: I) -> Result<Vec<u8>>
where
    I: Iterator<Item = &'a [u8]>,
{
    let mut out = try_alloc_zeroed(header.encode_max_len())?;
    let size = encode_impl(&mut out, header, rows)?;
    out.truncate(size);
    Ok(out)
}

/// The maximum number of bytes the encoded image will take.
///
/// Can be used to pre-allocate the buffer to encode the image into.
#[inline]
pub fn encode_max_len(width: u32, height: u32) -> usize {
    let (width, height) = (width as usize, height as usize);
    let n_pixels = width.saturating_mul(height);
    // a QOI_OP_RGBA for every pixel is the worst case
    QOI_HEADER_SIZE + n_pixels.saturating_mul(5).saturating_add(QOI_PADDING_SIZE)
}

/// Encode the image into a pre-allocated buffer.
///
/// Returns the total number of bytes written.
#[inline]
pub fn encode_to_buf(
    buf: impl AsMut<[u8]>, data: impl AsRef<[u8]>, width: u32, height: u32,
) -> Result<usize> {
    Encoder::new(&data, width, height)?.encode_to_buf(buf)
}

/// Encode the image into a newly allocated vector.
#[inline]
pub fn encode_to_vec(data: impl AsRef<[u8]>, width: u32, height: u32) -> Result<Vec<u8>> {
    Encoder::new(&data, width, height)?.encode_to_vec()
}

/// Encode QOI images into buffers or into streams.
///
/// Pixel data is RGBA, four bytes per pixel, rows in the order they go on the
/// wire (the first row encoded is the first row decoded).
pub struct Encoder<'a> {
    data: &'a [u8],
    header: Header,
}

impl<'a> Encoder<'a> {
    /// Creates a new encoder from a given array of pixel data and image dimensions.
    ///
    /// The header is tagged as RGBA and sRGB; use [`Encoder::with_channels`] and
    /// [`Encoder::with_colorspace`] to change that.
    #[inline]
    pub fn new(data: &'a (impl AsRef<[u8]> + ?Sized), width: u32, height: u32) -> Result<Self> {
        let data = data.as_ref();
        let header = Header::try_new(width, height, Channels::Rgba, ColorSpace::Srgb)?;
        if unlikely(data.len() != header.n_bytes()) {
            return Err(Error::InvalidImageLength { size: data.len(), width, height });
        }
        Ok(Self { data, header })
    }

    /// Returns a new encoder with modified channels field.
    #[inline]
    pub const fn with_channels(mut self, channels: Channels) -> Self {
        self.header.channels = channels;
        self
    }

    /// Returns a new encoder with modified color space.
    ///
    /// Note: the color space doesn't affect encoding or decoding in any way, it's
    /// a purely informative field that's stored in the image header.
    #[inline]
    pub const fn with_colorspace(mut self, colorspace: ColorSpace) -> Self {
        self.header.colorspace = colorspace;
        self
    }

    /// Returns the inferred QOI header.
    #[inline]
    pub const fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the maximum number of bytes the encoded image will take.
    ///
    /// Can be used to pre-allocate the buffer to encode the image into.
    #[inline]
    pub fn required_buf_len(&self) -> usize {
        self.header.encode_max_len()
    }

    fn rows(&self) -> impl Iterator<Item = &'a [u8]> {
        self.data.chunks_exact(self.header.stride())
    }

    /// Encodes the image to a pre-allocated buffer and returns the number of bytes written.
    ///
    /// The minimum size of the buffer can be found via [`Encoder::required_buf_len`].
    #[inline]
    pub fn encode_to_buf(&self, mut buf: impl AsMut<[u8]>) -> Result<usize> {
        encode_impl(buf.as_mut(), &self.header, self.rows())
    }

    /// Encodes the image into a newly allocated vector of bytes and returns it.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        encode_rows_to_vec(&self.header, self.rows())
    }

    /// Encodes the image directly to a generic writer that implements [`Write`].
    ///
    /// Returns the number of bytes written.
    ///
    /// Note: while it's possible to pass a `&mut [u8]` slice here since it implements `Write`,
    /// it would be more efficient to use a specialized method instead: [`Encoder::encode_to_buf`].
    #[inline]
    pub fn encode_to_stream<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let encoded = self.encode_to_vec()?;
        writer.write_all(&encoded)?;
        Ok(encoded.len())
    }
}
