use std::io::{self, Read};

use bytemuck::cast_slice_mut;

use crate::cache::ColorCache;
use crate::consts::{
    QOI_HEADER_SIZE, QOI_MASK_2, QOI_OP_DIFF, QOI_OP_INDEX, QOI_OP_LUMA, QOI_OP_RGB, QOI_OP_RGBA,
    QOI_PADDING, QOI_PADDING_SIZE,
};
use crate::error::{Error, Result};
use crate::header::Header;
use crate::log::{debug, trace};
use crate::pixel::Pixel;
use crate::stream::StreamBuf;
use crate::utils::{try_alloc_zeroed, unlikely};

/// Reads and validates the 14-byte header, touching nothing past it.
pub(crate) fn read_header<R: Read + ?Sized>(reader: &mut R) -> Result<Header> {
    let mut bytes = [0_u8; QOI_HEADER_SIZE];
    reader.read_exact(&mut bytes).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => Error::UnexpectedBufferEnd,
        _ => Error::IoError(err),
    })?;
    Header::decode(bytes)
}

/// Decodes ops from `buf` into RGBA rows, handed over in wire order, then
/// checks the end marker.
///
/// A run may spill over into following rows. One that outlasts the image is
/// dropped.
pub(crate) fn decode_impl<'a, R, I>(buf: &mut StreamBuf<R>, rows: I) -> Result<()>
where
    R: Read,
    I: Iterator<Item = &'a mut [u8]>,
{
    let mut index = ColorCache::new();
    let mut px = Pixel::start();
    let mut run = 0_usize;

    for row in rows {
        let pixels = cast_slice_mut::<u8, [u8; 4]>(row);

        let mut pos = run.min(pixels.len());
        pixels[..pos].fill(px.into());
        run -= pos;

        while pos < pixels.len() {
            buf.prepare()?;
            let b1 = buf.read_u8()?;

            match b1 {
                QOI_OP_RGB => {
                    let [r, g, b] = buf.read_array()?;
                    px = px.with_rgb(r, g, b);
                }
                QOI_OP_RGBA => {
                    px = Pixel::from(buf.read_array::<4>()?);
                }
                _ => match b1 & QOI_MASK_2 {
                    QOI_OP_INDEX => {
                        px = index.get(b1);
                    }
                    QOI_OP_DIFF => {
                        px.rgb_add(
                            ((b1 >> 4) & 0x03).wrapping_sub(2),
                            ((b1 >> 2) & 0x03).wrapping_sub(2),
                            (b1 & 0x03).wrapping_sub(2),
                        );
                    }
                    QOI_OP_LUMA => {
                        let b2 = buf.read_u8()?;
                        let vg = (b1 & 0x3f).wrapping_sub(32);
                        let vg_8 = vg.wrapping_sub(8);
                        px.rgb_add(vg_8.wrapping_add(b2 >> 4), vg, vg_8.wrapping_add(b2 & 0x0f));
                    }
                    _ => {
                        // QOI_OP_RUN: repeats do not touch the index
                        run = usize::from(b1 & 0x3f) + 1;
                        let n = run.min(pixels.len() - pos);
                        pixels[pos..pos + n].fill(px.into());
                        pos += n;
                        run -= n;
                        continue;
                    }
                },
            }

            index.insert(px);
            pixels[pos] = px.into();
            pos += 1;
        }
    }

    if run != 0 {
        debug!("qoi: dropping {} run pixels past the end of the image", run);
    }

    buf.prepare()?;
    let padding = buf.read_array::<QOI_PADDING_SIZE>()?;
    if unlikely(padding != QOI_PADDING) {
        return Err(Error::InvalidPadding);
    }
    Ok(())
}

/// Decode the image into a pre-allocated buffer.
///
/// Note: the resulting number of bytes is always `width * height * 4`.
#[inline]
pub fn decode_to_buf(buf: impl AsMut<[u8]>, data: impl AsRef<[u8]>) -> Result<Header> {
    let mut decoder = Decoder::new(&data)?;
    decoder.decode_to_buf(buf)?;
    Ok(*decoder.header())
}

/// Decode the image into a newly allocated vector.
#[inline]
pub fn decode_to_vec(data: impl AsRef<[u8]>) -> Result<(Header, Vec<u8>)> {
    let mut decoder = Decoder::new(&data)?;
    let out = decoder.decode_to_vec()?;
    Ok((*decoder.header(), out))
}

/// Decode the image header from a slice of bytes.
#[inline]
pub fn decode_header(data: impl AsRef<[u8]>) -> Result<Header> {
    Header::decode(data)
}

/// Decode QOI images from slices or from streams.
///
/// The header is read and validated on construction; pixel data is pulled from
/// the source through a fixed 4 KiB window only once one of the `decode_*`
/// methods is called.
pub struct Decoder<R> {
    stream: StreamBuf<R>,
    header: Header,
}

impl<'a> Decoder<&'a [u8]> {
    /// Creates a new decoder from a slice of bytes.
    ///
    /// The header will be decoded immediately upon construction.
    #[inline]
    pub fn new(data: &'a (impl AsRef<[u8]> + ?Sized)) -> Result<Self> {
        Self::from_stream(data.as_ref())
    }
}

impl<R: Read> Decoder<R> {
    /// Creates a new decoder from a generic reader that implements [`Read`].
    ///
    /// The header will be decoded immediately upon construction.
    #[inline]
    pub fn from_stream(mut reader: R) -> Result<Self> {
        let header = read_header(&mut reader)?;
        trace!(
            "qoi: header {}x{}, {} channels, {:?}",
            header.width,
            header.height,
            header.channels.as_u8(),
            header.colorspace
        );
        Ok(Self { stream: StreamBuf::new(reader)?, header })
    }

    /// Returns the decoded image header.
    #[inline]
    pub const fn header(&self) -> &Header {
        &self.header
    }

    /// The number of bytes the decoded RGBA image will take.
    ///
    /// Can be used to pre-allocate the buffer to decode the image into.
    #[inline]
    pub const fn required_buf_len(&self) -> usize {
        self.header.n_bytes()
    }

    /// Decodes the image to a pre-allocated buffer and returns the number of bytes written.
    ///
    /// The minimum size of the buffer can be found via [`Decoder::required_buf_len`].
    #[inline]
    pub fn decode_to_buf(&mut self, mut buf: impl AsMut<[u8]>) -> Result<usize> {
        let buf = buf.as_mut();
        let size = self.required_buf_len();
        if unlikely(buf.len() < size) {
            return Err(Error::OutputBufferTooSmall { size: buf.len(), required: size });
        }
        let stride = self.header.stride();
        self.decode_rows(buf[..size].chunks_exact_mut(stride))?;
        Ok(size)
    }

    /// Decodes the image into a newly allocated vector of bytes and returns it.
    #[inline]
    pub fn decode_to_vec(&mut self) -> Result<Vec<u8>> {
        let mut out = try_alloc_zeroed(self.header.n_bytes())?;
        self.decode_to_buf(&mut out)?;
        Ok(out)
    }

    /// Decodes into caller-provided rows, in wire order. Each row must be
    /// exactly `width * 4` bytes long.
    pub(crate) fn decode_rows<'b, I>(&mut self, rows: I) -> Result<()>
    where
        I: Iterator<Item = &'b mut [u8]>,
    {
        decode_impl(&mut self.stream, rows)?;
        debug!("qoi: decoded {}x{} image", self.header.width, self.header.height);
        Ok(())
    }

    /// Returns the underlying reader.
    ///
    /// Bytes already pulled into the decode window are not returned to it.
    #[inline]
    pub fn into_inner(self) -> R {
        self.stream.into_inner()
    }
}
