use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::utils::{try_alloc_zeroed, unlikely};

/// String-keyed store of small binary tags attached to a [`Bitmap`].
///
/// The QOI format uses it to carry the `channels` and `colorspace` header
/// fields from a load to a later save.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    tags: BTreeMap<String, Vec<u8>>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.tags.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.tags.get(key).map(Vec::as_slice)
    }

    /// Returns a single-byte tag; tags of any other length are ignored.
    pub fn get_u8(&self, key: &str) -> Option<u8> {
        match self.get(key) {
            Some(&[v]) => Some(v),
            _ => None,
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<u8>> {
        self.tags.remove(key)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// A 32-bit RGBA image as a host image library would hold it.
///
/// Scanlines are stored bottom-up: `scanline(0)` is the bottom row of the
/// picture. A bitmap may also be created without pixel storage, for callers
/// that only want the dimensions and tags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    bits: Option<Vec<u8>>,
    metadata: Metadata,
}

fn bits_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or(Error::OutOfMemory { size: usize::MAX })
}

impl Bitmap {
    /// Bits per pixel; the only depth this type supports.
    pub const BPP: u32 = 32;

    /// Allocates a zero-filled bitmap.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let bits = try_alloc_zeroed(bits_len(width, height)?)?;
        Ok(Self { width, height, bits: Some(bits), metadata: Metadata::new() })
    }

    /// Creates a bitmap that has dimensions but no pixel storage.
    pub fn header_only(width: u32, height: u32) -> Self {
        Self { width, height, bits: None, metadata: Metadata::new() }
    }

    /// Wraps bottom-up RGBA scanlines.
    pub fn from_bits(width: u32, height: u32, bits: Vec<u8>) -> Result<Self> {
        if unlikely(bits.len() != bits_len(width, height)?) {
            return Err(Error::InvalidImageLength { size: bits.len(), width, height });
        }
        Ok(Self { width, height, bits: Some(bits), metadata: Metadata::new() })
    }

    /// Builds a bitmap from RGBA rows listed top row first.
    pub fn from_top_down(width: u32, height: u32, data: &[u8]) -> Result<Self> {
        if unlikely(data.len() != bits_len(width, height)?) {
            return Err(Error::InvalidImageLength { size: data.len(), width, height });
        }
        let mut bitmap = Self::new(width, height)?;
        let pitch = bitmap.pitch();
        if let Some(rows) = bitmap.top_down_rows_mut() {
            for (dst, src) in rows.zip(data.chunks_exact(pitch)) {
                dst.copy_from_slice(src);
            }
        }
        Ok(bitmap)
    }

    /// Copies the pixels out as RGBA rows, top row first.
    pub fn to_top_down(&self) -> Option<Vec<u8>> {
        let mut out = Vec::with_capacity(self.bits.as_ref()?.len());
        for row in self.top_down_rows()? {
            out.extend_from_slice(row);
        }
        Some(out)
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub const fn bpp(&self) -> u32 {
        Self::BPP
    }

    /// Bytes per scanline.
    pub const fn pitch(&self) -> usize {
        self.width as usize * 4
    }

    pub const fn has_pixels(&self) -> bool {
        self.bits.is_some()
    }

    pub fn bits(&self) -> Option<&[u8]> {
        self.bits.as_deref()
    }

    pub fn bits_mut(&mut self) -> Option<&mut [u8]> {
        self.bits.as_deref_mut()
    }

    /// Returns scanline `y`, counting from the bottom of the picture.
    pub fn scanline(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let (pitch, y) = (self.pitch(), y as usize);
        self.bits()?.get(pitch * y..pitch * (y + 1))
    }

    pub fn scanline_mut(&mut self, y: u32) -> Option<&mut [u8]> {
        if y >= self.height {
            return None;
        }
        let (pitch, y) = (self.pitch(), y as usize);
        self.bits_mut()?.get_mut(pitch * y..pitch * (y + 1))
    }

    /// RGBA value at column `x` of scanline `y`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width {
            return None;
        }
        let offset = x as usize * 4;
        let row = self.scanline(y)?;
        Some([row[offset], row[offset + 1], row[offset + 2], row[offset + 3]])
    }

    /// Scanlines from the top of the picture down, which is the order they
    /// are written to and read from a QOI stream. `None` without pixel storage
    /// or for a zero-width bitmap.
    pub(crate) fn top_down_rows(&self) -> Option<impl Iterator<Item = &[u8]>> {
        let pitch = self.pitch();
        if pitch == 0 {
            return None;
        }
        Some(self.bits()?.chunks_exact(pitch).rev())
    }

    pub(crate) fn top_down_rows_mut(&mut self) -> Option<impl Iterator<Item = &mut [u8]>> {
        let pitch = self.pitch();
        if pitch == 0 {
            return None;
        }
        Some(self.bits_mut()?.chunks_exact_mut(pitch).rev())
    }

    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_stored_bottom_up() {
        let top_down = [[1, 1, 1, 1], [2, 2, 2, 2], [3, 3, 3, 3], [4, 4, 4, 4]].concat();
        let bitmap = Bitmap::from_top_down(2, 2, &top_down).unwrap();
        assert_eq!(bitmap.scanline(0).unwrap(), &[3, 3, 3, 3, 4, 4, 4, 4]);
        assert_eq!(bitmap.scanline(1).unwrap(), &[1, 1, 1, 1, 2, 2, 2, 2]);
        assert_eq!(bitmap.scanline(2), None);
        assert_eq!(bitmap.pixel(1, 1), Some([2, 2, 2, 2]));
        assert_eq!(bitmap.pixel(2, 1), None);
        assert_eq!(bitmap.to_top_down().unwrap(), top_down);
    }

    #[test]
    fn test_header_only_has_no_rows() {
        let bitmap = Bitmap::header_only(3, 2);
        assert!(!bitmap.has_pixels());
        assert_eq!(bitmap.scanline(0), None);
        assert_eq!(bitmap.to_top_down(), None);
        assert_eq!(bitmap.pitch(), 12);
    }

    #[test]
    fn test_metadata_tags() {
        let mut meta = Metadata::new();
        meta.set("channels", [3_u8]);
        meta.set("comment", b"hello".to_vec());
        assert_eq!(meta.get_u8("channels"), Some(3));
        assert_eq!(meta.get_u8("comment"), None);
        assert_eq!(meta.get("comment"), Some(&b"hello"[..]));
        assert_eq!(meta.len(), 2);
        assert_eq!(meta.remove("channels"), Some(vec![3]));
        assert_eq!(meta.iter().count(), 1);
    }

    #[test]
    fn test_bits_length_checked() {
        assert!(matches!(
            Bitmap::from_bits(2, 2, vec![0; 15]),
            Err(Error::InvalidImageLength { .. })
        ));
        assert!(Bitmap::from_bits(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn test_top_down_length_checked_before_allocating() {
        // 16 GiB of pixels: must be refused on the length alone
        assert!(matches!(
            Bitmap::from_top_down(65_536, 65_536, &[0; 16]),
            Err(Error::InvalidImageLength { size: 16, width: 65_536, height: 65_536 })
        ));
        assert!(matches!(
            Bitmap::from_top_down(2, 2, &[0; 12]),
            Err(Error::InvalidImageLength { .. })
        ));
    }
}
