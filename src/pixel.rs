use crate::consts::QOI_INDEX_SIZE;

/// A single RGBA pixel.
///
/// Equality is exact over all four channels; [`Pixel::as_u32`] lets hot loops
/// compare pixels as one 32-bit word.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct Pixel([u8; 4]);

impl Pixel {
    #[inline]
    pub const fn new() -> Self {
        Self([0; 4])
    }

    #[inline]
    pub const fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    /// Previous-pixel value both sides start from: opaque black.
    #[inline]
    pub const fn start() -> Self {
        Self([0, 0, 0, 0xff])
    }

    #[inline]
    pub const fn r(self) -> u8 {
        self.0[0]
    }

    #[inline]
    pub const fn g(self) -> u8 {
        self.0[1]
    }

    #[inline]
    pub const fn b(self) -> u8 {
        self.0[2]
    }

    #[inline]
    pub const fn a(self) -> u8 {
        self.0[3]
    }

    #[inline]
    pub const fn with_rgb(mut self, r: u8, g: u8, b: u8) -> Self {
        self.0[0] = r;
        self.0[1] = g;
        self.0[2] = b;
        self
    }

    /// Packs the channels into one word. Only used for fast comparisons, so
    /// native byte order is fine.
    #[inline]
    pub fn as_u32(self) -> u32 {
        bytemuck::cast(self.0)
    }

    #[inline]
    pub fn same_as(self, other: Self) -> bool {
        self.as_u32() == other.as_u32()
    }

    #[inline]
    pub const fn hash_index(self) -> u8 {
        let r = self.r().wrapping_mul(3);
        let g = self.g().wrapping_mul(5);
        let b = self.b().wrapping_mul(7);
        let a = self.a().wrapping_mul(11);
        r.wrapping_add(g).wrapping_add(b).wrapping_add(a) % (QOI_INDEX_SIZE as u8)
    }

    #[inline]
    pub fn rgb_add(&mut self, r: u8, g: u8, b: u8) {
        self.0[0] = self.0[0].wrapping_add(r);
        self.0[1] = self.0[1].wrapping_add(g);
        self.0[2] = self.0[2].wrapping_add(b);
    }
}

impl From<[u8; 4]> for Pixel {
    #[inline(always)]
    fn from(arr: [u8; 4]) -> Self {
        Self(arr)
    }
}

impl From<Pixel> for [u8; 4] {
    #[inline(always)]
    fn from(px: Pixel) -> Self {
        px.0
    }
}
