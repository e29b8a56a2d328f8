use crate::consts::QOI_INDEX_SIZE;
use crate::pixel::Pixel;

/// The 64-slot table of recently seen pixels.
///
/// Encoder and decoder each keep their own copy and update it by the same
/// rules, so `QOI_OP_INDEX` back-references resolve identically on both sides.
/// Slots are overwritten unconditionally; a colliding pixel simply evicts
/// whatever was there.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ColorCache {
    slots: [Pixel; QOI_INDEX_SIZE],
}

impl ColorCache {
    #[inline]
    pub const fn new() -> Self {
        Self { slots: [Pixel::new(); QOI_INDEX_SIZE] }
    }

    /// Returns the pixel stored in `slot`. Only the low 6 bits are used.
    #[inline]
    pub fn get(&self, slot: u8) -> Pixel {
        self.slots[usize::from(slot) % QOI_INDEX_SIZE]
    }

    /// Returns the slot `px` hashes to, and whether that slot already holds it.
    #[inline]
    pub fn lookup(&self, px: Pixel) -> (u8, bool) {
        let slot = px.hash_index();
        (slot, self.slots[usize::from(slot)].same_as(px))
    }

    #[inline]
    pub fn insert(&mut self, px: Pixel) {
        self.slots[usize::from(px.hash_index())] = px;
    }

    pub fn slots(&self) -> &[Pixel; QOI_INDEX_SIZE] {
        &self.slots
    }
}

impl Default for ColorCache {
    fn default() -> Self {
        Self::new()
    }
}
