#[inline(always)]
#[cold]
pub const fn cold() {}

#[inline(always)]
pub const fn unlikely(b: bool) -> bool {
    if b {
        cold();
    }
    b
}

/// Forward cursor over a preallocated output slice.
///
/// Callers size the slice with `encode_max_len()` up front, so running out of
/// room is a bug rather than a recoverable condition.
pub struct BytesMut<'a>(&'a mut [u8]);

impl<'a> BytesMut<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self(buf)
    }

    #[inline]
    pub fn write_one(self, v: u8) -> Self {
        if let Some((first, tail)) = self.0.split_first_mut() {
            *first = v;
            Self(tail)
        } else {
            cold();
            panic!("qoi: output buffer overrun");
        }
    }

    #[inline]
    pub fn write_many(self, v: &[u8]) -> Self {
        let (head, tail) = self.0.split_at_mut(v.len());
        head.copy_from_slice(v);
        Self(tail)
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.0.len()
    }
}

/// Reserves exactly `size` zeroed bytes, reporting allocator refusal instead
/// of aborting.
pub fn try_alloc_zeroed(size: usize) -> crate::error::Result<Vec<u8>> {
    let mut out = Vec::new();
    out.try_reserve_exact(size).map_err(|_| crate::error::Error::OutOfMemory { size })?;
    out.resize(size, 0);
    Ok(out)
}
