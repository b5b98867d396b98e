use super::error::AllocError;

/// One contiguous span of the arena, tagged free or occupied.
///
/// Regions are owned exclusively by the arena's slot table; callers only ever
/// see them through a [`Handle`](super::handle::Handle). The arena keeps its
/// regions offset-contiguous and exhaustive over the storage, so the bounds
/// checks here guard against inconsistency rather than expected inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub offset: usize,
    pub size: usize,
    pub free: bool,
}

impl Region {
    pub fn new(offset: usize, size: usize, free: bool) -> Self {
        Self { offset, size, free }
    }

    /// The first byte past this region.
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.size
    }

    /// Whether the region's span lies within a storage of `capacity` bytes.
    #[inline]
    pub fn fits_in(&self, capacity: usize) -> bool {
        // Checked add so a corrupt offset/size pair can't wrap past capacity.
        self.offset
            .checked_add(self.size)
            .is_some_and(|end| end <= capacity)
    }

    fn bounds_check(&self, storage: &[u8]) -> Result<(), AllocError> {
        if self.fits_in(storage.len()) {
            Ok(())
        } else {
            Err(AllocError::OutOfBounds {
                offset: self.offset,
                size: self.size,
                capacity: storage.len(),
            })
        }
    }

    /// Copy out exactly `size` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if the region does not fit `storage`.
    pub fn read(&self, storage: &[u8]) -> Result<Vec<u8>, AllocError> {
        self.bounds_check(storage)?;
        Ok(storage[self.offset..self.end()].to_vec())
    }

    /// Overwrite the first `value.len()` bytes of the region.
    ///
    /// Short writes are permitted: bytes past `value.len()` keep whatever
    /// was resident in the span. They are not zeroed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidWrite` if `value` is longer than the region, and
    /// `OutOfBounds` if the region does not fit `storage`.
    pub fn write(&self, storage: &mut [u8], value: &[u8]) -> Result<(), AllocError> {
        if value.len() > self.size {
            return Err(AllocError::InvalidWrite {
                len: value.len(),
                size: self.size,
            });
        }
        self.bounds_check(storage)?;
        storage[self.offset..self.offset + value.len()].copy_from_slice(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_fits_in() {
        assert!(Region::new(0, 8, true).fits_in(8));
        assert!(Region::new(4, 4, false).fits_in(8));
        assert!(!Region::new(4, 5, false).fits_in(8));
        assert!(!Region::new(usize::MAX, 2, true).fits_in(8));
    }

    #[test]
    fn test_region_read_copies_span() {
        let storage = vec![1u8, 2, 3, 4, 5, 6];
        let region = Region::new(2, 3, false);
        assert_eq!(region.read(&storage).unwrap(), vec![3, 4, 5]);
    }

    #[test]
    fn test_region_read_out_of_bounds() {
        let storage = vec![0u8; 4];
        let region = Region::new(2, 3, false);
        assert_eq!(
            region.read(&storage),
            Err(AllocError::OutOfBounds {
                offset: 2,
                size: 3,
                capacity: 4
            })
        );
    }

    #[test]
    fn test_region_write_over_length_rejected() {
        let mut storage = vec![0u8; 8];
        let region = Region::new(0, 2, false);
        let err = region.write(&mut storage, b"abc").unwrap_err();
        assert_eq!(err, AllocError::InvalidWrite { len: 3, size: 2 });
        // Storage untouched on failure.
        assert_eq!(storage, vec![0u8; 8]);
    }

    #[test]
    fn test_region_short_write_keeps_tail() {
        let mut storage = vec![9u8; 6];
        let region = Region::new(1, 4, false);
        region.write(&mut storage, b"ab").unwrap();
        assert_eq!(storage, vec![9, b'a', b'b', 9, 9, 9]);
    }

    #[test]
    fn test_region_empty_write_is_noop() {
        let mut storage = vec![7u8; 4];
        Region::new(0, 4, false).write(&mut storage, b"").unwrap();
        assert_eq!(storage, vec![7u8; 4]);
    }
}
