//! Append-only storage regions with reserve-then-patch writes.

use rustc_hash::FxHashMap;

use crate::{EmitError, Result};

/// Highest number of cells a region may hold: offsets are 16-bit.
pub const REGION_LIMIT: usize = 1 << 16;

/// Growable arena of fixed-width cells addressed by 16-bit offsets.
///
/// Space is reserved with [`alloc`](Self::alloc) (zero-filled) and written
/// later with [`update`](Self::update), which must target the start of an
/// earlier allocation and stay inside it.
#[derive(Clone, Debug)]
pub struct Region<T> {
    name: &'static str,
    cells: Vec<T>,
    allocations: FxHashMap<u16, usize>,
}

impl<T: Copy + Default> Region<T> {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            cells: Vec::new(),
            allocations: FxHashMap::default(),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Reserve `width` zeroed cells and return their offset.
    pub fn alloc(&mut self, width: usize) -> Result<u16> {
        let start = self.cells.len();
        let end = start + width;
        if end > REGION_LIMIT {
            return Err(EmitError::RegionOverflow {
                region: self.name,
                requested: end,
            });
        }
        let offset = u16::try_from(start).map_err(|_| EmitError::RegionOverflow {
            region: self.name,
            requested: end,
        })?;
        self.cells.resize(end, T::default());
        self.allocations.insert(offset, width);
        Ok(offset)
    }

    /// Reserve and fill in one step.
    pub fn push(&mut self, values: &[T]) -> Result<u16> {
        let offset = self.alloc(values.len())?;
        self.update(offset, values)?;
        Ok(offset)
    }

    /// Overwrite an earlier allocation.
    pub fn update(&mut self, offset: u16, values: &[T]) -> Result<()> {
        let Some(&capacity) = self.allocations.get(&offset) else {
            return Err(EmitError::UnallocatedUpdate {
                region: self.name,
                offset,
            });
        };
        if values.len() > capacity {
            return Err(EmitError::UpdateOverrun {
                region: self.name,
                offset,
                len: values.len(),
                capacity,
            });
        }
        let start = usize::from(offset);
        self.cells[start..start + values.len()].copy_from_slice(values);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.cells
    }
}
