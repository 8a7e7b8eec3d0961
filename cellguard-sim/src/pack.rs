//! Packed cell word
//!
//! The monitor's voltage input arrives as one wide word holding every
//! cell code side by side, cell 0 in the low bits.

use crate::error::SimError;

/// Layout of a packed cell word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPacking {
    count: usize,
    width: u8,
}

impl CellPacking {
    /// Layout for `count` cells of `width` bits each
    pub fn new(count: usize, width: u8) -> Result<Self, SimError> {
        let fits = count > 0 && (1..=16).contains(&width) && count * width as usize <= 64;
        if !fits {
            return Err(SimError::PackLayout {
                cells: count,
                width,
            });
        }
        Ok(Self { count, width })
    }

    fn field_mask(&self) -> u64 {
        (1u64 << self.width) - 1
    }

    /// Pack cell codes, truncating each to the field width
    pub fn pack(&self, cells: &[u16]) -> Result<u64, SimError> {
        if cells.len() != self.count {
            return Err(SimError::CellCount {
                expected: self.count,
                actual: cells.len(),
            });
        }

        let mask = self.field_mask();
        let word = cells.iter().enumerate().fold(0u64, |word, (i, &code)| {
            word | ((code as u64 & mask) << (i * self.width as usize))
        });
        Ok(word)
    }

    /// Unpack the first `N` cells of a word
    ///
    /// Fields past the layout's cell count read as zero.
    pub fn unpack<const N: usize>(&self, word: u64) -> [u16; N] {
        let mask = self.field_mask();
        let mut cells = [0u16; N];
        for (i, cell) in cells.iter_mut().enumerate().take(self.count) {
            *cell = ((word >> (i * self.width as usize)) & mask) as u16;
        }
        cells
    }
}
