//! Operand fields.
//!
//! A [`FieldSpec`] describes one logical operand: its name, its total width,
//! and the chunks it is split into. Each chunk is a [`BitRange`] naming where
//! the chunk lands inside the assembled value. Where a chunk sits inside the
//! *encoding* is decided by the pattern that places it, so the same field
//! (say a 3-bit `Rd`) can be shared by many instruction specifications.

use std::sync::Arc;

use crate::{Result, SpecError};

/// Maximum width of an assembled field value.
pub const MAX_VALUE_BITS: u8 = 32;

/// Shared handle to a field, reused across instruction specifications.
pub type FieldRef = Arc<FieldSpec>;

/// One chunk of a field: `width` bits placed at `shift` in the logical value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BitRange {
    pub shift: u8,
    pub width: u8,
}

impl BitRange {
    #[must_use]
    pub const fn new(shift: u8, width: u8) -> Self {
        Self { shift, width }
    }

    /// Mask of the chunk's raw bits (right-aligned).
    #[inline]
    #[must_use]
    pub const fn raw_mask(&self) -> u32 {
        if self.width >= 32 {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        }
    }

    /// Mask of the chunk's bits inside the logical value.
    #[inline]
    #[must_use]
    pub const fn value_mask(&self) -> u32 {
        self.raw_mask() << self.shift
    }
}

/// How extracted bits turn into operand values.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Plain bit field (flags, condition codes, shift types).
    Field,
    /// Immediate operand; sign or zero extension is left to macros.
    Immediate,
    /// Register number.
    Register,
    /// Stored value is biased: operand = raw + `bias` (e.g. `widthm1`).
    Plus { bias: u32 },
    /// One encoded register number bound to two operand names (`Rdn`).
    Pair { alias: String },
    /// One encoded bit on top of a fixed 3-bit register number.
    ImpliedRegister { low: u8 },
    /// Branch immediate bit stored as `J`; the operand bit is `!(J ^ S)`,
    /// `S` being the top bit of the same immediate.
    NotXor,
}

/// A named operand and its bit layout.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldSpec {
    name: String,
    width: u8,
    ranges: Vec<BitRange>,
    kind: FieldKind,
}

impl FieldSpec {
    /// Create a field from explicit ranges, most significant chunk first.
    pub fn new(
        name: impl Into<String>,
        width: u8,
        ranges: Vec<BitRange>,
        kind: FieldKind,
    ) -> Result<Self> {
        let field = Self {
            name: name.into(),
            width,
            ranges,
            kind,
        };
        field.validate()?;
        Ok(field)
    }

    fn validate(&self) -> Result<()> {
        if self.ranges.is_empty() {
            return Err(SpecError::EmptyField {
                name: self.name.clone(),
            });
        }

        let mut covered = 0u32;
        let mut total = 0u32;
        for range in &self.ranges {
            let end = u32::from(range.shift) + u32::from(range.width);
            if range.width == 0 || end > u32::from(MAX_VALUE_BITS) {
                return Err(SpecError::RangeOutOfBounds {
                    name: self.name.clone(),
                    shift: range.shift,
                    width: range.width,
                    max: MAX_VALUE_BITS,
                });
            }
            if covered & range.value_mask() != 0 {
                return Err(SpecError::OverlappingRanges {
                    name: self.name.clone(),
                    shift: range.shift,
                });
            }
            covered |= range.value_mask();
            total += u32::from(range.width);
        }

        if total != u32::from(self.width) {
            return Err(SpecError::FieldWidth {
                name: self.name.clone(),
                declared: self.width,
                actual: total,
            });
        }

        if let FieldKind::ImpliedRegister { low } = self.kind {
            if low > 0b111 {
                return Err(SpecError::ImpliedBits {
                    name: self.name.clone(),
                    low,
                });
            }
        }
        Ok(())
    }

    fn single(name: &str, width: u8, shift: u8, kind: FieldKind) -> Result<FieldRef> {
        Self::new(name, width, vec![BitRange::new(shift, width)], kind).map(Arc::new)
    }

    /// Contiguous plain field.
    pub fn field(name: &str, width: u8) -> Result<FieldRef> {
        Self::single(name, width, 0, FieldKind::Field)
    }

    /// Piece of a plain field landing at `shift` (e.g. `register_list` bit 14).
    pub fn scattered_field(name: &str, width: u8, shift: u8) -> Result<FieldRef> {
        Self::single(name, width, shift, FieldKind::Field)
    }

    /// Contiguous immediate.
    pub fn immediate(name: &str, width: u8) -> Result<FieldRef> {
        Self::single(name, width, 0, FieldKind::Immediate)
    }

    /// Piece of an immediate landing at `shift` (e.g. `imm3` at bit 8).
    pub fn scattered_immediate(name: &str, width: u8, shift: u8) -> Result<FieldRef> {
        Self::single(name, width, shift, FieldKind::Immediate)
    }

    /// Contiguous register number.
    pub fn register(name: &str, width: u8) -> Result<FieldRef> {
        Self::single(name, width, 0, FieldKind::Register)
    }

    /// Piece of a register number landing at `shift` (e.g. the `D` bit of `Rd`).
    pub fn scattered_register(name: &str, width: u8, shift: u8) -> Result<FieldRef> {
        Self::single(name, width, shift, FieldKind::Register)
    }

    /// Register number bound to both `name` and `alias`.
    pub fn double_register(name: &str, alias: &str, width: u8) -> Result<FieldRef> {
        Self::double_scattered_register(name, alias, width, 0)
    }

    /// Piece of a register number bound to both `name` and `alias`.
    pub fn double_scattered_register(
        name: &str,
        alias: &str,
        width: u8,
        shift: u8,
    ) -> Result<FieldRef> {
        Self::single(
            name,
            width,
            shift,
            FieldKind::Pair {
                alias: alias.to_string(),
            },
        )
    }

    /// Field whose stored value is `operand - bias`.
    pub fn plus(name: &str, width: u8, bias: u32) -> Result<FieldRef> {
        Self::single(name, width, 0, FieldKind::Plus { bias })
    }

    /// One encoded bit forming bit 3 of a register whose low bits are `low`.
    pub fn implied_register(name: &str, low: u8) -> Result<FieldRef> {
        Self::single(name, 1, 3, FieldKind::ImpliedRegister { low })
    }

    /// Branch immediate bit at `shift` stored as `J` (`I = NOT(J XOR S)`).
    pub fn not_xor_immediate(name: &str, shift: u8) -> Result<FieldRef> {
        Self::single(name, 1, shift, FieldKind::NotXor)
    }

    /// Field assembled from several ranges, most significant first.
    pub fn scattered(
        name: &str,
        width: u8,
        kind: FieldKind,
        ranges: &[(u8, u8)],
    ) -> Result<FieldRef> {
        let ranges = ranges
            .iter()
            .map(|&(shift, width)| BitRange::new(shift, width))
            .collect();
        Self::new(name, width, ranges, kind).map(Arc::new)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Second operand name for paired registers.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Pair { alias } => Some(alias),
            _ => None,
        }
    }

    /// Every operand name this field binds.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.alias())
    }

    #[must_use]
    pub const fn width(&self) -> u8 {
        self.width
    }

    #[must_use]
    pub fn ranges(&self) -> &[BitRange] {
        &self.ranges
    }

    #[must_use]
    pub const fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Number of chunks a pattern has to place.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.ranges.len()
    }

    /// Whether the field's bits do not form one contiguous run starting at bit 0.
    #[must_use]
    pub fn is_scattered(&self) -> bool {
        self.ranges.len() > 1 || self.ranges[0].shift != 0
    }

    /// Assemble raw chunk values (in declared order) into the field value.
    ///
    /// Bias and implied bits are applied; `NotXor` bits are returned raw
    /// since they depend on the rest of the immediate.
    #[must_use]
    pub fn assemble(&self, chunks: &[u32]) -> i64 {
        let raw = self
            .ranges
            .iter()
            .zip(chunks)
            .fold(0u32, |acc, (range, &chunk)| {
                acc | ((chunk & range.raw_mask()) << range.shift)
            });
        self.finish(raw)
    }

    /// Apply the kind's value adjustment to an assembled raw value.
    #[must_use]
    pub fn finish(&self, raw: u32) -> i64 {
        match self.kind {
            FieldKind::Plus { bias } => i64::from(raw) + i64::from(bias),
            FieldKind::ImpliedRegister { low } => i64::from(raw | u32::from(low)),
            _ => i64::from(raw),
        }
    }

    /// Split an operand value back into raw chunk values (inverse of [`assemble`]).
    ///
    /// [`assemble`]: Self::assemble
    #[must_use]
    pub fn split(&self, value: i64) -> Vec<u32> {
        let raw = match self.kind {
            FieldKind::Plus { bias } => value.wrapping_sub(i64::from(bias)) as u32,
            _ => value as u32,
        };
        self.ranges
            .iter()
            .map(|range| (raw >> range.shift) & range.raw_mask())
            .collect()
    }
}
