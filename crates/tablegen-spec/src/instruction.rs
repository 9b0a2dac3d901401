//! Instruction specifications.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::placement::resolve;
use crate::{
    extract_operands, insert_operands, Cell, FieldRef, MacroSpec, Operands, Pattern, Placement,
    Result, SpecError,
};

/// Widest encoding a specification may declare.
pub const MAX_WIDTH: u8 = 64;

/// One catalog entry: syntax label, encoding pattern and macros.
///
/// Bit indices are counted from the most significant bit of the encoding:
/// index 0 is the first cell of the pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstructionSpec {
    syntax: String,
    width: u8,
    cells: Vec<Cell>,
    macros: Vec<MacroSpec>,
    literal_mask: u64,
    literal_value: u64,
    placements: Vec<Placement>,
}

impl InstructionSpec {
    /// Build and validate a specification.
    pub fn new(
        syntax: impl Into<String>,
        width: u8,
        pattern: Pattern,
        macros: Vec<MacroSpec>,
    ) -> Result<Self> {
        let syntax = syntax.into();
        if width == 0 || width > MAX_WIDTH {
            return Err(SpecError::WidthOutOfRange {
                syntax,
                width,
                max: MAX_WIDTH,
            });
        }

        let cells = pattern.into_cells();
        check_chunks(&syntax, &cells)?;

        let actual = cells.iter().map(Cell::width).sum::<u32>();
        if actual != u32::from(width) {
            return Err(SpecError::PatternWidth {
                syntax,
                declared: width,
                actual,
            });
        }

        check_macros(&syntax, &cells, &macros)?;

        let (literal_mask, literal_value) = literals(&cells, width);
        let placements = resolve(&cells, width);
        Ok(Self {
            syntax,
            width,
            cells,
            macros,
            literal_mask,
            literal_value,
            placements,
        })
    }

    /// Specification without macros.
    pub fn plain(syntax: impl Into<String>, width: u8, pattern: Pattern) -> Result<Self> {
        Self::new(syntax, width, pattern, Vec::new())
    }

    #[must_use]
    pub fn syntax(&self) -> &str {
        &self.syntax
    }

    #[must_use]
    pub const fn width(&self) -> u8 {
        self.width
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[must_use]
    pub fn macros(&self) -> &[MacroSpec] {
        &self.macros
    }

    /// Field chunks with positions relative to this encoding's width.
    #[must_use]
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Literal bits as a mask (bit `width - 1` is index 0).
    #[must_use]
    pub const fn literal_mask(&self) -> u64 {
        self.literal_mask
    }

    /// Values of the literal bits under [`literal_mask`](Self::literal_mask).
    #[must_use]
    pub const fn literal_value(&self) -> u64 {
        self.literal_value
    }

    /// Literal value at MSB-based `index`, or `None` for field/wildcard bits.
    #[inline]
    #[must_use]
    pub const fn literal(&self, index: u8) -> Option<bool> {
        if index >= self.width {
            return None;
        }
        let bit = 1u64 << (self.width - 1 - index);
        if self.literal_mask & bit == 0 {
            None
        } else {
            Some(self.literal_value & bit != 0)
        }
    }

    /// Whether `word` (right-aligned, `width` bits) satisfies every literal bit.
    #[inline]
    #[must_use]
    pub const fn matches(&self, word: u64) -> bool {
        word & self.literal_mask == self.literal_value
    }

    /// Distinct fields referenced by the pattern, in first-use order.
    #[must_use]
    pub fn fields(&self) -> Vec<FieldRef> {
        let mut seen = FxHashSet::default();
        self.cells
            .iter()
            .filter_map(|cell| match cell {
                Cell::Field { field, .. } if seen.insert(FieldRef::as_ptr(field)) => {
                    Some(FieldRef::clone(field))
                }
                _ => None,
            })
            .collect()
    }

    /// Operand values encoded in `word`, before macros.
    #[must_use]
    pub fn raw_operands(&self, word: u64) -> Operands {
        extract_operands(&self.placements, word)
    }

    /// Apply this specification's macros in declaration order.
    pub fn apply_macros(&self, operands: &mut Operands) {
        for m in &self.macros {
            m.apply(operands);
        }
    }

    /// Fully decoded operands of `word`.
    #[must_use]
    pub fn operands(&self, word: u64) -> Operands {
        let mut operands = self.raw_operands(word);
        self.apply_macros(&mut operands);
        operands
    }

    /// Encode operand values (pre-macro) into a right-aligned word.
    #[must_use]
    pub fn assemble(&self, values: &Operands) -> u64 {
        insert_operands(&self.placements, values, self.literal_value)
    }
}

impl fmt::Display for InstructionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]",
            self.syntax,
            Pattern::from(self.cells.clone())
        )
    }
}

fn check_chunks(syntax: &str, cells: &[Cell]) -> Result<()> {
    let mut placed: FxHashMap<*const crate::FieldSpec, (FieldRef, FxHashSet<usize>)> =
        FxHashMap::default();
    for cell in cells {
        let Cell::Field { field, chunk } = cell else {
            continue;
        };
        if *chunk >= field.chunk_count() {
            return Err(SpecError::UnknownChunk {
                syntax: syntax.to_string(),
                field: field.name().to_string(),
                chunk: *chunk,
            });
        }
        placed
            .entry(FieldRef::as_ptr(field))
            .or_insert_with(|| (FieldRef::clone(field), FxHashSet::default()))
            .1
            .insert(*chunk);
    }

    for (field, chunks) in placed.values() {
        if let Some(chunk) = (0..field.chunk_count()).find(|c| !chunks.contains(c)) {
            return Err(SpecError::MissingChunk {
                syntax: syntax.to_string(),
                field: field.name().to_string(),
                chunk,
            });
        }
    }
    Ok(())
}

fn check_macros(syntax: &str, cells: &[Cell], macros: &[MacroSpec]) -> Result<()> {
    let mut known: FxHashSet<&str> = cells
        .iter()
        .filter_map(|cell| match cell {
            Cell::Field { field, .. } => Some(field),
            _ => None,
        })
        .flat_map(|field| field.names())
        .collect();

    for m in macros {
        if let Some(missing) = m.reads().into_iter().find(|name| !known.contains(name)) {
            return Err(SpecError::UnknownField {
                syntax: syntax.to_string(),
                macro_name: m.name(),
                field: missing.to_string(),
            });
        }
        for name in m.consumes() {
            known.remove(name);
        }
        known.extend(m.writes());
    }
    Ok(())
}

fn literals(cells: &[Cell], width: u8) -> (u64, u64) {
    let mut mask = 0u64;
    let mut value = 0u64;
    let mut next = u32::from(width);
    for cell in cells {
        next -= cell.width();
        if let Some(bit) = cell.literal() {
            mask |= 1 << next;
            if bit {
                value |= 1 << next;
            }
        }
    }
    (mask, value)
}
