//! Encoding patterns.
//!
//! A pattern is the ordered list of cells making up an instruction encoding,
//! most significant bit first: literal bits, wildcards, and field chunks.

use std::fmt;

use crate::{BitRange, FieldRef};

/// One pattern cell.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    /// Literal 0.
    Zero,
    /// Literal 1.
    One,
    /// Occupies one bit but is neither discriminating nor bound to a field.
    Any,
    /// Chunk `chunk` of `field`.
    Field { field: FieldRef, chunk: usize },
}

impl Cell {
    /// Number of encoding bits this cell covers.
    #[must_use]
    pub fn width(&self) -> u32 {
        match self {
            Self::Zero | Self::One | Self::Any => 1,
            Self::Field { field, chunk } => field
                .ranges()
                .get(*chunk)
                .map_or(0, |range| u32::from(range.width)),
        }
    }

    /// Literal value, if this cell is a literal bit.
    #[must_use]
    pub const fn literal(&self) -> Option<bool> {
        match self {
            Self::Zero => Some(false),
            Self::One => Some(true),
            _ => None,
        }
    }

    /// The chunk's range, if this cell is a field chunk.
    #[must_use]
    pub fn range(&self) -> Option<BitRange> {
        match self {
            Self::Field { field, chunk } => field.ranges().get(*chunk).copied(),
            _ => None,
        }
    }
}

/// Pattern builder.
///
/// ```
/// use tablegen_spec::{FieldSpec, Pattern};
///
/// let rm = FieldSpec::register("Rm", 3).unwrap();
/// let rd = FieldSpec::register("Rd", 3).unwrap();
/// let pattern = Pattern::new().bits("0100_0011_00").field(&rm).field(&rd);
/// assert_eq!(pattern.width(), 16);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Pattern {
    cells: Vec<Cell>,
}

impl Pattern {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append literal bits from a string.
    ///
    /// `0` and `1` are literals, `_` and whitespace are ignored, and any other
    /// character is a wildcard.
    #[must_use]
    pub fn bits(mut self, bits: &str) -> Self {
        for c in bits.chars() {
            match c {
                '0' => self.cells.push(Cell::Zero),
                '1' => self.cells.push(Cell::One),
                '_' => {}
                c if c.is_whitespace() => {}
                _ => self.cells.push(Cell::Any),
            }
        }
        self
    }

    /// Append every chunk of `field`, in declared order.
    #[must_use]
    pub fn field(mut self, field: &FieldRef) -> Self {
        for chunk in 0..field.chunk_count() {
            self.cells.push(Cell::Field {
                field: FieldRef::clone(field),
                chunk,
            });
        }
        self
    }

    /// Append a single chunk of a multi-range field.
    #[must_use]
    pub fn chunk(mut self, field: &FieldRef, chunk: usize) -> Self {
        self.cells.push(Cell::Field {
            field: FieldRef::clone(field),
            chunk,
        });
        self
    }

    #[must_use]
    pub fn cell(mut self, cell: Cell) -> Self {
        self.cells.push(cell);
        self
    }

    /// Total number of encoding bits.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.cells.iter().map(Cell::width).sum()
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[must_use]
    pub fn into_cells(self) -> Vec<Cell> {
        self.cells
    }
}

impl From<Vec<Cell>> for Pattern {
    fn from(cells: Vec<Cell>) -> Self {
        Self { cells }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in &self.cells {
            match cell {
                Cell::Zero => write!(f, "0")?,
                Cell::One => write!(f, "1")?,
                Cell::Any => write!(f, "x")?,
                Cell::Field { field, .. } => {
                    let tag = field.name().chars().next_back().unwrap_or('?');
                    for _ in 0..cell.width() {
                        write!(f, "{tag}")?;
                    }
                }
            }
        }
        Ok(())
    }
}
