//! Instruction encoding specifications.
//!
//! This crate provides the data model consumed by the decode-table compiler:
//! operand fields and how their bits are scattered across an encoding,
//! post-decode macros, and instruction specifications built from ordered
//! pattern cells. Everything is validated at construction so that later
//! stages only ever see well-formed catalogs.

mod field;
mod instruction;
mod macros;
mod operands;
mod pattern;
mod placement;

pub use field::*;
pub use instruction::*;
pub use macros::*;
pub use operands::*;
pub use pattern::*;
pub use placement::*;

use thiserror::Error;

/// Catalog construction errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("field `{name}`: declared width {declared} but ranges cover {actual} bits")]
    FieldWidth {
        name: String,
        declared: u8,
        actual: u32,
    },
    #[error("field `{name}`: no bit ranges")]
    EmptyField { name: String },
    #[error("field `{name}`: range at bit {shift} overlaps another range")]
    OverlappingRanges { name: String, shift: u8 },
    #[error("field `{name}`: range {shift}+{width} exceeds {max} value bits")]
    RangeOutOfBounds {
        name: String,
        shift: u8,
        width: u8,
        max: u8,
    },
    #[error("field `{name}`: implied low bits {low:#x} do not fit in 3 bits")]
    ImpliedBits { name: String, low: u8 },
    #[error("`{syntax}`: chunk {chunk} of field `{field}` is never placed")]
    MissingChunk {
        syntax: String,
        field: String,
        chunk: usize,
    },
    #[error("`{syntax}`: field `{field}` has no chunk {chunk}")]
    UnknownChunk {
        syntax: String,
        field: String,
        chunk: usize,
    },
    #[error("`{syntax}`: macro `{macro_name}` reads unknown field `{field}`")]
    UnknownField {
        syntax: String,
        macro_name: &'static str,
        field: String,
    },
    #[error("`{syntax}`: pattern covers {actual} bits, declared width is {declared}")]
    PatternWidth {
        syntax: String,
        declared: u8,
        actual: u32,
    },
    #[error("`{syntax}`: width {width} is outside 1..={max}")]
    WidthOutOfRange { syntax: String, width: u8, max: u8 },
}

impl SpecError {
    /// Whether this is a configuration error (malformed field or macro),
    /// as opposed to a pattern width error.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        !matches!(
            self,
            Self::PatternWidth { .. } | Self::WidthOutOfRange { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SpecError>;
