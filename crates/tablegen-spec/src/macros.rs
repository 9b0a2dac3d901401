//! Post-decode macros.
//!
//! Macros run after every field of a matched instruction has been extracted.
//! They derive values that are not stored as contiguous bits: implied
//! registers, sign-extended branch offsets, expanded modified immediates and
//! register lists.

use crate::Operands;

/// Stack pointer register number.
pub const REG_SP: i64 = 13;
/// Link register number.
pub const REG_LR: i64 = 14;
/// Program counter register number.
pub const REG_PC: i64 = 15;

/// Flag value meaning "set unless inside an IT block" (16-bit ALU ops).
pub const FLAG_IT: i64 = 2;

/// Logical shift left.
pub const SHIFT_LSL: i64 = 0;

/// Default immediate operand name.
pub const IMM: &str = "imm";

/// A post-decode transform attached to an instruction specification.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MacroSpec {
    /// Unconditionally assign constants to named operands.
    Assign(Vec<(String, i64)>),
    /// Treat `field` as a `bits`-wide two's-complement value.
    SignExtend { field: String, bits: u8 },
    /// Expand a 12-bit modified immediate into its 32-bit constant.
    ExpandImmediate { field: String },
    /// Fold single-bit fields into bit positions of `target`.
    MergeReglist {
        sources: Vec<(String, u8)>,
        target: String,
    },
    /// Turn a single register `source` into the register list `1 << source`.
    RtReglist { source: String, target: String },
}

impl MacroSpec {
    /// Assignment from `(name, value)` pairs.
    pub fn assign<'a>(pairs: impl IntoIterator<Item = (&'a str, i64)>) -> Self {
        Self::Assign(
            pairs
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        )
    }

    /// Sign extension of the default immediate.
    #[must_use]
    pub fn sign_extend(bits: u8) -> Self {
        Self::SignExtend {
            field: IMM.to_string(),
            bits,
        }
    }

    /// Modified-immediate expansion of the default immediate.
    #[must_use]
    pub fn expand_immediate() -> Self {
        Self::ExpandImmediate {
            field: IMM.to_string(),
        }
    }

    #[must_use]
    pub fn merge_reglist(sources: &[(&str, u8)], target: &str) -> Self {
        Self::MergeReglist {
            sources: sources
                .iter()
                .map(|&(name, bit)| (name.to_string(), bit))
                .collect(),
            target: target.to_string(),
        }
    }

    /// `register_list = 1 << Rt`.
    #[must_use]
    pub fn rt_reglist() -> Self {
        Self::RtReglist {
            source: "Rt".to_string(),
            target: "register_list".to_string(),
        }
    }

    /// Short name used in diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Assign(_) => "Assign",
            Self::SignExtend { .. } => "SignExtend",
            Self::ExpandImmediate { .. } => "ExpandImmediate",
            Self::MergeReglist { .. } => "MergeReglist",
            Self::RtReglist { .. } => "RtReglist",
        }
    }

    /// Operand names that must exist before this macro runs.
    #[must_use]
    pub fn reads(&self) -> Vec<&str> {
        match self {
            Self::Assign(_) => Vec::new(),
            Self::SignExtend { field, .. } | Self::ExpandImmediate { field } => vec![field.as_str()],
            Self::MergeReglist { sources, .. } => {
                sources.iter().map(|(name, _)| name.as_str()).collect()
            }
            Self::RtReglist { source, .. } => vec![source.as_str()],
        }
    }

    /// Operand names this macro removes once it has read them.
    #[must_use]
    pub fn consumes(&self) -> Vec<&str> {
        match self {
            Self::MergeReglist { sources, .. } => {
                sources.iter().map(|(name, _)| name.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Operand names this macro creates or overwrites.
    #[must_use]
    pub fn writes(&self) -> Vec<&str> {
        match self {
            Self::Assign(pairs) => pairs.iter().map(|(name, _)| name.as_str()).collect(),
            Self::SignExtend { field, .. } | Self::ExpandImmediate { field } => vec![field.as_str()],
            Self::MergeReglist { target, .. } | Self::RtReglist { target, .. } => {
                vec![target.as_str()]
            }
        }
    }

    /// Apply the macro. Names are checked when the owning spec is built.
    pub fn apply(&self, operands: &mut Operands) {
        match self {
            Self::Assign(pairs) => {
                for (name, value) in pairs {
                    operands.set(name, *value);
                }
            }
            Self::SignExtend { field, bits } => {
                if let Some(value) = operands.get(field) {
                    operands.set(field, sign_extend(value, *bits));
                }
            }
            Self::ExpandImmediate { field } => {
                if let Some(value) = operands.get(field) {
                    operands.set(field, i64::from(thumb_expand_imm(value as u32)));
                }
            }
            Self::MergeReglist { sources, target } => {
                for (name, bit) in sources {
                    if let Some(value) = operands.remove(name) {
                        operands.merge_bits(target, (value & 1) << bit);
                    }
                }
            }
            Self::RtReglist { source, target } => {
                if let Some(rt) = operands.get(source) {
                    operands.set(target, 1 << (rt & 0xF));
                }
            }
        }
    }
}

/// Interpret the low `bits` of `value` as two's complement.
#[inline]
#[must_use]
pub const fn sign_extend(value: i64, bits: u8) -> i64 {
    if bits == 0 || bits >= 64 {
        return value;
    }
    let shift = 64 - bits as u32;
    (value << shift) >> shift
}

/// ThumbExpandImm: expand `i:imm3:imm8` into a 32-bit constant.
#[must_use]
pub const fn thumb_expand_imm(imm12: u32) -> u32 {
    let imm12 = imm12 & 0xFFF;
    let imm8 = imm12 & 0xFF;
    if imm12 >> 10 == 0 {
        match (imm12 >> 8) & 0b11 {
            0b00 => imm8,
            0b01 => (imm8 << 16) | imm8,
            0b10 => (imm8 << 24) | (imm8 << 8),
            _ => (imm8 << 24) | (imm8 << 16) | (imm8 << 8) | imm8,
        }
    } else {
        let unrotated = 0x80 | (imm12 & 0x7F);
        unrotated.rotate_right(imm12 >> 7)
    }
}
