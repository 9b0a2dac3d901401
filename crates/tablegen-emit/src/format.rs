//! Format table: how to extract operands once a word has been matched.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tablegen_spec::{InstructionSpec, MacroSpec, Operands, Placement, extract_operands};

use crate::{EmitError, Result};

/// Everything needed to turn a matched word into operands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Format {
    pub syntax: String,
    /// Encoding width in bits.
    pub width: u8,
    /// Field chunks, positioned in the full decoded word.
    pub placements: Vec<Placement>,
    pub macros: Vec<MacroSpec>,
}

impl Format {
    /// Format for `spec` occupying the top bits of a `word_bits` word.
    pub fn new(spec: &InstructionSpec, word_bits: u8) -> Result<Self> {
        let offset = word_bits
            .checked_sub(spec.width())
            .ok_or(EmitError::InvalidWordBits {
                word_bits,
                required: spec.width(),
            })?;
        Ok(Self {
            syntax: spec.syntax().to_string(),
            width: spec.width(),
            placements: spec
                .placements()
                .iter()
                .map(|p| p.rebase(offset))
                .collect(),
            macros: spec.macros().to_vec(),
        })
    }

    /// Operands of `word`, macros applied.
    #[must_use]
    pub fn operands(&self, word: u64) -> Operands {
        let mut operands = extract_operands(&self.placements, word);
        for m in &self.macros {
            m.apply(&mut operands);
        }
        operands
    }
}

/// Formats in index order, one per specification.
#[derive(Debug, Default)]
pub struct FormatTable {
    formats: Vec<Format>,
    indices: FxHashMap<*const InstructionSpec, u16>,
}

impl FormatTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the format for `spec`, creating it on first use.
    pub fn obtain(&mut self, spec: &Arc<InstructionSpec>, word_bits: u8) -> Result<u16> {
        let key = Arc::as_ptr(spec);
        if let Some(&index) = self.indices.get(&key) {
            return Ok(index);
        }
        let index = u16::try_from(self.formats.len()).map_err(|_| EmitError::RegionOverflow {
            region: "format",
            requested: self.formats.len() + 1,
        })?;
        self.formats.push(Format::new(spec, word_bits)?);
        self.indices.insert(key, index);
        Ok(index)
    }

    #[must_use]
    pub fn get(&self, index: u16) -> Option<&Format> {
        self.formats.get(usize::from(index))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Format> {
        self.formats
    }
}
