//! Thumb dispatch: 16-bit and 32-bit encodings behind one lookahead.
//!
//! A Thumb word is `hw1 << 16 | hw2`. The top five bits of the first
//! halfword decide the encoding width: `0b11101`, `0b11110` and `0b11111`
//! start a 32-bit instruction, everything else is a complete 16-bit one.

use std::sync::Arc;

use tablegen_spec::InstructionSpec;
use tracing::debug;

use crate::{
    CompileConfig, DecodeTable, EmitError, Emitter, Opcode, ProgramCell, Result, SingleTable,
};

/// Bits of `hw1` inspected by the dispatch table.
pub const DISPATCH_BITS: u8 = 5;

/// Dispatch values that select the 32-bit table.
pub const THUMB2_PREFIXES: [u16; 3] = [0b11101, 0b11110, 0b11111];

/// Whether `hw1` starts a 32-bit encoding.
#[inline]
#[must_use]
pub fn is_thumb2(hw1: u16) -> bool {
    THUMB2_PREFIXES.contains(&(hw1 >> (16 - DISPATCH_BITS)))
}

/// Decoded word for a halfword pair.
#[inline]
#[must_use]
pub fn thumb_word(hw1: u16, hw2: u16) -> u64 {
    (u64::from(hw1) << 16) | u64::from(hw2)
}

/// Two-stage Thumb decode table.
#[derive(Debug)]
pub struct ThumbTable {
    thumb: SingleTable,
    thumb2: SingleTable,
}

impl Default for ThumbTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ThumbTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            thumb: SingleTable::new(16),
            thumb2: SingleTable::new(32),
        }
    }

    /// The 16-bit table.
    #[must_use]
    pub const fn thumb(&self) -> &SingleTable {
        &self.thumb
    }

    /// The 32-bit table.
    #[must_use]
    pub const fn thumb2(&self) -> &SingleTable {
        &self.thumb2
    }
}

impl DecodeTable for ThumbTable {
    fn insert(&mut self, spec: Arc<InstructionSpec>) -> Result<()> {
        match spec.width() {
            16 => self.thumb.insert(spec),
            32 => self.thumb2.insert(spec),
            width => Err(EmitError::UnsupportedWidth {
                syntax: spec.syntax().to_string(),
                width,
            }),
        }
    }

    fn process(&mut self, config: &CompileConfig) -> Result<()> {
        let (thumb, thumb2) = (&mut self.thumb, &mut self.thumb2);
        let (a, b) = if config.parallel {
            rayon::join(|| thumb.build(config), || thumb2.build(config))
        } else {
            (thumb.build(config), thumb2.build(config))
        };
        a?;
        b?;
        Ok(())
    }

    fn create(&self, emitter: &mut Emitter<'_>) -> Result<u16> {
        let (Some(thumb), Some(thumb2)) = (self.thumb.trie(), self.thumb2.trie()) else {
            return Err(EmitError::NotProcessed);
        };
        let word_bits = emitter.word_bits();
        if word_bits < 32 {
            return Err(EmitError::InvalidWordBits {
                word_bits,
                required: 32,
            });
        }

        let dispatch = emitter.reserve(Opcode::Table.size())?;
        let entries = 1usize << DISPATCH_BITS;
        let table = emitter.alloc_lookup(entries)?;

        let narrow = emitter.emit(thumb)?;
        let wide = emitter.emit(thumb2)?;

        let targets: Vec<u16> = (0..entries as u16)
            .map(|prefix| {
                if THUMB2_PREFIXES.contains(&prefix) {
                    wide
                } else {
                    narrow
                }
            })
            .collect();
        emitter.patch_lookup(table, &targets)?;
        emitter.patch(
            dispatch,
            ProgramCell::Table {
                bits: DISPATCH_BITS,
                shift: word_bits - DISPATCH_BITS,
                table,
            },
        )?;
        debug!(dispatch, narrow, wide, "thumb dispatch");
        Ok(dispatch)
    }
}
