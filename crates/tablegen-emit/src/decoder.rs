//! Reference runtime decoder over emitted tables.

use tablegen_spec::Operands;

use crate::{EmitError, Format, ProgramCell, Result};

/// A successfully decoded word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decoded<'a> {
    /// Index into the format table.
    pub format: u16,
    pub syntax: &'a str,
    /// Encoding width in bits.
    pub width: u8,
    pub operands: Operands,
}

/// Executes a state-machine program against instruction words.
#[derive(Clone, Copy, Debug)]
pub struct Decoder<'a> {
    program: &'a [u8],
    lookup: &'a [u16],
    formats: &'a [Format],
    entry: u16,
    word_bits: u8,
}

impl<'a> Decoder<'a> {
    #[must_use]
    pub const fn new(
        program: &'a [u8],
        lookup: &'a [u16],
        formats: &'a [Format],
        entry: u16,
        word_bits: u8,
    ) -> Self {
        Self {
            program,
            lookup,
            formats,
            entry,
            word_bits,
        }
    }

    #[must_use]
    pub const fn word_bits(&self) -> u8 {
        self.word_bits
    }

    /// Format index selected for `word`, or `None` if undefined.
    pub fn lookup(&self, word: u64) -> Result<Option<u16>> {
        let word_bits = u32::from(self.word_bits.min(64));
        let mut offset = usize::from(self.entry);
        // Trie programs are acyclic: a terminal is reached in fewer steps than there are bytes
        for _ in 0..=self.program.len() {
            offset = match ProgramCell::read(self.program, offset)? {
                ProgramCell::Halt { format } => return Ok(Some(format)),
                ProgramCell::Undef => return Ok(None),
                ProgramCell::Bit { shift, zero, one } => {
                    if u32::from(shift) >= word_bits {
                        return Err(EmitError::CorruptProgram {
                            offset,
                            reason: "bit outside word",
                        });
                    }
                    if (word >> shift) & 1 == 0 {
                        usize::from(zero)
                    } else {
                        usize::from(one)
                    }
                }
                ProgramCell::Table { bits, shift, table } => {
                    if bits == 0 || u32::from(shift) + u32::from(bits) > word_bits {
                        return Err(EmitError::CorruptProgram {
                            offset,
                            reason: "table bits outside word",
                        });
                    }
                    let mask = (1u64 << bits) - 1;
                    let index = usize::from(table) + ((word >> shift) & mask) as usize;
                    let next = self.lookup.get(index).ok_or(EmitError::CorruptProgram {
                        offset,
                        reason: "lookup index out of range",
                    })?;
                    usize::from(*next)
                }
            };
        }
        Err(EmitError::CorruptProgram {
            offset,
            reason: "program does not terminate",
        })
    }

    /// Decode `word` (instruction in the top bits) into format and operands.
    pub fn decode(&self, word: u64) -> Result<Option<Decoded<'a>>> {
        let Some(index) = self.lookup(word)? else {
            return Ok(None);
        };
        let format = self
            .formats
            .get(usize::from(index))
            .ok_or(EmitError::CorruptProgram {
                offset: usize::from(index),
                reason: "halt refers to unknown format",
            })?;
        Ok(Some(Decoded {
            format: index,
            syntax: &format.syntax,
            width: format.width,
            operands: format.operands(word),
        }))
    }
}
