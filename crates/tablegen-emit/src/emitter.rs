//! Trie to program emission.

use rustc_hash::FxHashMap;
use tablegen_trie::{DecodeNode, DecodeTrie};
use tracing::{debug, trace};

use crate::{EmitError, FormatTable, Opcode, ProgramCell, Region, Result};

/// Emits decode tries into shared program and lookup regions.
///
/// Branch and table cells are reserved before their children are emitted
/// and patched once the children's offsets are known. `HALT` cells are
/// shared per format and a single `UNDEF` cell serves every dead end.
pub struct Emitter<'a> {
    program: &'a mut Region<u8>,
    lookup: &'a mut Region<u16>,
    formats: &'a mut FormatTable,
    word_bits: u8,
    halts: FxHashMap<u16, u16>,
    undef: Option<u16>,
}

impl<'a> Emitter<'a> {
    pub fn new(
        program: &'a mut Region<u8>,
        lookup: &'a mut Region<u16>,
        formats: &'a mut FormatTable,
        word_bits: u8,
    ) -> Result<Self> {
        if word_bits == 0 || word_bits > 64 {
            return Err(EmitError::InvalidWordBits {
                word_bits,
                required: 1,
            });
        }
        Ok(Self {
            program,
            lookup,
            formats,
            word_bits,
            halts: FxHashMap::default(),
            undef: None,
        })
    }

    #[must_use]
    pub const fn word_bits(&self) -> u8 {
        self.word_bits
    }

    /// Emit `trie` and return the offset of its root cell.
    pub fn emit(&mut self, trie: &DecodeTrie) -> Result<u16> {
        if trie.width() > self.word_bits {
            return Err(EmitError::InvalidWordBits {
                word_bits: self.word_bits,
                required: trie.width(),
            });
        }
        let start = self.program.len();
        let root = self.node(trie, trie.root())?;
        debug!(
            width = trie.width(),
            root,
            bytes = self.program.len() - start,
            formats = self.formats.len(),
            "emitted decode trie"
        );
        Ok(root)
    }

    /// Reserve a raw cell; used by compositors that patch it themselves.
    pub fn reserve(&mut self, width: usize) -> Result<u16> {
        self.program.alloc(width)
    }

    /// Patch a cell reserved with [`reserve`](Self::reserve).
    pub fn patch(&mut self, offset: u16, cell: ProgramCell) -> Result<()> {
        self.program.update(offset, &cell.encode())
    }

    pub fn alloc_lookup(&mut self, entries: usize) -> Result<u16> {
        self.lookup.alloc(entries)
    }

    pub fn patch_lookup(&mut self, offset: u16, entries: &[u16]) -> Result<()> {
        self.lookup.update(offset, entries)
    }

    fn node(&mut self, trie: &DecodeTrie, node: &DecodeNode) -> Result<u16> {
        match node {
            DecodeNode::Undefined => self.undef(),
            DecodeNode::Leaf(id) => {
                let Some(spec) = trie.spec(*id) else {
                    return Err(EmitError::CorruptProgram {
                        offset: id.index(),
                        reason: "leaf refers to unknown specification",
                    });
                };
                let format = self.formats.obtain(spec, self.word_bits)?;
                self.halt(format)
            }
            DecodeNode::Branch { index, zero, one } => {
                let offset = self.program.alloc(Opcode::Bit.size())?;
                let zero = self.node(trie, zero)?;
                let one = self.node(trie, one)?;
                let shift = self.word_bits - 1 - index;
                self.patch(offset, ProgramCell::Bit { shift, zero, one })?;
                Ok(offset)
            }
            DecodeNode::Switch { index, bits, arms } => {
                let offset = self.program.alloc(Opcode::Table.size())?;
                let table = self.lookup.alloc(arms.len())?;
                let targets = arms
                    .iter()
                    .map(|arm| self.node(trie, arm))
                    .collect::<Result<Vec<_>>>()?;
                self.lookup.update(table, &targets)?;
                let shift = self.word_bits - index - bits;
                self.patch(
                    offset,
                    ProgramCell::Table {
                        bits: *bits,
                        shift,
                        table,
                    },
                )?;
                Ok(offset)
            }
        }
    }

    fn halt(&mut self, format: u16) -> Result<u16> {
        if let Some(&offset) = self.halts.get(&format) {
            return Ok(offset);
        }
        let offset = self.program.push(&ProgramCell::Halt { format }.encode())?;
        trace!(format, offset, "halt cell");
        self.halts.insert(format, offset);
        Ok(offset)
    }

    fn undef(&mut self) -> Result<u16> {
        if let Some(offset) = self.undef {
            return Ok(offset);
        }
        let offset = self.program.push(&ProgramCell::Undef.encode())?;
        self.undef = Some(offset);
        Ok(offset)
    }
}

/// Emit a single trie and return its entry offset.
pub fn create(
    trie: &DecodeTrie,
    program: &mut Region<u8>,
    lookup: &mut Region<u16>,
    formats: &mut FormatTable,
    word_bits: u8,
) -> Result<u16> {
    Emitter::new(program, lookup, formats, word_bits)?.emit(trie)
}
