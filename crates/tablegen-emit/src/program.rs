//! State-machine program encoding.
//!
//! The program is a byte array of cells, each an opcode followed by its
//! operands. Offsets are little-endian `u16` pairs.
//!
//! | Cell    | Bytes                              | Action                                  |
//! |---------|------------------------------------|-----------------------------------------|
//! | `HALT`  | `op lo(fmt) hi(fmt)`               | matched format `fmt`                    |
//! | `UNDEF` | `op`                               | no instruction matches                  |
//! | `BIT`   | `op shift lo(a) hi(a) lo(b) hi(b)` | go to `a` if bit `shift` is 0, else `b` |
//! | `TABLE` | `op bits shift lo(t) hi(t)`        | go to `lut[t + (word >> shift) & mask]` |

use std::fmt;

use crate::{EmitError, Result};

/// Cell opcodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Halt = 0,
    Undef = 1,
    Bit = 2,
    Table = 3,
}

impl Opcode {
    /// Cell size in bytes, opcode included.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Halt => 3,
            Self::Undef => 1,
            Self::Bit => 6,
            Self::Table => 5,
        }
    }

    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Halt),
            1 => Some(Self::Undef),
            2 => Some(Self::Bit),
            3 => Some(Self::Table),
            _ => None,
        }
    }
}

/// A decoded program cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProgramCell {
    Halt { format: u16 },
    Undef,
    Bit { shift: u8, zero: u16, one: u16 },
    Table { bits: u8, shift: u8, table: u16 },
}

impl ProgramCell {
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        match self {
            Self::Halt { .. } => Opcode::Halt,
            Self::Undef => Opcode::Undef,
            Self::Bit { .. } => Opcode::Bit,
            Self::Table { .. } => Opcode::Table,
        }
    }

    /// Byte encoding of the cell.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let op = self.opcode() as u8;
        match *self {
            Self::Halt { format } => {
                let [lo, hi] = format.to_le_bytes();
                vec![op, lo, hi]
            }
            Self::Undef => vec![op],
            Self::Bit { shift, zero, one } => {
                let [a_lo, a_hi] = zero.to_le_bytes();
                let [b_lo, b_hi] = one.to_le_bytes();
                vec![op, shift, a_lo, a_hi, b_lo, b_hi]
            }
            Self::Table { bits, shift, table } => {
                let [lo, hi] = table.to_le_bytes();
                vec![op, bits, shift, lo, hi]
            }
        }
    }

    /// Decode the cell starting at `offset`.
    pub fn read(program: &[u8], offset: usize) -> Result<Self> {
        let corrupt = |reason| EmitError::CorruptProgram { offset, reason };
        let op = program
            .get(offset)
            .copied()
            .ok_or_else(|| corrupt("offset past end of program"))?;
        let op = Opcode::from_byte(op).ok_or_else(|| corrupt("unknown opcode"))?;
        let bytes = program
            .get(offset..offset + op.size())
            .ok_or_else(|| corrupt("truncated cell"))?;
        let word = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);

        Ok(match op {
            Opcode::Halt => Self::Halt { format: word(1) },
            Opcode::Undef => Self::Undef,
            Opcode::Bit => Self::Bit {
                shift: bytes[1],
                zero: word(2),
                one: word(4),
            },
            Opcode::Table => Self::Table {
                bits: bytes[1],
                shift: bytes[2],
                table: word(3),
            },
        })
    }
}

impl fmt::Display for ProgramCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Halt { format } => write!(f, "HALT  {format}"),
            Self::Undef => write!(f, "UNDEF"),
            Self::Bit { shift, zero, one } => write!(f, "BIT   {shift} {zero} {one}"),
            Self::Table { bits, shift, table } => write!(f, "TABLE {bits} {shift} {table}"),
        }
    }
}

/// Every cell of a program in offset order.
pub fn cells(program: &[u8]) -> Result<Vec<(usize, ProgramCell)>> {
    let mut offset = 0;
    let mut out = Vec::new();
    while offset < program.len() {
        let cell = ProgramCell::read(program, offset)?;
        out.push((offset, cell));
        offset += cell.opcode().size();
    }
    Ok(out)
}

/// Human-readable program listing, one cell per line.
pub fn listing(program: &[u8]) -> Result<String> {
    use std::fmt::Write;

    let mut out = String::new();
    for (offset, cell) in cells(program)? {
        let _ = writeln!(out, "{offset:5}: {cell}");
    }
    Ok(out)
}
