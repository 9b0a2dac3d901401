//! Decode table emission.
//!
//! Turns built decode tries into a compact byte-coded state machine, a
//! 16-bit lookup table for multi-way dispatch, and a format table describing
//! how to pull operands out of a matched word. [`ThumbTable`] composes the
//! 16-bit and 32-bit Thumb tries behind a 5-bit first-halfword dispatch;
//! [`SingleTable`] covers fixed-width instruction sets.

mod config;
mod decoder;
mod emitter;
mod format;
mod program;
mod region;
mod table;
mod thumb;

pub use config::*;
pub use decoder::*;
pub use emitter::*;
pub use format::*;
pub use program::*;
pub use region::*;
pub use table::*;
pub use thumb::*;

use tablegen_trie::TrieError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    #[error("`{syntax}`: no decode table for {width}-bit encodings")]
    UnsupportedWidth { syntax: String, width: u8 },
    #[error("{region} region overflow: {requested} cells past 16-bit addressing")]
    RegionOverflow {
        region: &'static str,
        requested: usize,
    },
    #[error("{region} region: update at {offset} does not start an allocation")]
    UnallocatedUpdate { region: &'static str, offset: u16 },
    #[error("{region} region: update of {len} cells at {offset} exceeds allocation of {capacity}")]
    UpdateOverrun {
        region: &'static str,
        offset: u16,
        len: usize,
        capacity: usize,
    },
    #[error("corrupt program at {offset}: {reason}")]
    CorruptProgram { offset: usize, reason: &'static str },
    #[error("word of {word_bits} bits cannot hold {required}-bit encodings")]
    InvalidWordBits { word_bits: u8, required: u8 },
    #[error("table has not been processed")]
    NotProcessed,
    #[error("table has already been processed")]
    AlreadyProcessed,
    #[error(transparent)]
    Trie(#[from] TrieError),
}

pub type Result<T> = std::result::Result<T, EmitError>;
