//! Tablegen - instruction decode-table compiler
//!
//! Compiles a catalog of declarative instruction encodings into a byte-coded
//! decode state machine, a lookup table and a format table.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tablegen::{FieldSpec, InstructionSpec, Pattern, compile_thumb, thumb_word};
//!
//! let rm = FieldSpec::register("Rm", 3)?;
//! let rd = FieldSpec::register("Rd", 3)?;
//! let orr = InstructionSpec::plain(
//!     "ORRS <Rd>, <Rm>",
//!     16,
//!     Pattern::new().bits("0100001100").field(&rm).field(&rd),
//! )?;
//!
//! let tables = compile_thumb([Arc::new(orr)])?;
//! let decoded = tables.decoder().decode(thumb_word(0x4311, 0))?.unwrap();
//! assert_eq!(decoded.syntax, "ORRS <Rd>, <Rm>");
//! assert_eq!(decoded.operands.get("Rm"), Some(2));
//! # Ok::<(), tablegen::Error>(())
//! ```

use std::sync::Arc;

pub use tablegen_emit::{
    CompileConfig, CompiledTables, DecodeTable, Decoded, Decoder, EmitError, Emitter, Format,
    FormatTable, Opcode, ProgramCell, Region, SingleTable, TableStats, ThumbTable,
    THUMB2_PREFIXES, THUMB_WORD_BITS, compile, create, is_thumb2, listing, thumb_word,
};
pub use tablegen_spec::{
    BitRange, Cell, FieldKind, FieldRef, FieldSpec, FLAG_IT, IMM, InstructionSpec, MacroSpec,
    Operands, Pattern, Placement, PlacementKind, REG_LR, REG_PC, REG_SP, SHIFT_LSL, SpecError,
    sign_extend, thumb_expand_imm,
};
pub use tablegen_trie::{
    DecodeNode, DecodeTrie, ProcessOptions, SpecId, TrieBuilder, TrieError, TrieStats,
};

use thiserror::Error;
use tracing::debug;

/// Decode-table compiler errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("specification error: {0}")]
    Spec(#[from] SpecError),
    #[error("trie error: {0}")]
    Trie(#[from] TrieError),
    #[error("emit error: {0}")]
    Emit(#[from] EmitError),
}

impl Error {
    /// Whether two specifications decode the same words.
    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        matches!(
            self,
            Self::Trie(TrieError::Ambiguous { .. })
                | Self::Emit(EmitError::Trie(TrieError::Ambiguous { .. }))
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Compile a Thumb catalog (16-bit and 32-bit encodings) with defaults.
pub fn compile_thumb<I>(catalog: I) -> Result<CompiledTables>
where
    I: IntoIterator<Item = Arc<InstructionSpec>>,
{
    compile_thumb_with(catalog, &CompileConfig::default())
}

/// Compile a Thumb catalog with an explicit configuration.
pub fn compile_thumb_with<I>(catalog: I, config: &CompileConfig) -> Result<CompiledTables>
where
    I: IntoIterator<Item = Arc<InstructionSpec>>,
{
    let mut table = ThumbTable::new();
    Ok(compile(&mut table, catalog, config)?)
}

/// Compile a catalog whose encodings all share one width.
///
/// The word width defaults to the encoding width when `config` leaves it
/// narrower than the encodings.
pub fn compile_single<I>(width: u8, catalog: I, config: &CompileConfig) -> Result<CompiledTables>
where
    I: IntoIterator<Item = Arc<InstructionSpec>>,
{
    let config = if config.word_bits < width {
        debug!(width, word_bits = config.word_bits, "widening word to encoding width");
        config.with_word_bits(width)
    } else {
        *config
    };
    let mut table = SingleTable::new(width);
    Ok(compile(&mut table, catalog, &config)?)
}
