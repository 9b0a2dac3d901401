//! Table drivers and the compile pipeline.

use std::sync::Arc;

use tablegen_spec::InstructionSpec;
use tablegen_trie::{DecodeTrie, TrieBuilder};
use tracing::{debug, info, info_span};

use crate::{CompileConfig, Decoder, Emitter, EmitError, Format, FormatTable, Region, Result};

/// A decode table under construction.
///
/// Tables are driven in three phases: every specification is inserted,
/// the table is processed (tries built and optimised), then emitted.
pub trait DecodeTable {
    /// Add a specification to the table.
    fn insert(&mut self, spec: Arc<InstructionSpec>) -> Result<()>;

    /// Build and optimise the table's tries.
    fn process(&mut self, config: &CompileConfig) -> Result<()>;

    /// Emit the table and return the program entry offset.
    fn create(&self, emitter: &mut Emitter<'_>) -> Result<u16>;
}

/// Trie state of one width class.
#[derive(Debug)]
enum Stage {
    Collecting(TrieBuilder),
    Built(DecodeTrie),
}

/// Decode table over encodings of a single width.
#[derive(Debug)]
pub struct SingleTable {
    stage: Stage,
}

impl SingleTable {
    #[must_use]
    pub fn new(width: u8) -> Self {
        Self {
            stage: Stage::Collecting(TrieBuilder::new(width)),
        }
    }

    #[must_use]
    pub const fn width(&self) -> u8 {
        match &self.stage {
            Stage::Collecting(builder) => builder.width(),
            Stage::Built(trie) => trie.width(),
        }
    }

    /// The built trie, once processed.
    #[must_use]
    pub const fn trie(&self) -> Option<&DecodeTrie> {
        match &self.stage {
            Stage::Collecting(_) => None,
            Stage::Built(trie) => Some(trie),
        }
    }

    /// Build and optimise the trie.
    ///
    /// Processing twice keeps the first result.
    pub(crate) fn build(&mut self, config: &CompileConfig) -> Result<()> {
        let width = self.width();
        let stage = std::mem::replace(&mut self.stage, Stage::Collecting(TrieBuilder::new(width)));
        self.stage = match stage {
            Stage::Collecting(builder) => {
                let mut trie = builder.build()?;
                if let Some(options) = config.process_options() {
                    trie.process(&options);
                }
                Stage::Built(trie)
            }
            built @ Stage::Built(_) => built,
        };
        Ok(())
    }
}

impl DecodeTable for SingleTable {
    fn insert(&mut self, spec: Arc<InstructionSpec>) -> Result<()> {
        match &mut self.stage {
            Stage::Collecting(builder) => {
                if spec.width() != builder.width() {
                    return Err(EmitError::UnsupportedWidth {
                        syntax: spec.syntax().to_string(),
                        width: spec.width(),
                    });
                }
                builder.insert(spec)?;
                Ok(())
            }
            Stage::Built(_) => Err(EmitError::AlreadyProcessed),
        }
    }

    fn process(&mut self, config: &CompileConfig) -> Result<()> {
        self.build(config)
    }

    fn create(&self, emitter: &mut Emitter<'_>) -> Result<u16> {
        let trie = self.trie().ok_or(EmitError::NotProcessed)?;
        emitter.emit(trie)
    }
}

/// Sizes of a compiled table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TableStats {
    pub program_bytes: usize,
    pub lookup_entries: usize,
    pub formats: usize,
}

/// Finished decode tables.
#[derive(Clone, Debug)]
pub struct CompiledTables {
    pub state_machine: Vec<u8>,
    pub lookup_table: Vec<u16>,
    pub formats: Vec<Format>,
    /// Program offset decoding starts at.
    pub entry: u16,
    pub word_bits: u8,
}

impl CompiledTables {
    #[must_use]
    pub fn stats(&self) -> TableStats {
        TableStats {
            program_bytes: self.state_machine.len(),
            lookup_entries: self.lookup_table.len(),
            formats: self.formats.len(),
        }
    }

    /// Runtime decoder over these tables.
    #[must_use]
    pub fn decoder(&self) -> Decoder<'_> {
        Decoder::new(
            &self.state_machine,
            &self.lookup_table,
            &self.formats,
            self.entry,
            self.word_bits,
        )
    }
}

/// Run `catalog` through `table`: insert, process, emit.
pub fn compile<T, I>(table: &mut T, catalog: I, config: &CompileConfig) -> Result<CompiledTables>
where
    T: DecodeTable + ?Sized,
    I: IntoIterator<Item = Arc<InstructionSpec>>,
{
    let _span = info_span!("compile", word_bits = config.word_bits).entered();

    let mut specs = 0usize;
    for spec in catalog {
        table.insert(spec)?;
        specs += 1;
    }
    debug!(specs, "catalog inserted");

    table.process(config)?;

    let mut program = Region::new("state machine");
    let mut lookup = Region::new("lookup table");
    let mut formats = FormatTable::new();
    let entry = {
        let mut emitter = Emitter::new(&mut program, &mut lookup, &mut formats, config.word_bits)?;
        table.create(&mut emitter)?
    };

    let compiled = CompiledTables {
        state_machine: program.into_vec(),
        lookup_table: lookup.into_vec(),
        formats: formats.into_vec(),
        entry,
        word_bits: config.word_bits,
    };
    let stats = compiled.stats();
    info!(
        specs,
        program_bytes = stats.program_bytes,
        lookup_entries = stats.lookup_entries,
        formats = stats.formats,
        entry,
        "compiled decode tables"
    );
    Ok(compiled)
}
