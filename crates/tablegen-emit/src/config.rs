//! Compile configuration.

use tablegen_trie::{DEFAULT_MAX_SWITCH_BITS, ProcessOptions};

/// Word width of Thumb decoding: `hw1 << 16 | hw2`.
pub const THUMB_WORD_BITS: u8 = 32;

/// Table compilation configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompileConfig {
    /// Bits in a decoded word. Instructions occupy its top bits.
    pub word_bits: u8,
    /// Run the trie normalisation pass.
    pub optimize: bool,
    /// Widest multi-bit table the optimiser may build.
    pub max_switch_bits: u8,
    /// Build independent tries on the rayon pool.
    pub parallel: bool,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            word_bits: THUMB_WORD_BITS,
            optimize: true,
            max_switch_bits: DEFAULT_MAX_SWITCH_BITS,
            parallel: true,
        }
    }
}

impl CompileConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_word_bits(mut self, word_bits: u8) -> Self {
        self.word_bits = word_bits;
        self
    }

    #[must_use]
    pub const fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    #[must_use]
    pub const fn with_max_switch_bits(mut self, bits: u8) -> Self {
        self.max_switch_bits = bits;
        self
    }

    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Options for the trie pass, if optimisation is enabled.
    #[must_use]
    pub fn process_options(&self) -> Option<ProcessOptions> {
        self.optimize
            .then(|| ProcessOptions::default().with_max_switch_bits(self.max_switch_bits))
    }
}
