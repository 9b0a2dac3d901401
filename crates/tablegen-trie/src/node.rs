//! Trie nodes and the finished trie.

use std::fmt;
use std::sync::Arc;

use tablegen_spec::InstructionSpec;

/// Index of a specification inside the trie that owns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpecId(u32);

impl SpecId {
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SpecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Decision tree node.
///
/// Bit indices count from the most significant bit of the trie's width.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DecodeNode {
    /// No specification matches.
    Undefined,
    /// Every literal bit of this specification has been checked.
    Leaf(SpecId),
    /// Test bit `index`.
    Branch {
        index: u8,
        zero: Box<DecodeNode>,
        one: Box<DecodeNode>,
    },
    /// Table over bits `index..index + bits`, first bit most significant.
    Switch {
        index: u8,
        bits: u8,
        arms: Vec<DecodeNode>,
    },
}

impl DecodeNode {
    #[must_use]
    pub fn branch(index: u8, zero: Self, one: Self) -> Self {
        Self::Branch {
            index,
            zero: Box::new(zero),
            one: Box::new(one),
        }
    }

    /// Follow `word` (right-aligned, `width` bits) down to a terminal node.
    #[must_use]
    pub fn walk(&self, word: u64, width: u8) -> Option<SpecId> {
        let mut node = self;
        loop {
            node = match node {
                Self::Undefined => return None,
                Self::Leaf(id) => return Some(*id),
                Self::Branch { index, zero, one } => {
                    if (word >> (width - 1 - index)) & 1 == 0 {
                        zero
                    } else {
                        one
                    }
                }
                Self::Switch { index, bits, arms } => {
                    let shift = width - index - bits;
                    let arm = (word >> shift) & ((1u64 << bits) - 1);
                    &arms[arm as usize]
                }
            };
        }
    }

    /// Visit every node, parents first.
    pub fn visit(&self, f: &mut impl FnMut(&Self)) {
        f(self);
        match self {
            Self::Undefined | Self::Leaf(_) => {}
            Self::Branch { zero, one, .. } => {
                zero.visit(f);
                one.visit(f);
            }
            Self::Switch { arms, .. } => {
                for arm in arms {
                    arm.visit(f);
                }
            }
        }
    }

    /// Longest root-to-terminal path, counted in decisions.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Undefined | Self::Leaf(_) => 0,
            Self::Branch { zero, one, .. } => 1 + zero.depth().max(one.depth()),
            Self::Switch { arms, .. } => 1 + arms.iter().map(Self::depth).max().unwrap_or(0),
        }
    }
}

/// Node counts of a trie.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrieStats {
    pub specs: usize,
    pub leaves: usize,
    pub undefined: usize,
    pub branches: usize,
    pub switches: usize,
    pub depth: usize,
}

impl TrieStats {
    #[must_use]
    pub const fn nodes(&self) -> usize {
        self.leaves + self.undefined + self.branches + self.switches
    }
}

/// A built decode trie and the specifications its leaves refer to.
#[derive(Clone, Debug)]
pub struct DecodeTrie {
    pub(crate) width: u8,
    pub(crate) specs: Vec<Arc<InstructionSpec>>,
    pub(crate) root: DecodeNode,
}

impl DecodeTrie {
    /// Width of the words this trie decodes.
    #[must_use]
    pub const fn width(&self) -> u8 {
        self.width
    }

    #[must_use]
    pub fn specs(&self) -> &[Arc<InstructionSpec>] {
        &self.specs
    }

    #[must_use]
    pub fn spec(&self, id: SpecId) -> Option<&Arc<InstructionSpec>> {
        self.specs.get(id.index())
    }

    #[must_use]
    pub const fn root(&self) -> &DecodeNode {
        &self.root
    }

    /// Specification selected for `word` (right-aligned, `width` bits).
    #[must_use]
    pub fn walk(&self, word: u64) -> Option<&Arc<InstructionSpec>> {
        self.root
            .walk(word, self.width)
            .and_then(|id| self.spec(id))
    }

    #[must_use]
    pub fn stats(&self) -> TrieStats {
        let mut stats = TrieStats {
            specs: self.specs.len(),
            depth: self.root.depth(),
            ..TrieStats::default()
        };
        self.root.visit(&mut |node| match node {
            DecodeNode::Undefined => stats.undefined += 1,
            DecodeNode::Leaf(_) => stats.leaves += 1,
            DecodeNode::Branch { .. } => stats.branches += 1,
            DecodeNode::Switch { .. } => stats.switches += 1,
        });
        stats
    }
}
