//! Semantics-preserving trie normalisation.

use tracing::debug;

use crate::{DecodeNode, DecodeTrie};

/// Default widest multi-bit table produced by [`DecodeTrie::process`].
pub const DEFAULT_MAX_SWITCH_BITS: u8 = 4;

/// Options for [`DecodeTrie::process`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Widest switch to build; `1` or less keeps every branch binary.
    pub max_switch_bits: u8,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            max_switch_bits: DEFAULT_MAX_SWITCH_BITS,
        }
    }
}

impl ProcessOptions {
    #[must_use]
    pub const fn with_max_switch_bits(mut self, bits: u8) -> Self {
        self.max_switch_bits = bits;
        self
    }
}

impl DecodeTrie {
    /// Collapse redundant branches, then fold runs of consecutive branches
    /// into multi-bit switches.
    pub fn process(&mut self, options: &ProcessOptions) {
        let before = self.stats();
        let root = std::mem::replace(&mut self.root, DecodeNode::Undefined);
        self.root = widen(collapse(root), options.max_switch_bits);
        let after = self.stats();
        debug!(
            width = self.width,
            nodes_before = before.nodes(),
            nodes_after = after.nodes(),
            switches = after.switches,
            "processed decode trie"
        );
    }
}

/// Remove branches whose two sides decide identically.
fn collapse(node: DecodeNode) -> DecodeNode {
    match node {
        DecodeNode::Branch { index, zero, one } => {
            let zero = collapse(*zero);
            let one = collapse(*one);
            if zero == one {
                zero
            } else {
                DecodeNode::branch(index, zero, one)
            }
        }
        DecodeNode::Switch { index, bits, arms } => {
            let arms: Vec<_> = arms.into_iter().map(collapse).collect();
            if arms.windows(2).all(|pair| pair[0] == pair[1]) {
                arms.into_iter().next().unwrap_or(DecodeNode::Undefined)
            } else {
                DecodeNode::Switch { index, bits, arms }
            }
        }
        terminal => terminal,
    }
}

fn widen(node: DecodeNode, max_bits: u8) -> DecodeNode {
    let DecodeNode::Branch { index, zero, one } = node else {
        return node;
    };

    let mut arms = vec![*zero, *one];
    let mut bits = 1u8;
    while bits < max_bits && arms.iter().all(|arm| tests_bit(arm, index + bits)) {
        arms = arms.into_iter().flat_map(children).collect();
        bits += 1;
    }

    let mut arms = arms.into_iter().map(|arm| widen(arm, max_bits));
    if bits == 1 {
        let zero = arms.next().unwrap_or(DecodeNode::Undefined);
        let one = arms.next().unwrap_or(DecodeNode::Undefined);
        DecodeNode::branch(index, zero, one)
    } else {
        DecodeNode::Switch {
            index,
            bits,
            arms: arms.collect(),
        }
    }
}

fn tests_bit(node: &DecodeNode, bit: u8) -> bool {
    matches!(node, DecodeNode::Branch { index, .. } if *index == bit)
}

/// Outcomes for bit 0 and bit 1 of a binary branch. A node that does not
/// branch decides the same either way.
fn children(node: DecodeNode) -> [DecodeNode; 2] {
    match node {
        DecodeNode::Branch { zero, one, .. } => [*zero, *one],
        other => [other.clone(), other],
    }
}
