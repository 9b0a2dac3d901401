//! Trie construction from literal bit patterns.

use std::cmp::Reverse;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tablegen_spec::InstructionSpec;
use tracing::{debug, trace, trace_span};

use crate::{DecodeNode, DecodeTrie, Result, SpecId, TrieError};

/// Collects specifications of one width and builds their decode trie.
///
/// Construction is order-independent: the same set of specifications yields
/// the same tree whatever order they were inserted in, up to leaf ids.
#[derive(Debug)]
pub struct TrieBuilder {
    width: u8,
    specs: Vec<Arc<InstructionSpec>>,
    literals: FxHashMap<(u64, u64), SpecId>,
}

/// How one bit index splits a candidate set.
#[derive(Clone, Copy, Debug, Default)]
struct Split {
    zeros: usize,
    ones: usize,
    free: usize,
}

impl TrieBuilder {
    #[must_use]
    pub fn new(width: u8) -> Self {
        Self {
            width,
            specs: Vec::new(),
            literals: FxHashMap::default(),
        }
    }

    #[must_use]
    pub const fn width(&self) -> u8 {
        self.width
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Add a specification.
    ///
    /// Fails on a width mismatch, or when another specification already has
    /// exactly the same literal bits.
    pub fn insert(&mut self, spec: Arc<InstructionSpec>) -> Result<SpecId> {
        if spec.width() != self.width {
            return Err(TrieError::WidthMismatch {
                syntax: spec.syntax().to_string(),
                expected: self.width,
                actual: spec.width(),
            });
        }

        let key = (spec.literal_mask(), spec.literal_value());
        if let Some(existing) = self.literals.get(&key) {
            let first = self.specs[existing.index()].syntax().to_string();
            trace!(%first, second = spec.syntax(), "identical literal bits");
            return Err(TrieError::Ambiguous {
                first,
                second: spec.syntax().to_string(),
            });
        }

        let id = SpecId::new(self.specs.len() as u32);
        self.literals.insert(key, id);
        self.specs.push(spec);
        Ok(id)
    }

    /// Build the trie over every inserted specification.
    pub fn build(self) -> Result<DecodeTrie> {
        let _span = trace_span!("build_trie", width = self.width).entered();
        let candidates = (0..self.specs.len() as u32).map(SpecId::new).collect();
        let root = self.node(candidates, 0)?;
        let trie = DecodeTrie {
            width: self.width,
            specs: self.specs,
            root,
        };
        let stats = trie.stats();
        debug!(
            width = trie.width,
            specs = stats.specs,
            nodes = stats.nodes(),
            depth = stats.depth,
            "built decode trie"
        );
        Ok(trie)
    }

    /// `tested` has bit `i` set once index `i` has been branched on.
    fn node(&self, candidates: Vec<SpecId>, tested: u64) -> Result<DecodeNode> {
        if candidates.is_empty() {
            return Ok(DecodeNode::Undefined);
        }

        let splits: Vec<(u8, Split)> = (0..self.width)
            .filter(|index| tested & (1 << index) == 0)
            .map(|index| (index, self.split(&candidates, index)))
            .collect();

        // Bits on which the candidates disagree
        let discriminating = splits
            .iter()
            .filter(|(_, s)| s.zeros > 0 && s.ones > 0)
            .min_by_key(|(index, s)| (s.free, s.zeros.abs_diff(s.ones), *index));
        if let Some(&(index, _)) = discriminating {
            let zero = self.side(&candidates, index, false);
            let one = self.side(&candidates, index, true);
            return self.branch(index, zero, one, tested);
        }

        // Literal bits not yet checked; all candidates that fix one agree
        let unchecked = splits
            .iter()
            .filter(|(_, s)| s.zeros + s.ones > 0)
            .min_by_key(|(index, s)| (Reverse(s.zeros + s.ones), *index));
        if let Some(&(index, _)) = unchecked {
            let zero = self.side(&candidates, index, false);
            let one = self.side(&candidates, index, true);
            return self.branch(index, zero, one, tested);
        }

        self.resolve(&candidates)
    }

    fn branch(
        &self,
        index: u8,
        zero: Vec<SpecId>,
        one: Vec<SpecId>,
        tested: u64,
    ) -> Result<DecodeNode> {
        let tested = tested | (1 << index);
        Ok(DecodeNode::branch(
            index,
            self.node(zero, tested)?,
            self.node(one, tested)?,
        ))
    }

    fn split(&self, candidates: &[SpecId], index: u8) -> Split {
        candidates
            .iter()
            .fold(Split::default(), |mut split, &id| {
                match self.specs[id.index()].literal(index) {
                    Some(false) => split.zeros += 1,
                    Some(true) => split.ones += 1,
                    None => split.free += 1,
                }
                split
            })
    }

    /// Candidates still possible when bit `index` equals `bit`.
    fn side(&self, candidates: &[SpecId], index: u8, bit: bool) -> Vec<SpecId> {
        candidates
            .iter()
            .copied()
            .filter(|&id| {
                self.specs[id.index()]
                    .literal(index)
                    .is_none_or(|literal| literal == bit)
            })
            .collect()
    }

    /// Pick the winner among candidates whose literal bits are all satisfied.
    fn resolve(&self, candidates: &[SpecId]) -> Result<DecodeNode> {
        match candidates {
            [] => return Ok(DecodeNode::Undefined),
            [only] => return Ok(DecodeNode::Leaf(*only)),
            _ => {}
        }

        let mask = |id: SpecId| self.specs[id.index()].literal_mask();
        let contains = |outer: SpecId, inner: SpecId| {
            let (outer, inner) = (mask(outer), mask(inner));
            outer & inner == inner && outer != inner
        };

        if let Some(&winner) = candidates.iter().find(|&&winner| {
            candidates
                .iter()
                .all(|&other| other == winner || contains(winner, other))
        }) {
            trace!(
                winner = self.specs[winner.index()].syntax(),
                candidates = candidates.len(),
                "resolved overlap by specialisation"
            );
            return Ok(DecodeNode::Leaf(winner));
        }

        // Report the two most specific candidates, by name for determinism
        let mut maximal: Vec<&str> = candidates
            .iter()
            .filter(|&&id| !candidates.iter().any(|&other| contains(other, id)))
            .map(|&id| self.specs[id.index()].syntax())
            .collect();
        maximal.sort_unstable();
        trace!(?maximal, "unresolvable overlap");
        Err(TrieError::Ambiguous {
            first: maximal.first().copied().unwrap_or_default().to_string(),
            second: maximal.get(1).copied().unwrap_or_default().to_string(),
        })
    }
}
