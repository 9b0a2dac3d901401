//! Decode trie construction.
//!
//! A [`TrieBuilder`] collects instruction specifications of one width and
//! builds a binary decision tree over their literal bits. Every internal node
//! tests one bit (or, after [`DecodeTrie::process`], a run of bits), and every
//! path ends either in the single spec that matches or in
//! [`DecodeNode::Undefined`].
//!
//! Overlapping encodings are resolved by specialisation only: when several
//! specs survive all literal tests, the one whose literal bits strictly
//! contain every other's wins. Anything else is an [`TrieError::Ambiguous`].

mod builder;
mod node;
mod process;

pub use builder::*;
pub use node::*;
pub use process::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrieError {
    #[error("`{syntax}` is {actual} bits wide, trie decodes {expected}-bit words")]
    WidthMismatch {
        syntax: String,
        expected: u8,
        actual: u8,
    },
    #[error("ambiguous encoding: `{first}` and `{second}` match the same words")]
    Ambiguous { first: String, second: String },
}

pub type Result<T> = std::result::Result<T, TrieError>;
