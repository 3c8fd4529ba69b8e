//! # wordtrie
//!
//! A compact ordered associative map in the Judy-array family: keys are
//! byte strings (NUL-terminated) or fixed-width `u64` tuples, and each key
//! maps to a single caller-owned word cell.
//!
//! The trie adapts its node shapes to population density — six shapes with
//! promotion, radix decomposition, and span compression between them — so
//! memory stays proportional to the data while point lookups, ordered
//! traversal, and key reconstruction are all logarithmic in key length.
//! All node storage comes from 64 KiB segments owned by the map, recycled
//! through per-shape free lists and released together on drop.
//!
//! ## Example
//!
//! ```rust
//! use wordtrie::WordTrie;
//!
//! let mut trie = WordTrie::for_strings(32);
//! trie.insert(b"apple", 1).unwrap();
//! trie.insert(b"apricot", 2).unwrap();
//! trie.insert(b"banana", 3).unwrap();
//!
//! let mut values = Vec::new();
//! let mut cur = trie.first();
//! while let Some(cell) = cur {
//!     values.push(trie.get(cell));
//!     cur = trie.next();
//! }
//! assert_eq!(values, [1, 2, 3]); // byte-lexicographic order
//! ```
//!
//! ## Design notes
//!
//! - A key is *present* only while its cell holds a non-zero value; a
//!   fresh [`WordTrie::cell`] returns a zeroed cell for the caller to
//!   fill, possibly with a [`DataRef`] from [`WordTrie::data`].
//! - The map carries a stateful cursor (the path of the most recent
//!   operation); `next`/`prev`/`remove`/key reconstruction work from it.
//!   Use [`WordTrie::view`] for independent read-only cursors.
//! - Not thread-safe by design; there is no internal locking to pay for.

pub mod tree;

mod arena;
mod key;
mod node;
mod path;
mod tracing_helpers;

pub use tree::{Cell, DataRef, InsertError, TrieView, WordTrie};
