//! Ordered traversal, key reconstruction, and snapshot views.
//!
//! `first`/`last` descend choosing the minimum/maximum populated slot at
//! each shape. `next`/`prev` pop the path stack to the deepest frame with a
//! remaining sibling, step it, and descend to the extreme of the subtree
//! behind it. `start` resumes with `next` from the partial path a failed
//! exact lookup leaves behind, which yields the lowest key ≥ the probe.

use crate::key::{frag_width, read_frag, KeyBuf, Mode};
use crate::node::{
    lin_cell, lin_count, lin_frag, radix_slot, span_cell, NodeRef, Shape, SPAN_BYTES, WORD,
    WORD_MASK,
};
use crate::path::PathStack;

use super::{Cell, Core, WordTrie};

impl Core {
    /// Descend to the smallest key in the subtree behind `next`.
    pub(super) fn first_from(
        &self,
        mut next: NodeRef,
        mut off: usize,
        path: &mut PathStack,
    ) -> Option<usize> {
        let max = self.key_limit;
        while !next.is_null() {
            path.push(next, off);
            match next.shape() {
                Shape::Radix => {
                    off += 1;
                    let table = next.addr();
                    let mut b = 0usize;
                    let mut child = NodeRef::NULL;
                    while b < 256 {
                        let outer = self.arena.word(radix_slot(table, b >> 4));
                        if outer == 0 {
                            // whole inner table absent: skip its 16 bytes
                            b |= 0xF;
                            b += 1;
                            continue;
                        }
                        let inner = NodeRef::from_word(outer).addr();
                        let entry = radix_slot(inner, b & 0xF);
                        let w = self.arena.word(entry);
                        if w != 0 {
                            path.set_slot(b as i32);
                            if self.mode.radix_leaf(b as u8, off, max) {
                                return Some(entry);
                            }
                            child = NodeRef::from_word(w);
                            break;
                        }
                        b += 1;
                    }
                    if child.is_null() {
                        return None;
                    }
                    next = child;
                }

                Shape::Span => {
                    let base = next.addr();
                    let tail = span_cell(base);
                    if self.arena.byte(base + SPAN_BYTES - 1) == 0 {
                        return Some(tail);
                    }
                    next = NodeRef::from_word(self.arena.word(tail));
                    off += SPAN_BYTES;
                }

                shape => {
                    let size = shape.size();
                    let base = next.addr();
                    let width = frag_width(off);
                    let cnt = lin_count(size, width);
                    let Some(slot) =
                        (0..cnt).find(|&s| self.arena.word(lin_cell(base, size, s)) != 0)
                    else {
                        // only unset cells below here
                        return None;
                    };
                    path.set_slot(slot as i32);
                    let end = (off | WORD_MASK) + 1;
                    let last = self.arena.byte(base + slot * width + width - 1);
                    let entry = lin_cell(base, size, slot);
                    if self.mode.lin_leaf(last, end, max) {
                        return Some(entry);
                    }
                    next = NodeRef::from_word(self.arena.word(entry));
                    off = end;
                }
            }
        }
        None
    }

    /// Descend to the largest key in the subtree behind `next`.
    pub(super) fn last_from(
        &self,
        mut next: NodeRef,
        mut off: usize,
        path: &mut PathStack,
    ) -> Option<usize> {
        let max = self.key_limit;
        while !next.is_null() {
            path.push(next, off);
            match next.shape() {
                Shape::Radix => {
                    off += 1;
                    let table = next.addr();
                    let mut b = 256usize;
                    let mut child = NodeRef::NULL;
                    while b > 0 {
                        b -= 1;
                        path.set_slot(b as i32);
                        let outer = self.arena.word(radix_slot(table, b >> 4));
                        if outer == 0 {
                            // land on the previous inner table's top entry
                            b &= !0xF;
                            continue;
                        }
                        let inner = NodeRef::from_word(outer).addr();
                        let entry = radix_slot(inner, b & 0xF);
                        let w = self.arena.word(entry);
                        if w != 0 {
                            if self.mode.radix_leaf(b as u8, off, max) {
                                return Some(entry);
                            }
                            child = NodeRef::from_word(w);
                            break;
                        }
                    }
                    if child.is_null() {
                        return None;
                    }
                    next = child;
                }

                Shape::Span => {
                    let base = next.addr();
                    let tail = span_cell(base);
                    if self.arena.byte(base + SPAN_BYTES - 1) == 0 {
                        return Some(tail);
                    }
                    next = NodeRef::from_word(self.arena.word(tail));
                    off += SPAN_BYTES;
                }

                shape => {
                    let size = shape.size();
                    let base = next.addr();
                    let width = frag_width(off);
                    let slot = lin_count(size, width) - 1;
                    path.set_slot(slot as i32);
                    let end = off + width;
                    let last = self.arena.byte(base + slot * width + width - 1);
                    let entry = lin_cell(base, size, slot);
                    if self.mode.lin_leaf(last, end, max) {
                        return Some(entry);
                    }
                    next = NodeRef::from_word(self.arena.word(entry));
                    off = end;
                }
            }
        }
        None
    }

    /// Advance the cursor to the next key. An empty path means "before the
    /// first key".
    pub(super) fn next_cell(&self, path: &mut PathStack) -> Option<usize> {
        if path.level() == 0 {
            return self.first_from(NodeRef::from_word(self.root), 0, path);
        }
        let max = self.key_limit;
        while path.level() > 0 {
            let frame = path.top();
            let node = frame.node;
            let off = frame.off as usize;
            match node.shape() {
                Shape::Radix => {
                    let table = node.addr();
                    let mut b = frame.slot + 1;
                    while b < 256 {
                        let bu = b as usize;
                        let outer = self.arena.word(radix_slot(table, bu >> 4));
                        if outer == 0 {
                            b |= 0xF;
                            b += 1;
                            continue;
                        }
                        let inner = NodeRef::from_word(outer).addr();
                        let entry = radix_slot(inner, bu & 0xF);
                        let w = self.arena.word(entry);
                        if w != 0 {
                            path.set_slot(b);
                            if self.mode.radix_leaf(bu as u8, off + 1, max) {
                                return Some(entry);
                            }
                            return self.first_from(NodeRef::from_word(w), off + 1, path);
                        }
                        b += 1;
                    }
                    path.pop();
                }

                Shape::Span => path.pop(),

                shape => {
                    let size = shape.size();
                    let base = node.addr();
                    let width = frag_width(off);
                    let cnt = lin_count(size, width);
                    let s = frame.slot + 1;
                    if s < cnt as i32 {
                        path.set_slot(s);
                        let su = s as usize;
                        let end = (off | WORD_MASK) + 1;
                        let last = self.arena.byte(base + su * width + width - 1);
                        let entry = lin_cell(base, size, su);
                        if self.mode.lin_leaf(last, end, max) {
                            return Some(entry);
                        }
                        return self.first_from(
                            NodeRef::from_word(self.arena.word(entry)),
                            end,
                            path,
                        );
                    }
                    path.pop();
                }
            }
        }
        None
    }

    /// Retreat the cursor to the previous key. An empty path means "after
    /// the last key".
    pub(super) fn prev_cell(&self, path: &mut PathStack) -> Option<usize> {
        if path.level() == 0 {
            return self.last_from(NodeRef::from_word(self.root), 0, path);
        }
        let max = self.key_limit;
        while path.level() > 0 {
            let frame = path.top();
            let node = frame.node;
            let off = frame.off as usize;
            match node.shape() {
                Shape::Radix => {
                    let table = node.addr();
                    let mut b = frame.slot;
                    while b > 0 {
                        b -= 1;
                        path.set_slot(b);
                        let bu = b as usize;
                        let outer = self.arena.word(radix_slot(table, bu >> 4));
                        if outer == 0 {
                            continue;
                        }
                        let inner = NodeRef::from_word(outer).addr();
                        let entry = radix_slot(inner, bu & 0xF);
                        let w = self.arena.word(entry);
                        if w == 0 {
                            continue;
                        }
                        if self.mode.radix_leaf(bu as u8, off + 1, max) {
                            return Some(entry);
                        }
                        return self.last_from(NodeRef::from_word(w), off + 1, path);
                    }
                    path.pop();
                }

                Shape::Span => path.pop(),

                shape => {
                    let size = shape.size();
                    let base = node.addr();
                    let width = frag_width(off);
                    let s = frame.slot;
                    if s <= 0
                        || self.arena.word(lin_cell(base, size, (s - 1) as usize)) == 0
                    {
                        path.pop();
                        continue;
                    }
                    let su = (s - 1) as usize;
                    path.set_slot(s - 1);
                    let end = (off | WORD_MASK) + 1;
                    let last = self.arena.byte(base + su * width + width - 1);
                    let entry = lin_cell(base, size, su);
                    if self.mode.lin_leaf(last, end, max) {
                        return Some(entry);
                    }
                    return self.last_from(NodeRef::from_word(self.arena.word(entry)), end, path);
                }
            }
        }
        None
    }

    /// Lowest cell whose key is ≥ `key` (canonical bytes).
    pub(super) fn start_at(&self, key: &[u8], path: &mut PathStack) -> Option<usize> {
        if key.is_empty() {
            path.clear();
            return self.first_from(NodeRef::from_word(self.root), 0, path);
        }
        if let Some(cell) = self.find(key, path) {
            if self.arena.word(cell) != 0 {
                return Some(cell);
            }
            // an exact match on a never-written cell counts as absent; the
            // cursor sits just below the successor
            return self.next_cell(path);
        }

        // an exact probe that died at a span recorded no direction: when
        // the stored bytes sort after the probe's remainder (or extend a
        // probe they fully match), every key below the span is greater,
        // so the answer is the span subtree's first leaf
        if path.level() > 0 {
            let frame = path.top();
            if frame.node.shape() == Shape::Span {
                let off = frame.off as usize;
                let base = frame.node.addr();
                let take = SPAN_BYTES.min(key.len() - off);
                let stored = self.arena.bytes(base, take);
                let probe = &key[off..off + take];
                if stored > probe || (stored == probe && self.arena.byte(base + take) != 0) {
                    path.pop();
                    return self.first_from(frame.node, off, path);
                }
            }
        }
        self.next_cell(path)
    }

    /// Rebuild the cursor's key from the path stack. Returns the byte
    /// count written; the cursor's full key is truncated to `buf`.
    pub(super) fn reconstruct(&self, path: &PathStack, buf: &mut [u8]) -> usize {
        let cap = match self.mode {
            Mode::Str => buf.len(),
            Mode::Words(depth) => buf.len().min(depth * WORD),
        };
        let mut len = 0usize;
        for level in 1..=path.level() {
            if len >= cap {
                break;
            }
            let frame = path.frame(level);
            let node = frame.node;
            let off = frame.off as usize;
            match node.shape() {
                Shape::Radix => {
                    let byte = frame.slot as u8;
                    // zero is the string terminator, data otherwise
                    if self.mode.is_words() || byte != 0 {
                        buf[len] = byte;
                        len += 1;
                    }
                }

                Shape::Span => {
                    for &b in self.arena.bytes(node.addr(), SPAN_BYTES) {
                        if b == 0 || len >= cap {
                            break;
                        }
                        buf[len] = b;
                        len += 1;
                    }
                }

                _ => {
                    let width = frag_width(off);
                    debug_assert!(frame.slot >= 0);
                    let slot = frame.slot.max(0) as usize;
                    let frag = self.arena.bytes(lin_frag(node.addr(), slot, width), width);
                    if self.mode.is_words() {
                        let take = width.min(cap - len);
                        buf[len..len + take].copy_from_slice(&frag[..take]);
                        len += take;
                    } else {
                        for &b in frag {
                            if b == 0 || len >= cap {
                                break;
                            }
                            buf[len] = b;
                            len += 1;
                        }
                    }
                }
            }
        }
        len
    }
}

// ============================================================================
//  Public traversal surface
// ============================================================================

impl WordTrie {
    /// Position on and return the smallest key's cell.
    pub fn first(&mut self) -> Option<Cell> {
        self.path.clear();
        let found = self
            .core
            .first_from(NodeRef::from_word(self.core.root), 0, &mut self.path)
            .map(Cell);
        self.located = found.is_some();
        found
    }

    /// Position on and return the largest key's cell.
    pub fn last(&mut self) -> Option<Cell> {
        self.path.clear();
        let found = self
            .core
            .last_from(NodeRef::from_word(self.core.root), 0, &mut self.path)
            .map(Cell);
        self.located = found.is_some();
        found
    }

    /// Advance to the next key in order; from a cleared cursor, the first.
    pub fn next(&mut self) -> Option<Cell> {
        let found = self.core.next_cell(&mut self.path).map(Cell);
        self.located = found.is_some();
        found
    }

    /// Retreat to the previous key in order; from a cleared cursor, the
    /// last.
    pub fn prev(&mut self) -> Option<Cell> {
        let found = self.core.prev_cell(&mut self.path).map(Cell);
        self.located = found.is_some();
        found
    }

    /// Lowest key ≥ `key`, positioning the cursor on it.
    pub fn start(&mut self, key: &[u8]) -> Option<Cell> {
        self.core.assert_str(key);
        let found = self.core.start_at(key, &mut self.path).map(Cell);
        self.located = found.is_some();
        found
    }

    /// Lowest word-tuple key ≥ `key`.
    pub fn start_words(&mut self, key: &[u64]) -> Option<Cell> {
        let canon = self.core.canonical(key);
        let found = self.core.start_at(&canon, &mut self.path).map(Cell);
        self.located = found.is_some();
        found
    }

    /// Reconstruct the cursor's key into `buf`, returning the byte count.
    /// With no current position this writes nothing and returns 0.
    pub fn key_bytes(&self, buf: &mut [u8]) -> usize {
        self.core.reconstruct(&self.path, buf)
    }

    /// Reconstruct the cursor's word-tuple key into `out`, returning the
    /// word count.
    ///
    /// # Panics
    ///
    /// Panics if the map is string-keyed or `out` is shorter than the
    /// declared depth.
    pub fn key_words(&self, out: &mut [u64]) -> usize {
        let Mode::Words(depth) = self.core.mode else {
            panic!("key_words on a byte-string map");
        };
        assert!(out.len() >= depth, "output buffer shorter than the key depth");
        let mut buf = KeyBuf::from_elem(0, depth * WORD);
        let n = self.core.reconstruct(&self.path, &mut buf);
        let words = n / WORD;
        for (w, chunk) in out.iter_mut().zip(buf[..words * WORD].chunks_exact(WORD)) {
            *w = read_frag(chunk);
        }
        words
    }

    /// A traversal-only snapshot: shares the map's structure read-only and
    /// carries its own copy of the cursor, so it can iterate independently.
    /// The borrow keeps the map immutable while any view is alive.
    #[must_use]
    pub fn view(&self) -> TrieView<'_> {
        TrieView {
            core: &self.core,
            path: self.path.clone(),
        }
    }
}

// ============================================================================
//  TrieView
// ============================================================================

/// Read-only snapshot cursor over a [`WordTrie`].
///
/// Created by [`WordTrie::view`]. Carries its own path stack, so lookups
/// and traversal on the view never disturb the parent map's cursor — and
/// mutation through a view is not expressible.
pub struct TrieView<'a> {
    core: &'a Core,
    path: PathStack,
}

impl TrieView<'_> {
    /// Read a cell's word.
    #[inline]
    #[must_use]
    pub fn get(&self, cell: Cell) -> u64 {
        self.core.arena.word(cell.0)
    }

    /// Borrow caller payload bytes (see [`WordTrie::data`]).
    #[must_use]
    pub fn data_bytes(&self, data: super::DataRef, len: usize) -> &[u8] {
        self.core.arena.bytes(data.0, len)
    }

    /// Exact lookup on the snapshot's own cursor.
    pub fn slot(&mut self, key: &[u8]) -> Option<Cell> {
        self.core.assert_str(key);
        if key.len() > self.core.key_limit {
            self.path.clear();
            return None;
        }
        self.core.find(key, &mut self.path).map(Cell)
    }

    /// Exact lookup for word tuples.
    pub fn slot_words(&mut self, key: &[u64]) -> Option<Cell> {
        let canon = self.core.canonical(key);
        self.core.find(&canon, &mut self.path).map(Cell)
    }

    /// Lowest key ≥ `key`.
    pub fn start(&mut self, key: &[u8]) -> Option<Cell> {
        self.core.assert_str(key);
        self.core.start_at(key, &mut self.path).map(Cell)
    }

    /// Lowest word-tuple key ≥ `key`.
    pub fn start_words(&mut self, key: &[u64]) -> Option<Cell> {
        let canon = self.core.canonical(key);
        self.core.start_at(&canon, &mut self.path).map(Cell)
    }

    pub fn first(&mut self) -> Option<Cell> {
        self.path.clear();
        self.core
            .first_from(NodeRef::from_word(self.core.root), 0, &mut self.path)
            .map(Cell)
    }

    pub fn last(&mut self) -> Option<Cell> {
        self.path.clear();
        self.core
            .last_from(NodeRef::from_word(self.core.root), 0, &mut self.path)
            .map(Cell)
    }

    pub fn next(&mut self) -> Option<Cell> {
        self.core.next_cell(&mut self.path).map(Cell)
    }

    pub fn prev(&mut self) -> Option<Cell> {
        self.core.prev_cell(&mut self.path).map(Cell)
    }

    /// Reconstruct the view cursor's key into `buf`.
    pub fn key_bytes(&self, buf: &mut [u8]) -> usize {
        self.core.reconstruct(&self.path, buf)
    }
}

// ============================================================================
//  Tests
// ============================================================================
