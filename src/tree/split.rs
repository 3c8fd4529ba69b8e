//! Node growth: promotion, linear→radix decomposition, span decomposition.
//!
//! All three paths build the replacement fully before freeing the old
//! block, so a descent never observes a half-grown node.

use crate::key::write_frag;
use crate::node::{lin_cell, lin_count, lin_frag, radix_slot, span_cell, NodeRef, Shape, WORD};
use crate::tracing_helpers::trace_log;

use super::{SlotPtr, WordTrie};

impl WordTrie {
    /// Replace the full linear node behind `at` with the next larger shape,
    /// splicing `value` in as the entry at `idx`. Returns the new entry's
    /// cell address; the current path frame is updated to the new node.
    pub(super) fn promote(&mut self, at: SlotPtr, idx: usize, value: u64, width: usize) -> usize {
        let old = NodeRef::from_word(self.slot_word(at));
        let base = old.addr();
        let from = old.shape();
        let to = from.larger();
        let oldcnt = lin_count(from.size(), width);
        let newcnt = lin_count(to.size(), width);
        let grow = newcnt - oldcnt;

        let nb = self.core.arena.alloc(to);
        let node = NodeRef::new(nb, to);
        self.set_slot_word(at, node.word());

        // entries below the insertion point land one slot lower than the
        // rest, leaving the new bottom slots empty
        self.core.arena.copy(base, nb + (grow - 1) * width, idx * width);
        for s in 0..idx {
            let w = self.core.arena.word(lin_cell(base, from.size(), s));
            self.core
                .arena
                .set_word(lin_cell(nb, to.size(), s + grow - 1), w);
        }

        write_frag(
            self.core
                .arena
                .bytes_mut(lin_frag(nb, idx + grow - 1, width), width),
            value,
        );
        let entry = lin_cell(nb, to.size(), idx + grow - 1);

        self.core
            .arena
            .copy(base + idx * width, nb + (idx + grow) * width, (oldcnt - idx) * width);
        for s in idx..oldcnt {
            let w = self.core.arena.word(lin_cell(base, from.size(), s));
            self.core.arena.set_word(lin_cell(nb, to.size(), s + grow), w);
        }

        let frame = self.path.top_mut();
        frame.node = node;
        frame.slot = (idx + grow - 1) as i32;

        self.core.arena.free(base, from);
        trace_log!(?from, ?to, width, "linear node promoted");
        entry
    }

    /// Decompose the full maximal node behind `at` into a radix pair:
    /// entries are grouped by leading fragment byte, and each group becomes
    /// a fresh linear node of one-byte-shorter fragments under the byte's
    /// outer/inner slots. The caller rewinds and reprocesses the level.
    pub(super) fn split_linear(&mut self, at: SlotPtr, width: usize) {
        let old = NodeRef::from_word(self.slot_word(at));
        let base = old.addr();
        let cnt = lin_count(Shape::Lin32.size(), width);

        let radix = self.core.arena.alloc(Shape::Radix);
        self.set_slot_word(at, NodeRef::new(radix, Shape::Radix).word());

        let mut start = 0usize;
        let mut lead: u32 = 0x100; // sentinel: no group open yet
        for slot in 0..cnt {
            let head = u32::from(self.core.arena.byte(base + slot * width));
            if lead > 0xFF {
                lead = head;
            }
            if head == lead {
                continue;
            }
            self.radix_group(radix, base, start, slot, width, lead as u8);
            start = slot;
            lead = head;
        }
        self.radix_group(radix, base, start, cnt, width, lead as u8);

        self.core.arena.free(base, Shape::Lin32);
        trace_log!(width, "maximal node decomposed into radix pair");
    }

    /// Move one leading-byte group of a decomposing node under its radix
    /// pair. `old[start..end)` share the leading byte `lead`; their
    /// fragments shorten by that byte.
    fn radix_group(
        &mut self,
        radix: usize,
        old_base: usize,
        start: usize,
        end: usize,
        old_width: usize,
        lead: u8,
    ) {
        let width = old_width - 1;
        let old_size = Shape::Lin32.size();

        let outer_at = radix_slot(radix, usize::from(lead >> 4));
        if self.core.arena.word(outer_at) == 0 {
            let inner = self.core.arena.alloc(Shape::Radix);
            self.core
                .arena
                .set_word(outer_at, NodeRef::new(inner, Shape::Radix).word());
        }
        let inner = NodeRef::from_word(self.core.arena.word(outer_at)).addr();
        let inner_at = radix_slot(inner, usize::from(lead & 0xF));

        // the peeled byte exhausted the fragment (or was the string
        // terminator): the group is a single entry whose slot moves into
        // the radix pair unchanged
        if width == 0 || (!self.core.mode.is_words() && lead == 0) {
            let w = self.core.arena.word(lin_cell(old_base, old_size, start));
            self.core.arena.set_word(inner_at, w);
            return;
        }

        let cnt = end - start;
        // smallest linear shape that fits the group
        let mut shape = Shape::Lin1;
        while cnt > lin_count(shape.size(), width) && shape != Shape::Lin32 {
            shape = shape.larger();
        }
        let newcnt = lin_count(shape.size(), width);

        let nb = self.core.arena.alloc(shape);
        self.core
            .arena
            .set_word(inner_at, NodeRef::new(nb, shape).word());

        // copy tails top-aligned, preserving order, dropping the shared
        // leading byte
        for i in 0..cnt {
            let from = start + cnt - i - 1;
            let to = newcnt - i - 1;
            self.core
                .arena
                .copy(old_base + from * old_width + 1, nb + to * width, width);
            let w = self.core.arena.word(lin_cell(old_base, old_size, from));
            self.core.arena.set_word(lin_cell(nb, shape.size(), to), w);
        }
    }

    /// Bust the span behind `at` into a chain of one-entry linear nodes,
    /// one per word of span content, ending in the span's former trailing
    /// slot. The caller reprocesses the level against the chain head.
    pub(super) fn split_span(&mut self, at: SlotPtr) {
        let old = NodeRef::from_word(self.slot_word(at));
        let base = old.addr();
        let tail = self.core.arena.word(span_cell(base));

        let mut link = at;
        let mut off = 0usize;
        loop {
            let nb = self.core.arena.alloc(Shape::Lin1);
            self.set_slot_word(link, NodeRef::new(nb, Shape::Lin1).word());
            self.core.arena.copy(base + off, nb, WORD);
            link = SlotPtr::At(lin_cell(nb, Shape::Lin1.size(), 0));
            off += WORD;
            // stop past the last span word, or where the stored key ended
            if off >= crate::node::SPAN_BYTES || self.core.arena.byte(base + off - 1) == 0 {
                break;
            }
        }
        self.set_slot_word(link, tail);

        self.core.arena.free(base, Shape::Span);
        trace_log!(words = off / WORD, "span decomposed into linear chain");
    }
}
