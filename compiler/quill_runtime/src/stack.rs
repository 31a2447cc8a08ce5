//! The execution stack.
//!
//! A growable array of values addressed by absolute index. Storage is a list
//! of fixed-size blocks allocated on first use, so growth never moves values
//! that are already on the stack. Module globals, call frames (parameters,
//! return slot, locals) and call-argument temporaries all live here.
//!
//! Popping or truncating resets the vacated slots to `nothing`, which drops
//! any references they held.

use crate::value::Value;

pub struct ExecStack {
    blocks: Vec<Box<[Value]>>,
    len: usize,
    block_size: usize,
}

impl ExecStack {
    /// Empty stack with `block_size` values per block (at least 1).
    pub fn new(block_size: usize) -> Self {
        ExecStack {
            blocks: Vec::new(),
            len: 0,
            block_size: block_size.max(1),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of blocks allocated so far.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    fn locate(&self, index: usize) -> (usize, usize) {
        (index / self.block_size, index % self.block_size)
    }

    pub fn push(&mut self, value: Value) {
        let (block, slot) = self.locate(self.len);
        if block == self.blocks.len() {
            self.blocks
                .push(vec![Value::Nothing; self.block_size].into_boxed_slice());
        }
        self.blocks[block][slot] = value;
        self.len += 1;
    }

    /// Push `count` copies of `nothing`.
    pub fn push_nothing(&mut self, count: usize) {
        for _ in 0..count {
            self.push(Value::Nothing);
        }
    }

    /// Push a contiguous range, first element lowest.
    pub fn push_range(&mut self, values: impl IntoIterator<Item = Value>) {
        for value in values {
            self.push(value);
        }
    }

    pub fn pop(&mut self) -> Option<Value> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let (block, slot) = self.locate(self.len);
        Some(std::mem::take(&mut self.blocks[block][slot]))
    }

    /// Pop the top `count` values, returned lowest first. Pops fewer if the
    /// stack holds fewer.
    pub fn pop_range(&mut self, count: usize) -> Vec<Value> {
        let start = self.len.saturating_sub(count);
        let values = (start..self.len).map(|i| self.take_slot(i)).collect();
        self.len = start;
        values
    }

    /// Shrink to `len`, resetting every vacated slot.
    pub fn truncate(&mut self, len: usize) {
        while self.len > len {
            self.len -= 1;
            let index = self.len;
            drop(self.take_slot(index));
        }
    }

    fn take_slot(&mut self, index: usize) -> Value {
        let (block, slot) = self.locate(index);
        std::mem::take(&mut self.blocks[block][slot])
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Value> {
        if index >= self.len {
            return None;
        }
        let (block, slot) = self.locate(index);
        Some(&self.blocks[block][slot])
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        if index >= self.len {
            return None;
        }
        let (block, slot) = self.locate(index);
        Some(&mut self.blocks[block][slot])
    }

    /// Value at `index`, `nothing` if out of range.
    #[inline]
    pub fn load(&self, index: usize) -> Value {
        self.get(index).cloned().unwrap_or_default()
    }

    /// Overwrite `index`. Returns `false` if it is out of range.
    pub fn set(&mut self, index: usize, value: Value) -> bool {
        match self.get_mut(index) {
            Some(slot) => {
                let old = std::mem::replace(slot, value);
                drop(old);
                true
            }
            None => false,
        }
    }

    /// Move the value out of `index`, leaving `nothing`.
    pub fn take(&mut self, index: usize) -> Value {
        self.get_mut(index).map(std::mem::take).unwrap_or_default()
    }

    pub fn peek(&self) -> Option<&Value> {
        self.len.checked_sub(1).and_then(|top| self.get(top))
    }

    /// Copy of `[start, start + count)`, clipped to the stack.
    pub fn range(&self, start: usize, count: usize) -> Vec<Value> {
        let end = start.saturating_add(count).min(self.len);
        (start..end).map(|i| self.load(i)).collect()
    }
}

impl Default for ExecStack {
    fn default() -> Self {
        ExecStack::new(crate::config::DEFAULT_STACK_BLOCK_SIZE)
    }
}
