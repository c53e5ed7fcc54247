//! Random access stack used for the evaluation, alt, result and invocation stacks.
//!
//! Every index counts from the top: 0 is the most recently pushed item.

use crate::error::{VmError, VmResult};

#[derive(Debug, Clone)]
pub struct RandomAccessStack<T> {
    list: Vec<T>,
}

impl<T> Default for RandomAccessStack<T> {
    fn default() -> Self {
        Self { list: Vec::new() }
    }
}

impl<T> RandomAccessStack<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn clear(&mut self) {
        self.list.clear();
    }

    fn position(&self, index: usize) -> VmResult<usize> {
        if index >= self.list.len() {
            return Err(VmError::stack_underflow_msg(index, self.list.len()));
        }
        Ok(self.list.len() - 1 - index)
    }

    pub fn push(&mut self, item: T) {
        self.list.push(item);
    }

    pub fn pop(&mut self) -> VmResult<T> {
        self.list
            .pop()
            .ok_or_else(|| VmError::stack_underflow_msg(0, 0))
    }

    pub fn peek(&self, index: usize) -> VmResult<&T> {
        let position = self.position(index)?;
        Ok(&self.list[position])
    }

    pub fn peek_mut(&mut self, index: usize) -> VmResult<&mut T> {
        let position = self.position(index)?;
        Ok(&mut self.list[position])
    }

    /// Inserts so that the new item ends up at `index`. `index == len` inserts at the bottom.
    pub fn insert(&mut self, index: usize, item: T) -> VmResult<()> {
        if index > self.list.len() {
            return Err(VmError::stack_underflow_msg(index, self.list.len()));
        }
        let position = self.list.len() - index;
        self.list.insert(position, item);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> VmResult<T> {
        let position = self.position(index)?;
        Ok(self.list.remove(position))
    }

    pub fn set(&mut self, index: usize, item: T) -> VmResult<()> {
        let position = self.position(index)?;
        self.list[position] = item;
        Ok(())
    }

    /// Swaps the items at two indexes.
    pub fn swap(&mut self, a: usize, b: usize) -> VmResult<()> {
        let a = self.position(a)?;
        let b = self.position(b)?;
        self.list.swap(a, b);
        Ok(())
    }

    /// Removes the top `count` items, returned bottom-to-top.
    pub fn take_top(&mut self, count: usize) -> VmResult<Vec<T>> {
        if count > self.list.len() {
            return Err(VmError::stack_underflow_msg(count, self.list.len()));
        }
        let start = self.list.len() - count;
        Ok(self.list.split_off(start))
    }

    /// Removes every item, returned bottom-to-top.
    pub fn take_all(&mut self) -> Vec<T> {
        std::mem::take(&mut self.list)
    }

    /// Pushes items in order, so the last one ends up on top.
    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) {
        self.list.extend(items);
    }

    /// Iterates bottom-to-top.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.list.iter()
    }
}

impl<T: Clone> RandomAccessStack<T> {
    /// Copies the top `count` items (all when `None`) onto `target`, preserving order.
    pub fn copy_to(&self, target: &mut RandomAccessStack<T>, count: Option<usize>) -> VmResult<()> {
        let count = count.unwrap_or(self.list.len());
        if count > self.list.len() {
            return Err(VmError::stack_underflow_msg(count, self.list.len()));
        }
        target
            .list
            .extend_from_slice(&self.list[self.list.len() - count..]);
        Ok(())
    }
}
