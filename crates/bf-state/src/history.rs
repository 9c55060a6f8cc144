//! Undo/Redo history of note edits
//!
//! Bounded two-stack log of reversible transactions. Each transaction is an
//! ordered list of insert/delete batches; undo hands back the inverse list so
//! the caller can replay it through its normal mutation path.

use std::collections::VecDeque;

/// Default number of undoable transactions
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Kind of atomic edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Insert,
    Delete,
}

impl EditKind {
    pub fn inverse(self) -> Self {
        match self {
            EditKind::Insert => EditKind::Delete,
            EditKind::Delete => EditKind::Insert,
        }
    }
}

/// One atomic edit: a batch of items inserted or deleted together
#[derive(Debug, Clone, PartialEq)]
pub struct Edit<T> {
    pub kind: EditKind,
    pub items: Vec<T>,
}

impl<T> Edit<T> {
    pub fn insert(items: Vec<T>) -> Self {
        Self {
            kind: EditKind::Insert,
            items,
        }
    }

    pub fn delete(items: Vec<T>) -> Self {
        Self {
            kind: EditKind::Delete,
            items,
        }
    }
}

/// One undoable step
#[derive(Debug, Clone, PartialEq)]
pub struct EditTransaction<T> {
    pub edits: Vec<Edit<T>>,
}

impl<T> EditTransaction<T> {
    pub fn new(edits: Vec<Edit<T>>) -> Self {
        Self { edits }
    }

    pub fn single(edit: Edit<T>) -> Self {
        Self { edits: vec![edit] }
    }

    /// Reversed order with every kind flipped
    pub fn inverted(self) -> Self {
        let edits = self
            .edits
            .into_iter()
            .rev()
            .map(|edit| Edit {
                kind: edit.kind.inverse(),
                items: edit.items,
            })
            .collect();
        Self { edits }
    }
}

/// Bounded undo/redo log
#[derive(Debug, Clone)]
pub struct EditHistory<T> {
    undo_stack: VecDeque<EditTransaction<T>>,
    redo_stack: VecDeque<EditTransaction<T>>,
    capacity: usize,
}

impl<T: Clone> Default for EditHistory<T> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl<T: Clone> EditHistory<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            undo_stack: VecDeque::with_capacity(capacity),
            redo_stack: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a transaction; forward history is dropped
    pub fn add(&mut self, transaction: EditTransaction<T>) {
        self.redo_stack.clear();
        Self::push_bounded(&mut self.undo_stack, transaction, self.capacity);
    }

    /// Merge the last `count` transactions into one step
    pub fn consolidate(&mut self, count: usize) {
        let count = count.min(self.undo_stack.len());
        if count < 2 {
            return;
        }

        let start = self.undo_stack.len() - count;
        let edits = self
            .undo_stack
            .drain(start..)
            .flat_map(|tx| tx.edits)
            .collect();
        self.undo_stack.push_back(EditTransaction::new(edits));
    }

    /// Pop the latest step; returns the edits that revert it
    pub fn undo(&mut self) -> Option<EditTransaction<T>> {
        let transaction = self.undo_stack.pop_back()?;
        Self::push_bounded(&mut self.redo_stack, transaction.clone(), self.capacity);
        Some(transaction.inverted())
    }

    /// Pop the latest undone step; returns the edits that re-apply it
    pub fn redo(&mut self) -> Option<EditTransaction<T>> {
        let transaction = self.redo_stack.pop_back()?;
        Self::push_bounded(&mut self.undo_stack, transaction.clone(), self.capacity);
        Some(transaction)
    }

    /// Rewrite every recorded item in place
    pub fn map_items(&mut self, mut f: impl FnMut(&mut T)) {
        for transaction in self.undo_stack.iter_mut().chain(self.redo_stack.iter_mut()) {
            for edit in &mut transaction.edits {
                edit.items.iter_mut().for_each(&mut f);
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn push_bounded(
        stack: &mut VecDeque<EditTransaction<T>>,
        transaction: EditTransaction<T>,
        capacity: usize,
    ) {
        while stack.len() >= capacity {
            stack.pop_front();
            log::trace!("Edit history full, evicted oldest entry");
        }
        stack.push_back(transaction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(items: &[i32]) -> EditTransaction<i32> {
        EditTransaction::single(Edit::insert(items.to_vec()))
    }

    fn delete(items: &[i32]) -> EditTransaction<i32> {
        EditTransaction::single(Edit::delete(items.to_vec()))
    }

    #[test]
    fn test_undo_inverts() {
        let mut history = EditHistory::new(10);
        history.add(insert(&[1, 2]));

        let undo = history.undo().unwrap();
        assert_eq!(undo, delete(&[1, 2]));
        assert!(!history.can_undo());
        assert!(history.can_redo());
    }

    #[test]
    fn test_redo_restores_forward() {
        let mut history = EditHistory::new(10);
        history.add(delete(&[7]));

        history.undo();
        let redo = history.redo().unwrap();
        assert_eq!(redo, delete(&[7]));
        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.redo_count(), 0);
    }

    #[test]
    fn test_empty_history_is_noop() {
        let mut history: EditHistory<i32> = EditHistory::new(10);
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_add_truncates_redo() {
        let mut history = EditHistory::new(10);
        history.add(insert(&[1]));
        history.add(insert(&[2]));
        history.undo();
        assert_eq!(history.redo_count(), 1);

        history.add(insert(&[3]));
        assert_eq!(history.redo_count(), 0);
        assert_eq!(history.undo_count(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = EditHistory::new(3);
        for i in 0..5 {
            history.add(insert(&[i]));
        }
        assert_eq!(history.undo_count(), 3);

        assert_eq!(history.undo().unwrap(), delete(&[4]));
        assert_eq!(history.undo().unwrap(), delete(&[3]));
        assert_eq!(history.undo().unwrap(), delete(&[2]));
        assert!(history.undo().is_none());
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let mut history = EditHistory::new(0);
        history.add(insert(&[1]));
        history.add(insert(&[2]));
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.undo_count(), 1);
    }

    #[test]
    fn test_consolidate() {
        let mut history = EditHistory::new(10);
        history.add(insert(&[9]));
        history.add(delete(&[1]));
        history.add(insert(&[2]));
        history.consolidate(2);
        assert_eq!(history.undo_count(), 2);

        let undo = history.undo().unwrap();
        assert_eq!(
            undo,
            EditTransaction::new(vec![Edit::delete(vec![2]), Edit::insert(vec![1])])
        );
    }

    #[test]
    fn test_consolidate_clamps() {
        let mut history = EditHistory::new(10);
        history.add(insert(&[1]));
        history.consolidate(5);
        assert_eq!(history.undo_count(), 1);
    }

    #[test]
    fn test_map_items() {
        let mut history = EditHistory::new(10);
        history.add(insert(&[1]));
        history.add(insert(&[2]));
        history.undo();

        history.map_items(|x| *x *= 10);
        assert_eq!(history.redo().unwrap(), insert(&[20]));
        history.undo();
        history.undo();
        assert_eq!(history.redo().unwrap(), insert(&[10]));
    }
}
