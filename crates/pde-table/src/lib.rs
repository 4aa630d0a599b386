//! Value-typed 2-D [`Table`], its 1-D analogue [`List`], and the
//! deferred-mutation [`Buffer`] facade used for bulk mesh construction.
//!
//! The buffer's flush algorithm must reproduce exactly which array row each
//! buffered row ends up in, in insertion order, with earliest-removed array
//! rows refilled first.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("row has {got} values, table has {expected} columns")]
    BadRowWidth { expected: usize, got: usize },
    #[error("row_size can only be changed on an empty table, or to the same value (table has {size} rows, {old} -> {new} columns)")]
    IllegalRowSizeChange { size: usize, old: usize, new: usize },
    #[error("row index {index} out of bounds (table has {size} rows)")]
    OutOfBounds { index: usize, size: usize },
    #[error("buffer was created against a table of size {expected}, but the table now has {actual} rows")]
    StaleBuffer { expected: usize, actual: usize },
}

/// Row-major, fixed-column-count 2-D table.
#[derive(Debug, Clone)]
pub struct Table<T> {
    data: Vec<T>,
    row_size: usize,
}

impl<T: Clone + Default> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Default> Table<T> {
    pub fn new() -> Self {
        Self { data: Vec::new(), row_size: 0 }
    }

    pub fn with_row_size(row_size: usize) -> Self {
        Self { data: Vec::new(), row_size }
    }

    pub fn row_size(&self) -> usize {
        self.row_size
    }

    pub fn size(&self) -> usize {
        if self.row_size == 0 { 0 } else { self.data.len() / self.row_size }
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Legal only when the table is empty, or when `cols` equals the current
    /// row size (a no-op in that case).
    pub fn set_row_size(&mut self, cols: usize) -> Result<(), TableError> {
        if self.size() == 0 {
            self.row_size = cols;
            self.data.clear();
            Ok(())
        } else if cols == self.row_size {
            Ok(())
        } else {
            Err(TableError::IllegalRowSizeChange { size: self.size(), old: self.row_size, new: cols })
        }
    }

    /// Preserves existing data when growing; discards trailing rows when shrinking.
    pub fn resize(&mut self, rows: usize) {
        self.data.resize(rows * self.row_size, T::default());
    }

    pub fn get_row(&self, index: usize) -> Result<&[T], TableError> {
        let size = self.size();
        if index >= size {
            return Err(TableError::OutOfBounds { index, size });
        }
        let start = index * self.row_size;
        Ok(&self.data[start..start + self.row_size])
    }

    pub fn get_row_mut(&mut self, index: usize) -> Result<&mut [T], TableError> {
        let size = self.size();
        if index >= size {
            return Err(TableError::OutOfBounds { index, size });
        }
        let row_size = self.row_size;
        let start = index * row_size;
        Ok(&mut self.data[start..start + row_size])
    }

    pub fn set_row(&mut self, index: usize, row: &[T]) -> Result<(), TableError> {
        if row.len() != self.row_size {
            return Err(TableError::BadRowWidth { expected: self.row_size, got: row.len() });
        }
        let slot = self.get_row_mut(index)?;
        slot.clone_from_slice(row);
        Ok(())
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.data.chunks(self.row_size.max(1)).take(self.size())
    }

    /// Starts a deferred-mutation buffer anchored to the table's current size.
    pub fn create_buffer(&self, block_size: usize) -> Buffer<T> {
        Buffer::new(self.row_size, self.size(), block_size)
    }
}

/// 1-D analogue of [`Table`].
#[derive(Debug, Clone, Default)]
pub struct List<T>(Vec<T>);

impl<T: Clone + Default> List<T> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn size(&self) -> usize {
        self.0.len()
    }

    pub fn resize(&mut self, n: usize) {
        self.0.resize(n, T::default());
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.0.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.0.get_mut(index)
    }

    pub fn push(&mut self, value: T) -> usize {
        self.0.push(value);
        self.0.len() - 1
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.0
    }
}

struct BufferBlock<T> {
    rows: Vec<T>,
    row_size: usize,
    is_not_empty: Vec<bool>,
}

impl<T: Clone + Default> BufferBlock<T> {
    fn new(row_size: usize, capacity: usize) -> Self {
        Self {
            rows: vec![T::default(); row_size * capacity],
            row_size,
            is_not_empty: vec![false; capacity],
        }
    }

    fn capacity(&self) -> usize {
        self.is_not_empty.len()
    }

    fn row(&self, idx: usize) -> &[T] {
        let start = idx * self.row_size;
        &self.rows[start..start + self.row_size]
    }

    fn set_row(&mut self, idx: usize, row: &[T]) {
        let start = idx * self.row_size;
        self.rows[start..start + self.row_size].clone_from_slice(row);
        self.is_not_empty[idx] = true;
    }
}

/// Deferred-mutation facade over a [`Table`]. Records `add_row`/`add_empty_row`/
/// `rm_row` and coalesces them into the table only on [`Buffer::flush`].
pub struct Buffer<T> {
    row_size: usize,
    array_size: usize,
    block_size: usize,
    blocks: Vec<BufferBlock<T>>,
    empty_array_rows: std::collections::VecDeque<usize>,
    empty_buffer_rows: std::collections::VecDeque<usize>,
    /// Buffer rows never written via add_row/add_empty_row (reserved capacity
    /// in the last, partially-filled block) also count as empty on flush.
    next_buffer_row: usize,
}

impl<T: Clone + Default> Buffer<T> {
    fn new(row_size: usize, array_size: usize, block_size: usize) -> Self {
        Self {
            row_size,
            array_size,
            block_size: block_size.max(1),
            blocks: Vec::new(),
            empty_array_rows: Default::default(),
            empty_buffer_rows: Default::default(),
            next_buffer_row: 0,
        }
    }

    fn ensure_capacity(&mut self) -> usize {
        if let Some(idx) = self.empty_buffer_rows.pop_front() {
            return idx;
        }
        let total_capacity: usize = self.blocks.iter().map(|b| b.capacity()).sum();
        if self.next_buffer_row >= total_capacity {
            self.blocks.push(BufferBlock::new(self.row_size, self.block_size));
        }
        let idx = self.next_buffer_row;
        self.next_buffer_row += 1;
        idx
    }

    fn block_and_local(&self, buffer_idx: usize) -> (usize, usize) {
        let mut remaining = buffer_idx;
        for (b, block) in self.blocks.iter().enumerate() {
            if remaining < block.capacity() {
                return (b, remaining);
            }
            remaining -= block.capacity();
        }
        unreachable!("buffer index out of range of allocated blocks")
    }

    /// Appends `row`; returns the virtual index (array size + buffered rows before it).
    pub fn add_row(&mut self, row: &[T]) -> Result<usize, TableError> {
        if row.len() != self.row_size {
            return Err(TableError::BadRowWidth { expected: self.row_size, got: row.len() });
        }
        let buffer_idx = self.ensure_capacity();
        let (b, local) = self.block_and_local(buffer_idx);
        self.blocks[b].set_row(local, row);
        Ok(self.array_size + buffer_idx)
    }

    pub fn add_empty_row(&mut self) -> usize {
        let buffer_idx = self.ensure_capacity();
        let (b, local) = self.block_and_local(buffer_idx);
        let default_row = vec![T::default(); self.row_size];
        self.blocks[b].set_row(local, &default_row);
        self.array_size + buffer_idx
    }

    /// Marks `array_idx` (a virtual index into array+buffer) as empty.
    pub fn rm_row(&mut self, array_idx: usize) {
        if array_idx < self.array_size {
            self.empty_array_rows.push_back(array_idx);
        } else {
            let buffer_idx = array_idx - self.array_size;
            let (b, local) = self.block_and_local(buffer_idx);
            self.blocks[b].is_not_empty[local] = false;
            self.empty_buffer_rows.push_back(buffer_idx);
        }
    }

    /// Coalesces buffered mutations into `table`. `table` must have the size
    /// the buffer was created against.
    pub fn flush(&mut self, table: &mut Table<T>) -> Result<(), TableError> {
        if table.size() != self.array_size {
            return Err(TableError::StaleBuffer { expected: self.array_size, actual: table.size() });
        }

        let new_size =
            self.array_size + self.next_buffer_row - self.empty_array_rows.len() - self.empty_buffer_rows.len();

        let buffered_rows: Vec<(bool, Vec<T>)> = self
            .blocks
            .iter()
            .flat_map(|block| {
                (0..block.capacity()).map(move |i| (block.is_not_empty[i], block.row(i).to_vec()))
            })
            .take(self.next_buffer_row)
            .collect();

        if new_size > self.array_size {
            table.resize(new_size);
            let mut growth_idx = self.array_size;
            for (is_live, row) in &buffered_rows {
                if !*is_live {
                    continue;
                }
                if let Some(empty_idx) = self.empty_array_rows.pop_front() {
                    table.set_row(empty_idx, row)?;
                } else {
                    table.set_row(growth_idx, row)?;
                    growth_idx += 1;
                }
            }
        } else {
            for (is_live, row) in &buffered_rows {
                if !*is_live {
                    continue;
                }
                let empty_idx = self
                    .empty_array_rows
                    .pop_front()
                    .expect("flush: more live buffered rows than array rows marked empty");
                table.set_row(empty_idx, row)?;
            }

            // Remaining empty prefix rows get swapped with filled rows from
            // the tail that's about to be truncated away.
            let mut full_row_idx = new_size;
            let remaining: Vec<usize> = self.empty_array_rows.iter().copied().collect();
            for empty_idx in remaining {
                if empty_idx >= new_size {
                    continue;
                }
                while full_row_idx < self.array_size
                    && self.empty_array_rows.contains(&full_row_idx)
                {
                    full_row_idx += 1;
                }
                assert!(
                    full_row_idx < self.array_size,
                    "buffer flush: not enough filled tail rows to swap into the live prefix"
                );
                let filler = table.get_row(full_row_idx)?.to_vec();
                table.set_row(empty_idx, &filler)?;
                full_row_idx += 1;
            }
            table.resize(new_size);
        }

        self.blocks.clear();
        self.empty_array_rows.clear();
        self.empty_buffer_rows.clear();
        self.next_buffer_row = 0;
        tracing::trace!(new_size, "buffer flushed");
        self.array_size = table.size();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Grow/shrink scenario: added rows fill removed slots before the
    /// backing array grows, and the array shrinks once trailing rows free up.
    #[test]
    fn buffer_flush_grow_refills_removed_row_then_appends() {
        let mut t: Table<i32> = Table::with_row_size(2);
        t.resize(3);
        t.set_row(0, &[1, 1]).unwrap();
        t.set_row(1, &[2, 2]).unwrap();
        t.set_row(2, &[3, 3]).unwrap();

        let mut b = t.create_buffer(8);
        b.rm_row(1);
        b.add_row(&[4, 4]).unwrap();
        b.add_row(&[5, 5]).unwrap();
        b.flush(&mut t).unwrap();

        assert_eq!(t.size(), 4);
        assert_eq!(t.get_row(0).unwrap(), &[1, 1]);
        assert_eq!(t.get_row(1).unwrap(), &[4, 4]);
        assert_eq!(t.get_row(2).unwrap(), &[3, 3]);
        assert_eq!(t.get_row(3).unwrap(), &[5, 5]);
    }

    #[test]
    fn buffer_flush_can_shrink_the_table() {
        let mut t: Table<i32> = Table::with_row_size(1);
        t.resize(4);
        for i in 0..4 {
            t.set_row(i, &[i as i32]).unwrap();
        }

        let mut b = t.create_buffer(4);
        b.rm_row(0);
        b.rm_row(1);
        b.rm_row(2);
        b.flush(&mut t).unwrap();

        assert_eq!(t.size(), 1);
        assert_eq!(t.get_row(0).unwrap(), &[3]);
    }

    #[test]
    fn add_empty_row_uses_default_values() {
        let t: Table<i32> = Table::with_row_size(2);
        let mut b = t.create_buffer(4);
        let idx = b.add_empty_row();
        assert_eq!(idx, 0);
        let mut table = t;
        b.flush(&mut table).unwrap();
        assert_eq!(table.get_row(0).unwrap(), &[0, 0]);
    }

    #[test]
    fn set_row_size_rejects_change_on_nonempty_table() {
        let mut t: Table<i32> = Table::with_row_size(2);
        t.resize(1);
        assert!(t.set_row_size(3).is_err());
        assert!(t.set_row_size(2).is_ok());
    }

    #[test]
    fn list_resize_preserves_existing_values() {
        let mut l: List<f64> = List::new();
        l.resize(3);
        *l.get_mut(0).unwrap() = 1.0;
        l.resize(5);
        assert_eq!(*l.get(0).unwrap(), 1.0);
        assert_eq!(l.size(), 5);
    }
}
