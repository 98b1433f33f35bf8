/// Least-recently-used row cache for paged raster access

use std::collections::{BTreeMap, HashMap};

struct CachedRow {
    values: Vec<f64>,
    dirty: bool,
    last_access: u64,
}

/// A row pushed out of the cache to make room for another
#[derive(Debug, Clone, PartialEq)]
pub struct EvictedRow {
    pub row: usize,
    pub values: Vec<f64>,
    /// Whether the row holds changes that were never written back
    pub dirty: bool,
}

/// Bounded working set of decoded raster rows
///
/// Each resident row carries a dirty flag and an access sequence number.
/// The sequence numbers are also kept in an ordered map, so the
/// least-recently-touched row is found without scanning every row.
pub struct RowCache {
    rows: HashMap<usize, CachedRow>,
    lru: BTreeMap<u64, usize>,
    next_access: u64,
    capacity: usize,
    evictions: u64,
}

impl RowCache {
    /// Creates a cache holding at most `capacity` rows (at least one)
    pub fn new(capacity: usize) -> Self {
        Self {
            rows: HashMap::new(),
            lru: BTreeMap::new(),
            next_access: 0,
            capacity: capacity.max(1),
            evictions: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the current number of resident rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, row: usize) -> bool {
        self.rows.contains_key(&row)
    }

    /// Gets a resident row and marks it most recently used
    pub fn get(&mut self, row: usize) -> Option<&[f64]> {
        self.touch(row);
        self.rows.get(&row).map(|entry| entry.values.as_slice())
    }

    /// Gets a resident row for modification, marking it used and dirty
    pub fn get_mut(&mut self, row: usize) -> Option<&mut [f64]> {
        self.touch(row);
        self.rows.get_mut(&row).map(|entry| {
            entry.dirty = true;
            entry.values.as_mut_slice()
        })
    }

    /// Gets a resident row without changing its recency
    pub fn peek(&self, row: usize) -> Option<&[f64]> {
        self.rows.get(&row).map(|entry| entry.values.as_slice())
    }

    /// Inserts a row, evicting the least recently used one if the cache is full
    ///
    /// Replacing a row that is already resident never evicts.
    pub fn insert(&mut self, row: usize, values: Vec<f64>, dirty: bool) -> Option<EvictedRow> {
        if let Some(entry) = self.rows.get_mut(&row) {
            entry.values = values;
            entry.dirty |= dirty;
            self.touch(row);
            return None;
        }

        let evicted = if self.rows.len() >= self.capacity {
            self.pop_lru()
        } else {
            None
        };

        let access = self.next_tick();
        self.lru.insert(access, row);
        self.rows.insert(
            row,
            CachedRow {
                values,
                dirty,
                last_access: access,
            },
        );

        evicted
    }

    /// Removes and returns the least recently used row
    pub fn pop_lru(&mut self) -> Option<EvictedRow> {
        let (_, row) = self.lru.pop_first()?;
        let entry = self.rows.remove(&row)?;
        self.evictions += 1;
        Some(EvictedRow {
            row,
            values: entry.values,
            dirty: entry.dirty,
        })
    }

    pub fn is_dirty(&self, row: usize) -> bool {
        self.rows.get(&row).is_some_and(|entry| entry.dirty)
    }

    pub fn mark_clean(&mut self, row: usize) {
        if let Some(entry) = self.rows.get_mut(&row) {
            entry.dirty = false;
        }
    }

    /// Returns the dirty rows in ascending order
    pub fn dirty_rows(&self) -> Vec<usize> {
        let mut rows: Vec<usize> = self
            .rows
            .iter()
            .filter(|(_, entry)| entry.dirty)
            .map(|(&row, _)| row)
            .collect();
        rows.sort_unstable();
        rows
    }

    /// Drops every resident row, dirty or not
    pub fn clear(&mut self) {
        self.rows.clear();
        self.lru.clear();
    }

    /// Returns cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            row_count: self.rows.len(),
            dirty_rows: self.rows.values().filter(|entry| entry.dirty).count(),
            capacity: self.capacity,
            evictions: self.evictions,
        }
    }

    fn touch(&mut self, row: usize) {
        let access = self.next_tick();
        if let Some(entry) = self.rows.get_mut(&row) {
            self.lru.remove(&entry.last_access);
            entry.last_access = access;
            self.lru.insert(access, row);
        }
    }

    fn next_tick(&mut self) -> u64 {
        let tick = self.next_access;
        self.next_access += 1;
        tick
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of rows currently resident
    pub row_count: usize,
    /// Number of resident rows with unwritten changes
    pub dirty_rows: usize,
    /// Maximum number of rows
    pub capacity: usize,
    /// Rows evicted since the cache was created
    pub evictions: u64,
}
