//! Bounded raster cache

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use image::RgbaImage;

/// Rasters keyed by content hash, evicting the least recently used entry
/// once `capacity` is reached
#[derive(Debug)]
pub(crate) struct RasterCache {
    entries: HashMap<String, Arc<RgbaImage>>,
    /// Keys from least to most recently used
    order: VecDeque<String>,
    capacity: usize,
}

impl RasterCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.entries.len() > capacity {
            self.evict_oldest();
        }
    }

    pub(crate) fn get(&mut self, key: &str) -> Option<Arc<RgbaImage>> {
        let image = self.entries.get(key).cloned()?;
        self.mark_used(key);
        Some(image)
    }

    /// Store a raster; returns how many entries were evicted to make room
    pub(crate) fn insert(&mut self, key: String, image: Arc<RgbaImage>) -> usize {
        if self.capacity == 0 {
            return 0;
        }
        if self.entries.insert(key.clone(), image).is_some() {
            self.mark_used(&key);
            return 0;
        }
        self.order.push_back(key);

        let mut evicted = 0;
        while self.entries.len() > self.capacity {
            self.evict_oldest();
            evicted += 1;
        }
        evicted
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn mark_used(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }

    fn evict_oldest(&mut self) {
        if let Some(oldest) = self.order.pop_front() {
            self.entries.remove(&oldest);
        }
    }
}
