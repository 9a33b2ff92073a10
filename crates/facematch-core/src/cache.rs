//! Bounded feature-vector cache keyed by a coarse region fingerprint.
//!
//! The cache only avoids recomputation inside a comparison session; it is
//! never an identity authority. Keys are cheap content fingerprints, not
//! cryptographic hashes — a collision costs a wrong cache hit at worst, and
//! the bounded capacity keeps that window small.

use std::collections::VecDeque;
use std::sync::Mutex;

use image::RgbImage;

use crate::features::FeatureVector;

/// Coarse content fingerprint of one region: dimensions, a strided
/// polynomial checksum, and the four corner pixels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegionKey {
    width: u32,
    height: u32,
    checksum: u64,
    corners: [[u8; 3]; 4],
}

impl RegionKey {
    pub fn fingerprint(region: &RgbImage) -> Self {
        let (w, h) = (region.width(), region.height());
        if w == 0 || h == 0 {
            return Self { width: w, height: h, checksum: 0, corners: [[0; 3]; 4] };
        }

        // Stride depends only on dimensions, so equal regions always map to
        // the same key.
        let stride = (w.max(h) / 64).max(1);
        let mut checksum = 0u64;
        let mut y = 0;
        while y < h {
            let mut x = 0;
            while x < w {
                let p = region.get_pixel(x, y).0;
                for &c in &p {
                    checksum = checksum.wrapping_mul(31).wrapping_add(c as u64);
                }
                x += stride;
            }
            y += stride;
        }

        let corners = [
            region.get_pixel(0, 0).0,
            region.get_pixel(w - 1, 0).0,
            region.get_pixel(0, h - 1).0,
            region.get_pixel(w - 1, h - 1).0,
        ];

        Self { width: w, height: h, checksum, corners }
    }
}

/// Bounded FIFO cache: on overflow the least-recently-inserted entry is
/// evicted. Lookups do not affect eviction order, which keeps the behavior
/// deterministic for a given insert sequence.
pub struct FeatureCache {
    inner: Mutex<Inner>,
}

struct Inner {
    entries: VecDeque<(RegionKey, FeatureVector)>,
    capacity: usize,
}

impl FeatureCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: VecDeque::with_capacity(capacity),
                capacity,
            }),
        }
    }

    pub fn get(&self, key: &RegionKey) -> Option<FeatureVector> {
        let inner = self.inner.lock().expect("feature cache poisoned");
        inner
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn put(&self, key: RegionKey, vector: FeatureVector) {
        let mut inner = self.inner.lock().expect("feature cache poisoned");
        if inner.capacity == 0 || inner.entries.iter().any(|(k, _)| k == &key) {
            return;
        }
        if inner.entries.len() >= inner.capacity {
            inner.entries.pop_front();
        }
        inner.entries.push_back((key, vector));
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("feature cache poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
