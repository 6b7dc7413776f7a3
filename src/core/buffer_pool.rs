//! Purpose: Rent and reclaim reusable buffers so writers avoid per-call allocation.
//! Exports: `ArrayPool`, `BucketPool`, `FreshPool`, `PoolStats`.
//! Role: Performance optimization only; no correctness property depends on reuse.
//! Invariants: `rent(n)` always yields `len >= n`; contents are unspecified until written.
//! Invariants: Rent/release are safe from concurrent sessions without external locking.
//! Notes: Callers track their own logical length; the pool never tracks usage.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

pub const MIN_CLASS_LEN: usize = 16;
pub const DEFAULT_MAX_CLASS_LEN: usize = 1024 * 1024;
pub const DEFAULT_MAX_IDLE_PER_CLASS: usize = 8;

pub trait ArrayPool<T>: Send + Sync {
    /// Returns a buffer with at least `minimum_length` elements.
    fn rent(&self, minimum_length: usize) -> Vec<T>;

    /// Hands a buffer back. Zero-capacity buffers are ignored.
    fn release(&self, buffer: Vec<T>);
}

/// Pool that always allocates. Contract-compliant, never reuses.
#[derive(Clone, Copy, Debug, Default)]
pub struct FreshPool;

impl<T: Copy + Default + Send> ArrayPool<T> for FreshPool {
    fn rent(&self, minimum_length: usize) -> Vec<T> {
        vec![T::default(); minimum_length]
    }

    fn release(&self, _buffer: Vec<T>) {}
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PoolStats {
    pub rented: u64,
    pub reused: u64,
    pub released: u64,
    pub dropped: u64,
}

/// Power-of-two capacity classes, each holding a bounded stack of idle buffers.
pub struct BucketPool<T> {
    classes: Vec<Mutex<Vec<Vec<T>>>>,
    max_class_len: usize,
    max_idle_per_class: usize,
    rented: AtomicU64,
    reused: AtomicU64,
    released: AtomicU64,
    dropped: AtomicU64,
}

impl<T: Copy + Default + Send> BucketPool<T> {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_CLASS_LEN, DEFAULT_MAX_IDLE_PER_CLASS)
    }

    /// `max_class_len` is rounded up to a power of two and never below `MIN_CLASS_LEN`.
    pub fn with_limits(max_class_len: usize, max_idle_per_class: usize) -> Self {
        let max_class_len = max_class_len.max(MIN_CLASS_LEN).next_power_of_two();
        let class_count = class_index(max_class_len) + 1;
        let classes = (0..class_count).map(|_| Mutex::new(Vec::new())).collect();
        Self {
            classes,
            max_class_len,
            max_idle_per_class,
            rented: AtomicU64::new(0),
            reused: AtomicU64::new(0),
            released: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn max_class_len(&self) -> usize {
        self.max_class_len
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            rented: self.rented.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    /// Number of idle buffers currently held across all classes.
    pub fn idle(&self) -> usize {
        self.classes
            .iter()
            .map(|class| class.lock().map(|idle| idle.len()).unwrap_or(0))
            .sum()
    }
}

impl<T: Copy + Default + Send> Default for BucketPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default + Send> ArrayPool<T> for BucketPool<T> {
    fn rent(&self, minimum_length: usize) -> Vec<T> {
        self.rented.fetch_add(1, Ordering::Relaxed);
        let class_len = minimum_length.max(MIN_CLASS_LEN).next_power_of_two();
        if class_len > self.max_class_len {
            trace!(minimum_length, "buffer request above pool ceiling");
            return vec![T::default(); minimum_length];
        }

        // Any idle buffer from this class or a larger one satisfies the request.
        // A poisoned class only loses reuse; allocating fresh stays correct.
        for class in &self.classes[class_index(class_len)..] {
            if let Ok(mut idle) = class.lock() {
                if let Some(buffer) = idle.pop() {
                    self.reused.fetch_add(1, Ordering::Relaxed);
                    return buffer;
                }
            }
        }
        trace!(class_len, "buffer pool miss");
        vec![T::default(); class_len]
    }

    fn release(&self, mut buffer: Vec<T>) {
        if buffer.capacity() == 0 {
            return;
        }
        self.released.fetch_add(1, Ordering::Relaxed);
        buffer.resize(buffer.capacity(), T::default());

        let len = buffer.len();
        if len < MIN_CLASS_LEN {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        // Largest class the buffer fully covers; anything above the ceiling is not retained.
        let class_len = floor_power_of_two(len);
        if class_len > self.max_class_len {
            trace!(len, "dropping buffer above pool ceiling");
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        let index = class_index(class_len);
        match self.classes[index].lock() {
            Ok(mut idle) if idle.len() < self.max_idle_per_class => idle.push(buffer),
            _ => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

fn class_index(class_len: usize) -> usize {
    (class_len.trailing_zeros() - MIN_CLASS_LEN.trailing_zeros()) as usize
}

fn floor_power_of_two(value: usize) -> usize {
    1usize << (usize::BITS - 1 - value.leading_zeros())
}
