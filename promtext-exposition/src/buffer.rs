use crate::stream::TextStream;
use promtext_core::ExpositionError;
use promtext_core::config::BufferConfig;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, trace};

/// Source of output buffers for rendering.
///
/// Implementations must tolerate concurrent `acquire`/`release` calls.
/// Every acquired buffer is handed back through `release` exactly once.
pub trait BufferAllocator: Send + Sync {
    /// Hand out an empty buffer.
    fn acquire(&self) -> Result<Vec<u8>, ExpositionError>;

    /// Take a buffer back after use.
    fn release(&self, buf: Vec<u8>);

    /// Upper bound on bytes written into one acquired buffer.
    fn max_capacity(&self) -> usize;
}

/// A buffer on loan from an allocator, returned on drop.
pub struct ScopedBuffer<'p> {
    buf: Vec<u8>,
    allocator: &'p dyn BufferAllocator,
}

impl<'p> ScopedBuffer<'p> {
    pub fn acquire(allocator: &'p dyn BufferAllocator) -> Result<Self, ExpositionError> {
        let buf = allocator.acquire()?;
        Ok(Self { buf, allocator })
    }

    /// Text stream appending to this buffer.
    pub fn stream(&mut self) -> TextStream<'_> {
        TextStream::new(&mut self.buf, self.allocator.max_capacity())
    }

    /// Everything written so far.
    pub fn readable_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn writer_index(&self) -> usize {
        self.buf.len()
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    pub fn max_capacity(&self) -> usize {
        self.allocator.max_capacity()
    }
}

impl Drop for ScopedBuffer<'_> {
    fn drop(&mut self) {
        self.allocator.release(std::mem::take(&mut self.buf));
    }
}

/// Thread-safe pool of reusable output buffers.
///
/// Idle buffers are kept up to `max_idle`; extra buffers released beyond
/// that are dropped. An empty pool allocates a fresh buffer.
pub struct BufferPool {
    idle: Mutex<Vec<Vec<u8>>>,
    initial_capacity: usize,
    max_capacity: usize,
    max_idle: usize,
}

impl BufferPool {
    pub fn new(initial_capacity: usize, max_capacity: usize, max_idle: usize) -> Self {
        debug!(
            initial_capacity,
            max_capacity, max_idle, "Initializing output buffer pool"
        );
        Self {
            idle: Mutex::new(Vec::with_capacity(max_idle)),
            initial_capacity,
            max_capacity,
            max_idle,
        }
    }

    pub fn from_config(config: &BufferConfig) -> Self {
        Self::new(
            config.initial_capacity,
            config.max_capacity,
            config.max_idle,
        )
    }

    /// Buffers currently parked in the pool.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::from_config(&BufferConfig::default())
    }
}

impl BufferAllocator for BufferPool {
    fn acquire(&self) -> Result<Vec<u8>, ExpositionError> {
        let reused = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        if let Some(buf) = reused {
            trace!(capacity = buf.capacity(), "Reusing pooled buffer");
            return Ok(buf);
        }
        let mut buf = Vec::new();
        buf.try_reserve_exact(self.initial_capacity.min(self.max_capacity))?;
        trace!(capacity = buf.capacity(), "Allocated new buffer");
        Ok(buf)
    }

    fn release(&self, mut buf: Vec<u8>) {
        buf.clear();
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.max_idle {
            idle.push(buf);
        }
    }

    fn max_capacity(&self) -> usize {
        self.max_capacity
    }
}
