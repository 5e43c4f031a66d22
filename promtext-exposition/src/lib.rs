pub mod buffer;
pub mod escape;
pub mod format;
pub mod generator;
pub mod provider;
pub mod source;
pub mod stream;

#[cfg(feature = "prometheus")]
pub mod registry;

pub use buffer::{BufferAllocator, BufferPool, ScopedBuffer};
pub use generator::{Generator, generate_system_metrics};
pub use provider::{RawMetricsProvider, StaticTextProvider};
pub use source::MetricFamilySource;
pub use stream::TextStream;
