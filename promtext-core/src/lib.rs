pub mod config;
pub mod error;
pub mod model;

pub use config::ExporterConfig;
pub use error::ExpositionError;
pub use model::{CLUSTER_LABEL, MetricFamily, MetricType, Sample};
