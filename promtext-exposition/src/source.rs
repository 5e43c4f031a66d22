use promtext_core::MetricFamily;

/// Ordered, finite enumeration of metric families.
///
/// Consumed in a single pass per generation. An `Err` item stops the pass and
/// abandons that generation.
///
/// Families are yielded owned; in-memory snapshots clone theirs on every pass.
pub trait MetricFamilySource: Send + Sync {
    fn metric_families(&self) -> Box<dyn Iterator<Item = anyhow::Result<MetricFamily>> + '_>;
}

impl MetricFamilySource for [MetricFamily] {
    fn metric_families(&self) -> Box<dyn Iterator<Item = anyhow::Result<MetricFamily>> + '_> {
        Box::new(self.iter().cloned().map(Ok))
    }
}

impl MetricFamilySource for Vec<MetricFamily> {
    fn metric_families(&self) -> Box<dyn Iterator<Item = anyhow::Result<MetricFamily>> + '_> {
        self.as_slice().metric_families()
    }
}
