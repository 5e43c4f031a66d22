//! Snapshot adapter for `prometheus::Registry`.
//!
//! Each gathered protobuf family becomes a flat list of samples: histograms
//! expand into `_bucket` (with `le`), `_count` and `_sum` series; summaries
//! into quantile series, `_count` and `_sum`.

use crate::format::format_value;
use crate::source::MetricFamilySource;
use prometheus::proto;
use promtext_core::{MetricFamily, MetricType, Sample};

impl MetricFamilySource for prometheus::Registry {
    fn metric_families(&self) -> Box<dyn Iterator<Item = anyhow::Result<MetricFamily>> + '_> {
        Box::new(self.gather().into_iter().map(|mf| convert_family(&mf)))
    }
}

pub fn metric_type(kind: proto::MetricType) -> MetricType {
    match kind {
        proto::MetricType::COUNTER => MetricType::Counter,
        proto::MetricType::GAUGE => MetricType::Gauge,
        proto::MetricType::SUMMARY => MetricType::Summary,
        proto::MetricType::HISTOGRAM => MetricType::Histogram,
        proto::MetricType::UNTYPED => MetricType::Unknown,
    }
}

/// Flatten one gathered family into samples, preserving metric order.
pub fn convert_family(mf: &proto::MetricFamily) -> anyhow::Result<MetricFamily> {
    let name = mf.get_name();
    let kind = metric_type(mf.get_field_type());
    let mut family = MetricFamily::new(name, kind)?;

    for metric in mf.get_metric() {
        let labels = metric.get_label();
        match kind {
            MetricType::Counter => {
                family
                    .samples
                    .push(labeled(name, labels, None, metric.get_counter().get_value()));
            }
            MetricType::Gauge => {
                family
                    .samples
                    .push(labeled(name, labels, None, metric.get_gauge().get_value()));
            }
            MetricType::Summary => {
                let summary = metric.get_summary();
                for q in summary.get_quantile() {
                    family.samples.push(labeled(
                        name,
                        labels,
                        Some(("quantile", q.get_quantile())),
                        q.get_value(),
                    ));
                }
                push_count_and_sum(
                    &mut family,
                    labels,
                    summary.get_sample_count(),
                    summary.get_sample_sum(),
                );
            }
            MetricType::Histogram => {
                let histogram = metric.get_histogram();
                let bucket_name = format!("{name}_bucket");
                let mut saw_inf = false;
                for bucket in histogram.get_bucket() {
                    let upper = bucket.get_upper_bound();
                    saw_inf |= upper == f64::INFINITY;
                    family.samples.push(labeled(
                        &bucket_name,
                        labels,
                        Some(("le", upper)),
                        bucket.get_cumulative_count() as f64,
                    ));
                }
                if !saw_inf {
                    family.samples.push(labeled(
                        &bucket_name,
                        labels,
                        Some(("le", f64::INFINITY)),
                        histogram.get_sample_count() as f64,
                    ));
                }
                push_count_and_sum(
                    &mut family,
                    labels,
                    histogram.get_sample_count(),
                    histogram.get_sample_sum(),
                );
            }
            MetricType::Info | MetricType::Unknown => {
                family
                    .samples
                    .push(labeled(name, labels, None, metric.get_untyped().get_value()));
            }
        }
    }
    Ok(family)
}

fn push_count_and_sum(family: &mut MetricFamily, labels: &[proto::LabelPair], count: u64, sum: f64) {
    let count_name = format!("{}_count", family.name);
    let sum_name = format!("{}_sum", family.name);
    family
        .samples
        .push(labeled(&count_name, labels, None, count as f64));
    family.samples.push(labeled(&sum_name, labels, None, sum));
}

fn labeled(
    name: &str,
    labels: &[proto::LabelPair],
    extra: Option<(&str, f64)>,
    value: f64,
) -> Sample {
    let mut sample = Sample::new(name, value);
    for pair in labels {
        sample = sample.label(pair.get_name(), pair.get_value());
    }
    if let Some((label, bound)) = extra {
        sample = sample.label(label, format_value(bound));
    }
    sample
}
