//! Text exposition generator.
//!
//! Output is all-or-nothing: everything is rendered into one pooled buffer and
//! copied to the destination in a single write only after every stage has
//! succeeded. Failures after the buffer is acquired are logged and swallowed,
//! so a broken collector or provider costs one empty scrape rather than an
//! error on the endpoint.

use crate::buffer::{BufferAllocator, BufferPool, ScopedBuffer};
use crate::escape::escape_label_value;
use crate::format::{special_value, type_line_parts};
use crate::provider::RawMetricsProvider;
use crate::source::MetricFamilySource;
use crate::stream::TextStream;
use promtext_core::{CLUSTER_LABEL, ExpositionError, MetricFamily, Sample};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, error, trace};

/// Renders a metric family source, plus optional raw providers, as text
/// exposition with a `cluster` label on every sample.
pub struct Generator {
    source: Arc<dyn MetricFamilySource>,
    allocator: Arc<dyn BufferAllocator>,
}

impl Generator {
    pub fn new(source: Arc<dyn MetricFamilySource>, allocator: Arc<dyn BufferAllocator>) -> Self {
        Self { source, allocator }
    }

    /// Generator backed by a default-sized [`BufferPool`].
    pub fn with_default_pool(source: Arc<dyn MetricFamilySource>) -> Self {
        Self::new(source, Arc::new(BufferPool::default()))
    }

    /// Render everything into `out`.
    ///
    /// Only a failure to acquire the output buffer is returned. Any later
    /// failure (enumeration, provider, buffer growth, destination write) is
    /// logged, and `out` receives no bytes for this call.
    pub fn generate(
        &self,
        cluster: &str,
        out: &mut dyn Write,
        providers: Option<&[Arc<dyn RawMetricsProvider>]>,
    ) -> Result<(), ExpositionError> {
        debug!(cluster, "Generating metrics");
        let mut buf = ScopedBuffer::acquire(&*self.allocator)?;
        debug!(
            writer_index = buf.writer_index(),
            capacity = buf.capacity(),
            max_capacity = buf.max_capacity(),
            "Acquired output buffer"
        );

        match self.render_and_flush(&mut buf, cluster, out, providers) {
            Ok(()) => debug!(
                cluster,
                bytes = buf.writer_index(),
                "Successfully generated metrics"
            ),
            Err(e) => error!(
                cluster,
                stage = e.stage(),
                error = %e,
                "Failed to generate metrics"
            ),
        }
        Ok(())
    }

    fn render_and_flush(
        &self,
        buf: &mut ScopedBuffer<'_>,
        cluster: &str,
        out: &mut dyn Write,
        providers: Option<&[Arc<dyn RawMetricsProvider>]>,
    ) -> Result<(), ExpositionError> {
        {
            let mut stream = buf.stream();
            debug!("Starting system metrics");
            generate_system_metrics(&mut stream, &*self.source, cluster)?;
            log_usage("system_metrics", &stream);

            if let Some(providers) = providers {
                debug!(providers = providers.len(), "Starting provider metrics");
                for provider in providers {
                    let name = provider.name();
                    trace!(provider = name, "Starting provider");
                    provider
                        .generate(&mut stream)
                        .map_err(|source| ExpositionError::Provider {
                            provider: name.to_string(),
                            source,
                        })?;
                    log_usage(name, &stream);
                }
            }
        }
        out.write_all(buf.readable_bytes())?;
        Ok(())
    }
}

fn log_usage(stage: &str, stream: &TextStream<'_>) {
    debug!(
        stage,
        writer_index = stream.writer_index(),
        capacity = stream.capacity(),
        max_capacity = stream.max_capacity(),
        "Buffer usage"
    );
}

/// Write every family of `source`, in order, injecting `cluster` into each
/// sample that lacks a `cluster` label.
pub fn generate_system_metrics(
    stream: &mut TextStream<'_>,
    source: &dyn MetricFamilySource,
    cluster: &str,
) -> Result<(), ExpositionError> {
    let cluster = escape_label_value(cluster);
    let mut count = 0usize;
    for next in source.metric_families() {
        let family = next.map_err(|source| ExpositionError::Enumeration {
            family: count,
            source,
        })?;
        count += 1;
        trace!(
            family = count,
            name = %family.name,
            kind = %family.metric_type,
            samples = family.samples.len(),
            "Writing metric family"
        );
        write_family(stream, &family, &cluster, count).inspect_err(|e| {
            debug!(family = count, name = %family.name, error = %e, "Abandoning metric family")
        })?;
    }
    debug!(families = count, "System metrics written");
    Ok(())
}

fn write_family(
    stream: &mut TextStream<'_>,
    family: &MetricFamily,
    escaped_cluster: &str,
    ordinal: usize,
) -> Result<(), ExpositionError> {
    let (suffix, keyword) = type_line_parts(family.metric_type);
    stream
        .write_str("# TYPE ")?
        .write_str(&family.name)?
        .write_str(suffix)?
        .write_char(' ')?
        .write_str(keyword)?
        .write_char('\n')?;

    for sample in &family.samples {
        trace!(
            family = ordinal,
            sample = %sample.name,
            labels = sample.label_names.len(),
            "Writing sample"
        );
        write_sample(stream, sample, escaped_cluster)?;
    }
    Ok(())
}

fn write_sample(
    stream: &mut TextStream<'_>,
    sample: &Sample,
    escaped_cluster: &str,
) -> Result<(), ExpositionError> {
    if sample.label_names.len() != sample.label_values.len() {
        return Err(ExpositionError::InvalidMetric(format!(
            "sample {}: {} label names but {} label values",
            sample.name,
            sample.label_names.len(),
            sample.label_values.len()
        )));
    }

    stream.write_str(&sample.name)?.write_char('{')?;
    if !sample.has_label(CLUSTER_LABEL) {
        stream
            .write_str(CLUSTER_LABEL)?
            .write_str("=\"")?
            .write_str(escaped_cluster)?
            .write_char('"')?;
        // No trailing comma when cluster is the only label.
        if !sample.label_names.is_empty() {
            stream.write_char(',')?;
        }
    }
    for (i, (name, value)) in sample.labels().enumerate() {
        if i > 0 {
            stream.write_char(',')?;
        }
        stream
            .write_str(name)?
            .write_str("=\"")?
            .write_str(&escape_label_value(value))?
            .write_char('"')?;
    }
    stream.write_str("} ")?;
    write_value(stream, sample.value)?;
    stream.write_char('\n')?;
    Ok(())
}

fn write_value(stream: &mut TextStream<'_>, value: f64) -> Result<(), ExpositionError> {
    match special_value(value) {
        Some(token) => {
            stream.write_str(token)?;
        }
        None => {
            write!(stream, "{value:?}")?;
        }
    }
    Ok(())
}
