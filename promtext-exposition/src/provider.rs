use crate::stream::TextStream;

/// Appends raw exposition text to a shared stream during generation.
///
/// Providers run after the system metrics, in list order, against the same
/// stream. Each should append zero or more complete, newline-terminated lines.
/// Returning an error abandons the whole generation.
pub trait RawMetricsProvider: Send + Sync {
    fn generate(&self, stream: &mut TextStream<'_>) -> anyhow::Result<()>;

    /// Identity used in logs when this provider fails.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Provider that appends a fixed block of exposition text.
#[derive(Debug, Clone)]
pub struct StaticTextProvider {
    name: String,
    text: String,
}

impl StaticTextProvider {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut text = text.into();
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        Self {
            name: name.into(),
            text,
        }
    }

    /// Read the text from a file, named after its path.
    pub fn from_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        Ok(Self::new(path.display().to_string(), text))
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl RawMetricsProvider for StaticTextProvider {
    fn generate(&self, stream: &mut TextStream<'_>) -> anyhow::Result<()> {
        stream.write_str(&self.text)?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Provider that appends a `prometheus` registry rendered by its own text
/// encoder, for collectors registered outside the system snapshot.
#[cfg(feature = "prometheus")]
pub struct RegistryTextProvider {
    name: String,
    registry: prometheus::Registry,
}

#[cfg(feature = "prometheus")]
impl RegistryTextProvider {
    pub fn new(name: impl Into<String>, registry: prometheus::Registry) -> Self {
        Self {
            name: name.into(),
            registry,
        }
    }
}

#[cfg(feature = "prometheus")]
impl RawMetricsProvider for RegistryTextProvider {
    fn generate(&self, stream: &mut TextStream<'_>) -> anyhow::Result<()> {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut rendered = Vec::new();
        encoder.encode(&metric_families, &mut rendered)?;
        stream.write_str(std::str::from_utf8(&rendered)?)?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
