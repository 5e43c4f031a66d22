use figment::{Figment, providers::{Env, Format, Yaml}};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Value of the `cluster` label injected into every sample.
    #[serde(default = "default_cluster")]
    pub cluster: String,
    #[serde(default)]
    pub buffer: BufferConfig,
}

/// Output buffer pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Capacity reserved for a freshly allocated buffer.
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,
    /// Hard upper bound on a single rendering. Growth beyond it aborts that generation.
    #[serde(default = "default_max_capacity")]
    pub max_capacity: usize,
    /// Released buffers kept for reuse. 0 disables pooling.
    #[serde(default = "default_max_idle")]
    pub max_idle: usize,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_cluster() -> String { "standalone".into() }
fn default_initial_capacity() -> usize { 4096 }
fn default_max_capacity() -> usize { 256 * 1024 * 1024 }
fn default_max_idle() -> usize { 16 }

// ── Impls ─────────────────────────────────────────────────────

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            cluster: default_cluster(),
            buffer: BufferConfig::default(),
        }
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            initial_capacity: default_initial_capacity(),
            max_capacity: default_max_capacity(),
            max_idle: default_max_idle(),
        }
    }
}

impl ExporterConfig {
    /// Load configuration from YAML file + env overrides.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: ExporterConfig = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("PROMTEXT_").split("__"))
            .extract()?;
        config.validate()?;
        tracing::debug!(cluster = %config.cluster, "Exporter config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), crate::ExpositionError> {
        if self.buffer.initial_capacity > self.buffer.max_capacity {
            return Err(crate::ExpositionError::Config(format!(
                "buffer.initial_capacity ({}) exceeds buffer.max_capacity ({})",
                self.buffer.initial_capacity, self.buffer.max_capacity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // ── Default values ────────────────────────────────────────────

    #[test]
    fn default_buffer_config_has_expected_values() {
        let cfg = BufferConfig::default();
        assert_eq!(cfg.initial_capacity, 4096);
        assert_eq!(cfg.max_capacity, 256 * 1024 * 1024);
        assert_eq!(cfg.max_idle, 16);
    }

    #[test]
    fn default_exporter_config_uses_standalone_cluster() {
        let cfg = ExporterConfig::default();
        assert_eq!(cfg.cluster, "standalone");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_initial_above_max() {
        let mut cfg = ExporterConfig::default();
        cfg.buffer.initial_capacity = 1024;
        cfg.buffer.max_capacity = 512;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("initial_capacity"));
    }

    // ── ExporterConfig::load() ────────────────────────────────────

    #[test]
    fn load_from_valid_yaml_overrides_defaults() {
        let mut tmpfile = tempfile::NamedTempFile::new().unwrap();
        write!(tmpfile, "cluster: \"prod-eu\"\nbuffer:\n  max_idle: 2\n").unwrap();
        let cfg = ExporterConfig::load(tmpfile.path()).unwrap();
        assert_eq!(cfg.cluster, "prod-eu");
        assert_eq!(cfg.buffer.max_idle, 2);
        // Defaults still apply for unspecified fields
        assert_eq!(cfg.buffer.initial_capacity, 4096);
    }

    #[test]
    fn load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ExporterConfig::load(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(cfg.cluster, "standalone");
        assert_eq!(cfg.buffer.max_capacity, 256 * 1024 * 1024);
    }

    #[test]
    fn load_rejects_inconsistent_buffer_bounds() {
        let yaml = r#"
buffer:
  initial_capacity: 8192
  max_capacity: 1024
"#;
        let mut tmpfile = tempfile::NamedTempFile::new().unwrap();
        write!(tmpfile, "{yaml}").unwrap();
        assert!(ExporterConfig::load(tmpfile.path()).is_err());
    }

    #[test]
    fn config_roundtrips_through_json() {
        let cfg = ExporterConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ExporterConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cluster, cfg.cluster);
        assert_eq!(back.buffer.max_idle, cfg.buffer.max_idle);
    }
}
