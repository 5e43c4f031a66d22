// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  promtext — one-shot Prometheus text exposition renderer
//
//  System metrics: a YAML/JSON snapshot of metric families
//  Providers:      raw exposition files, process collector
//  Output:         stdout or a file, all-or-nothing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use anyhow::Context;
use clap::Parser;
use promtext_core::{ExporterConfig, MetricFamily};
use promtext_exposition::provider::RegistryTextProvider;
use promtext_exposition::{BufferPool, Generator, RawMetricsProvider, StaticTextProvider};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "promtext", version, about = "Render metrics in Prometheus text exposition format")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Cluster label value (overrides the config file)
    #[arg(long)]
    cluster: Option<String>,

    /// YAML or JSON list of metric families rendered as system metrics
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Raw exposition text file appended after system metrics (repeatable)
    #[arg(short, long)]
    append: Vec<PathBuf>,

    /// Append this process's own metrics (Linux only)
    #[arg(long)]
    process: bool,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Tracing (stderr, stdout carries exposition text) ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    // ── Config ──
    let mut config = match &cli.config {
        Some(path) => {
            info!(path = %path.display(), "Loading config file");
            ExporterConfig::load(path)?
        }
        None => ExporterConfig::default(),
    };
    if let Some(cluster) = &cli.cluster {
        config.cluster = cluster.clone();
    }
    config.validate()?;

    // ── System metrics ──
    let families = match &cli.snapshot {
        Some(path) => load_snapshot(path)?,
        None => Vec::new(),
    };
    info!(families = families.len(), cluster = %config.cluster, "Snapshot loaded");

    // ── Providers ──
    let providers = build_providers(&cli)?;

    let pool = Arc::new(BufferPool::from_config(&config.buffer));
    let generator = Generator::new(Arc::new(families), pool);

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("cannot create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    generator.generate(&config.cluster, &mut *out, Some(providers.as_slice()))?;
    out.flush()?;
    Ok(())
}

fn build_providers(cli: &Cli) -> anyhow::Result<Vec<Arc<dyn RawMetricsProvider>>> {
    let mut providers: Vec<Arc<dyn RawMetricsProvider>> = Vec::new();
    for path in &cli.append {
        providers.push(Arc::new(StaticTextProvider::from_file(path)?));
    }
    if cli.process {
        match process_registry() {
            Some(registry) => providers.push(Arc::new(RegistryTextProvider::new("process", registry))),
            None => warn!("Process metrics are only available on Linux"),
        }
    }
    info!(providers = providers.len(), "Providers registered");
    Ok(providers)
}

#[cfg(target_os = "linux")]
fn process_registry() -> Option<prometheus::Registry> {
    let registry = prometheus::Registry::new();
    let collector = prometheus::process_collector::ProcessCollector::for_self();
    match registry.register(Box::new(collector)) {
        Ok(()) => Some(registry),
        Err(e) => {
            warn!(error = %e, "Failed to register process collector");
            None
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn process_registry() -> Option<prometheus::Registry> {
    None
}

/// Parse a snapshot file; `.json` is read as JSON, anything else as YAML.
fn load_snapshot(path: &Path) -> anyhow::Result<Vec<MetricFamily>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read snapshot {}", path.display()))?;
    let families: Vec<MetricFamily> = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&raw)?,
        _ => serde_yaml::from_str(&raw)?,
    };
    for family in &families {
        family
            .validate()
            .with_context(|| format!("invalid family {} in {}", family.name, path.display()))?;
    }
    Ok(families)
}

#[cfg(test)]
mod tests {
    use super::*;
    use promtext_core::MetricType;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn cli_parses_repeated_append() {
        let cli = Cli::try_parse_from([
            "promtext",
            "--cluster",
            "prod",
            "-a",
            "one.prom",
            "-a",
            "two.prom",
        ])
        .unwrap();
        assert_eq!(cli.cluster.as_deref(), Some("prod"));
        assert_eq!(cli.append.len(), 2);
        assert!(!cli.process);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn load_yaml_snapshot() {
        let file = write_temp(
            ".yaml",
            r#"
- name: up
  type: gauge
  samples:
    - name: up
      value: 1.0
- name: requests_total
  type: counter
  samples:
    - name: requests_total
      label_names: [method]
      label_values: [GET]
      value: 12
"#,
        );
        let families = load_snapshot(file.path()).unwrap();
        assert_eq!(families.len(), 2);
        assert_eq!(families[1].metric_type, MetricType::Counter);
        assert_eq!(families[1].samples[0].value, 12.0);
    }

    #[test]
    fn load_json_snapshot() {
        let file = write_temp(
            ".json",
            r#"[{"name":"up","type":"gauge","samples":[{"name":"up","value":0.0}]}]"#,
        );
        let families = load_snapshot(file.path()).unwrap();
        assert_eq!(families[0].name, "up");
    }

    #[test]
    fn snapshot_with_misaligned_labels_is_rejected() {
        let file = write_temp(
            ".yaml",
            r#"
- name: x
  type: gauge
  samples:
    - name: x
      label_names: [a, b]
      label_values: [only-one]
      value: 1
"#,
        );
        let err = load_snapshot(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("invalid family x"));
    }

    #[test]
    fn snapshot_renders_with_appended_text() {
        let snapshot = write_temp(
            ".yaml",
            "- name: up\n  type: gauge\n  samples:\n    - name: up\n      value: 1.0\n",
        );
        let extra = write_temp(".prom", "# TYPE extra counter\nextra 5\n");
        let cli =
            Cli::try_parse_from(["promtext", "-a", extra.path().to_str().unwrap()]).unwrap();

        let families = load_snapshot(snapshot.path()).unwrap();
        let providers = build_providers(&cli).unwrap();
        let generator = Generator::with_default_pool(Arc::new(families));
        let mut out = Vec::new();
        generator
            .generate("ci", &mut out, Some(providers.as_slice()))
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "# TYPE up gauge\nup{cluster=\"ci\"} 1.0\n# TYPE extra counter\nextra 5\n"
        );
    }
}
