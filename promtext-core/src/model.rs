use crate::error::ExpositionError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// Label key injected into every rendered sample that does not carry one.
pub const CLUSTER_LABEL: &str = "cluster";

/// Metric kind of a family, as reported by the collecting registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Counter,
    Gauge,
    Info,
    Summary,
    Histogram,
    #[serde(other)]
    Unknown,
}

impl MetricType {
    /// Suffix appended to the family name in the `# TYPE` line.
    ///
    /// The text format has no native info type, so info families are exposed
    /// as gauges whose name ends in `_info`.
    pub fn name_suffix(&self) -> &'static str {
        match self {
            MetricType::Info => "_info",
            _ => "",
        }
    }

    /// Keyword written after the name in the `# TYPE` line.
    pub fn type_keyword(&self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge | MetricType::Info => "gauge",
            MetricType::Summary => "summary",
            MetricType::Histogram => "histogram",
            MetricType::Unknown => "unknown",
        }
    }

    pub fn all() -> &'static [MetricType] {
        &[
            MetricType::Counter,
            MetricType::Gauge,
            MetricType::Info,
            MetricType::Summary,
            MetricType::Histogram,
            MetricType::Unknown,
        ]
    }
}

impl FromStr for MetricType {
    type Err = std::convert::Infallible;

    /// Unrecognised kinds map to `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "counter" => MetricType::Counter,
            "gauge" => MetricType::Gauge,
            "info" => MetricType::Info,
            "summary" => MetricType::Summary,
            "histogram" => MetricType::Histogram,
            _ => MetricType::Unknown,
        })
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
            MetricType::Info => "info",
            MetricType::Summary => "summary",
            MetricType::Histogram => "histogram",
            MetricType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// One concrete labeled series value within a family.
///
/// `label_names` and `label_values` are aligned by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub name: String,
    #[serde(default)]
    pub label_names: Vec<String>,
    #[serde(default)]
    pub label_values: Vec<String>,
    pub value: f64,
}

impl Sample {
    /// Unlabeled sample.
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            label_names: Vec::new(),
            label_values: Vec::new(),
            value,
        }
    }

    /// Sample with explicit labels. Names and values must line up and names must be unique.
    pub fn with_labels(
        name: impl Into<String>,
        label_names: Vec<String>,
        label_values: Vec<String>,
        value: f64,
    ) -> Result<Self, ExpositionError> {
        let sample = Self {
            name: name.into(),
            label_names,
            label_values,
            value,
        };
        sample.validate()?;
        Ok(sample)
    }

    /// Append one label, builder style.
    pub fn label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.label_names.push(name.into());
        self.label_values.push(value.into());
        self
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.label_names.iter().any(|n| n == name)
    }

    /// Iterate `(name, value)` pairs in declaration order.
    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.label_names
            .iter()
            .zip(self.label_values.iter())
            .map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn validate(&self) -> Result<(), ExpositionError> {
        if self.name.is_empty() {
            return Err(ExpositionError::InvalidMetric(
                "sample name must not be empty".into(),
            ));
        }
        if self.label_names.len() != self.label_values.len() {
            return Err(ExpositionError::InvalidMetric(format!(
                "sample {}: {} label names but {} label values",
                self.name,
                self.label_names.len(),
                self.label_values.len()
            )));
        }
        let mut seen = HashSet::with_capacity(self.label_names.len());
        for label in &self.label_names {
            if !seen.insert(label.as_str()) {
                return Err(ExpositionError::InvalidMetric(format!(
                    "sample {}: duplicate label {}",
                    self.name, label
                )));
            }
        }
        Ok(())
    }
}

/// A named group of samples sharing a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricFamily {
    pub name: String,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    #[serde(default)]
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    pub fn new(name: impl Into<String>, metric_type: MetricType) -> Result<Self, ExpositionError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ExpositionError::InvalidMetric(
                "metric family name must not be empty".into(),
            ));
        }
        Ok(Self {
            name,
            metric_type,
            samples: Vec::new(),
        })
    }

    /// Append a sample, builder style.
    pub fn sample(mut self, sample: Sample) -> Self {
        self.samples.push(sample);
        self
    }

    /// Check the family name and every sample.
    pub fn validate(&self) -> Result<(), ExpositionError> {
        if self.name.is_empty() {
            return Err(ExpositionError::InvalidMetric(
                "metric family name must not be empty".into(),
            ));
        }
        self.samples.iter().try_for_each(Sample::validate)
    }
}
