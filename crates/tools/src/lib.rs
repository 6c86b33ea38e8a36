use std::fs;
use std::path::{Path, PathBuf};

use compute::{DatasetSummarizer, DatasetSummary, SummarizerConfig, SummaryError};
use formats::{FeatureCollection, FormatError};
use foundation::AttributeKey;
use layers::{
    Direction, Legend, ProportionalSymbolLayer, RadiusError, ScaleContext, ScalingPolicy,
    SequenceError, SequenceState, SymbolLayerSnapshot,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Everything the CLI can be configured with from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub summarizer: SummarizerConfig,
    pub scaling: ScalingPolicy,
}

/// Command-line and environment settings layered over the config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub policy: Option<String>,
    pub scale_factor: Option<f64>,
    pub exponent: Option<f64>,
    pub strict: bool,
}

#[derive(Debug)]
pub enum ToolError {
    Io { path: PathBuf, message: String },
    Config(String),
    Json(String),
    Format(FormatError),
    Summary(SummaryError),
    Radius(RadiusError),
    Sequence(SequenceError),
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolError::Io { path, message } => write!(f, "{}: {message}", path.display()),
            ToolError::Config(msg) => write!(f, "config: {msg}"),
            ToolError::Json(msg) => write!(f, "json: {msg}"),
            ToolError::Format(e) => write!(f, "parse geojson: {e}"),
            ToolError::Summary(e) => write!(f, "summarize: {e}"),
            ToolError::Radius(e) => write!(f, "radius: {e}"),
            ToolError::Sequence(e) => write!(f, "sequence: {e}"),
        }
    }
}

impl std::error::Error for ToolError {}

impl From<FormatError> for ToolError {
    fn from(e: FormatError) -> Self {
        ToolError::Format(e)
    }
}

impl From<SummaryError> for ToolError {
    fn from(e: SummaryError) -> Self {
        ToolError::Summary(e)
    }
}

impl From<RadiusError> for ToolError {
    fn from(e: RadiusError) -> Self {
        ToolError::Radius(e)
    }
}

impl From<SequenceError> for ToolError {
    fn from(e: SequenceError) -> Self {
        ToolError::Sequence(e)
    }
}

impl ToolConfig {
    pub fn from_json_str(payload: &str) -> Result<Self, ToolError> {
        serde_json::from_str(payload).map_err(|e| ToolError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ToolError> {
        let payload = fs::read_to_string(path).map_err(|e| ToolError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&payload)
    }

    /// Preset name replaces the configured policy; explicit parameters then
    /// adjust whichever policy is in effect.
    pub fn apply(&mut self, overrides: &ConfigOverrides) -> Result<(), ToolError> {
        if let Some(name) = &overrides.policy {
            self.scaling = ScalingPolicy::from_name(name)?;
        }
        if let Some(scale_factor) = overrides.scale_factor {
            self.scaling = self.scaling.with_scale_factor(scale_factor);
        }
        if let Some(exponent) = overrides.exponent {
            match &mut self.scaling {
                ScalingPolicy::Linear { exponent: e, .. } => *e = exponent,
                ScalingPolicy::Flannery { .. } => {
                    return Err(ToolError::Config(
                        "--exponent only applies to linear scaling".to_string(),
                    ));
                }
            }
        }
        if overrides.strict {
            self.summarizer.strict = true;
        }
        self.scaling.validate()?;
        Ok(())
    }

    pub fn summarizer(&self) -> DatasetSummarizer {
        DatasetSummarizer::new(self.summarizer.clone())
    }
}

/// Loads the config file (if any) and layers the overrides on top.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<ToolConfig, ToolError> {
    let mut config = match path {
        Some(p) => ToolConfig::load(p)?,
        None => ToolConfig::default(),
    };
    config.apply(overrides)?;
    debug!(
        policy = config.scaling.name(),
        scaling = ?config.scaling,
        strict = config.summarizer.strict,
        "resolved config"
    );
    Ok(config)
}

/// A parsed input file together with its content hash.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub source: PathBuf,
    pub source_hash: String,
    pub collection: FeatureCollection,
}

impl Dataset {
    pub fn load(path: &Path) -> Result<Self, ToolError> {
        let bytes = fs::read(path).map_err(|e| ToolError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let payload = std::str::from_utf8(&bytes).map_err(|e| ToolError::Io {
            path: path.to_path_buf(),
            message: format!("utf8: {e}"),
        })?;
        let collection = FeatureCollection::from_geojson_str(payload)?;
        let source_hash = blake3::hash(&bytes).to_hex().to_string();
        info!(path = %path.display(), features = collection.len(), "loaded dataset");
        Ok(Self {
            source: path.to_path_buf(),
            source_hash,
            collection,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub source: String,
    pub source_hash: String,
    pub feature_count: usize,
    #[serde(flatten)]
    pub summary: DatasetSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadiusReport {
    pub policy: ScalingPolicy,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_min: Option<f64>,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub attribute: AttributeKey,
}

/// Which attribute a command works on: by name, by slider index, or the first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub attribute: Option<String>,
    pub index: Option<usize>,
}

pub fn attributes(dataset: &Dataset, config: &ToolConfig) -> Result<Vec<AttributeKey>, ToolError> {
    Ok(config
        .summarizer()
        .discover_attribute_keys(&dataset.collection.features)?)
}

pub fn summarize(
    dataset: &Dataset,
    config: &ToolConfig,
    attribute: Option<&AttributeKey>,
) -> Result<SummaryReport, ToolError> {
    let summary = config
        .summarizer()
        .summarize(&dataset.collection.features, attribute)?;
    Ok(SummaryReport {
        source: dataset.source.display().to_string(),
        source_hash: dataset.source_hash.clone(),
        feature_count: dataset.collection.len(),
        summary,
    })
}

pub fn radius(
    value: f64,
    config: &ToolConfig,
    dataset_min: Option<f64>,
) -> Result<RadiusReport, ToolError> {
    let context = dataset_min.map(ScaleContext::new);
    let radius = layers::radius_for(value, &config.scaling, context.as_ref())?;
    Ok(RadiusReport {
        policy: config.scaling,
        value,
        dataset_min,
        radius,
    })
}

/// The dataset-wide minimum, when the configured policy scales against it.
pub fn scale_context(
    dataset: &Dataset,
    config: &ToolConfig,
) -> Result<Option<ScaleContext>, ToolError> {
    if !config.scaling.needs_context() {
        return Ok(None);
    }
    let extent = config
        .summarizer()
        .global_extremes(&dataset.collection.features)?;
    Ok(Some(ScaleContext::from_extent(&extent)))
}

pub fn select_attribute(
    keys: &[AttributeKey],
    selection: &Selection,
) -> Result<(SequenceState, AttributeKey), ToolError> {
    let index = match (&selection.attribute, selection.index) {
        (Some(name), _) => keys
            .iter()
            .position(|k| k.as_str() == name.as_str())
            .ok_or_else(|| SummaryError::UnknownAttribute(name.clone()))?,
        (None, Some(index)) => index,
        (None, None) => 0,
    };
    let state = SequenceState::at(index, keys.len())?;
    let key = state
        .current_attribute(keys)
        .cloned()
        .ok_or(SequenceError::OutOfRange {
            index,
            len: keys.len(),
        })?;
    Ok((state, key))
}

pub fn symbols(
    dataset: &Dataset,
    config: &ToolConfig,
    selection: &Selection,
) -> Result<SymbolLayerSnapshot, ToolError> {
    let keys = attributes(dataset, config)?;
    let (_, attribute) = select_attribute(&keys, selection)?;
    let context = scale_context(dataset, config)?;
    let layer = ProportionalSymbolLayer::new(config.scaling, context);
    Ok(layer.extract(&dataset.collection.features, &attribute)?)
}

pub fn legend(
    dataset: &Dataset,
    config: &ToolConfig,
    selection: &Selection,
) -> Result<Legend, ToolError> {
    let keys = attributes(dataset, config)?;
    let (_, attribute) = select_attribute(&keys, selection)?;
    let summary = config
        .summarizer()
        .attribute_extremes(&dataset.collection.features, &attribute)?;
    let context = scale_context(dataset, config)?;
    Ok(Legend::build(&summary, &config.scaling, context.as_ref())?)
}

pub fn step(
    dataset: &Dataset,
    config: &ToolConfig,
    index: usize,
    direction: Direction,
) -> Result<StepReport, ToolError> {
    let keys = attributes(dataset, config)?;
    let mut state = SequenceState::at(index, keys.len())?;
    state.step(direction);
    let (_, attribute) = select_attribute(
        &keys,
        &Selection {
            attribute: None,
            index: Some(state.index()),
        },
    )?;
    Ok(StepReport {
        index: state.index(),
        attribute,
    })
}
