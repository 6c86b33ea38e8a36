use foundation::{AttributeKey, DEFAULT_ATTRIBUTE_MARKER, ValueExtent, is_attribute_name};
use formats::CityFeature;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analysis::coerce::finite_number;

/// Which features are inspected when discovering attribute keys.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyDiscovery {
    /// Only the first feature is treated as representative.
    FirstFeature,
    /// Every feature contributes keys not seen before, in encounter order.
    #[default]
    AllFeatures,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub marker: String,
    pub discovery: KeyDiscovery,
    /// Fail on values that do not coerce to a finite number instead of skipping them.
    pub strict: bool,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            marker: DEFAULT_ATTRIBUTE_MARKER.to_string(),
            discovery: KeyDiscovery::AllFeatures,
            strict: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Attribute the extremes were taken over; `None` for the whole dataset.
    pub attribute: Option<AttributeKey>,
    pub min: f64,
    pub max: f64,
    /// Midpoint of `min` and `max`.
    pub mean: f64,
    pub attributes: Vec<AttributeKey>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SummaryError {
    EmptyDataset,
    MalformedValue { feature: String, key: String },
    UnknownAttribute(String),
    NoValues { attribute: Option<String> },
}

impl std::fmt::Display for SummaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryError::EmptyDataset => write!(f, "dataset has no features"),
            SummaryError::MalformedValue { feature, key } => {
                write!(f, "feature {feature}: value of {key} is not a finite number")
            }
            SummaryError::UnknownAttribute(key) => write!(f, "unknown attribute: {key}"),
            SummaryError::NoValues { attribute: Some(key) } => {
                write!(f, "no numeric values for attribute {key}")
            }
            SummaryError::NoValues { attribute: None } => {
                write!(f, "no numeric population values in dataset")
            }
        }
    }
}

impl std::error::Error for SummaryError {}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetSummarizer {
    config: SummarizerConfig,
}

impl DatasetSummarizer {
    pub fn new(config: SummarizerConfig) -> Self {
        Self { config }
    }

    pub fn discover_attribute_keys(
        &self,
        features: &[CityFeature],
    ) -> Result<Vec<AttributeKey>, SummaryError> {
        let first = features.first().ok_or(SummaryError::EmptyDataset)?;
        let scanned = match self.config.discovery {
            KeyDiscovery::FirstFeature => std::slice::from_ref(first),
            KeyDiscovery::AllFeatures => features,
        };

        let mut keys: Vec<AttributeKey> = Vec::new();
        for feature in scanned {
            for name in feature.properties.keys() {
                if !is_attribute_name(name, &self.config.marker) {
                    continue;
                }
                if keys.iter().any(|k| k.as_str() == name) {
                    continue;
                }
                keys.push(AttributeKey::new(name.as_str()));
            }
        }
        debug!(count = keys.len(), "discovered attribute keys");
        Ok(keys)
    }

    /// Min, max and midpoint of one attribute across every feature.
    pub fn attribute_extremes(
        &self,
        features: &[CityFeature],
        key: &AttributeKey,
    ) -> Result<DatasetSummary, SummaryError> {
        let attributes = self.discover_attribute_keys(features)?;
        if !attributes.contains(key) {
            return Err(SummaryError::UnknownAttribute(key.to_string()));
        }

        let mut extent = ValueExtent::empty();
        for (index, feature) in features.iter().enumerate() {
            let value = feature.attribute(key);
            if let Some(v) = self.checked_value(feature, index, key.as_str(), value)? {
                extent.include(v);
            }
        }
        if extent.is_empty() {
            return Err(SummaryError::NoValues {
                attribute: Some(key.to_string()),
            });
        }

        Ok(DatasetSummary {
            attribute: Some(key.clone()),
            min: extent.min,
            max: extent.max,
            mean: extent.midpoint(),
            attributes,
        })
    }

    /// One extent spanning every population attribute of every feature.
    pub fn global_extremes(&self, features: &[CityFeature]) -> Result<ValueExtent, SummaryError> {
        if features.is_empty() {
            return Err(SummaryError::EmptyDataset);
        }

        let mut extent = ValueExtent::empty();
        for (index, feature) in features.iter().enumerate() {
            for (name, value) in &feature.properties {
                if !is_attribute_name(name, &self.config.marker) {
                    continue;
                }
                if let Some(v) = self.checked_value(feature, index, name, Some(value))? {
                    extent.include(v);
                }
            }
        }
        if extent.is_empty() {
            return Err(SummaryError::NoValues { attribute: None });
        }
        Ok(extent)
    }

    pub fn summarize(
        &self,
        features: &[CityFeature],
        attribute: Option<&AttributeKey>,
    ) -> Result<DatasetSummary, SummaryError> {
        if let Some(key) = attribute {
            return self.attribute_extremes(features, key);
        }

        let attributes = self.discover_attribute_keys(features)?;
        let extent = self.global_extremes(features)?;
        Ok(DatasetSummary {
            attribute: None,
            min: extent.min,
            max: extent.max,
            mean: extent.midpoint(),
            attributes,
        })
    }

    fn checked_value(
        &self,
        feature: &CityFeature,
        index: usize,
        key: &str,
        value: Option<&serde_json::Value>,
    ) -> Result<Option<f64>, SummaryError> {
        if let Some(v) = finite_number(value) {
            return Ok(Some(v));
        }
        let label = feature.label(index);
        if self.config.strict {
            return Err(SummaryError::MalformedValue {
                feature: label,
                key: key.to_string(),
            });
        }
        warn!(feature = %label, key, "skipping non-numeric attribute value");
        Ok(None)
    }
}

/// Summarizes with the default configuration.
pub fn summarize(
    features: &[CityFeature],
    attribute: Option<&AttributeKey>,
) -> Result<DatasetSummary, SummaryError> {
    DatasetSummarizer::default().summarize(features, attribute)
}

#[cfg(test)]
mod tests {
    use super::{
        DatasetSummarizer, KeyDiscovery, SummarizerConfig, SummaryError, summarize,
    };
    use foundation::{AttributeKey, ValueExtent};
    use formats::{CityFeature, FeatureCollection, GeoPoint};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn feature(properties: Value) -> CityFeature {
        let properties = properties.as_object().cloned().unwrap_or_default();
        let city = properties
            .get("City")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        CityFeature {
            id: None,
            city,
            location: GeoPoint::new(0.0, 0.0),
            properties,
        }
    }

    fn keys(names: &[&str]) -> Vec<AttributeKey> {
        names.iter().map(|n| AttributeKey::new(*n)).collect()
    }

    fn megacities() -> FeatureCollection {
        let payload = include_str!("../../../../data/MegaCities.geojson");
        FeatureCollection::from_geojson_str(payload).expect("parse fixture")
    }

    #[test]
    fn discovers_keys_in_encounter_order() {
        let features = vec![feature(
            json!({"City": "X", "Pop_1990": 1, "Pop_2000": 2, "Other": 3}),
        )];
        let found = DatasetSummarizer::default()
            .discover_attribute_keys(&features)
            .unwrap();
        assert_eq!(found, keys(&["Pop_1990", "Pop_2000"]));
    }

    #[test]
    fn first_feature_discovery_ignores_later_keys() {
        let features = vec![
            feature(json!({"Pop_1990": 1})),
            feature(json!({"Pop_1990": 1, "Pop_2000": 2})),
        ];
        let first_only = DatasetSummarizer::new(SummarizerConfig {
            discovery: KeyDiscovery::FirstFeature,
            ..SummarizerConfig::default()
        });
        assert_eq!(
            first_only.discover_attribute_keys(&features).unwrap(),
            keys(&["Pop_1990"])
        );
        assert_eq!(
            DatasetSummarizer::default()
                .discover_attribute_keys(&features)
                .unwrap(),
            keys(&["Pop_1990", "Pop_2000"])
        );
    }

    #[test]
    fn empty_dataset_is_an_error() {
        let s = DatasetSummarizer::default();
        assert_eq!(s.discover_attribute_keys(&[]), Err(SummaryError::EmptyDataset));
        assert_eq!(summarize(&[], None), Err(SummaryError::EmptyDataset));
        assert_eq!(
            summarize(&[], Some(&AttributeKey::new("Pop_2015"))),
            Err(SummaryError::EmptyDataset)
        );
        assert_eq!(s.global_extremes(&[]), Err(SummaryError::EmptyDataset));
    }

    #[test]
    fn attribute_summary_uses_range_midpoint() {
        let features = vec![
            feature(json!({"Pop_2015": 4})),
            feature(json!({"Pop_2015": 16})),
        ];
        let summary = summarize(&features, Some(&AttributeKey::new("Pop_2015"))).unwrap();
        assert_eq!(summary.min, 4.0);
        assert_eq!(summary.max, 16.0);
        assert_eq!(summary.mean, 10.0);
        assert_eq!(summary.attributes, keys(&["Pop_2015"]));

        // Skewed values: mean stays the midpoint, not the average.
        let skewed = vec![
            feature(json!({"Pop_2015": 1})),
            feature(json!({"Pop_2015": 1})),
            feature(json!({"Pop_2015": 1})),
            feature(json!({"Pop_2015": 9})),
        ];
        let summary = summarize(&skewed, Some(&AttributeKey::new("Pop_2015"))).unwrap();
        assert_eq!(summary.mean, 5.0);
    }

    #[test]
    fn summary_orders_min_mean_max() {
        let collection = megacities();
        for key in DatasetSummarizer::default()
            .discover_attribute_keys(&collection.features)
            .unwrap()
        {
            let s = summarize(&collection.features, Some(&key)).unwrap();
            assert!(s.min <= s.mean && s.mean <= s.max, "{key}: {s:?}");
            assert_eq!(s.mean, (s.min + s.max) / 2.0);
        }
    }

    #[test]
    fn summarize_is_idempotent() {
        let collection = megacities();
        let key = AttributeKey::new("Pop_2000");
        let a = summarize(&collection.features, Some(&key)).unwrap();
        let b = summarize(&collection.features, Some(&key)).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            summarize(&collection.features, None).unwrap(),
            summarize(&collection.features, None).unwrap()
        );
    }

    #[test]
    fn fixture_summaries() {
        let collection = megacities();
        let s = summarize(&collection.features, Some(&AttributeKey::new("Pop_2015"))).unwrap();
        assert_eq!((s.min, s.max), (17.6, 38.0));
        assert_eq!(s.attributes.len(), 7);
        assert_eq!(s.attributes[0].as_str(), "Pop_1985");
        assert_eq!(s.attributes[6].as_str(), "Pop_2015");

        let global = summarize(&collection.features, None).unwrap();
        assert_eq!(global.attribute, None);
        assert_eq!((global.min, global.max), (4.66, 38.0));
    }

    #[test]
    fn global_extremes_span_all_years() {
        let features = vec![
            feature(json!({"City": "A", "Pop_1990": 3, "Pop_2000": 30, "Area": 1000})),
            feature(json!({"City": "B", "Pop_1990": 1.5, "Pop_2000": 12})),
        ];
        let extent = DatasetSummarizer::default()
            .global_extremes(&features)
            .unwrap();
        assert_eq!(extent, ValueExtent::new(1.5, 30.0));
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let features = vec![feature(json!({"Pop_2015": 4}))];
        assert_eq!(
            summarize(&features, Some(&AttributeKey::new("Pop_1900"))),
            Err(SummaryError::UnknownAttribute("Pop_1900".to_string()))
        );
    }

    #[test]
    fn lenient_mode_skips_malformed_values() {
        let features = vec![
            feature(json!({"City": "A", "Pop_2015": "n/a"})),
            feature(json!({"City": "B", "Pop_2015": "12.5"})),
            feature(json!({"City": "C", "Pop_2015": 20})),
            feature(json!({"City": "D"})),
        ];
        let s = summarize(&features, Some(&AttributeKey::new("Pop_2015"))).unwrap();
        assert_eq!((s.min, s.max), (12.5, 20.0));
    }

    #[test]
    fn strict_mode_names_feature_and_key() {
        let features = vec![
            feature(json!({"City": "A", "Pop_2015": 3})),
            feature(json!({"City": "Lagos", "Pop_2015": "many"})),
        ];
        let strict = DatasetSummarizer::new(SummarizerConfig {
            strict: true,
            ..SummarizerConfig::default()
        });
        let err = strict
            .summarize(&features, Some(&AttributeKey::new("Pop_2015")))
            .unwrap_err();
        assert_eq!(
            err,
            SummaryError::MalformedValue {
                feature: "Lagos".to_string(),
                key: "Pop_2015".to_string(),
            }
        );
        assert_eq!(
            err.to_string(),
            "feature Lagos: value of Pop_2015 is not a finite number"
        );
        assert!(strict.global_extremes(&features).is_err());
    }

    #[test]
    fn strict_mode_rejects_missing_key_with_fallback_labels() {
        let strict = DatasetSummarizer::new(SummarizerConfig {
            strict: true,
            ..SummarizerConfig::default()
        });
        let key = AttributeKey::new("Pop_2015");

        let mut with_id = feature(json!({"Pop_1990": 2}));
        with_id.id = Some("dhaka".to_string());
        let features = vec![feature(json!({"City": "A", "Pop_2015": 3})), with_id];
        assert_eq!(
            strict.summarize(&features, Some(&key)),
            Err(SummaryError::MalformedValue {
                feature: "dhaka".to_string(),
                key: "Pop_2015".to_string(),
            })
        );

        let features = vec![
            feature(json!({"City": "A", "Pop_2015": 3})),
            feature(json!({"Pop_1990": 2})),
        ];
        assert_eq!(
            strict.summarize(&features, Some(&key)),
            Err(SummaryError::MalformedValue {
                feature: "#1".to_string(),
                key: "Pop_2015".to_string(),
            })
        );

        let lenient = DatasetSummarizer::default()
            .summarize(&features, Some(&key))
            .unwrap();
        assert_eq!((lenient.min, lenient.max), (3.0, 3.0));
    }

    #[test]
    fn mean_stays_finite_near_f64_max() {
        let features = vec![
            feature(json!({"Pop_2015": 1e308})),
            feature(json!({"Pop_2015": 1.7e308})),
        ];
        let s = summarize(&features, Some(&AttributeKey::new("Pop_2015"))).unwrap();
        assert!(s.mean.is_finite());
        assert!(s.min <= s.mean && s.mean <= s.max);
        assert_eq!(s.mean, 1e308 / 2.0 + 1.7e308 / 2.0);

        let global = summarize(&features, None).unwrap();
        assert!(global.mean.is_finite());
    }

    #[test]
    fn all_values_malformed_reports_no_values() {
        let features = vec![feature(json!({"Pop_2015": "?"}))];
        assert_eq!(
            summarize(&features, Some(&AttributeKey::new("Pop_2015"))),
            Err(SummaryError::NoValues {
                attribute: Some("Pop_2015".to_string())
            })
        );
        assert_eq!(
            summarize(&features, None),
            Err(SummaryError::NoValues { attribute: None })
        );
    }

    #[test]
    fn custom_marker_selects_other_fields() {
        let features = vec![feature(json!({"Pop_2015": 4, "GDP_2015": 7}))];
        let gdp = DatasetSummarizer::new(SummarizerConfig {
            marker: "GDP".to_string(),
            ..SummarizerConfig::default()
        });
        let s = gdp.summarize(&features, None).unwrap();
        assert_eq!(s.attributes, keys(&["GDP_2015"]));
        assert_eq!((s.min, s.max), (7.0, 7.0));
    }
}
