use compute::DatasetSummary;
use serde::Serialize;

use crate::symbology::{RadiusError, ScaleContext, ScalingPolicy};

/// The legend svg is 60px tall; circles sit on a baseline one pixel above
/// its bottom edge.
pub const LEGEND_BASELINE_Y: f64 = 59.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendCircleKind {
    Max,
    Mean,
    Min,
}

impl LegendCircleKind {
    pub const ALL: [LegendCircleKind; 3] = [
        LegendCircleKind::Max,
        LegendCircleKind::Mean,
        LegendCircleKind::Min,
    ];

    /// Baseline of the label text next to the circle.
    pub fn text_y(self) -> f64 {
        match self {
            LegendCircleKind::Max => 20.0,
            LegendCircleKind::Mean => 40.0,
            LegendCircleKind::Min => 60.0,
        }
    }

    fn value(self, summary: &DatasetSummary) -> f64 {
        match self {
            LegendCircleKind::Max => summary.max,
            LegendCircleKind::Mean => summary.mean,
            LegendCircleKind::Min => summary.min,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendCircle {
    pub kind: LegendCircleKind,
    pub value: f64,
    pub radius: f64,
    pub cy: f64,
    pub text_y: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: String,
    pub circles: Vec<LegendCircle>,
}

impl Legend {
    /// Nested max/mean/min circles for a summary, sized with the same policy
    /// as the map symbols.
    pub fn build(
        summary: &DatasetSummary,
        policy: &ScalingPolicy,
        context: Option<&ScaleContext>,
    ) -> Result<Self, RadiusError> {
        let title = match &summary.attribute {
            Some(key) => format!("Population in {}", key.year()),
            None => "Population, all years".to_string(),
        };

        let mut circles = Vec::with_capacity(LegendCircleKind::ALL.len());
        for kind in LegendCircleKind::ALL {
            let value = kind.value(summary);
            let radius = policy.radius(value, context)?;
            circles.push(LegendCircle {
                kind,
                value,
                radius,
                cy: LEGEND_BASELINE_Y - radius,
                text_y: kind.text_y(),
                label: format!("{} million", round_hundredths(value)),
            });
        }

        Ok(Self { title, circles })
    }

    pub fn circle(&self, kind: LegendCircleKind) -> Option<&LegendCircle> {
        self.circles.iter().find(|c| c.kind == kind)
    }
}

fn round_hundredths(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::{LEGEND_BASELINE_Y, Legend, LegendCircleKind};
    use crate::symbology::{RadiusError, ScaleContext, ScalingPolicy};
    use compute::DatasetSummary;
    use foundation::AttributeKey;
    use pretty_assertions::assert_eq;
    use std::f64::consts::PI;

    fn summary(min: f64, max: f64) -> DatasetSummary {
        DatasetSummary {
            attribute: Some(AttributeKey::new("Pop_2015")),
            min,
            max,
            mean: (min + max) / 2.0,
            attributes: vec![AttributeKey::new("Pop_2015")],
        }
    }

    #[test]
    fn circles_are_max_mean_min() {
        let legend = Legend::build(&summary(4.0, 16.0), &ScalingPolicy::default(), None).unwrap();
        assert_eq!(legend.title, "Population in 2015");

        let kinds: Vec<_> = legend.circles.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LegendCircleKind::Max,
                LegendCircleKind::Mean,
                LegendCircleKind::Min
            ]
        );
        let labels: Vec<_> = legend.circles.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["16 million", "10 million", "4 million"]);
        let text_y: Vec<_> = legend.circles.iter().map(|c| c.text_y).collect();
        assert_eq!(text_y, vec![20.0, 40.0, 60.0]);
    }

    #[test]
    fn circles_sit_on_shared_baseline() {
        let legend = Legend::build(&summary(4.0, 16.0), &ScalingPolicy::default(), None).unwrap();
        let max = legend.circle(LegendCircleKind::Max).unwrap();
        assert_eq!(max.radius, (800.0 / PI).sqrt());
        assert_eq!(max.cy, LEGEND_BASELINE_Y - max.radius);
        for c in &legend.circles {
            assert!((c.cy + c.radius - LEGEND_BASELINE_Y).abs() < 1e-9);
        }
    }

    #[test]
    fn labels_round_to_hundredths() {
        let legend =
            Legend::build(&summary(4.661, 15.957), &ScalingPolicy::default(), None).unwrap();
        let labels: Vec<_> = legend.circles.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["15.96 million", "10.31 million", "4.66 million"]);
    }

    #[test]
    fn flannery_legend_needs_context() {
        let flannery = ScalingPolicy::Flannery { scale_factor: 500.0 };
        assert_eq!(
            Legend::build(&summary(4.0, 16.0), &flannery, None),
            Err(RadiusError::MissingContext)
        );
        let legend =
            Legend::build(&summary(4.0, 16.0), &flannery, Some(&ScaleContext::new(4.0))).unwrap();
        let min = legend.circle(LegendCircleKind::Min).unwrap();
        assert_eq!(min.radius, (1.0083 * 500.0 / PI).sqrt());
    }

    #[test]
    fn dataset_wide_title() {
        let mut s = summary(1.0, 2.0);
        s.attribute = None;
        let legend = Legend::build(&s, &ScalingPolicy::default(), None).unwrap();
        assert_eq!(legend.title, "Population, all years");
    }
}
