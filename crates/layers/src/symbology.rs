use std::f64::consts::PI;

use foundation::ValueExtent;
use serde::{Deserialize, Serialize};

/// Flannery (1971) apparent-magnitude correction constants.
pub const FLANNERY_COEFFICIENT: f64 = 1.0083;
pub const FLANNERY_EXPONENT: f64 = 0.5716;

/// Circle-marker styling applied to every proportional symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolStyle {
    pub fill_color: String,
    pub color: String,
    pub weight: f32,
    pub opacity: f32,
    pub fill_opacity: f32,
}

impl Default for SymbolStyle {
    fn default() -> Self {
        Self {
            fill_color: "#ff7800".to_string(),
            color: "#000".to_string(),
            weight: 1.0,
            opacity: 1.0,
            fill_opacity: 0.8,
        }
    }
}

/// How an attribute value becomes a circle area.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ScalingPolicy {
    /// `area = (value * scale_factor) ^ exponent`
    Linear {
        scale_factor: f64,
        #[serde(default = "unit_exponent")]
        exponent: f64,
    },
    /// `area = 1.0083 * (value / dataset_min) ^ 0.5716 * scale_factor`
    Flannery { scale_factor: f64 },
}

fn unit_exponent() -> f64 {
    1.0
}

impl Default for ScalingPolicy {
    fn default() -> Self {
        ScalingPolicy::Linear {
            scale_factor: 50.0,
            exponent: 1.0,
        }
    }
}

/// Dataset-wide context some policies scale against.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleContext {
    pub dataset_min: f64,
}

impl ScaleContext {
    pub fn new(dataset_min: f64) -> Self {
        Self { dataset_min }
    }

    pub fn from_extent(extent: &ValueExtent) -> Self {
        Self::new(extent.min)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RadiusError {
    InvalidValue(f64),
    MissingContext,
    InvalidContext(f64),
    InvalidParameter { name: &'static str, value: f64 },
    NonFiniteRadius(f64),
    UnknownPolicy(String),
}

impl std::fmt::Display for RadiusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RadiusError::InvalidValue(v) => {
                write!(f, "value must be finite and non-negative, got {v}")
            }
            RadiusError::MissingContext => {
                write!(f, "flannery scaling requires the dataset minimum")
            }
            RadiusError::InvalidContext(min) => {
                write!(f, "dataset minimum must be finite and positive, got {min}")
            }
            RadiusError::InvalidParameter { name, value } => {
                write!(f, "{name} must be finite and positive, got {value}")
            }
            RadiusError::NonFiniteRadius(v) => {
                write!(f, "value {v} does not scale to a finite radius")
            }
            RadiusError::UnknownPolicy(name) => write!(
                f,
                "unknown scaling policy: {name} (expected linear, cubic or flannery)"
            ),
        }
    }
}

impl std::error::Error for RadiusError {}

impl ScalingPolicy {
    /// Named presets: `linear` (scale 50), `cubic` (scale 0.5, cubed) and
    /// `flannery` (scale 500).
    pub fn from_name(name: &str) -> Result<Self, RadiusError> {
        match name {
            "linear" => Ok(ScalingPolicy::default()),
            "cubic" => Ok(ScalingPolicy::Linear {
                scale_factor: 0.5,
                exponent: 3.0,
            }),
            "flannery" => Ok(ScalingPolicy::Flannery { scale_factor: 500.0 }),
            other => Err(RadiusError::UnknownPolicy(other.to_string())),
        }
    }

    /// Preset name when the parameters match `cubic`, otherwise the policy kind.
    pub fn name(&self) -> &'static str {
        match *self {
            ScalingPolicy::Linear {
                scale_factor,
                exponent,
            } if scale_factor == 0.5 && exponent == 3.0 => "cubic",
            ScalingPolicy::Linear { .. } => "linear",
            ScalingPolicy::Flannery { .. } => "flannery",
        }
    }

    pub fn scale_factor(&self) -> f64 {
        match self {
            ScalingPolicy::Linear { scale_factor, .. }
            | ScalingPolicy::Flannery { scale_factor } => *scale_factor,
        }
    }

    pub fn with_scale_factor(self, scale_factor: f64) -> Self {
        match self {
            ScalingPolicy::Linear { exponent, .. } => ScalingPolicy::Linear {
                scale_factor,
                exponent,
            },
            ScalingPolicy::Flannery { .. } => ScalingPolicy::Flannery { scale_factor },
        }
    }

    pub fn needs_context(&self) -> bool {
        matches!(self, ScalingPolicy::Flannery { .. })
    }

    pub fn validate(&self) -> Result<(), RadiusError> {
        let positive = |name: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(RadiusError::InvalidParameter { name, value })
            }
        };
        match *self {
            ScalingPolicy::Linear {
                scale_factor,
                exponent,
            } => {
                positive("scale_factor", scale_factor)?;
                positive("exponent", exponent)
            }
            ScalingPolicy::Flannery { scale_factor } => positive("scale_factor", scale_factor),
        }
    }

    /// Checks that `context` satisfies this policy before any value is scaled.
    pub fn check_context(&self, context: Option<&ScaleContext>) -> Result<(), RadiusError> {
        if !self.needs_context() {
            return Ok(());
        }
        let ctx = context.ok_or(RadiusError::MissingContext)?;
        if !(ctx.dataset_min.is_finite() && ctx.dataset_min > 0.0) {
            return Err(RadiusError::InvalidContext(ctx.dataset_min));
        }
        Ok(())
    }

    pub fn area(&self, value: f64, context: Option<&ScaleContext>) -> Result<f64, RadiusError> {
        if !value.is_finite() || value < 0.0 {
            return Err(RadiusError::InvalidValue(value));
        }
        self.validate()?;
        self.check_context(context)?;

        let area = match *self {
            ScalingPolicy::Linear {
                scale_factor,
                exponent,
            } => {
                let base = value * scale_factor;
                if exponent == 1.0 {
                    base
                } else {
                    base.powf(exponent)
                }
            }
            ScalingPolicy::Flannery { scale_factor } => {
                // check_context guarantees a positive minimum.
                let min = context.map(|c| c.dataset_min).unwrap_or(1.0);
                FLANNERY_COEFFICIENT * (value / min).powf(FLANNERY_EXPONENT) * scale_factor
            }
        };
        if !area.is_finite() {
            return Err(RadiusError::NonFiniteRadius(value));
        }
        Ok(area)
    }

    pub fn radius(&self, value: f64, context: Option<&ScaleContext>) -> Result<f64, RadiusError> {
        let area = self.area(value, context)?;
        Ok((area / PI).sqrt())
    }
}

/// Radius of the circle whose area encodes `value` under `policy`.
pub fn radius_for(
    value: f64,
    policy: &ScalingPolicy,
    context: Option<&ScaleContext>,
) -> Result<f64, RadiusError> {
    policy.radius(value, context)
}
