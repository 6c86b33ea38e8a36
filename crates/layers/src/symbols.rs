use foundation::AttributeKey;
use formats::{CityFeature, GeoPoint};
use serde::Serialize;
use tracing::{debug, warn};

use compute::finite_number;

use crate::popup::Popup;
use crate::symbology::{RadiusError, ScaleContext, ScalingPolicy, SymbolStyle};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProportionalSymbol {
    pub city: Option<String>,
    pub location: GeoPoint,
    pub value: f64,
    pub radius: f64,
    pub popup: Popup,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolLayerSnapshot {
    pub attribute: AttributeKey,
    pub policy: ScalingPolicy,
    pub style: SymbolStyle,
    pub symbols: Vec<ProportionalSymbol>,
}

/// Sizes one circle per feature for the selected attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct ProportionalSymbolLayer {
    policy: ScalingPolicy,
    context: Option<ScaleContext>,
    style: SymbolStyle,
}

impl ProportionalSymbolLayer {
    pub fn new(policy: ScalingPolicy, context: Option<ScaleContext>) -> Self {
        Self {
            policy,
            context,
            style: SymbolStyle::default(),
        }
    }

    pub fn radius(&self, value: f64) -> Result<f64, RadiusError> {
        self.policy.radius(value, self.context.as_ref())
    }

    /// Features without a usable value for `attribute` get no symbol.
    pub fn extract(
        &self,
        features: &[CityFeature],
        attribute: &AttributeKey,
    ) -> Result<SymbolLayerSnapshot, RadiusError> {
        self.policy.validate()?;
        self.policy.check_context(self.context.as_ref())?;

        let mut symbols = Vec::with_capacity(features.len());
        for (index, feature) in features.iter().enumerate() {
            let Some(value) = finite_number(feature.attribute(attribute)) else {
                debug!(feature = %feature.label(index), %attribute, "no value, skipping symbol");
                continue;
            };
            let radius = match self.radius(value) {
                Ok(r) => r,
                Err(RadiusError::InvalidValue(v) | RadiusError::NonFiniteRadius(v)) => {
                    warn!(feature = %feature.label(index), %attribute, value = v, "cannot size symbol");
                    continue;
                }
                Err(e) => return Err(e),
            };
            let Some(popup) = Popup::for_feature(feature, attribute, radius) else {
                continue;
            };
            symbols.push(ProportionalSymbol {
                city: feature.city.clone(),
                location: feature.location,
                value,
                radius,
                popup,
            });
        }

        Ok(SymbolLayerSnapshot {
            attribute: attribute.clone(),
            policy: self.policy,
            style: self.style.clone(),
            symbols,
        })
    }
}
