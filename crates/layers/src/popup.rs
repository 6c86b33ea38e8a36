use foundation::AttributeKey;
use formats::CityFeature;
use serde::Serialize;

use compute::finite_number;

/// Display payload for one symbol's popup. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub city: Option<String>,
    pub attribute: AttributeKey,
    pub year: String,
    pub population: f64,
    /// Anchor offset in pixels so the popup sits on top of the circle.
    pub offset: [f64; 2],
    pub content: String,
    pub headline: String,
}

impl Popup {
    /// `None` when the feature has no numeric value for `attribute`.
    pub fn for_feature(
        feature: &CityFeature,
        attribute: &AttributeKey,
        radius: f64,
    ) -> Option<Self> {
        let population = finite_number(feature.attribute(attribute))?;
        let year = attribute.year().to_string();
        let city_html = escape_html(feature.city.as_deref().unwrap_or(""));
        let year_html = escape_html(&year);

        Some(Self {
            city: feature.city.clone(),
            attribute: attribute.clone(),
            content: format!(
                "<p><b>City:</b> {city_html}</p><p><b>Population in {year_html}:</b> {population} million</p>"
            ),
            headline: format!("<h2>{population} million</h2>"),
            year,
            population,
            offset: [0.0, -radius],
        })
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
