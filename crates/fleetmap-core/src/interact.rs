//! Popup construction and click resolution.
//!
//! Handlers are registered on the surface once per layer lifetime (by the
//! reconciler's create transition); this module only decides what a hover
//! shows and which domain entity a click resolves to.

use std::collections::HashSet;

use crate::domain::{LayerId, TickInput};
use crate::feature::Feature;

#[derive(Debug, Clone, PartialEq)]
pub struct PopupRow {
    pub label: String,
    pub value: String,
}

/// Transient popup descriptor: title plus key-value rows sourced from the
/// hovered feature's properties. The surface renders it; the engine removes
/// it on pointer-leave.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupContent {
    pub title: String,
    pub rows: Vec<PopupRow>,
}

fn row(feature: &Feature, key: &str, label: &str) -> Option<PopupRow> {
    let value = match feature.properties.get(key)? {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(v) if v.fract() == 0.0 => format!("{}", v as i64),
            Some(v) => format!("{:.2}", v),
            None => n.to_string(),
        },
        other => other.to_string(),
    };
    Some(PopupRow { label: label.into(), value })
}

/// Build the hover popup for a feature on the given layer.
///
/// Each layer whitelists the properties worth showing; everything else in
/// the bag stays renderer-internal.
pub fn popup_for(layer: LayerId, feature: &Feature) -> PopupContent {
    let title = feature
        .prop_str("name")
        .or_else(|| feature.prop_str("title"))
        .or_else(|| feature.prop_str("kind"))
        .or_else(|| feature.id())
        .unwrap_or("feature")
        .to_string();

    let keys: &[(&str, &str)] = match layer {
        LayerId::Assets => &[
            ("status", "Status"),
            ("powerKw", "Power (kW)"),
            ("pr", "PR"),
            ("availability", "Availability (%)"),
            ("riskScore", "Risk score"),
        ],
        LayerId::WorkOrders => &[("priority", "Priority"), ("siteId", "Site")],
        LayerId::Alerts => &[("severity", "Severity"), ("kind", "Type"), ("siteId", "Site")],
        LayerId::Boundaries => &[("name", "Region")],
        LayerId::Heatmap | LayerId::RiskZones | LayerId::Weather => &[],
    };

    let rows = keys.iter().filter_map(|&(key, label)| row(feature, key, label)).collect();
    PopupContent { title, rows }
}

/// Index of entity ids present in the current tick, used to resolve clicks.
/// A click on an id that fell out of the collections between tick and click
/// is a no-op, not an error.
#[derive(Debug, Default)]
pub struct EntityIndex {
    ids: HashSet<String>,
}

impl EntityIndex {
    pub fn from_input(input: &TickInput<'_>) -> Self {
        let mut ids = HashSet::new();
        ids.extend(input.assets.iter().map(|a| a.id.clone()));
        ids.extend(input.work_orders.iter().map(|w| w.id.clone()));
        ids.extend(input.alerts.iter().map(|a| a.id.clone()));
        Self { ids }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }
}
