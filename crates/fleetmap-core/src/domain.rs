//! Domain records owned by the host application.
//!
//! The engine borrows these collections read-only on every tick and never
//! mutates them; invalid records are excluded from projection, not removed.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Operational status of a fleet asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    Online,
    Degraded,
    Offline,
    Maintenance,
    Tamper,
    /// Catch-all for statuses this build does not know about.
    /// Renders with the neutral fallback color.
    #[serde(other)]
    Unknown,
}

impl AssetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetStatus::Online => "online",
            AssetStatus::Degraded => "degraded",
            AssetStatus::Offline => "offline",
            AssetStatus::Maintenance => "maintenance",
            AssetStatus::Tamper => "tamper",
            AssetStatus::Unknown => "unknown",
        }
    }
}

/// A positioned generation asset (inverter, turbine, string combiner).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub site_id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub status: AssetStatus,
    /// Latest telemetry sample, if any has arrived for this asset.
    pub power_kw: Option<f64>,
    pub temp_c: Option<f64>,
    pub rated_capacity_kw: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkOrderPriority {
    Critical,
    High,
    Medium,
    Low,
}

impl WorkOrderPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkOrderPriority::Critical => "critical",
            WorkOrderPriority::High => "high",
            WorkOrderPriority::Medium => "medium",
            WorkOrderPriority::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: String,
    pub site_id: String,
    pub title: String,
    pub lat: f64,
    pub lon: f64,
    pub priority: WorkOrderPriority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl AlertSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertSeverity::Critical => "critical",
            AlertSeverity::High => "high",
            AlertSeverity::Medium => "medium",
            AlertSeverity::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub site_id: String,
    pub lat: f64,
    pub lon: f64,
    /// Alert category, e.g. `tamper`, `overheat`, `comms_loss`.
    pub kind: String,
    pub severity: AlertSeverity,
    pub acknowledged: bool,
    pub timestamp_ms: u64,
}

/// Administrative boundary: a closed polygon ring of `[lon, lat]` vertices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boundary {
    pub id: String,
    pub name: String,
    pub ring: Vec<[f64; 2]>,
}

/// Site-level KPI record joined onto assets by `site_id` (left-outer;
/// absent keys resolve to zeros).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiRecord {
    pub site_id: String,
    /// Performance ratio, 0–1 by convention.
    pub pr: f64,
    /// Availability in percent, 0–100.
    pub availability: f64,
    pub yield_kwh: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// Site-level risk assessment joined onto assets by `site_id`
/// (left-outer; absent keys resolve to score 0, level low).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub site_id: String,
    /// 0–1.
    pub score: f64,
    pub level: RiskLevel,
}

/// The fixed set of map layers the dashboard knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerId {
    Assets,
    Boundaries,
    Heatmap,
    WorkOrders,
    Alerts,
    RiskZones,
    Weather,
}

impl LayerId {
    pub fn as_str(self) -> &'static str {
        match self {
            LayerId::Assets => "assets",
            LayerId::Boundaries => "boundaries",
            LayerId::Heatmap => "heatmap",
            LayerId::WorkOrders => "workorders",
            LayerId::Alerts => "alerts",
            LayerId::RiskZones => "risk_zones",
            LayerId::Weather => "weather",
        }
    }

    pub const ALL: [LayerId; 7] = [
        LayerId::Assets,
        LayerId::Boundaries,
        LayerId::Heatmap,
        LayerId::WorkOrders,
        LayerId::Alerts,
        LayerId::RiskZones,
        LayerId::Weather,
    ];
}

/// How a layer is drawn on the surface. Determines the paint specification
/// and which opacity paint property applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Circle,
    Fill,
    Heatmap,
}

/// Host-owned layer configuration. The engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerConfig {
    pub id: LayerId,
    pub visible: bool,
    /// 0–1.
    pub opacity: f64,
    pub kind: LayerKind,
}

impl LayerConfig {
    /// Default configuration for the full layer set: entity layers visible,
    /// the heavier overlays off.
    pub fn defaults() -> Vec<LayerConfig> {
        LayerId::ALL
            .iter()
            .map(|&id| {
                let (visible, opacity, kind) = match id {
                    LayerId::Assets => (true, 1.0, LayerKind::Circle),
                    LayerId::Boundaries => (true, 0.3, LayerKind::Fill),
                    LayerId::Heatmap => (false, 0.7, LayerKind::Heatmap),
                    LayerId::WorkOrders => (true, 1.0, LayerKind::Circle),
                    LayerId::Alerts => (true, 1.0, LayerKind::Circle),
                    LayerId::RiskZones => (false, 0.4, LayerKind::Fill),
                    LayerId::Weather => (false, 0.5, LayerKind::Fill),
                };
                LayerConfig { id, visible, opacity, kind }
            })
            .collect()
    }
}

/// Host-driven narrowing of the asset and heatmap pipelines.
/// Edited outside the timer cadence; an edit is just another `update` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetFilter {
    /// Keep only these statuses when set.
    pub statuses: Option<HashSet<AssetStatus>>,
    /// Case-insensitive substring match on name or site id when set.
    pub query: Option<String>,
}

impl AssetFilter {
    pub fn matches(&self, asset: &Asset) -> bool {
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&asset.status) {
                return false;
            }
        }
        if let Some(query) = &self.query {
            let q = query.to_lowercase();
            if !asset.name.to_lowercase().contains(&q)
                && !asset.site_id.to_lowercase().contains(&q)
            {
                return false;
            }
        }
        true
    }
}

/// Camera state reported upward to the host on every camera move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub lon: f64,
    pub lat: f64,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

/// Everything the host hands the engine for one reconciliation pass.
/// All collections are borrowed; the engine never mutates them.
#[derive(Debug, Clone, Copy)]
pub struct TickInput<'a> {
    pub assets: &'a [Asset],
    pub work_orders: &'a [WorkOrder],
    pub alerts: &'a [Alert],
    pub boundaries: &'a [Boundary],
    pub kpis: &'a [KpiRecord],
    pub risks: &'a [RiskAssessment],
    pub layer_configs: &'a [LayerConfig],
    /// Metric name driving the heatmap weight; unknown names fall back
    /// to a constant mid weight.
    pub heatmap_metric: &'a str,
    pub filter: Option<&'a AssetFilter>,
    pub now_ms: u64,
}
