//! Fixed styling tables and paint specifications.
//!
//! Colors are resolved at projection time into `properties.color`; the paint
//! spec then references that property rather than baking colors per layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{AlertSeverity, AssetStatus, LayerKind, WorkOrderPriority};

// ── Color tables ─────────────────────────────────────────────────────────────

pub const COLOR_ONLINE: &str = "#22c55e";
pub const COLOR_DEGRADED: &str = "#f59e0b";
pub const COLOR_OFFLINE: &str = "#ef4444";
pub const COLOR_MAINTENANCE: &str = "#3b82f6";
pub const COLOR_TAMPER: &str = "#a855f7";
/// Fallback for statuses outside the known set.
pub const COLOR_NEUTRAL: &str = "#9ca3af";

pub const COLOR_CRITICAL: &str = "#dc2626";
pub const COLOR_HIGH: &str = "#ea580c";
pub const COLOR_MEDIUM: &str = "#ca8a04";
pub const COLOR_LOW: &str = "#16a34a";

pub fn asset_color(status: AssetStatus) -> &'static str {
    match status {
        AssetStatus::Online => COLOR_ONLINE,
        AssetStatus::Degraded => COLOR_DEGRADED,
        AssetStatus::Offline => COLOR_OFFLINE,
        AssetStatus::Maintenance => COLOR_MAINTENANCE,
        AssetStatus::Tamper => COLOR_TAMPER,
        AssetStatus::Unknown => COLOR_NEUTRAL,
    }
}

pub fn priority_color(priority: WorkOrderPriority) -> &'static str {
    match priority {
        WorkOrderPriority::Critical => COLOR_CRITICAL,
        WorkOrderPriority::High => COLOR_HIGH,
        WorkOrderPriority::Medium => COLOR_MEDIUM,
        WorkOrderPriority::Low => COLOR_LOW,
    }
}

pub fn severity_color(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::Critical => COLOR_CRITICAL,
        AlertSeverity::High => COLOR_HIGH,
        AlertSeverity::Medium => COLOR_MEDIUM,
        AlertSeverity::Low => COLOR_LOW,
    }
}

// ── Risk stroke rule ─────────────────────────────────────────────────────────

/// Circle stroke width in px from the site risk score:
/// `>0.7 → 3`, `>0.5 → 2`, else `1`.
pub fn stroke_width_for_risk(risk: f64) -> f64 {
    if risk > 0.7 {
        3.0
    } else if risk > 0.5 {
        2.0
    } else {
        1.0
    }
}

// ── Paint specification ──────────────────────────────────────────────────────

/// How the circle stroke width is driven.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StrokeRule {
    Fixed(f64),
    /// Per-feature width from the `riskScore` property through
    /// [`stroke_width_for_risk`].
    RiskThresholds,
}

/// Equality filter on one feature property, e.g. `severity == critical`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFilter {
    pub property: String,
    pub equals: Value,
}

/// Renderer-neutral paint specification handed to the surface at layer
/// creation. Zoom-interpolated radius, color from `properties.color`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaintSpec {
    /// `(zoom, radius_px)` interpolation stops for circle layers.
    pub radius_stops: Vec<(f64, f64)>,
    /// Property supplying the per-feature color, when data-driven.
    pub color_property: Option<String>,
    pub stroke_rule: StrokeRule,
    pub opacity: f64,
    pub filter: Option<PropertyFilter>,
}

/// Default radius interpolation: small markers zoomed out, readable close up.
const RADIUS_STOPS: [(f64, f64); 3] = [(4.0, 2.0), (10.0, 6.0), (16.0, 12.0)];

/// The paint specification for a layer of the given kind.
pub fn paint_for(kind: LayerKind, opacity: f64) -> PaintSpec {
    match kind {
        LayerKind::Circle => PaintSpec {
            radius_stops: RADIUS_STOPS.to_vec(),
            color_property: Some("color".into()),
            stroke_rule: StrokeRule::RiskThresholds,
            opacity,
            filter: None,
        },
        LayerKind::Fill => PaintSpec {
            radius_stops: Vec::new(),
            color_property: Some("color".into()),
            stroke_rule: StrokeRule::Fixed(1.0),
            opacity,
            filter: None,
        },
        LayerKind::Heatmap => PaintSpec {
            radius_stops: RADIUS_STOPS.to_vec(),
            color_property: None,
            stroke_rule: StrokeRule::Fixed(0.0),
            opacity,
            filter: None,
        },
    }
}

// ── Critical-alert pulse ─────────────────────────────────────────────────────

/// Period of the critical-alert pulse animation.
pub const PULSE_PERIOD_MS: u64 = 2000;

/// Pulse opacity for the critical-alert sub-layer: a triangle wave of
/// `now_ms mod 2000`, ranging 0.2–1.0 so the marker never fully vanishes.
pub fn pulse_opacity(now_ms: u64) -> f64 {
    let phase = (now_ms % PULSE_PERIOD_MS) as f64 / PULSE_PERIOD_MS as f64;
    let tri = if phase < 0.5 { phase * 2.0 } else { 2.0 - phase * 2.0 };
    0.2 + 0.8 * tri
}

/// Paint for the pulse sub-layer: same circles, filtered to critical
/// severity, opacity driven per tick.
pub fn pulse_paint(now_ms: u64) -> PaintSpec {
    PaintSpec {
        radius_stops: RADIUS_STOPS.iter().map(|&(z, r)| (z, r * 1.8)).collect(),
        color_property: Some("color".into()),
        stroke_rule: StrokeRule::Fixed(0.0),
        opacity: pulse_opacity(now_ms),
        filter: Some(PropertyFilter { property: "severity".into(), equals: Value::String("critical".into()) }),
    }
}
