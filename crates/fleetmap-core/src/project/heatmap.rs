//! Heatmap weight normalization.
//!
//! Maps a selected metric name and an asset + KPI pair to a scalar weight
//! in [0, 1]. Missing fields take defined defaults; NaN from any arithmetic
//! collapses to 0 rather than propagating into the renderer.

use crate::domain::{Asset, KpiRecord};

/// Fallback weight for metric names this build does not know about.
pub const UNKNOWN_METRIC_WEIGHT: f64 = 0.5;

/// Compute the heatmap weight for one asset under the selected metric.
///
/// - `power`: `power_kw / rated_capacity_kw`; missing power counts as 0.
/// - `pr`: KPI performance ratio directly; default 0.
/// - `availability`: KPI availability percent / 100; default 0.
/// - `temperature`: `max(0, 1 − (temp_c − 25) / 50)`; missing temp is
///   treated as 25 °C, i.e. weight 1.0.
///
/// The result is always finite and clamped to [0, 1].
pub fn heatmap_weight(metric: &str, asset: &Asset, kpi: Option<&KpiRecord>) -> f64 {
    let raw = match metric {
        "power" => {
            let power = asset.power_kw.unwrap_or(0.0);
            finite_or_zero(power / asset.rated_capacity_kw)
        }
        "pr" => kpi.map(|k| k.pr).unwrap_or(0.0),
        "availability" => kpi.map(|k| k.availability / 100.0).unwrap_or(0.0),
        "temperature" => {
            let temp = asset.temp_c.unwrap_or(25.0);
            1.0 - (temp - 25.0) / 50.0
        }
        _ => UNKNOWN_METRIC_WEIGHT,
    };
    finite_or_zero(raw).clamp(0.0, 1.0)
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
