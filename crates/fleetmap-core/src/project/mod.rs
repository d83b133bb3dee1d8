//! Per-entity-type feature projection.
//!
//! Each projector maps validated domain records (plus any joined secondary
//! data) into renderer-neutral features. KPI and risk joins are left-outer
//! by `site_id`: an absent key resolves to zeros / `low`, never an error.

pub mod heatmap;
pub mod style;

use std::collections::HashMap;

use serde_json::{json, Map, Value};

use crate::domain::{Alert, Asset, Boundary, KpiRecord, RiskAssessment, WorkOrder};
use crate::feature::Feature;
use crate::geo::ring_in_range;
use heatmap::heatmap_weight;
use style::{asset_color, priority_color, severity_color};

fn kpi_index(kpis: &[KpiRecord]) -> HashMap<&str, &KpiRecord> {
    kpis.iter().map(|k| (k.site_id.as_str(), k)).collect()
}

fn risk_index(risks: &[RiskAssessment]) -> HashMap<&str, &RiskAssessment> {
    risks.iter().map(|r| (r.site_id.as_str(), r)).collect()
}

/// Project assets to point features with status color, risk score, and
/// KPI fields joined in.
pub fn project_assets(
    assets: &[&Asset],
    kpis: &[KpiRecord],
    risks: &[RiskAssessment],
) -> Vec<Feature> {
    let kpi_by_site = kpi_index(kpis);
    let risk_by_site = risk_index(risks);

    assets
        .iter()
        .map(|asset| {
            let kpi = kpi_by_site.get(asset.site_id.as_str());
            let risk = risk_by_site.get(asset.site_id.as_str());

            let mut props = Map::new();
            props.insert("id".into(), json!(asset.id));
            props.insert("siteId".into(), json!(asset.site_id));
            props.insert("name".into(), json!(asset.name));
            props.insert("status".into(), json!(asset.status.as_str()));
            props.insert("color".into(), json!(asset_color(asset.status)));
            props.insert("powerKw".into(), json!(asset.power_kw.unwrap_or(0.0)));
            props.insert("riskScore".into(), json!(risk.map(|r| r.score).unwrap_or(0.0)));
            props.insert(
                "riskLevel".into(),
                json!(risk.map(|r| r.level.as_str()).unwrap_or("low")),
            );
            props.insert("pr".into(), json!(kpi.map(|k| k.pr).unwrap_or(0.0)));
            props.insert("availability".into(), json!(kpi.map(|k| k.availability).unwrap_or(0.0)));
            props.insert("yield".into(), json!(kpi.map(|k| k.yield_kwh).unwrap_or(0.0)));

            Feature::point(asset.lon, asset.lat, props)
        })
        .collect()
}

/// Project work orders to point features colored by priority.
pub fn project_work_orders(orders: &[&WorkOrder]) -> Vec<Feature> {
    orders
        .iter()
        .map(|order| {
            let mut props = Map::new();
            props.insert("id".into(), json!(order.id));
            props.insert("siteId".into(), json!(order.site_id));
            props.insert("title".into(), json!(order.title));
            props.insert("priority".into(), json!(order.priority.as_str()));
            props.insert("color".into(), json!(priority_color(order.priority)));
            Feature::point(order.lon, order.lat, props)
        })
        .collect()
}

/// Project alerts to point features. Acknowledged alerts are skipped;
/// `timestampMillis` feeds the critical-pulse styling downstream.
pub fn project_alerts(alerts: &[&Alert]) -> Vec<Feature> {
    alerts
        .iter()
        .filter(|alert| !alert.acknowledged)
        .map(|alert| {
            let mut props = Map::new();
            props.insert("id".into(), json!(alert.id));
            props.insert("siteId".into(), json!(alert.site_id));
            props.insert("kind".into(), json!(alert.kind));
            props.insert("severity".into(), json!(alert.severity.as_str()));
            props.insert("color".into(), json!(severity_color(alert.severity)));
            props.insert("timestampMillis".into(), json!(alert.timestamp_ms));
            Feature::point(alert.lon, alert.lat, props)
        })
        .collect()
}

/// Project administrative boundaries to polygon features. Rings with any
/// out-of-range vertex are excluded the same way invalid points are.
pub fn project_boundaries(boundaries: &[Boundary]) -> Vec<Feature> {
    boundaries
        .iter()
        .filter(|b| ring_in_range(&b.ring))
        .map(|b| {
            let mut props = Map::new();
            props.insert("id".into(), json!(b.id));
            props.insert("name".into(), json!(b.name));
            props.insert("color".into(), json!(style::COLOR_NEUTRAL));
            Feature::polygon(b.ring.clone(), props)
        })
        .collect()
}

/// Project assets to single-property heatmap samples under the selected
/// metric.
pub fn project_heatmap(assets: &[&Asset], kpis: &[KpiRecord], metric: &str) -> Vec<Feature> {
    let kpi_by_site = kpi_index(kpis);

    assets
        .iter()
        .map(|asset| {
            let kpi = kpi_by_site.get(asset.site_id.as_str()).copied();
            let mut props = Map::new();
            props.insert("weight".into(), Value::from(heatmap_weight(metric, asset, kpi)));
            Feature::point(asset.lon, asset.lat, props)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AlertSeverity, AssetStatus, RiskLevel};
    use crate::geo::validate;

    fn asset(id: &str, site: &str, status: AssetStatus) -> Asset {
        Asset {
            id: id.into(),
            site_id: site.into(),
            name: format!("{}-name", id),
            lat: 12.9,
            lon: 77.5,
            status,
            power_kw: Some(40.0),
            temp_c: Some(30.0),
            rated_capacity_kw: 100.0,
        }
    }

    #[test]
    fn asset_status_colors_resolve() {
        let tampered = asset("a1", "s1", AssetStatus::Tamper);
        let odd = asset("a2", "s1", AssetStatus::Unknown);
        let features = project_assets(&[&tampered, &odd], &[], &[]);

        assert_eq!(features[0].prop_str("color"), Some(style::COLOR_TAMPER));
        assert_eq!(features[1].prop_str("color"), Some(style::COLOR_NEUTRAL));
    }

    #[test]
    fn joins_are_left_outer_with_defaults() {
        let a = asset("a1", "site-x", AssetStatus::Online);
        let kpis = vec![KpiRecord {
            site_id: "site-x".into(),
            pr: 0.82,
            availability: 98.5,
            yield_kwh: 410.0,
        }];
        let risks = vec![RiskAssessment { site_id: "site-x".into(), score: 0.8, level: RiskLevel::High }];

        let joined = &project_assets(&[&a], &kpis, &risks)[0];
        assert_eq!(joined.prop_f64("pr"), Some(0.82));
        assert_eq!(joined.prop_f64("riskScore"), Some(0.8));
        assert_eq!(joined.prop_str("riskLevel"), Some("high"));

        let b = asset("b1", "site-unmatched", AssetStatus::Online);
        let bare = &project_assets(&[&b], &kpis, &risks)[0];
        assert_eq!(bare.prop_f64("pr"), Some(0.0));
        assert_eq!(bare.prop_f64("availability"), Some(0.0));
        assert_eq!(bare.prop_f64("riskScore"), Some(0.0));
        assert_eq!(bare.prop_str("riskLevel"), Some("low"));
    }

    #[test]
    fn alerts_filter_acknowledged_and_invalid() {
        let mk = |id: &str, acknowledged: bool, lat: f64, lon: f64| Alert {
            id: id.into(),
            site_id: "s1".into(),
            lat,
            lon,
            kind: "tamper".into(),
            severity: AlertSeverity::High,
            acknowledged,
            timestamp_ms: 1_000,
        };
        let alerts = vec![
            mk("A1", true, 12.9, 77.5),
            mk("A2", false, 999.0, 0.0),
            mk("A3", false, 12.9, 77.5),
        ];

        let features = project_alerts(&validate(&alerts));
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].id(), Some("A3"));
    }

    #[test]
    fn boundary_projection_carries_name() {
        let boundaries = vec![
            Boundary {
                id: "b1".into(),
                name: "North Zone".into(),
                ring: vec![[77.5, 12.9], [77.6, 12.9], [77.6, 13.0], [77.5, 12.9]],
            },
            Boundary { id: "b2".into(), name: "Broken".into(), ring: vec![[999.0, 0.0], [0.0, 0.0], [1.0, 1.0]] },
        ];
        let features = project_boundaries(&boundaries);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].prop_str("name"), Some("North Zone"));
    }

    #[test]
    fn heatmap_features_carry_single_weight() {
        let a = asset("a1", "s1", AssetStatus::Online);
        let features = project_heatmap(&[&a], &[], "power");
        assert_eq!(features[0].properties.len(), 1);
        let w = features[0].prop_f64("weight").unwrap();
        assert!((w - 0.4).abs() < 1e-12);
    }
}
