//! Layer lifecycle state machine.
//!
//! The planner is pure: `(prev state, desired config, features) → (next
//! state, adapter calls)`, so the call list is testable without a real
//! surface. Execution applies the calls in order; the first failure abandons
//! the batch for this tick and the previous state is kept (no partial phase
//! transition is ever committed).
//!
//! Central invariants: handlers are bound exactly once per layer lifetime,
//! and the source/layer objects are never recreated while a layer stays
//! visible. Data refreshes go through an in-place source-data replace.

use log::{debug, warn};
use serde_json::json;

use crate::domain::{LayerConfig, LayerId, LayerKind};
use crate::feature::Feature;
use crate::project::style::{paint_for, pulse_opacity, pulse_paint, PaintSpec};
use crate::surface::{PointerEvent, RenderSurface, SurfaceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayerPhase {
    #[default]
    Absent,
    Created,
}

/// Reconciler-private per-layer state. Never shared with the host.
#[derive(Debug, Clone, Default)]
pub struct LayerState {
    pub phase: LayerPhase,
    pub last_feature_count: usize,
    pub handlers_bound: bool,
    /// Last collection sent to the surface, kept so an identical tick
    /// issues no redundant data replace.
    last_features: Vec<Feature>,
    last_opacity: f64,
    last_pulse_opacity: Option<f64>,
}

/// One planned call against the rendering surface.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterCall {
    CreateSource { id: String, features: Vec<Feature> },
    UpdateSourceData { id: String, features: Vec<Feature> },
    RemoveSource { id: String },
    AddLayer { id: String, source_id: String, kind: LayerKind, paint: PaintSpec },
    RemoveLayer { id: String },
    SetPaintProperty { id: String, prop: String, value: serde_json::Value },
    /// Expands to one `on` registration per pointer event type.
    BindHandlers { id: String },
}

/// Id of the critical-alert pulse sub-layer riding on a layer's source.
pub fn pulse_layer_id(id: LayerId) -> String {
    format!("{}-pulse", id.as_str())
}

fn has_pulse(cfg: &LayerConfig) -> bool {
    cfg.id == LayerId::Alerts
}

fn opacity_prop(kind: LayerKind) -> &'static str {
    match kind {
        LayerKind::Circle => "circle-opacity",
        LayerKind::Fill => "fill-opacity",
        LayerKind::Heatmap => "heatmap-opacity",
    }
}

/// Decide the calls that converge the surface to the desired layer state.
///
/// Pure; the returned state must only be committed after every call has
/// been applied successfully.
pub fn plan(
    prev: &LayerState,
    cfg: &LayerConfig,
    features: &[Feature],
    now_ms: u64,
) -> (LayerState, Vec<AdapterCall>) {
    let id = cfg.id.as_str();
    let want = cfg.visible && !features.is_empty();

    match (prev.phase, want) {
        // Teardown is always explicit: visibility off, engine dispose, or a
        // populated layer whose input emptied out. An empty layer is never
        // retained or created.
        (LayerPhase::Created, false) => {
            let mut calls = Vec::new();
            if has_pulse(cfg) {
                calls.push(AdapterCall::RemoveLayer { id: pulse_layer_id(cfg.id) });
            }
            calls.push(AdapterCall::RemoveLayer { id: id.into() });
            calls.push(AdapterCall::RemoveSource { id: id.into() });
            (LayerState::default(), calls)
        }
        (LayerPhase::Absent, false) => (prev.clone(), Vec::new()),

        (LayerPhase::Absent, true) => {
            let mut calls = vec![
                AdapterCall::CreateSource { id: id.into(), features: features.to_vec() },
                AdapterCall::AddLayer {
                    id: id.into(),
                    source_id: id.into(),
                    kind: cfg.kind,
                    paint: paint_for(cfg.kind, cfg.opacity),
                },
            ];
            let mut pulse = None;
            if has_pulse(cfg) {
                calls.push(AdapterCall::AddLayer {
                    id: pulse_layer_id(cfg.id),
                    source_id: id.into(),
                    kind: cfg.kind,
                    paint: pulse_paint(now_ms),
                });
                pulse = Some(pulse_opacity(now_ms));
            }
            calls.push(AdapterCall::BindHandlers { id: id.into() });

            let next = LayerState {
                phase: LayerPhase::Created,
                last_feature_count: features.len(),
                handlers_bound: true,
                last_features: features.to_vec(),
                last_opacity: cfg.opacity,
                last_pulse_opacity: pulse,
            };
            (next, calls)
        }

        (LayerPhase::Created, true) => {
            let mut next = prev.clone();
            let mut calls = Vec::new();

            if features != prev.last_features.as_slice() {
                calls.push(AdapterCall::UpdateSourceData { id: id.into(), features: features.to_vec() });
                next.last_features = features.to_vec();
                next.last_feature_count = features.len();
            }
            if cfg.opacity != prev.last_opacity {
                calls.push(AdapterCall::SetPaintProperty {
                    id: id.into(),
                    prop: opacity_prop(cfg.kind).into(),
                    value: json!(cfg.opacity),
                });
                next.last_opacity = cfg.opacity;
            }
            if has_pulse(cfg) {
                let opacity = pulse_opacity(now_ms);
                if prev.last_pulse_opacity != Some(opacity) {
                    calls.push(AdapterCall::SetPaintProperty {
                        id: pulse_layer_id(cfg.id),
                        prop: "circle-opacity".into(),
                        value: json!(opacity),
                    });
                    next.last_pulse_opacity = Some(opacity);
                }
            }
            (next, calls)
        }
    }
}

/// Apply planned calls to the surface, stopping at the first failure.
///
/// Both directions are convergent so a layer whose previous tick failed
/// halfway can settle instead of tripping on duplicate or unknown ids:
/// create-or-update on the way up (an existing source takes a data replace,
/// an existing layer is left alone), remove-if-present on the way down.
pub fn apply<S: RenderSurface>(surface: &mut S, calls: &[AdapterCall]) -> Result<(), SurfaceError> {
    for call in calls {
        match call {
            AdapterCall::CreateSource { id, features } => {
                if surface.source_exists(id) {
                    surface.update_source_data(id, features)?;
                } else {
                    surface.create_source(id, features)?;
                }
            }
            AdapterCall::UpdateSourceData { id, features } => {
                surface.update_source_data(id, features)?;
            }
            AdapterCall::RemoveSource { id } => {
                if surface.source_exists(id) {
                    surface.remove_source(id)?;
                }
            }
            AdapterCall::AddLayer { id, source_id, kind, paint } => {
                if !surface.layer_exists(id) {
                    surface.add_layer(id, source_id, *kind, paint)?;
                }
            }
            AdapterCall::RemoveLayer { id } => {
                if surface.layer_exists(id) {
                    surface.remove_layer(id)?;
                }
            }
            AdapterCall::SetPaintProperty { id, prop, value } => {
                surface.set_paint_property(id, prop, value.clone())?;
            }
            AdapterCall::BindHandlers { id } => {
                surface.on(PointerEvent::Enter, id)?;
                surface.on(PointerEvent::Leave, id)?;
                surface.on(PointerEvent::Click, id)?;
            }
        }
    }
    Ok(())
}

/// One reconciliation step for a single layer: plan, apply, commit.
///
/// A surface failure is absorbed here; the layer keeps its previous state
/// and other layers are unaffected.
pub fn reconcile<S: RenderSurface>(
    surface: &mut S,
    state: &mut LayerState,
    cfg: &LayerConfig,
    features: &[Feature],
    now_ms: u64,
) {
    if cfg.visible && features.is_empty() && state.phase == LayerPhase::Absent {
        debug!("layer {}: no renderable features, create skipped", cfg.id.as_str());
    }

    let (next, calls) = plan(state, cfg, features, now_ms);
    if calls.is_empty() {
        *state = next;
        return;
    }
    match apply(surface, &calls) {
        Ok(()) => *state = next,
        Err(err) => {
            warn!(
                "layer {}: surface call failed, phase {:?} retained: {}",
                cfg.id.as_str(),
                state.phase,
                err
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{RecordedCall, RecordingSurface};
    use serde_json::Map;

    fn feature(id: &str) -> Feature {
        let mut props = Map::new();
        props.insert("id".into(), serde_json::json!(id));
        props.insert("severity".into(), serde_json::json!("critical"));
        Feature::point(77.5, 12.9, props)
    }

    fn cfg(id: LayerId, visible: bool, opacity: f64) -> LayerConfig {
        LayerConfig { id, visible, opacity, kind: LayerKind::Circle }
    }

    fn create_calls(surface: &RecordingSurface) -> usize {
        surface.count(|c| matches!(c, RecordedCall::CreateSource { .. } | RecordedCall::AddLayer { .. }))
    }

    #[test]
    fn empty_to_populated_transition() {
        let mut surface = RecordingSurface::new();
        let mut state = LayerState::default();
        let assets = cfg(LayerId::Assets, true, 1.0);

        reconcile(&mut surface, &mut state, &assets, &[], 0);
        assert_eq!(state.phase, LayerPhase::Absent);
        assert!(surface.calls.is_empty());

        reconcile(&mut surface, &mut state, &assets, &[feature("a1")], 0);
        assert_eq!(state.phase, LayerPhase::Created);
        assert_eq!(surface.count(|c| matches!(c, RecordedCall::CreateSource { .. })), 1);
        assert_eq!(surface.count(|c| matches!(c, RecordedCall::AddLayer { .. })), 1);
    }

    #[test]
    fn identical_tick_issues_no_calls() {
        let mut surface = RecordingSurface::new();
        let mut state = LayerState::default();
        let assets = cfg(LayerId::Assets, true, 0.8);
        let features = vec![feature("a1"), feature("a2")];

        reconcile(&mut surface, &mut state, &assets, &features, 100);
        let after_create = surface.calls.len();

        reconcile(&mut surface, &mut state, &assets, &features, 100);
        assert_eq!(surface.calls.len(), after_create, "second identical tick must be silent");
        assert_eq!(state.phase, LayerPhase::Created);
    }

    #[test]
    fn data_refresh_replaces_in_place() {
        let mut surface = RecordingSurface::new();
        let mut state = LayerState::default();
        let assets = cfg(LayerId::Assets, true, 1.0);

        reconcile(&mut surface, &mut state, &assets, &[feature("a1")], 0);
        reconcile(&mut surface, &mut state, &assets, &[feature("a1"), feature("a2")], 0);

        assert_eq!(surface.count(|c| matches!(c, RecordedCall::UpdateSourceData { .. })), 1);
        // Still the original source and layer objects.
        assert_eq!(create_calls(&surface), 2);
        assert_eq!(state.last_feature_count, 2);
    }

    #[test]
    fn handlers_bind_once_across_many_ticks() {
        let mut surface = RecordingSurface::new();
        let mut state = LayerState::default();
        let assets = cfg(LayerId::Assets, true, 1.0);

        for tick in 0..10u64 {
            let features = vec![feature(&format!("a{}", tick))];
            reconcile(&mut surface, &mut state, &assets, &features, tick * 5_000);
        }
        assert_eq!(surface.count(|c| matches!(c, RecordedCall::On { .. })), 3);
        assert_eq!(surface.handler_count("assets"), 3);
        assert!(state.handlers_bound);
    }

    #[test]
    fn opacity_change_issues_single_paint_update() {
        let mut surface = RecordingSurface::new();
        let mut state = LayerState::default();
        let features = vec![feature("a1")];

        reconcile(&mut surface, &mut state, &cfg(LayerId::Assets, true, 1.0), &features, 0);
        reconcile(&mut surface, &mut state, &cfg(LayerId::Assets, true, 0.5), &features, 0);

        let paints: Vec<_> = surface
            .calls
            .iter()
            .filter_map(|c| match c {
                RecordedCall::SetPaintProperty { id, prop } => Some((id.clone(), prop.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(paints, vec![("assets".to_string(), "circle-opacity".to_string())]);
    }

    #[test]
    fn teardown_from_created_is_one_remove_pair() {
        let mut surface = RecordingSurface::new();
        let mut state = LayerState::default();

        reconcile(&mut surface, &mut state, &cfg(LayerId::Assets, true, 1.0), &[feature("a1")], 0);
        reconcile(&mut surface, &mut state, &cfg(LayerId::Assets, false, 1.0), &[feature("a1")], 0);

        assert_eq!(state.phase, LayerPhase::Absent);
        assert_eq!(surface.count(|c| matches!(c, RecordedCall::RemoveLayer { .. })), 1);
        assert_eq!(surface.count(|c| matches!(c, RecordedCall::RemoveSource { .. })), 1);

        // Already absent: toggling visibility again issues nothing.
        let before = surface.calls.len();
        reconcile(&mut surface, &mut state, &cfg(LayerId::Assets, false, 1.0), &[feature("a1")], 0);
        assert_eq!(surface.calls.len(), before);
    }

    #[test]
    fn emptied_input_tears_the_layer_down() {
        let mut surface = RecordingSurface::new();
        let mut state = LayerState::default();
        let assets = cfg(LayerId::Assets, true, 1.0);

        reconcile(&mut surface, &mut state, &assets, &[feature("a1")], 0);
        reconcile(&mut surface, &mut state, &assets, &[], 0);

        assert_eq!(state.phase, LayerPhase::Absent);
        assert!(!surface.layer_exists("assets"));
        assert!(!surface.source_exists("assets"));
    }

    #[test]
    fn failure_keeps_previous_phase_and_recovers() {
        let mut surface = RecordingSurface::new();
        let mut state = LayerState::default();
        let assets = cfg(LayerId::Assets, true, 1.0);
        let features = vec![feature("a1")];

        surface.fail_on("add_layer");
        reconcile(&mut surface, &mut state, &assets, &features, 0);
        assert_eq!(state.phase, LayerPhase::Absent, "no partial transition");
        // The source landed before the failure; the retry must converge
        // without a duplicate-id error.
        assert!(surface.source_exists("assets"));

        surface.clear_failures();
        reconcile(&mut surface, &mut state, &assets, &features, 0);
        assert_eq!(state.phase, LayerPhase::Created);
        assert!(surface.layer_exists("assets"));
        assert_eq!(surface.handler_count("assets"), 3);
    }

    #[test]
    fn teardown_converges_after_transient_failure() {
        let mut surface = RecordingSurface::new();
        let mut state = LayerState::default();
        let features = vec![feature("a1")];

        reconcile(&mut surface, &mut state, &cfg(LayerId::Assets, true, 1.0), &features, 0);
        assert_eq!(state.phase, LayerPhase::Created);

        // The layer removal lands, the source removal fails: no partial
        // transition, so the phase stays Created with the source stranded.
        surface.fail_on("remove_source");
        reconcile(&mut surface, &mut state, &cfg(LayerId::Assets, false, 1.0), &features, 0);
        assert_eq!(state.phase, LayerPhase::Created, "no partial transition");
        assert!(!surface.layer_exists("assets"));
        assert!(surface.source_exists("assets"));

        // Once the failure clears, the replanned teardown must settle
        // rather than trip on the already-removed layer.
        surface.clear_failures();
        reconcile(&mut surface, &mut state, &cfg(LayerId::Assets, false, 1.0), &features, 0);
        assert_eq!(state.phase, LayerPhase::Absent);
        assert!(!surface.source_exists("assets"));

        // And a re-show from here goes through a full create again.
        reconcile(&mut surface, &mut state, &cfg(LayerId::Assets, true, 1.0), &features, 0);
        assert_eq!(state.phase, LayerPhase::Created);
        assert!(surface.layer_exists("assets"));
    }

    #[test]
    fn alerts_carry_a_pulse_sublayer() {
        let mut surface = RecordingSurface::new();
        let mut state = LayerState::default();
        let alerts = cfg(LayerId::Alerts, true, 1.0);
        let features = vec![feature("A1")];

        reconcile(&mut surface, &mut state, &alerts, &features, 0);
        assert!(surface.layer_exists("alerts"));
        assert!(surface.layer_exists("alerts-pulse"));
        // Handlers bind on the base layer only.
        assert_eq!(surface.handler_count("alerts-pulse"), 0);

        // Same data, later in the pulse period: only the pulse opacity moves.
        let before = surface.calls.len();
        reconcile(&mut surface, &mut state, &alerts, &features, 500);
        assert_eq!(surface.calls.len(), before + 1);
        assert!(matches!(
            surface.calls.last(),
            Some(RecordedCall::SetPaintProperty { id, prop })
                if id == "alerts-pulse" && prop == "circle-opacity"
        ));

        // Teardown removes the pulse sub-layer first, then the pair.
        reconcile(&mut surface, &mut state, &cfg(LayerId::Alerts, false, 1.0), &features, 600);
        assert!(!surface.layer_exists("alerts-pulse"));
        assert!(!surface.layer_exists("alerts"));
        assert!(!surface.source_exists("alerts"));
    }
}
