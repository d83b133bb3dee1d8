//! Engine: one reconciliation pass per tick over all configured layers,
//! pointer-event dispatch, and teardown.
//!
//! The engine exclusively owns its surface and all per-layer state. Domain
//! collections arrive borrowed in a [`TickInput`] and are never mutated.
//! Nothing here propagates an error to the host: adapter failures are
//! absorbed per layer, a partially-rendered map being preferable to a
//! crashed dashboard.

use std::collections::HashMap;

use log::{debug, warn};

use crate::domain::{LayerConfig, LayerId, TickInput, ViewState};
use crate::feature::Feature;
use crate::geo::{coord_in_range, Positioned};
use crate::interact::{popup_for, EntityIndex};
use crate::project::{
    project_alerts, project_assets, project_boundaries, project_heatmap, project_work_orders,
};
use crate::reconcile::{reconcile, LayerPhase, LayerState};
use crate::surface::RenderSurface;

pub type EntityClickHandler = Box<dyn FnMut(&str)>;
pub type ViewStateHandler = Box<dyn FnMut(ViewState)>;

pub struct MapEngine<S: RenderSurface> {
    surface: S,
    states: HashMap<LayerId, LayerState>,
    /// Last seen config per layer, kept for dispose-time teardown.
    configs: HashMap<LayerId, LayerConfig>,
    /// Layers in creation order; dispose tears down in reverse.
    created_order: Vec<LayerId>,
    entity_index: EntityIndex,
    on_entity_click: Option<EntityClickHandler>,
    on_view_state_change: Option<ViewStateHandler>,
    disposed: bool,
}

impl<S: RenderSurface> MapEngine<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            states: HashMap::new(),
            configs: HashMap::new(),
            created_order: Vec::new(),
            entity_index: EntityIndex::default(),
            on_entity_click: None,
            on_view_state_change: None,
            disposed: false,
        }
    }

    pub fn set_on_entity_click(&mut self, handler: EntityClickHandler) {
        self.on_entity_click = Some(handler);
    }

    pub fn set_on_view_state_change(&mut self, handler: ViewStateHandler) {
        self.on_view_state_change = Some(handler);
    }

    /// The owned surface, for hosts that pump pointer events from it.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn layer_phase(&self, id: LayerId) -> LayerPhase {
        self.states.get(&id).map(|s| s.phase).unwrap_or_default()
    }

    /// One full reconciliation pass. Layers are independent: a failure on
    /// one leaves the others untouched.
    pub fn update(&mut self, input: &TickInput<'_>) {
        if self.disposed {
            warn!("update called on a disposed engine, ignoring");
            return;
        }

        self.entity_index = EntityIndex::from_input(input);

        for cfg in input.layer_configs {
            let features = self.project_layer(cfg.id, input);
            let state = self.states.entry(cfg.id).or_default();
            let was = state.phase;
            reconcile(&mut self.surface, state, cfg, &features, input.now_ms);
            let now = state.phase;

            match (was, now) {
                (LayerPhase::Absent, LayerPhase::Created) => self.created_order.push(cfg.id),
                (LayerPhase::Created, LayerPhase::Absent) => {
                    self.created_order.retain(|&id| id != cfg.id)
                }
                _ => {}
            }
            self.configs.insert(cfg.id, cfg.clone());
        }
    }

    /// Validate and project one layer's input collection.
    fn project_layer(&self, id: LayerId, input: &TickInput<'_>) -> Vec<Feature> {
        let features = match id {
            LayerId::Assets => {
                let assets = self.filtered_assets(input);
                let valid = validate_logged(id, assets);
                project_assets(&valid, input.kpis, input.risks)
            }
            LayerId::WorkOrders => {
                let valid = validate_logged(id, input.work_orders.iter().collect());
                project_work_orders(&valid)
            }
            LayerId::Alerts => {
                let valid = validate_logged(id, input.alerts.iter().collect());
                project_alerts(&valid)
            }
            LayerId::Boundaries => {
                let received = input.boundaries.len();
                let features = project_boundaries(input.boundaries);
                if features.len() < received {
                    warn!(
                        "layer {}: excluded {} of {} boundaries with invalid rings",
                        id.as_str(),
                        received - features.len(),
                        received
                    );
                }
                features
            }
            LayerId::Heatmap => {
                let assets = self.filtered_assets(input);
                let valid = validate_logged(id, assets);
                project_heatmap(&valid, input.kpis, input.heatmap_metric)
            }
            // No feature pipeline feeds these yet; they reconcile to Absent.
            LayerId::RiskZones | LayerId::Weather => Vec::new(),
        };
        debug!("layer {}: {} features projected", id.as_str(), features.len());
        features
    }

    fn filtered_assets<'a>(&self, input: &TickInput<'a>) -> Vec<&'a crate::domain::Asset> {
        match input.filter {
            Some(filter) => input.assets.iter().filter(|a| filter.matches(a)).collect(),
            None => input.assets.iter().collect(),
        }
    }

    /// Pointer-enter on a layer: open the hover popup at the event
    /// coordinate. Ignored for layers without bound handlers.
    pub fn pointer_enter(&mut self, layer: LayerId, feature: &Feature, lon: f64, lat: f64) {
        let bound = self.states.get(&layer).map(|s| s.handlers_bound).unwrap_or(false);
        if !bound || self.disposed {
            return;
        }
        let content = popup_for(layer, feature);
        if let Err(err) = self.surface.open_popup(lon, lat, &content) {
            warn!("popup open failed on {}: {}", layer.as_str(), err);
        }
    }

    /// Pointer-leave removes all transient popups.
    pub fn pointer_leave(&mut self) {
        self.surface.close_all_popups();
    }

    /// Click dispatch: resolve the feature id back to a domain entity and
    /// notify the host. A stale id (entity removed between tick and click)
    /// is a no-op.
    pub fn click(&mut self, feature_id: &str) {
        if self.disposed || !self.entity_index.contains(feature_id) {
            return;
        }
        if let Some(handler) = self.on_entity_click.as_mut() {
            handler(feature_id);
        }
    }

    /// Poll the camera and report the view state upward.
    pub fn handle_camera_move(&mut self) {
        let (lon, lat) = self.surface.query_center();
        let view = ViewState {
            lon,
            lat,
            zoom: self.surface.query_zoom(),
            pitch: self.surface.query_pitch(),
            bearing: self.surface.query_bearing(),
        };
        if let Some(handler) = self.on_view_state_change.as_mut() {
            handler(view);
        }
    }

    /// Full teardown on host unmount: every created layer is removed in
    /// reverse creation order and popups are closed. Required, not an
    /// optimization: the surface is going away with us, and a dangling
    /// handler registration would reference a destroyed surface.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.surface.close_all_popups();

        let order: Vec<LayerId> = self.created_order.iter().rev().copied().collect();
        for id in order {
            let Some(state) = self.states.get_mut(&id) else { continue };
            let mut cfg = self
                .configs
                .get(&id)
                .cloned()
                .unwrap_or(LayerConfig { id, visible: false, opacity: 1.0, kind: crate::domain::LayerKind::Circle });
            cfg.visible = false;
            reconcile(&mut self.surface, state, &cfg, &[], 0);
        }
        self.created_order.clear();
        self.disposed = true;
    }
}

/// Validate with the received-vs-validated warning the silent exclusion
/// contract leaves to the caller.
fn validate_logged<T: Positioned>(id: LayerId, records: Vec<&T>) -> Vec<&T> {
    let received = records.len();
    let valid: Vec<&T> =
        records.into_iter().filter(|r| coord_in_range(r.lat(), r.lon())).collect();
    if valid.len() < received {
        warn!(
            "layer {}: excluded {} of {} records with invalid coordinates",
            id.as_str(),
            received - valid.len(),
            received
        );
    }
    valid
}
