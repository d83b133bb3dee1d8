//! Geospatial layer synchronization engine for a renewable-asset fleet map.
//!
//! Reconciles independently-mutating domain collections (assets, work
//! orders, alerts, boundaries, KPI and risk joins, a derived heatmap)
//! against a retained-mode rendering surface, consumed through the
//! [`surface::RenderSurface`] trait. The pipeline per layer and tick:
//! validate coordinates → project to features → reconcile source/layer
//! lifecycle. Handlers bind once per layer lifetime; data refreshes replace
//! source data in place.

pub mod domain;
pub mod engine;
pub mod feature;
pub mod geo;
pub mod interact;
pub mod project;
pub mod reconcile;
pub mod sim;
pub mod surface;

pub use domain::{LayerConfig, LayerId, TickInput, ViewState};
pub use engine::MapEngine;
pub use feature::{Feature, Geometry};
pub use reconcile::{LayerPhase, LayerState};
pub use surface::{RecordingSurface, RenderSurface, SurfaceError};
