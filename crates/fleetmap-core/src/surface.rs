//! The boundary to the external rendering surface.
//!
//! The real surface is a retained-mode GPU renderer consumed as a
//! capability; nothing here draws. [`RecordingSurface`] implements the same
//! trait for tests and the offline simulation tool, recording every call
//! and optionally failing on demand.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::domain::LayerKind;
use crate::feature::Feature;
use crate::interact::PopupContent;
use crate::project::style::PaintSpec;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("duplicate id: {0}")]
    DuplicateId(String),
    #[error("unknown id: {0}")]
    UnknownId(String),
    #[error("surface not ready")]
    NotReady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEvent {
    Enter,
    Leave,
    Click,
}

impl PointerEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            PointerEvent::Enter => "pointerenter",
            PointerEvent::Leave => "pointerleave",
            PointerEvent::Click => "click",
        }
    }
}

/// Minimum capability set the engine requires of a rendering surface.
///
/// All mutations are synchronous fire-and-forget from the engine's point of
/// view; failures surface as [`SurfaceError`] and are absorbed per layer by
/// the reconciler.
pub trait RenderSurface {
    fn create_source(&mut self, id: &str, features: &[Feature]) -> Result<(), SurfaceError>;
    fn update_source_data(&mut self, id: &str, features: &[Feature]) -> Result<(), SurfaceError>;
    fn remove_source(&mut self, id: &str) -> Result<(), SurfaceError>;
    fn source_exists(&self, id: &str) -> bool;

    fn add_layer(
        &mut self,
        id: &str,
        source_id: &str,
        kind: LayerKind,
        paint: &PaintSpec,
    ) -> Result<(), SurfaceError>;
    fn remove_layer(&mut self, id: &str) -> Result<(), SurfaceError>;
    fn layer_exists(&self, id: &str) -> bool;
    fn set_paint_property(
        &mut self,
        id: &str,
        prop: &str,
        value: serde_json::Value,
    ) -> Result<(), SurfaceError>;

    /// Register a pointer handler on a layer. Called exactly once per event
    /// type per layer lifetime; the surface delivers events back through the
    /// engine's `pointer_enter` / `pointer_leave` / `click` entry points.
    fn on(&mut self, event: PointerEvent, layer_id: &str) -> Result<(), SurfaceError>;

    fn query_center(&self) -> (f64, f64);
    fn query_zoom(&self) -> f64;
    fn query_pitch(&self) -> f64;
    fn query_bearing(&self) -> f64;

    fn open_popup(&mut self, lon: f64, lat: f64, content: &PopupContent) -> Result<(), SurfaceError>;
    fn close_all_popups(&mut self);
}

// ── Recording fake ───────────────────────────────────────────────────────────

/// One recorded surface call, for assertions and the simulation tool.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    CreateSource { id: String, feature_count: usize },
    UpdateSourceData { id: String, feature_count: usize },
    AddLayer { id: String, source_id: String },
    RemoveLayer { id: String },
    RemoveSource { id: String },
    SetPaintProperty { id: String, prop: String },
    On { event: PointerEvent, layer_id: String },
    OpenPopup { title: String },
    CloseAllPopups,
}

/// Camera state returned by the `query_*` methods.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub lon: f64,
    pub lat: f64,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { lon: 0.0, lat: 0.0, zoom: 4.0, pitch: 0.0, bearing: 0.0 }
    }
}

/// In-memory surface fake. Enforces id uniqueness like a real surface and
/// can be told to fail specific methods to exercise the fail-soft path.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub calls: Vec<RecordedCall>,
    pub camera: Camera,
    sources: HashMap<String, Vec<Feature>>,
    layers: HashSet<String>,
    handlers: Vec<(PointerEvent, String)>,
    open_popups: usize,
    failing: HashSet<&'static str>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the named method (`"add_layer"`, `"create_source"`, ...) fail
    /// until cleared.
    pub fn fail_on(&mut self, method: &'static str) {
        self.failing.insert(method);
    }

    pub fn clear_failures(&mut self) {
        self.failing.clear();
    }

    fn check(&self, method: &'static str) -> Result<(), SurfaceError> {
        if self.failing.contains(method) {
            Err(SurfaceError::NotReady)
        } else {
            Ok(())
        }
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&RecordedCall) -> bool) -> usize {
        self.calls.iter().filter(|c| predicate(c)).count()
    }

    /// Handler registrations currently live for `layer_id`.
    pub fn handler_count(&self, layer_id: &str) -> usize {
        self.handlers.iter().filter(|(_, l)| l == layer_id).count()
    }

    pub fn open_popup_count(&self) -> usize {
        self.open_popups
    }

    /// Feature data currently held by a source, if it exists.
    pub fn source_data(&self, id: &str) -> Option<&[Feature]> {
        self.sources.get(id).map(Vec::as_slice)
    }
}

impl RenderSurface for RecordingSurface {
    fn create_source(&mut self, id: &str, features: &[Feature]) -> Result<(), SurfaceError> {
        self.check("create_source")?;
        self.calls.push(RecordedCall::CreateSource { id: id.into(), feature_count: features.len() });
        if self.sources.contains_key(id) {
            return Err(SurfaceError::DuplicateId(id.into()));
        }
        self.sources.insert(id.into(), features.to_vec());
        Ok(())
    }

    fn update_source_data(&mut self, id: &str, features: &[Feature]) -> Result<(), SurfaceError> {
        self.check("update_source_data")?;
        self.calls.push(RecordedCall::UpdateSourceData { id: id.into(), feature_count: features.len() });
        match self.sources.get_mut(id) {
            Some(data) => {
                *data = features.to_vec();
                Ok(())
            }
            None => Err(SurfaceError::UnknownId(id.into())),
        }
    }

    fn remove_source(&mut self, id: &str) -> Result<(), SurfaceError> {
        self.check("remove_source")?;
        self.calls.push(RecordedCall::RemoveSource { id: id.into() });
        self.sources
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| SurfaceError::UnknownId(id.into()))
    }

    fn source_exists(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn add_layer(
        &mut self,
        id: &str,
        source_id: &str,
        _kind: LayerKind,
        _paint: &PaintSpec,
    ) -> Result<(), SurfaceError> {
        self.check("add_layer")?;
        self.calls.push(RecordedCall::AddLayer { id: id.into(), source_id: source_id.into() });
        if self.layers.contains(id) {
            return Err(SurfaceError::DuplicateId(id.into()));
        }
        if !self.sources.contains_key(source_id) {
            return Err(SurfaceError::UnknownId(source_id.into()));
        }
        self.layers.insert(id.into());
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), SurfaceError> {
        self.check("remove_layer")?;
        self.calls.push(RecordedCall::RemoveLayer { id: id.into() });
        if !self.layers.remove(id) {
            return Err(SurfaceError::UnknownId(id.into()));
        }
        self.handlers.retain(|(_, l)| l != id);
        Ok(())
    }

    fn layer_exists(&self, id: &str) -> bool {
        self.layers.contains(id)
    }

    fn set_paint_property(
        &mut self,
        id: &str,
        prop: &str,
        _value: serde_json::Value,
    ) -> Result<(), SurfaceError> {
        self.check("set_paint_property")?;
        self.calls.push(RecordedCall::SetPaintProperty { id: id.into(), prop: prop.into() });
        if !self.layers.contains(id) {
            return Err(SurfaceError::UnknownId(id.into()));
        }
        Ok(())
    }

    fn on(&mut self, event: PointerEvent, layer_id: &str) -> Result<(), SurfaceError> {
        self.check("on")?;
        self.calls.push(RecordedCall::On { event, layer_id: layer_id.into() });
        self.handlers.push((event, layer_id.into()));
        Ok(())
    }

    fn query_center(&self) -> (f64, f64) {
        (self.camera.lon, self.camera.lat)
    }

    fn query_zoom(&self) -> f64 {
        self.camera.zoom
    }

    fn query_pitch(&self) -> f64 {
        self.camera.pitch
    }

    fn query_bearing(&self) -> f64 {
        self.camera.bearing
    }

    fn open_popup(&mut self, _lon: f64, _lat: f64, content: &PopupContent) -> Result<(), SurfaceError> {
        self.check("open_popup")?;
        self.calls.push(RecordedCall::OpenPopup { title: content.title.clone() });
        self.open_popups += 1;
        Ok(())
    }

    fn close_all_popups(&mut self) {
        self.calls.push(RecordedCall::CloseAllPopups);
        self.open_popups = 0;
    }
}
