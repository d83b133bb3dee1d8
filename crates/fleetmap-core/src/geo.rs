//! Coordinate validation for positioned domain records.
//!
//! Exclusion here is silent and order-preserving; the caller is responsible
//! for logging received-vs-validated counts when records are dropped.

use crate::domain::{Alert, Asset, WorkOrder};

/// Any record carrying a geographic position.
pub trait Positioned {
    fn lat(&self) -> f64;
    fn lon(&self) -> f64;
}

impl Positioned for Asset {
    fn lat(&self) -> f64 {
        self.lat
    }
    fn lon(&self) -> f64 {
        self.lon
    }
}

impl Positioned for WorkOrder {
    fn lat(&self) -> f64 {
        self.lat
    }
    fn lon(&self) -> f64 {
        self.lon
    }
}

impl Positioned for Alert {
    fn lat(&self) -> f64 {
        self.lat
    }
    fn lon(&self) -> f64 {
        self.lon
    }
}

/// True iff both coordinates are finite and within geographic range.
pub fn coord_in_range(lat: f64, lon: f64) -> bool {
    lat.is_finite() && lon.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

/// Filter `records` to those with valid coordinates.
///
/// Pure: returns a same-order subsequence of borrows, never mutating or
/// reordering the input.
pub fn validate<T: Positioned>(records: &[T]) -> Vec<&T> {
    records.iter().filter(|r| coord_in_range(r.lat(), r.lon())).collect()
}

/// True iff every vertex of a polygon ring is a valid coordinate.
/// A degenerate ring (fewer than 3 vertices) is invalid.
pub fn ring_in_range(ring: &[[f64; 2]]) -> bool {
    ring.len() >= 3 && ring.iter().all(|&[lon, lat]| coord_in_range(lat, lon))
}
