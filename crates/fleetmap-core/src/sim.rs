//! Simulated telemetry and alert feed driving the refresh loop.
//!
//! The engine never sees this module directly: a [`TelemetrySource`] stands
//! between, so a real push-based feed can replace the simulation without
//! touching reconciliation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{Alert, AlertSeverity, Asset, AssetStatus};

/// One telemetry sample for an asset.
#[derive(Debug, Clone)]
pub struct TelemetryReading {
    pub asset_id: String,
    pub power_kw: f64,
    pub temp_c: f64,
    pub timestamp_ms: u64,
}

/// Abstract feed of telemetry and spontaneous alerts.
pub trait TelemetrySource {
    /// Fresh samples for whichever assets reported this tick. Left-join
    /// semantics: assets without a sample keep their previous readings.
    fn sample(&mut self, assets: &[Asset], now_ms: u64) -> Vec<TelemetryReading>;

    /// At most one new alert per tick.
    fn maybe_emit_alert(&mut self, assets: &[Asset], now_ms: u64) -> Option<Alert>;
}

const ALERT_KINDS: [&str; 4] = ["tamper", "overheat", "comms_loss", "underperformance"];
const SEVERITIES: [AlertSeverity; 4] =
    [AlertSeverity::Critical, AlertSeverity::High, AlertSeverity::Medium, AlertSeverity::Low];

/// Random-walk telemetry generator. Seedable for reproducible runs.
pub struct SimulatedTelemetry {
    rng: StdRng,
    alert_probability: f64,
    alert_seq: u64,
}

impl SimulatedTelemetry {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed), alert_probability: 0.1, alert_seq: 0 }
    }

    pub fn with_alert_probability(mut self, p: f64) -> Self {
        self.alert_probability = p.clamp(0.0, 1.0);
        self
    }
}

impl TelemetrySource for SimulatedTelemetry {
    /// Resamples power and temperature for every producing asset: power
    /// jitters ±15 % around 80 % of rated capacity, temperature wanders a
    /// 20–55 °C band. Offline and maintenance assets stay silent.
    fn sample(&mut self, assets: &[Asset], now_ms: u64) -> Vec<TelemetryReading> {
        assets
            .iter()
            .filter(|a| matches!(a.status, AssetStatus::Online | AssetStatus::Degraded))
            .map(|asset| {
                let jitter = self.rng.gen_range(-0.15..=0.15);
                let power = (asset.rated_capacity_kw * 0.8 * (1.0 + jitter)).max(0.0);
                TelemetryReading {
                    asset_id: asset.id.clone(),
                    power_kw: power,
                    temp_c: self.rng.gen_range(20.0..55.0),
                    timestamp_ms: now_ms,
                }
            })
            .collect()
    }

    fn maybe_emit_alert(&mut self, assets: &[Asset], now_ms: u64) -> Option<Alert> {
        if assets.is_empty() || !self.rng.gen_bool(self.alert_probability) {
            return None;
        }
        let asset = &assets[self.rng.gen_range(0..assets.len())];
        self.alert_seq += 1;
        Some(Alert {
            id: format!("sim-alert-{}", self.alert_seq),
            site_id: asset.site_id.clone(),
            lat: asset.lat,
            lon: asset.lon,
            kind: ALERT_KINDS[self.rng.gen_range(0..ALERT_KINDS.len())].into(),
            severity: SEVERITIES[self.rng.gen_range(0..SEVERITIES.len())],
            acknowledged: false,
            timestamp_ms: now_ms,
        })
    }
}

/// Merge readings into the fleet by asset id. Assets without a reading are
/// left unchanged.
pub fn apply_readings(fleet: &mut [Asset], readings: &[TelemetryReading]) {
    for reading in readings {
        if let Some(asset) = fleet.iter_mut().find(|a| a.id == reading.asset_id) {
            asset.power_kw = Some(reading.power_kw);
            asset.temp_c = Some(reading.temp_c);
        }
    }
}

/// The timer-driven loop's per-tick work, minus the timer itself: sample,
/// merge, maybe append one alert. The caller owns the cadence (default
/// period 5 s) and feeds the result to the engine.
pub struct RefreshScheduler<T: TelemetrySource> {
    telemetry: T,
    period_ms: u64,
}

pub const DEFAULT_PERIOD_MS: u64 = 5_000;

impl<T: TelemetrySource> RefreshScheduler<T> {
    pub fn new(telemetry: T) -> Self {
        Self { telemetry, period_ms: DEFAULT_PERIOD_MS }
    }

    pub fn with_period_ms(mut self, period_ms: u64) -> Self {
        self.period_ms = period_ms;
        self
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    /// Advance one tick: mutate the fleet in place, possibly push an alert.
    pub fn tick(&mut self, fleet: &mut [Asset], alerts: &mut Vec<Alert>, now_ms: u64) {
        let readings = self.telemetry.sample(fleet, now_ms);
        apply_readings(fleet, &readings);
        if let Some(alert) = self.telemetry.maybe_emit_alert(fleet, now_ms) {
            alerts.push(alert);
        }
    }
}
