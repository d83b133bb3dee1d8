//! Offline simulation harness: drives the reconciliation engine with the
//! simulated telemetry feed against a recording surface and reports the
//! adapter traffic per tick. Diagnostic tool; no rendering. The engine's
//! own log output is surfaced through env_logger (RUST_LOG=debug for
//! per-layer counts).

use anyhow::{bail, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use fleetmap_core::domain::{
    Alert, Asset, AssetStatus, Boundary, KpiRecord, LayerConfig, RiskAssessment, RiskLevel,
    TickInput,
};
use fleetmap_core::sim::{RefreshScheduler, SimulatedTelemetry, DEFAULT_PERIOD_MS};
use fleetmap_core::{MapEngine, RecordingSurface};

#[derive(Parser, Debug)]
#[command(name = "simulate", about = "Run the layer reconciliation loop offline")]
struct Args {
    /// RNG seed for the demo fleet and telemetry.
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Number of refresh ticks to run.
    #[arg(short, long, default_value_t = 12)]
    ticks: u64,

    /// Refresh period in milliseconds (simulated clock; no sleeping).
    #[arg(short, long, default_value_t = DEFAULT_PERIOD_MS)]
    period_ms: u64,

    /// Heatmap metric: power, pr, availability, or temperature.
    #[arg(short, long, default_value = "power")]
    metric: String,

    /// Number of demo assets to generate.
    #[arg(long, default_value_t = 40)]
    fleet_size: usize,

    /// Per-tick probability of a synthesized alert.
    #[arg(long, default_value_t = 0.1)]
    alert_probability: f64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if !(0.0..=1.0).contains(&args.alert_probability) {
        bail!("alert probability must be within 0..=1, got {}", args.alert_probability);
    }

    let (mut fleet, boundaries, kpis, risks) = demo_fleet(args.seed, args.fleet_size);
    let mut alerts: Vec<Alert> = Vec::new();
    let mut configs = LayerConfig::defaults();
    for cfg in &mut configs {
        if cfg.id == fleetmap_core::LayerId::Heatmap {
            cfg.visible = true;
        }
    }

    let telemetry =
        SimulatedTelemetry::new(args.seed).with_alert_probability(args.alert_probability);
    let mut scheduler = RefreshScheduler::new(telemetry).with_period_ms(args.period_ms);
    let mut engine = MapEngine::new(RecordingSurface::new());
    engine.set_on_entity_click(Box::new(|id| println!("  click → {}", id)));

    println!(
        "fleet: {} assets, {} boundaries | metric: {} | period: {} ms",
        fleet.len(),
        boundaries.len(),
        args.metric,
        scheduler.period_ms()
    );

    for tick in 0..args.ticks {
        let now_ms = tick * scheduler.period_ms();
        scheduler.tick(&mut fleet, &mut alerts, now_ms);

        let before = engine.surface().calls.len();
        let input = TickInput {
            assets: &fleet,
            work_orders: &[],
            alerts: &alerts,
            boundaries: &boundaries,
            kpis: &kpis,
            risks: &risks,
            layer_configs: &configs,
            heatmap_metric: &args.metric,
            filter: None,
            now_ms,
        };
        engine.update(&input);

        println!(
            "tick {:>3} | alerts {:>2} | surface calls +{}",
            tick,
            alerts.len(),
            engine.surface().calls.len() - before
        );
    }

    engine.dispose();
    println!("disposed | total surface calls: {}", engine.surface().calls.len());
    Ok(())
}

/// Deterministic demo fleet standing in for the dashboard's mock datasets:
/// a few sites around Bangalore with KPI and risk records per site.
fn demo_fleet(
    seed: u64,
    fleet_size: usize,
) -> (Vec<Asset>, Vec<Boundary>, Vec<KpiRecord>, Vec<RiskAssessment>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let statuses = [
        AssetStatus::Online,
        AssetStatus::Online,
        AssetStatus::Online,
        AssetStatus::Degraded,
        AssetStatus::Offline,
        AssetStatus::Maintenance,
    ];
    let n_sites = (fleet_size / 8).max(1);

    let fleet = (0..fleet_size)
        .map(|i| {
            let site = i % n_sites;
            Asset {
                id: format!("asset-{:03}", i),
                site_id: format!("site-{:02}", site),
                name: format!("INV-{:03}", i),
                lat: 12.9 + rng.gen_range(-0.5..0.5),
                lon: 77.5 + rng.gen_range(-0.5..0.5),
                status: statuses[rng.gen_range(0..statuses.len())],
                power_kw: None,
                temp_c: None,
                rated_capacity_kw: rng.gen_range(50.0..250.0),
            }
        })
        .collect();

    let boundaries = vec![Boundary {
        id: "zone-core".into(),
        name: "Core Zone".into(),
        ring: vec![[77.0, 12.4], [78.0, 12.4], [78.0, 13.4], [77.0, 13.4], [77.0, 12.4]],
    }];

    let kpis = (0..n_sites)
        .map(|site| KpiRecord {
            site_id: format!("site-{:02}", site),
            pr: rng.gen_range(0.6..0.95),
            availability: rng.gen_range(90.0..100.0),
            yield_kwh: rng.gen_range(200.0..600.0),
        })
        .collect();

    let risks = (0..n_sites)
        .map(|site| {
            let score: f64 = rng.gen_range(0.0..1.0);
            let level = if score > 0.7 {
                RiskLevel::High
            } else if score > 0.4 {
                RiskLevel::Medium
            } else {
                RiskLevel::Low
            };
            RiskAssessment { site_id: format!("site-{:02}", site), score, level }
        })
        .collect();

    (fleet, boundaries, kpis, risks)
}
