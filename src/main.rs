// src/main.rs

use anyhow::Result;
use roadside_control::console;
use roadside_control::metrics::ControlMetrics;
use roadside_control::sessions::{EvRouteCoordinator, IncidentManager};
use roadside_control::signal::SignalCycleEngine;
use roadside_control::status::{StatusFacade, StatusReporter};
use roadside_control::streetlight::{
    open_sink, open_source, FrameDiffClassifier, FrameSource, StreetlightController,
    SyntheticCamera,
};
use roadside_control::types::Config;
use roadside_control::SharedControlState;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    let config = Config::load_or_default(&config_path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("roadside_control={}", config.logging.level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🚦 Roadside Control Starting");
    info!(
        "Signal cycle: green={}s yellow={}s all-red={}s, tick={}ms",
        config.signal.green_secs,
        config.signal.yellow_secs,
        config.signal.all_red_secs,
        config.signal.tick_interval_ms
    );

    let metrics = ControlMetrics::new();
    let state = SharedControlState::new(&config.signal);

    let sink = open_sink(config.streetlight.serial_port.as_deref());
    let classifier = Arc::new(FrameDiffClassifier::new(config.streetlight.motion_threshold));
    let camera: Box<dyn FrameSource> = match open_source(&config.camera) {
        Ok(camera) => camera,
        Err(e) => {
            warn!("Camera unavailable ({:#}), falling back to synthetic feed", e);
            Box::new(SyntheticCamera::new(
                config.camera.width,
                config.camera.height,
                config.camera.synthetic_period_frames,
            ))
        }
    };

    let streetlight = StreetlightController::new(
        Arc::clone(&state),
        &config.streetlight,
        sink,
        classifier,
        metrics.clone(),
    );
    let facade = StatusFacade::new(
        Arc::clone(&state),
        EvRouteCoordinator::new(Arc::clone(&state), &config.sessions, metrics.clone()),
        IncidentManager::new(Arc::clone(&state), &config.sessions, metrics.clone()),
        streetlight.clone(),
        metrics.clone(),
    );
    let engine = SignalCycleEngine::new(Arc::clone(&state), &config.signal, metrics.clone());
    let reporter = StatusReporter::new(
        facade.clone(),
        Duration::from_secs(config.logging.status_interval_secs.max(1)),
        config.logging.status_log.as_deref().map(Path::new),
    )?;
    info!("✓ Control loops ready");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handles = vec![
        tokio::spawn(engine.run(shutdown_rx.clone())),
        tokio::spawn(streetlight.run(camera, shutdown_rx.clone())),
        tokio::spawn(reporter.run(shutdown_rx.clone())),
    ];
    let console = tokio::spawn(console::run(facade, shutdown_tx.clone()));

    let mut shutdown_rx = shutdown_rx;
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("Failed to listen for ctrl-c: {}", e);
            }
            info!("Interrupt received");
        }
        _ = shutdown_rx.changed() => {
            info!("Shutdown requested from console");
        }
    }

    let _ = shutdown_tx.send(true);
    for handle in handles {
        if let Err(e) = handle.await {
            warn!("Control task ended abnormally: {}", e);
        }
    }
    console.abort();

    let summary = metrics.summary();
    info!("\n📊 Final Report:");
    info!("  Signal ticks: {}", summary.signal_ticks);
    info!("  Phase changes: {}", summary.phase_changes);
    info!("  Preempted ticks: {}", summary.preempted_ticks);
    info!(
        "  Sessions: {} EV, {} incident, {} rejected",
        summary.ev_triggers, summary.incident_triggers, summary.rejected_triggers
    );
    info!(
        "  Camera: {} frames ({:.1} FPS), {} misses",
        summary.frames_captured, summary.camera_fps, summary.camera_misses
    );
    info!("  Sink failures: {}", summary.sink_failures);

    Ok(())
}
