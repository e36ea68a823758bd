/// Blood Bridge headless runner.
///
/// Opens a session (file-backed when BLOOD_BRIDGE_DATA_DIR is set), runs the
/// logistics simulation and prints the activity feed until Ctrl-C or the
/// configured run time elapses. With GEMINI_API_KEY set it also asks for a
/// supply forecast for the scarcest blood type.

use std::process::ExitCode;
use std::time::Duration;

use tracing::{error, info, warn};

use bridge_core::analytics::units_by_blood_type;
use bridge_core::clock::SystemClock;
use bridge_core::commands::UuidIds;
use bridge_core::domain::LogisticsEvent;
use bridge_core::BridgeStore;

use bridge_runtime::advisory::{AdvisoryService, GeminiModel, RetryPolicy};
use bridge_runtime::config::RuntimeConfig;
use bridge_runtime::logging::init_logging;
use bridge_runtime::session::{Session, SharedSession};
use bridge_runtime::simulation::SimulationController;
use bridge_runtime::storage::FileSlotStore;

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let config = match RuntimeConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let session = open_session(&config);
    println!(
        "Blood Bridge: {} hospitals, {} inventory items, {} vehicles ({})",
        session.store().hospitals().len(),
        session.store().inventory().len(),
        session.store().vehicles().len(),
        if session.is_persistent() { "persistent" } else { "in memory" },
    );
    let session = SharedSession::new(session);

    if config.model.api_key.is_some() {
        print_forecast(&config, &session).await;
    }

    let mut simulation = SimulationController::new(session.clone(), config.simulation.clone(), config.seed);
    if let Err(err) = simulation.start() {
        error!(error = %err, "simulation failed to start");
        return ExitCode::FAILURE;
    }

    let feed = tokio::spawn(print_feed(session.clone()));
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
        _ = tokio::time::sleep(config.run_time) => info!("run time elapsed"),
    }

    simulation.stop();
    feed.abort();
    let state = session.snapshot();
    println!(
        "Stopped with {} vehicle(s) in transit and {} event(s) in the feed.",
        state.in_transit_count(),
        state.logistics_events.len()
    );
    ExitCode::SUCCESS
}

fn open_session(config: &RuntimeConfig) -> Session {
    let Some(dir) = &config.data_dir else {
        return Session::in_memory(BridgeStore::seeded());
    };
    let slots = match FileSlotStore::open(dir) {
        Ok(slots) => slots,
        Err(err) => {
            warn!(error = %err, "data directory unusable, continuing in memory");
            return Session::in_memory(BridgeStore::seeded());
        }
    };
    match Session::open(Box::new(slots), Box::new(SystemClock), Box::new(UuidIds)) {
        Ok(session) => session,
        Err(err) => {
            warn!(error = %err, "session hydration failed, continuing in memory");
            Session::in_memory(BridgeStore::seeded())
        }
    }
}

/// Print events newer than the last one seen, oldest first.
async fn print_feed(session: SharedSession) {
    let mut last_seen: Option<String> = None;
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        ticker.tick().await;
        let fresh: Vec<LogisticsEvent> = {
            let guard = session.lock();
            guard
                .store()
                .logistics_events()
                .take_while(|e| last_seen.as_deref() != Some(e.id.as_str()))
                .cloned()
                .collect()
        };
        if let Some(newest) = fresh.first() {
            last_seen = Some(newest.id.clone());
        }
        for event in fresh.iter().rev() {
            println!(
                "[{}] {:<8} {}",
                event.timestamp.format("%H:%M:%S"),
                event.kind,
                event.message
            );
        }
    }
}

async fn print_forecast(config: &RuntimeConfig, session: &SharedSession) {
    let inventory = session.lock().store().inventory().to_vec();
    let Some((blood_type, units)) = units_by_blood_type(&inventory)
        .into_iter()
        .min_by_key(|(_, units)| *units)
    else {
        return;
    };

    let model = match GeminiModel::from_config(&config.model) {
        Ok(model) => model,
        Err(err) => {
            warn!(error = %err, "advisory model unavailable");
            return;
        }
    };
    let service = AdvisoryService::new(model).with_retry(RetryPolicy::with_retries(config.model.retries));
    match service.forecast_supply(blood_type, &inventory).await {
        Ok(forecast) => println!(
            "Forecast for {} ({} units): {:?} risk. {}",
            blood_type, units, forecast.shortage_risk, forecast.reason
        ),
        Err(err) => warn!(error = %err, blood_type = %blood_type, "supply forecast failed"),
    }
}
