use errand_app::adapters::inbound::{parse_intent, FileEventStore, InMemoryEventStore, COMMANDS};
use errand_app::adapters::outbound::{init_combined_logger, init_console_logger, SimulatedPlatform};
use errand_app::application::RobotService;
use errand_app::common::EventStore;
use errand_app::domains::mission::MissionJournalActor;
use errand_app::domains::orchestrator::Orchestrator;
use errand_app::domains::robot::DynPlatform;
use errand_app::Config;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Errand App");

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = Config::load(&config_path)?;
    info!("Configuration loaded from {} (debug mode: {})", config_path, config.robot.debug_mode);

    let robot_tag = "errand";
    let logger = match &config.logging.file {
        Some(path) => init_combined_logger(path, &config.logging.level, robot_tag),
        None => init_console_logger(robot_tag),
    };

    let event_store: Arc<dyn EventStore> = match &config.journal.directory {
        Some(dir) => {
            info!("Mission journal in {}", dir.display());
            Arc::new(FileEventStore::new(dir.clone()))
        }
        None => {
            info!("Mission journal kept in memory");
            Arc::new(InMemoryEventStore::new())
        }
    };

    let (journal_tx, journal_rx) = mpsc::channel(100);
    let mut journal = MissionJournalActor::new(event_store, journal_rx);
    let projections = journal.projections();
    tokio::spawn(async move { journal.run().await });

    let platform: DynPlatform = Arc::new(SimulatedPlatform::demo(config.robot.simulated_kind));
    let (orchestrator, handle) = Orchestrator::new(
        platform,
        logger,
        config.runtime_settings(),
        config.robot.debug_mode,
    );
    let orchestrator = orchestrator.with_journal(journal_tx);
    let service = RobotService::new(handle).with_projections(projections);

    let mut view = service.subscribe();
    tokio::spawn(async move {
        let mut last_path = String::new();
        while view.changed().await.is_ok() {
            let current = view.borrow_and_update().clone();
            if current.path != last_path {
                info!("State: {}", current.path);
                last_path = current.path;
            }
        }
    });

    let running = tokio::spawn(orchestrator.run());

    info!("Type 'help' for commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "help" {
                    for (usage, what) in COMMANDS {
                        println!("  {:<28} {}", usage, what);
                    }
                    continue;
                }
                match parse_intent(line) {
                    Ok(event) => {
                        if let Err(e) = service.send(event).await {
                            error!("{}", e);
                            break;
                        }
                    }
                    Err(e) => warn!("{}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!("Shutting down Errand App");
    drop(service);
    match running.await {
        Ok(state) => info!("Orchestrator stopped in state {}", state),
        Err(e) => error!("Orchestrator task failed: {}", e),
    }

    Ok(())
}
