use clap::Parser;
use std::sync::Arc;

use appserver::cli::Cli;
use appserver::config::{AppState, Config};
use appserver::logger;
use appserver::server;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut cfg = Config::load_from(&cli.config)?;
    cfg.apply_cli(&cli);

    logger::init(&cfg)?;

    // Tokio runtime, thread count from config when set
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;

    let state = Arc::new(AppState::new(cfg));
    state.sessions.ensure_dir()?;

    logger::log_server_start(&addr, &state.config);

    let signals = Arc::new(server::SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals));

    // LocalSet for spawn_local-based connection tasks
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::run(listener, state, Arc::clone(&signals.shutdown)))
        .await
}
