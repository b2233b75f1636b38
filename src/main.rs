use jsonroute::adapter::AdapterRegistry;
use jsonroute::server::signal;
use jsonroute::{logger, Application, Config, RouteTable};
use std::sync::Arc;
use tokio::sync::Notify;

mod demo;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = match std::env::args().nth(1) {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };
    logger::init(&cfg.logging)?;

    let routes = if cfg.routes.is_empty() {
        demo::routes()?
    } else {
        RouteTable::from_config(&cfg.routes)?
    };
    let app = Application::builder()
        .routes(routes)
        .handlers(demo::handlers()?)
        .expose_errors(cfg.http.expose_errors)
        .build()?;
    logger::log_routes(app.routes());

    // Worker thread count follows `server.workers`, else one per CPU core
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg, Arc::new(app)))
}

async fn async_main(cfg: Config, app: Arc<Application>) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let adapters = AdapterRegistry::with_defaults(&cfg);
    let adapter = adapters.get(&cfg.server.adapter)?;

    let shutdown = Arc::new(Notify::new());
    signal::start_signal_handler(Arc::clone(&shutdown));

    logger::log_server_start(&addr, adapter.name(), &cfg);
    adapter.serve(app, addr, shutdown).await?;
    Ok(())
}
