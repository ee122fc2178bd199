

use sparql_bridge::core::config::AppConfig;
use sparql_bridge::http::run_server;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive("sparql_bridge=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    let config = AppConfig::load(None)?;
    run_server(config).await
}
