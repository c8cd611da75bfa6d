use clap::Parser;
use tracing_subscriber::EnvFilter;

use dataprof::server;

/// A browser based profiling dashboard for tabular data files.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Address to bind the web server to.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    server::start_server(&format!("{}:{}", args.host, args.port)).await
}
