use color_eyre::eyre::{Result, WrapErr};
use header_echo::{EchoServerTrait, HttpConfig, HttpServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Initialize logging, RUST_LOG overrides the default directive
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("header_echo=info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut config = HttpConfig::default();

    match args.get(1).map(String::as_str) {
        None => {}
        Some("-h" | "--help") => {
            print_usage(&args[0], &config);
            return Ok(());
        }
        Some(port) => {
            let port = port
                .parse::<u16>()
                .wrap_err_with(|| format!("Invalid port: {port}"))?;
            config.bind_addr.set_port(port);
        }
    }

    info!(
        address = %config.bind_addr,
        route = %config.route_path,
        max_connections = config.max_connections,
        "Starting header echo server"
    );

    let server = HttpServer::header_echo(config);
    server
        .run()
        .await
        .wrap_err("Failed to run header echo server")?;

    Ok(())
}

fn print_usage(program: &str, config: &HttpConfig) {
    eprintln!("Usage: {program} [port]");
    eprintln!(
        "  port: Port to bind to on all interfaces (default: {})",
        config.bind_addr.port()
    );
    eprintln!();
    eprintln!("Serves GET and POST on {} and echoes the request headers as JSON.", config.route_path);
    eprintln!("Set RUST_LOG (e.g. RUST_LOG=header_echo=debug) to change log verbosity.");
}
