mod cli;

use transcode_orchestrator::{config, server};
use orchestrator_db::pool::{init_memory_pool, init_pool};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // CLI flags win over the config file
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting transcode orchestrator");
    let db_path = config.database.path.to_string_lossy().into_owned();
    tracing::info!("Initializing database at {}", db_path);
    let db_pool = init_pool(&db_path)?;

    server::start_server(config, db_pool).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "transcode_orchestrator=trace,orchestrator_db=debug,orchestrator_common=debug,tower_http=debug".to_string()
        } else {
            "transcode_orchestrator=info,orchestrator_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Providers => list_providers(cli.config.as_deref()),
        Commands::Version => {
            println!("transcode-orchestrator {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Request deadline: {}s", config.server.request_deadline_secs);
    println!("  Database: {}", config.database.path.display());
    println!(
        "  Bitmovin: {}",
        if config.bitmovin.is_some() { "configured" } else { "not configured" }
    );
    println!(
        "  Encoding.com: {}",
        if config.encodingcom.is_some() { "configured" } else { "not configured" }
    );

    Ok(())
}

fn list_providers(config_path: Option<&std::path::Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    // Factories only need a store to bind to; nothing is written here
    let service = server::build_service(&config, init_memory_pool()?);

    for name in service.provider_names() {
        match service.registry().get(&name) {
            Ok(_) => println!("✓ {name}"),
            Err(e) => println!("✗ {name} - {e}"),
        }
    }

    Ok(())
}
