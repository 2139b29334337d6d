use anyhow::Context;
use colored::Colorize;

use ctc_server::{CtcServer, ServerConfig, StorageConfig};

use crate::cli::{Cli, Command, ConfigArgs, ServeArgs};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Config(args) => cmd_config(args),
    }
}

/// Config file plus command-line overrides.
fn resolve_config(args: &ServeArgs) -> anyhow::Result<ServerConfig> {
    let mut config = ServerConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(dir) = &args.static_dir {
        config.static_dir = dir.clone();
    }
    if let Some(path) = &args.data_dir {
        config.storage = StorageConfig::Dir { path: path.clone() };
    } else if args.memory {
        config.storage = StorageConfig::Memory;
    }
    Ok(config)
}

fn describe_storage(storage: &StorageConfig) -> String {
    match storage {
        StorageConfig::Memory => "memory (not persisted)".to_string(),
        StorageConfig::Dir { path } => path.display().to_string(),
    }
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;
    println!(
        "{} C-Terminal Community on {}",
        "▶".green().bold(),
        config.bind_addr.to_string().bold()
    );
    println!("  Storage: {}", describe_storage(&config.storage).cyan());
    println!("  Static:  {}", config.static_dir.display().to_string().cyan());
    if config.google_client_id.is_empty() {
        println!("  {} google_client_id is not set", "warning:".yellow());
    }

    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    runtime.block_on(async {
        let server = CtcServer::from_config(config).await?;
        server.serve().await
    })?;
    tracing::info!("server stopped");
    println!("{} Shut down.", "✓".green());
    Ok(())
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<()> {
    let config = ServerConfig::load(args.config.as_deref()).context("loading configuration")?;
    print!("{}", config.to_toml()?);
    Ok(())
}
