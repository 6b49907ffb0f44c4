mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

use hh_av::ToolRegistry;
use hh_core::config::Config;
use hh_sync::{Decision, Outcome, SyncEngine};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "horsehub=trace,hh_sync=trace,hh_av=trace,hh_core=debug,hh_server=debug,tower_http=debug"
                .to_string()
        } else {
            "horsehub=info,hh_sync=info,hh_av=info,hh_core=info,hh_server=info,tower_http=info"
                .to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Sync {
            intake,
            output,
            metadata,
            jobs,
            dry_run,
        } => {
            let mut config = Config::load_or_default(cli.config.as_deref());
            if let Some(dir) = intake {
                config.sync.intake_dir = dir;
            }
            if let Some(dir) = output {
                config.sync.output_dir = dir;
            }
            if let Some(path) = metadata {
                config.sync.metadata_path = path;
            }
            if jobs.is_some() {
                config.conversion.concurrency = jobs;
            }
            for warning in config.validate() {
                tracing::warn!("Config: {warning}");
            }

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(sync(&config, dry_run))
        }
        Commands::Serve {
            host,
            port,
            static_dir,
            metadata,
        } => {
            let mut config = Config::load_or_default(cli.config.as_deref());
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(dir) = static_dir {
                config.server.static_dir = dir;
            }
            if let Some(path) = metadata {
                config.sync.metadata_path = path;
            }

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(hh_server::start(&config))?;
            Ok(())
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
    }
}

async fn sync(config: &Config, dry_run: bool) -> Result<()> {
    let tools = Arc::new(ToolRegistry::discover(&config.tools));
    let engine = SyncEngine::from_config(config, tools);

    if dry_run {
        return print_plan(&engine);
    }

    let report = engine.run().await?;

    if report.intake_created {
        println!(
            "Created missing intake directory {}; nothing to do.",
            config.sync.intake_dir.display()
        );
        return Ok(());
    }

    for outcome in report.failures() {
        if let Outcome::Failed { reason } = &outcome.outcome {
            println!("✗ {}: {reason}", outcome.source);
        }
    }
    for source in &report.collisions {
        println!("! {source}: output name already used by another source");
    }
    for (name, error) in &report.delete_failures {
        println!("! could not delete {name}: {error}");
    }

    println!("{}", report.stats);
    Ok(())
}

fn print_plan(engine: &SyncEngine) -> Result<()> {
    let plan = engine.plan()?;

    if plan.intake_missing {
        println!(
            "[DRY RUN] Intake directory {} does not exist; it would be created.",
            engine.config().intake_dir.display()
        );
        return Ok(());
    }

    for file in &plan.files {
        let action = match file.decision {
            Decision::Create => "create",
            Decision::Refresh => "refresh",
            Decision::UpToDate => continue,
        };
        println!("  {action:<8} {} -> {} ({})", file.source, file.output, file.category);
    }
    for (name, error) in &plan.unreadable {
        println!("  skip     {name}: {error}");
    }
    for name in &plan.collisions {
        println!("  skip     {name}: output name already used");
    }
    for name in &plan.stale {
        println!("  delete   {name}");
    }

    println!(
        "\n[DRY RUN] Would process {} of {} file(s) and delete {} stale output(s)",
        plan.pending().count(),
        plan.files.len(),
        plan.stale.len()
    );
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = Config::load_or_default(config_path);
    let tools = ToolRegistry::discover(&config.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("ffmpeg is missing; videos and images will fail to convert until it is installed.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            Config::load(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("✓ Configuration is valid");
    } else {
        for warning in &warnings {
            println!("⚠ {warning}");
        }
    }

    println!("  Intake: {}", config.sync.intake_dir.display());
    println!("  Output: {}", config.sync.output_dir.display());
    println!("  Metadata: {}", config.sync.metadata_path.display());
    println!("  Server: {}:{}", config.server.host, config.server.port);
    match config.conversion.concurrency {
        Some(n) => println!("  Concurrency: {n}"),
        None => println!("  Concurrency: {} (CPU count)", num_cpus::get()),
    }

    Ok(())
}
