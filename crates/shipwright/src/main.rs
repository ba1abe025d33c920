mod commands;
mod utils;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ship")]
#[command(about = "Provision and deploy Django projects over SSH", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered environments
    Envs,
    /// Validate ship.kdl and print a summary
    Validate,
    /// Bootstrap a host and deploy the project
    Setup {
        /// Environment name
        environment: Option<String>,
        /// Environment name (-e/--env flag, SHIP_ENV variable)
        #[arg(
            short = 'e',
            long = "env",
            env = "SHIP_ENV",
            conflicts_with = "environment",
            hide = true
        )]
        env_flag: Option<String>,
        /// Skip confirmation prompts
        #[arg(short, long)]
        yes: bool,
    },
    /// Deploy the project into an existing host
    Deploy {
        /// Environment name
        environment: Option<String>,
        /// Environment name (-e/--env flag, SHIP_ENV variable)
        #[arg(
            short = 'e',
            long = "env",
            env = "SHIP_ENV",
            conflicts_with = "environment",
            hide = true
        )]
        env_flag: Option<String>,
        /// Skip confirmation prompts
        #[arg(short, long)]
        yes: bool,
    },
    /// Update the checkout, migrate and reload
    Update {
        /// Environment name
        environment: Option<String>,
        /// Environment name (-e/--env flag, SHIP_ENV variable)
        #[arg(
            short = 'e',
            long = "env",
            env = "SHIP_ENV",
            conflicts_with = "environment",
            hide = true
        )]
        env_flag: Option<String>,
    },
    /// Show git log and working tree status on the target
    Status {
        /// Environment name
        environment: Option<String>,
        /// Environment name (-e/--env flag, SHIP_ENV variable)
        #[arg(
            short = 'e',
            long = "env",
            env = "SHIP_ENV",
            conflicts_with = "environment",
            hide = true
        )]
        env_flag: Option<String>,
    },
    /// Run a command in the project directory (aliases expanded)
    Remote {
        /// Environment name
        environment: Option<String>,
        /// Environment name (-e/--env flag, SHIP_ENV variable)
        #[arg(
            short = 'e',
            long = "env",
            env = "SHIP_ENV",
            conflicts_with = "environment",
            hide = true
        )]
        env_flag: Option<String>,
        /// Command to run (after --). Defaults to `gs`.
        #[arg(last = true)]
        command: Vec<String>,
    },
    /// Print the Python version the target runs
    Python {
        /// Environment name
        environment: Option<String>,
        /// Environment name (-e/--env flag, SHIP_ENV variable)
        #[arg(
            short = 'e',
            long = "env",
            env = "SHIP_ENV",
            conflicts_with = "environment",
            hide = true
        )]
        env_flag: Option<String>,
    },
    /// Render the Apache vhost configuration
    Apache {
        /// Environment name
        environment: Option<String>,
        /// Environment name (-e/--env flag, SHIP_ENV variable)
        #[arg(
            short = 'e',
            long = "env",
            env = "SHIP_ENV",
            conflicts_with = "environment",
            hide = true
        )]
        env_flag: Option<String>,
        /// Write to this file instead of stdout (asks first)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Skip confirmation prompts
        #[arg(short, long)]
        yes: bool,
    },
    /// Render the WSGI entry point for the configured Django variant
    Wsgi {
        /// Environment name
        environment: Option<String>,
        /// Environment name (-e/--env flag, SHIP_ENV variable)
        #[arg(
            short = 'e',
            long = "env",
            env = "SHIP_ENV",
            conflicts_with = "environment",
            hide = true
        )]
        env_flag: Option<String>,
        /// Write to this file instead of stdout (asks first)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Skip confirmation prompts
        #[arg(short, long)]
        yes: bool,
    },
    /// Back up the database and configured extra paths
    Backup {
        /// Environment name
        environment: Option<String>,
        /// Environment name (-e/--env flag, SHIP_ENV variable)
        #[arg(
            short = 'e',
            long = "env",
            env = "SHIP_ENV",
            conflicts_with = "environment",
            hide = true
        )]
        env_flag: Option<String>,
        /// Offer to download the archive afterwards
        #[arg(short, long)]
        download: bool,
        /// Local directory for the downloaded archive
        #[arg(long, default_value = "backup")]
        dest: PathBuf,
        /// Skip confirmation prompts
        #[arg(short, long)]
        yes: bool,
    },
    /// Restore a backup archive (drops and recreates the database)
    Restore {
        /// Environment name
        #[arg(required = true)]
        environment: Option<String>,
        /// Backup archive (local path or remote archive name)
        archive: String,
        /// Environment name (-e/--env flag, SHIP_ENV variable)
        #[arg(
            short = 'e',
            long = "env",
            env = "SHIP_ENV",
            conflicts_with = "environment",
            hide = true
        )]
        env_flag: Option<String>,
        /// Skip confirmation prompts
        #[arg(short, long)]
        yes: bool,
    },
    /// Inspect a downloaded backup archive
    VerifyArchive {
        /// Path to a .tar.gz backup archive
        path: PathBuf,
    },
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // Commands that need no configuration file.
    match &cli.command {
        Commands::Version => {
            println!("shipwright {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Commands::VerifyArchive { path } => {
            return commands::verify::handle(path);
        }
        _ => {}
    }

    let config_root = match shipwright_core::find_config_root() {
        Ok(root) => root,
        Err(e) => {
            eprintln!("{} {e}", "Error:".red().bold());
            eprintln!();
            eprintln!(
                "{}",
                "hint: create a ship.kdl declaring your environments, or set SHIP_CONFIG_ROOT"
                    .yellow()
            );
            std::process::exit(1);
        }
    };
    let registry = shipwright_core::parse_config_file(&config_root.join(shipwright_core::CONFIG_FILENAME))?;

    match cli.command {
        Commands::Envs => {
            commands::envs::handle(&registry);
        }
        Commands::Validate => {
            commands::validate::handle(&config_root, &registry);
        }
        Commands::Setup {
            environment,
            env_flag,
            yes,
        } => {
            let name = utils::determine_environment(&registry, environment, env_flag)?;
            commands::setup::handle(&registry, &name, yes).await?;
        }
        Commands::Deploy {
            environment,
            env_flag,
            yes,
        } => {
            let name = utils::determine_environment(&registry, environment, env_flag)?;
            commands::deploy::handle(&registry, &name, yes).await?;
        }
        Commands::Update {
            environment,
            env_flag,
        } => {
            let name = utils::determine_environment(&registry, environment, env_flag)?;
            commands::update::handle(&registry, &name).await?;
        }
        Commands::Status {
            environment,
            env_flag,
        } => {
            let name = utils::determine_environment(&registry, environment, env_flag)?;
            commands::remote::handle_status(&registry, &name).await?;
        }
        Commands::Remote {
            environment,
            env_flag,
            command,
        } => {
            let name = utils::determine_environment(&registry, environment, env_flag)?;
            commands::remote::handle_remote(&registry, &name, &command.join(" ")).await?;
        }
        Commands::Python {
            environment,
            env_flag,
        } => {
            let name = utils::determine_environment(&registry, environment, env_flag)?;
            commands::remote::handle_python(&registry, &name).await?;
        }
        Commands::Apache {
            environment,
            env_flag,
            output,
            yes,
        } => {
            let name = utils::determine_environment(&registry, environment, env_flag)?;
            commands::render::handle_apache(&registry, &name, output, yes).await?;
        }
        Commands::Wsgi {
            environment,
            env_flag,
            output,
            yes,
        } => {
            let name = utils::determine_environment(&registry, environment, env_flag)?;
            commands::render::handle_wsgi(&registry, &name, output, yes).await?;
        }
        Commands::Backup {
            environment,
            env_flag,
            download,
            dest,
            yes,
        } => {
            let name = utils::determine_environment(&registry, environment, env_flag)?;
            commands::backup::handle(&registry, &name, download, dest, yes).await?;
        }
        Commands::Restore {
            environment,
            archive,
            env_flag,
            yes,
        } => {
            let name = utils::determine_environment(&registry, environment, env_flag)?;
            commands::restore::handle(&registry, &name, &archive, yes).await?;
        }
        Commands::VerifyArchive { .. } | Commands::Version => {
            unreachable!("handled before config loading");
        }
    }

    Ok(())
}
