mod cli;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::{error, info};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use tessera_core::KernelError;
use tessera_core::plugin_system::artifact::read_artifact_metadata;
use tessera_core::plugin_system::catalog::Source;
use tessera_core::plugin_system::metadata::{InvalidField, PluginMetadata};
use tessera_core::plugin_system::{LoadPass, PluginOrchestrator};
use tessera_core::storage::PluginConfig;
use tessera_core::transport::site::cache_file_name;

/// Tessera: plugin manager of the Tessera map editor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Configuration file (.json, .yaml or .toml)
    #[arg(long, global = true, default_value = "tessera.json")]
    config: PathBuf,

    /// Answer every question with yes
    #[arg(long, short = 'y', global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List known plugins
    List {
        /// Only show plugins matching every word of this text
        #[arg(long)]
        filter: Option<String>,
        /// Download the plugin lists even when cached copies exist
        #[arg(long)]
        refresh: bool,
    },
    /// Show which configured plugins would load, pass by pass
    Load,
    /// Download and install newer plugin versions
    Update {
        /// Plugins to update or install; all configured plugins when empty
        names: Vec<String>,
    },
    /// Print the metadata of a plugin artifact
    Info {
        /// Path to a .tpk file
        artifact: PathBuf,
    },
    /// Print the cache file name used for a plugin site
    CacheName {
        site: String,
    },
    /// Print configured plugins with their installed versions
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = CliArgs::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> Result<(), KernelError> {
    match args.command {
        Commands::CacheName { site } => {
            println!("{}", cache_file_name(&site));
            Ok(())
        }
        Commands::Info { artifact } => print_artifact(&artifact).await,
        Commands::List { filter, refresh } => {
            let mut orchestrator = orchestrator(&args.config, args.yes)?;
            orchestrator.scan_plugin_directory().await;
            if !orchestrator.refresh_plugin_list(refresh, &cancel_on_ctrl_c()).await? {
                info!("Listing without fresh plugin lists");
            }
            print_catalog(&orchestrator, filter.as_deref());
            Ok(())
        }
        Commands::Load => {
            let mut orchestrator = orchestrator(&args.config, args.yes)?;
            let load_set = orchestrator.build_load_set().await?;
            print_plan(&orchestrator, &load_set);
            Ok(())
        }
        Commands::Update { names } => {
            let mut orchestrator = orchestrator(&args.config, args.yes)?;
            let targets = (!names.is_empty()).then_some(names);
            let outcome = orchestrator.update_plugins(targets.as_deref(), &cancel_on_ctrl_c()).await?;
            if outcome.cancelled {
                println!("Update cancelled");
            }
            for name in &outcome.updated {
                println!("updated {}", name);
            }
            for (name, reason) in &outcome.failed {
                println!("failed  {}: {}", name, reason);
            }
            if outcome.updated.is_empty() && outcome.failed.is_empty() && !outcome.cancelled {
                println!("All plugins are up to date");
            }
            Ok(())
        }
        Commands::Status => {
            let mut orchestrator = orchestrator(&args.config, args.yes)?;
            orchestrator.scan_plugin_directory().await;
            println!("{}", orchestrator.bug_report_information());
            Ok(())
        }
    }
}

fn orchestrator(config_path: &Path, assume_yes: bool) -> Result<PluginOrchestrator, KernelError> {
    let config = PluginConfig::load_or_default(config_path)?;
    PluginOrchestrator::builder(config)
        .config_path(config_path)
        .ui(Arc::new(cli::CliUi::new(assume_yes)))
        .build()
}

/// Token cancelled by the first Ctrl-C
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Cancelling...");
            trigger.cancel();
        }
    });
    cancel
}

async fn print_artifact(path: &Path) -> Result<(), KernelError> {
    let metadata = read_artifact_metadata(path).await?;
    println!("{}", metadata.name());
    for line in metadata.to_block().lines() {
        println!("  {}", line);
    }
    for warning in metadata.warnings() {
        println!("warning: {}: {}", warning.key, warning.message);
    }
    for invalid in metadata.invalid_fields() {
        match invalid {
            InvalidField::Placeholder { key, value } => println!("invalid: {} has unresolved value '{}'", key, value),
            InvalidField::SelfDependency => println!("invalid: plugin requires itself"),
        }
    }
    Ok(())
}

fn print_catalog(orchestrator: &PluginOrchestrator, filter: Option<&str>) {
    let mut entries: Vec<_> = orchestrator
        .catalog()
        .entries()
        .filter(|e| filter.is_none_or(|f| e.metadata.matches(f)))
        .collect();
    entries.sort_by(|a, b| a.metadata.name().cmp(b.metadata.name()));

    if entries.is_empty() {
        println!("No plugins found");
        return;
    }
    for entry in entries {
        let metadata = &entry.metadata;
        let state = match entry.source {
            Source::CachedRemote => "available",
            Source::LocalArtifact | Source::Active if metadata.has_newer_advertised() => "update available",
            Source::LocalArtifact | Source::Active => "installed",
        };
        println!("{:<24} {:<12} {}", metadata.name(), version_of(metadata), state);
    }
}

fn version_of(metadata: &PluginMetadata) -> &str {
    metadata
        .local_version
        .as_deref()
        .or(metadata.version.as_deref())
        .unwrap_or("-")
}

/// Dry run of the loading passes.
///
/// Each pass is checked against the plugins accepted by earlier passes, the
/// way the real passes see the modules activated before them.
fn print_plan(orchestrator: &PluginOrchestrator, load_set: &[PluginMetadata]) {
    let mut accepted: Vec<PluginMetadata> = Vec::new();
    for pass in LoadPass::ALL {
        let plugins = pass.select(load_set);
        if plugins.is_empty() {
            continue;
        }
        let mut candidates = accepted.clone();
        candidates.extend(plugins.iter().cloned());
        let resolution = orchestrator.plan(candidates);

        println!("{} pass:", pass);
        for plugin in resolution.scheduled.iter().filter(|p| LoadPass::of(p) == pass) {
            println!("  load    {} ({})", plugin.name(), version_of(plugin));
            accepted.push(plugin.clone());
        }
        for (name, reason) in &resolution.rejected {
            if plugins.iter().any(|p| p.name() == name) {
                println!("  skip    {}: {}", name, reason);
            }
        }
    }
    if accepted.is_empty() {
        println!("No plugins to load");
    }
}
