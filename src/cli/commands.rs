//! Command dispatch

use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::CommandFactory;
use tokio::runtime::Runtime;
use tracing::{debug, instrument};

use crate::application::services::{BootstrapReport, ToggleOutcome};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::CliResult;
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::derive_prefixes;
use crate::infrastructure::analytics::MemoryAnalytics;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::provider::StaticProvider;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Tree { file, filters }) => cmd_tree(cli, file, filters),
        Some(Commands::Toggle {
            file,
            ids,
            filters,
        }) => cmd_toggle(cli, file, filters, ids),
        Some(Commands::Prefixes { filters }) => cmd_prefixes(filters),
        Some(Commands::Config { command }) => cmd_config(cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "taxotree", &mut io::stdout());
            Ok(())
        }
        None => {
            Cli::command()
                .print_help()
                .map_err(|e| InfraError::io("print help", e))?;
            Ok(())
        }
    }
}

fn runtime() -> CliResult<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| InfraError::io("start async runtime", e).into())
}

fn load_inputs(cli: &Cli, file: &Path) -> CliResult<(Settings, Arc<StaticProvider>)> {
    let settings = Settings::load(cli.config.as_deref())?;
    let provider = StaticProvider::load(file)?;
    Ok((settings, Arc::new(provider)))
}

fn print_report(report: &BootstrapReport) {
    let mode = if report.used_default {
        "default expansion"
    } else {
        "filter expansion"
    };
    output::header(&format!(
        "{} top-level, {} opened, {} fetches ({})",
        report.top_level,
        report.expanded.len(),
        report.fetches,
        mode
    ));
    if let Some(failure) = &report.failure {
        output::warning(&format!("bootstrap stopped early: {}", failure));
    }
}

#[instrument(skip(cli))]
fn cmd_tree(cli: &Cli, file: &Path, filters: &[String]) -> CliResult<()> {
    let (settings, provider) = load_inputs(cli, file)?;
    let facet = ServiceContainer::new(settings, provider).facet();
    facet.set_active_filters(filters);

    let report = runtime()?.block_on(facet.bootstrap());
    print_report(&report);
    output::info(&facet.render());

    report.into_result()?;
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_toggle(cli: &Cli, file: &Path, filters: &[String], ids: &[String]) -> CliResult<()> {
    let analytics = Arc::new(MemoryAnalytics::new());
    let (settings, provider) = load_inputs(cli, file)?;
    let facet = ServiceContainer::with_deps(settings, provider, analytics.clone()).facet();
    facet.set_active_filters(filters);

    let rt = runtime()?;
    let report = rt.block_on(facet.bootstrap());
    print_report(&report);
    report.into_result()?;

    for id in ids {
        let outcome = rt.block_on(facet.expand_id(id))?;
        debug!("{} -> {:?}", id, outcome);
        let verb = match outcome {
            ToggleOutcome::Expanded { fetched: true } => "expanded (fetched)",
            ToggleOutcome::Expanded { fetched: false } => "expanded",
            ToggleOutcome::Collapsed => "collapsed",
            ToggleOutcome::InFlight => "busy",
        };
        output::success(&format!("{}: {}", id, verb));
    }

    for event in analytics.events() {
        output::detail(&format!(
            "event {}/{}: {}",
            event.category, event.action, event.label
        ));
    }
    output::info(&facet.render());
    Ok(())
}

fn cmd_prefixes(filters: &[String]) -> CliResult<()> {
    for prefix in &derive_prefixes(filters) {
        output::info(prefix);
    }
    Ok(())
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(cli.config.as_deref())?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::info(&path.display()),
            None => output::warning("no config directory available"),
        },
    }
    Ok(())
}
