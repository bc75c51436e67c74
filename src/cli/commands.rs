//! Command dispatch

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use serde_yaml::Value;
use tracing::{debug, instrument};

use crate::application::services::SiteService;
use crate::cli::args::{Cli, Commands, ConfigCommands, DirArgs};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings, PROJECT_CONFIG_FILE};
use crate::domain::filters::number_format;
use crate::domain::Event;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;
use crate::tree_traits::TreeNodeConvert;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Build { dirs }) => cmd_build(cli, dirs),
        Some(Commands::Tree { dirs }) => cmd_tree(cli, dirs),
        Some(Commands::Links { dirs }) => cmd_links(cli, dirs),
        Some(Commands::Timeline { dirs }) => cmd_timeline(cli, dirs),
        Some(Commands::Config { command }) => cmd_config(cli, command),
        Some(Commands::Completion { shell }) => cmd_completion(*shell),
        None => Err(CliError::Usage(
            "no command given, see 'lorewiki --help'".into(),
        )),
    }
}

fn site_service(cli: &Cli, dirs: &DirArgs) -> CliResult<SiteService> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    settings.override_with(dirs.lib.as_deref(), dirs.output.as_deref());
    debug!("effective settings: {:?}", settings);
    Ok(ServiceContainer::new(settings).site_service())
}

#[instrument(skip(cli))]
fn cmd_build(cli: &Cli, dirs: &DirArgs) -> CliResult<()> {
    let report = site_service(cli, dirs)?.generate()?;
    for warning in &report.warnings {
        output::warning(warning);
    }
    output::success(&format!(
        "{} documents, {} pages, {} links, {} events",
        number_format(&report.documents.to_string()),
        number_format(&report.pages.to_string()),
        number_format(&report.links.to_string()),
        number_format(&report.events.to_string()),
    ));
    output::action("Written", &report.output_dir.display());
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_tree(cli: &Cli, dirs: &DirArgs) -> CliResult<()> {
    let site = site_service(cli, dirs)?.build()?;
    output::info(&site.wiki.tree.to_tree_string());
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_links(cli: &Cli, dirs: &DirArgs) -> CliResult<()> {
    let site = site_service(cli, dirs)?.build()?;
    output::header(&format!("{} link entries", site.wiki.links.len()));
    for entry in site.wiki.links.iter() {
        if entry.text == entry.link {
            output::detail(&format!("{} -> {}", entry.text, entry.file));
        } else {
            output::detail(&format!("{} ({}) -> {}", entry.text, entry.link, entry.file));
        }
    }
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_timeline(cli: &Cli, dirs: &DirArgs) -> CliResult<()> {
    let site = site_service(cli, dirs)?.build()?;
    output::header(&format!("{} events", site.wiki.timeline.len()));
    for event in site.wiki.timeline.iter() {
        output::detail(&format!(
            "{:<20} {:<24} {}",
            event.date,
            event.source,
            event_summary(event)
        ));
    }
    Ok(())
}

/// First text field of an event, for one-line listings.
fn event_summary(event: &Event) -> String {
    event
        .payload
        .values()
        .find_map(Value::as_str)
        .map(|s| s.lines().next().unwrap_or_default().to_string())
        .unwrap_or_default()
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(cli.config.as_deref())?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".into())
                })?
            } else {
                Path::new(PROJECT_CONFIG_FILE).to_path_buf()
            };
            if path.exists() {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
            }
            std::fs::write(&path, Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::action("Created", &path.display());
        }
        ConfigCommands::Path => {
            let project = cli
                .config
                .clone()
                .unwrap_or_else(|| Path::new(PROJECT_CONFIG_FILE).to_path_buf());
            match global_config_path() {
                Some(global) => print_config_path("global", &global),
                None => output::detail(&"global: (unavailable)"),
            }
            print_config_path("project", &project);
        }
    }
    Ok(())
}

fn print_config_path(label: &str, path: &Path) {
    let state = if path.exists() { "exists" } else { "missing" };
    output::detail(&format!("{label}: {} ({state})", path.display()));
}

fn cmd_completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
