use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand};
use client_core::{
    import::DEFAULT_IMPORT_PLUGIN, load_settings, load_settings_from, ImportBatch, ImportRules,
    Intent, NotificationKind, Orchestrator,
};
use shared::domain::{
    DefectType, DefectTypeId, NotificationRuleId, Pattern, PatternId, PatternKind, ProjectName,
    TestItemId,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Manage project settings on a test-reporting server")]
struct Cli {
    /// Settings file; defaults to ./client.toml.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the project from the settings.
    #[arg(long)]
    project: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show project info and configuration attributes.
    Project {
        #[arg(long)]
        info_only: bool,
    },
    #[command(subcommand)]
    DefectTypes(DefectTypeCommand),
    #[command(subcommand)]
    Patterns(PatternCommand),
    #[command(subcommand)]
    Notifications(NotificationCommand),
    /// Upload launch reports through an import plugin.
    Import {
        #[arg(long, default_value = DEFAULT_IMPORT_PLUGIN)]
        plugin: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Fetch analyzer suggestions for a test item.
    Suggestions { item_id: i64 },
}

#[derive(Subcommand, Debug)]
enum DefectTypeCommand {
    List,
    Add {
        type_ref: String,
        long_name: String,
        short_name: String,
        #[arg(long, default_value = "#ffffff")]
        color: String,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum PatternCommand {
    List,
    Add {
        name: String,
        value: String,
        #[arg(long)]
        regex: bool,
        #[arg(long)]
        disabled: bool,
    },
    Rename {
        id: i64,
        name: String,
    },
    Delete {
        id: i64,
    },
    /// Switch automatic pattern analysis on or off.
    Analysis {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

#[derive(Subcommand, Debug)]
enum NotificationCommand {
    List,
    Delete {
        id: i64,
    },
    /// Switch project e-mail notifications on or off.
    State {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => load_settings_from(path)?,
        None => load_settings()?,
    };
    if cli.project.is_some() {
        settings.project = cli.project.clone();
    }
    let project = settings
        .project
        .clone()
        .map(ProjectName::new)
        .context("no project configured; pass --project or set APP__PROJECT")?;
    let orchestrator = Orchestrator::connect(&settings)?;
    info!(server = %settings.server_url, project = %project, "cli: connected");

    match cli.command {
        Command::Project { info_only } => {
            run(
                &orchestrator,
                Intent::FetchProject {
                    project: project.clone(),
                    info_only,
                },
            )
            .await?;
            let state = orchestrator.store().snapshot();
            if let Some(info) = &state.project.info {
                println!("project {} (id={})", info.name, info.id);
            }
            for (key, value) in &state.project.configuration.attributes {
                println!("  {key} = {value}");
            }
            for filter in &state.filters.launches {
                println!("  filter {} {}", filter.id, filter.name);
            }
        }
        Command::DefectTypes(command) => {
            load_project(&orchestrator, &project).await?;
            defect_types(&orchestrator, command).await?;
        }
        Command::Patterns(command) => {
            load_project(&orchestrator, &project).await?;
            patterns(&orchestrator, command).await?;
        }
        Command::Notifications(command) => {
            run(&orchestrator, Intent::FetchProjectNotifications).await?;
            notifications(&orchestrator, command).await?;
        }
        Command::Import { plugin, files } => {
            let mut batch = ImportBatch::new(ImportRules::default());
            for path in files {
                let bytes = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("failed to read '{}'", path.display()))?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                batch.add_file(name, bytes);
            }
            info!(plugin = %plugin, files = batch.files().len(), "cli: importing");
            for file in batch.files().iter().filter(|f| !f.valid) {
                eprintln!(
                    "skipping {}: {}",
                    file.name,
                    file.validation_error.as_deref().unwrap_or("invalid")
                );
            }
            let summary = batch.upload(orchestrator.context(), &plugin).await?;
            print_notifications(&orchestrator);
            println!("imported {} file(s), {} failed", summary.uploaded, summary.failed);
            if summary.failed > 0 {
                bail!("some files were not imported");
            }
        }
        Command::Suggestions { item_id } => {
            run(&orchestrator, Intent::FetchMlSuggestions(TestItemId(item_id))).await?;
            let suggestions = orchestrator.store().select(|s| s.triage.suggestions.clone());
            for suggestion in suggestions {
                println!(
                    "{} {} {}",
                    suggestion.test_item_resource.id,
                    suggestion.test_item_resource.name,
                    serde_json::to_string(&suggestion.suggest_rs)?
                );
            }
        }
    }

    Ok(())
}

async fn run(orchestrator: &Orchestrator, intent: Intent) -> Result<()> {
    let outcome = orchestrator.run(intent).await;
    print_notifications(orchestrator);
    match outcome.error {
        Some(err) => {
            warn!(intent = outcome.kind.name(), error = %err, "cli: intent rejected");
            Err(err.into())
        }
        None => Ok(()),
    }
}

fn print_notifications(orchestrator: &Orchestrator) {
    let notifications = orchestrator.notifications();
    for notification in notifications.snapshot() {
        match notification.kind {
            NotificationKind::Success => println!("{}", notification.text()),
            NotificationKind::Error => eprintln!("error: {}", notification.text()),
        }
        notifications.dismiss(notification.id);
    }
}

async fn load_project(orchestrator: &Orchestrator, project: &ProjectName) -> Result<()> {
    run(
        orchestrator,
        Intent::FetchProject {
            project: project.clone(),
            info_only: true,
        },
    )
    .await
}

async fn defect_types(orchestrator: &Orchestrator, command: DefectTypeCommand) -> Result<()> {
    match command {
        DefectTypeCommand::List => {
            let groups = orchestrator
                .store()
                .select(|s| s.project.configuration.sub_types.clone());
            for (type_ref, defect_types) in groups {
                println!("{type_ref}");
                for defect_type in defect_types {
                    println!(
                        "  {} {} ({}) {}",
                        defect_type.id.map(|id| id.to_string()).unwrap_or_default(),
                        defect_type.long_name,
                        defect_type.short_name,
                        defect_type.color
                    );
                }
            }
            Ok(())
        }
        DefectTypeCommand::Add {
            type_ref,
            long_name,
            short_name,
            color,
        } => {
            let defect_type = DefectType {
                id: None,
                locator: None,
                type_ref,
                long_name,
                short_name,
                color,
            };
            run(orchestrator, Intent::AddDefectType(defect_type)).await
        }
        DefectTypeCommand::Delete { id } => {
            let id = Some(DefectTypeId(id));
            let Some(defect_type) = orchestrator.store().select(|s| {
                s.project
                    .configuration
                    .sub_types
                    .values()
                    .flatten()
                    .find(|d| d.id == id)
                    .cloned()
            }) else {
                bail!("no defect type with that id");
            };
            run(orchestrator, Intent::DeleteDefectType(defect_type)).await
        }
    }
}

async fn patterns(orchestrator: &Orchestrator, command: PatternCommand) -> Result<()> {
    let find = |id: i64| {
        let id = Some(PatternId(id));
        orchestrator
            .store()
            .select(|s| s.patterns().iter().find(|p| p.id == id).cloned())
            .context("no pattern with that id")
    };
    match command {
        PatternCommand::List => {
            for pattern in orchestrator.store().select(|s| s.patterns().to_vec()) {
                println!(
                    "{} {} [{}] {}",
                    pattern.id.map(|id| id.to_string()).unwrap_or_default(),
                    pattern.name,
                    if pattern.enabled { "on" } else { "off" },
                    pattern.value.unwrap_or_default()
                );
            }
            Ok(())
        }
        PatternCommand::Add {
            name,
            value,
            regex,
            disabled,
        } => {
            let pattern = Pattern {
                id: None,
                name,
                enabled: !disabled,
                kind: Some(if regex {
                    PatternKind::Regex
                } else {
                    PatternKind::String
                }),
                value: Some(value),
            };
            run(orchestrator, Intent::AddPattern(pattern)).await
        }
        PatternCommand::Rename { id, name } => {
            let mut pattern = find(id)?;
            pattern.name = name;
            run(orchestrator, Intent::UpdatePattern(pattern)).await
        }
        PatternCommand::Delete { id } => {
            let pattern = find(id)?;
            run(orchestrator, Intent::DeletePattern(pattern)).await
        }
        PatternCommand::Analysis { enabled } => {
            run(orchestrator, Intent::UpdatePatternAnalysisState(enabled)).await
        }
    }
}

async fn notifications(orchestrator: &Orchestrator, command: NotificationCommand) -> Result<()> {
    match command {
        NotificationCommand::List => {
            for rule in orchestrator.store().select(|s| s.notification_rules().to_vec()) {
                println!(
                    "{} {} [{}] {:?} -> {}",
                    rule.id.map(|id| id.to_string()).unwrap_or_default(),
                    rule.rule_name,
                    if rule.enabled { "on" } else { "off" },
                    rule.send_case,
                    rule.recipients.join(", ")
                );
            }
            Ok(())
        }
        NotificationCommand::Delete { id } => {
            run(orchestrator, Intent::DeleteNotificationRule(NotificationRuleId(id))).await
        }
        NotificationCommand::State { enabled } => {
            run(orchestrator, Intent::UpdateNotificationsState(enabled)).await
        }
    }
}
