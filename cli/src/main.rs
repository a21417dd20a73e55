//! CLI entrypoint for waverun
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use waverun_application::{
    Document, DocumentStore, ParentLocator, PrepareCommandUseCase, RegisterToolUseCase,
    ToolLifecycleUseCase,
};
use waverun_domain::{HierarchyAddress, ToolRun};
use waverun_infrastructure::{
    ConfigLoader, DocumentHierarchyStore, DocumentTemplateCatalog, FileConfig, FileOutputFormat,
    InMemoryDocumentStore,
};
use waverun_presentation::{Cli, Command, ConsoleFormatter, OutputFormat};

/// Use cases wired to one document store.
struct App {
    register: RegisterToolUseCase,
    lifecycle: ToolLifecycleUseCase,
    prepare: PrepareCommandUseCase,
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    ConsoleFormatter::set_color(config.output.color && !cli.no_color);

    if let Command::ShowConfig = cli.command {
        for line in ConfigLoader::describe_sources() {
            println!("{}", line);
        }
        println!();
        println!("{:#?}", config);
        return Ok(());
    }

    info!("Using store {}", config.store.path.display());

    // === Dependency Injection ===
    let store = Arc::new(
        InMemoryDocumentStore::load(&config.store.path)
            .await
            .with_context(|| format!("loading store {}", config.store.path.display()))?,
    );
    let documents: Arc<dyn DocumentStore> = store.clone();
    let hierarchy = Arc::new(DocumentHierarchyStore::new(documents.clone()));
    let catalog = Arc::new(DocumentTemplateCatalog::new(documents.clone()));

    let json = match cli.output {
        Some(format) => format == OutputFormat::Json,
        None => config.output.format == FileOutputFormat::Json,
    };
    let app = App {
        register: RegisterToolUseCase::new(documents.clone(), ParentLocator::new(hierarchy.clone())),
        lifecycle: ToolLifecycleUseCase::new(documents),
        prepare: PrepareCommandUseCase::new(catalog, hierarchy, config.output.namespace.clone()),
        json,
    };

    let mutating = cli.command.is_mutating();
    let output = app.run(cli.command).await?;
    print!("{}", output);

    if mutating {
        store
            .save(&config.store.path)
            .await
            .with_context(|| format!("saving store {}", config.store.path.display()))?;
        debug!("Store saved");
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).map_err(|e| anyhow!("invalid configuration: {}", e))?
    };

    if let Some(path) = &cli.store {
        config.store.path = path.clone();
    }
    if let Some(namespace) = &cli.namespace {
        config.output.namespace = namespace.clone();
    }

    config.validate()?;
    Ok(config)
}

impl App {
    async fn run(&self, command: Command) -> Result<String> {
        match command {
            Command::Add {
                name,
                target,
                text,
                tags,
                notes,
            } => {
                let address = HierarchyAddress::new(
                    target.level,
                    target.wave,
                    target.scope,
                    target.host,
                    target.port,
                    target.protocol,
                );
                let mut tool = ToolRun::new(name, address).with_tags(tags);
                if let Some(text) = text {
                    tool = tool.with_text(text);
                }
                if let Some(notes) = notes {
                    tool = tool.with_notes(notes);
                }
                let registration = self.register.execute(&mut tool).await?;
                Ok(ConsoleFormatter::format_registration(
                    registration.created,
                    &registration.id,
                ))
            }
            Command::Show { id } => {
                let tool = self.load(&id).await?;
                Ok(self.render(&tool))
            }
            Command::List { wave } => {
                let mut filter = Document::new();
                if let Some(wave) = wave {
                    filter.insert("wave".to_string(), serde_json::Value::String(wave));
                }
                let tools = self.register.list(&filter).await?;
                if self.json {
                    Ok(format!("{}\n", ConsoleFormatter::format_list_json(&tools)))
                } else {
                    Ok(ConsoleFormatter::format_list(&tools))
                }
            }
            Command::Start { id, runner } => {
                let mut tool = self.load(&id).await?;
                self.lifecycle.mark_running(&mut tool, &runner).await?;
                Ok(self.render(&tool))
            }
            Command::Done { id, result_file } => {
                let mut tool = self.load(&id).await?;
                self.lifecycle.mark_done(&mut tool, &result_file).await?;
                Ok(self.render(&tool))
            }
            Command::Reset { id } => {
                let mut tool = self.load(&id).await?;
                self.lifecycle.mark_not_done(&mut tool).await?;
                Ok(self.render(&tool))
            }
            Command::Error { id } => {
                let mut tool = self.load(&id).await?;
                self.lifecycle.mark_error(&mut tool).await?;
                Ok(self.render(&tool))
            }
            Command::OutOfTime { id } => {
                let mut tool = self.load(&id).await?;
                self.lifecycle.set_out_of_time(&mut tool).await?;
                Ok(self.render(&tool))
            }
            Command::InTime { id } => {
                let mut tool = self.load(&id).await?;
                self.lifecycle.set_in_time(&mut tool).await?;
                Ok(self.render(&tool))
            }
            Command::OutOfScope { id } => {
                let mut tool = self.load(&id).await?;
                self.lifecycle.set_out_of_scope(&mut tool).await?;
                Ok(self.render(&tool))
            }
            Command::InScope { id } => {
                let mut tool = self.load(&id).await?;
                self.lifecycle.set_in_scope(&mut tool).await?;
                Ok(self.render(&tool))
            }
            Command::Status { id, flags } => {
                let mut tool = self.load(&id).await?;
                self.lifecycle.set_status(&mut tool, flags.as_slice()).await?;
                Ok(self.render(&tool))
            }
            Command::Note { id, text } => {
                let mut tool = self.load(&id).await?;
                self.lifecycle.set_notes(&mut tool, &text).await?;
                Ok(self.render(&tool))
            }
            Command::Tag { id, tag } => {
                let mut tool = self.load(&id).await?;
                self.lifecycle.add_tag(&mut tool, &tag).await?;
                Ok(self.render(&tool))
            }
            Command::Info { id, key, value } => {
                let mut tool = self.load(&id).await?;
                let value = serde_json::from_str(&value).unwrap_or(serde_json::Value::String(value));
                self.lifecycle.set_info(&mut tool, &key, value).await?;
                Ok(self.render(&tool))
            }
            Command::Command { id } => {
                let tool = self.load(&id).await?;
                let prepared = self.prepare.execute(&tool).await?;
                if self.json {
                    let value = serde_json::json!({
                        "output_dir": prepared.output_dir,
                        "command": prepared.command,
                        "unresolved": prepared.unresolved,
                    });
                    Ok(format!("{}\n", serde_json::to_string_pretty(&value)?))
                } else {
                    Ok(ConsoleFormatter::format_command(
                        &prepared.output_dir,
                        &prepared.command,
                        &prepared.unresolved,
                    ))
                }
            }
            Command::Delete { id } => {
                let tool = self.load(&id).await?;
                self.register.delete(&tool).await?;
                Ok(format!("Deleted {}\n", id))
            }
            Command::ShowConfig => Ok(String::new()),
        }
    }

    async fn load(&self, id: &str) -> Result<ToolRun> {
        match self.register.load(id).await? {
            Some(tool) => Ok(tool),
            None => bail!("No tool run with id {}", id),
        }
    }

    fn render(&self, tool: &ToolRun) -> String {
        if self.json {
            format!("{}\n", ConsoleFormatter::format_json(tool))
        } else {
            ConsoleFormatter::format_tool(tool)
        }
    }
}
