//! Mailsmith CLI
//!
//! Usage:
//!   mailsmith [OPTIONS] <COMMAND>
//!
//! Commands:
//!   set        Set a parameter (persisted for the retention window)
//!   show       Show current parameter values
//!   clear      Reset all parameters and erase persisted values
//!   templates  List available templates
//!   inspect    Report placeholders used by a template
//!   generate   Fill a template and export the result

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::task::JoinHandle;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use mailsmith::export::DataUriExporter;
use mailsmith::storage::SystemClock;
use mailsmith::template::{
    read_file_as_text, BuiltinCatalog, DirectoryCatalog, TemplateCatalog, CUSTOM_SELECTION,
};
use mailsmith::{
    lint, placeholders, Error, Exporter, FileExporter, Generator, GeneratorConfig,
    JsonFileStorage, ParameterSet, ParameterStore, TemplateResolver, TemplateSelection,
};

#[derive(Parser)]
#[command(name = "mailsmith")]
#[command(about = "Fill named parameters into HTML email templates")]
struct Cli {
    /// Generator configuration file (TOML format)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// File holding persisted parameter values
    #[arg(long, global = true, default_value = ".mailsmith/params.json")]
    state: PathBuf,

    /// Serve templates from this directory instead of the built-ins
    #[arg(long, global = true)]
    templates_dir: Option<PathBuf>,

    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Set a parameter value
    Set {
        /// Parameter key, e.g. header
        key: String,
        /// Value, used verbatim
        value: String,
    },

    /// Show current parameter values
    Show,

    /// Reset all parameters and erase persisted values
    Clear,

    /// List available templates
    Templates,

    /// Report placeholders used by a template
    Inspect {
        /// Template id, or a file path with --file
        template: String,

        /// Treat TEMPLATE as a file path
        #[arg(short, long)]
        file: bool,
    },

    /// Fill a template and export the result
    Generate {
        /// Template id (default: the first built-in)
        #[arg(short, long, conflicts_with = "custom")]
        template: Option<String>,

        /// Use this file as a custom template
        #[arg(long)]
        custom: Option<PathBuf>,

        /// Set parameters before generating (KEY=VALUE, repeatable)
        #[arg(short, long = "param", value_parser = parse_assignment)]
        params: Vec<(String, String)>,

        /// Directory to write the document to
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Print a data: URI instead of writing a file
        #[arg(long)]
        data_uri: bool,
    },
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "mailsmith=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

async fn run(cli: Cli) -> Result<(), Error> {
    let config = match &cli.config {
        Some(path) => GeneratorConfig::from_file(path)?,
        None => GeneratorConfig::default(),
    };

    let catalog: Arc<dyn TemplateCatalog> = match &cli.templates_dir {
        Some(dir) => Arc::new(DirectoryCatalog::new(dir).with_extension(config.extension.clone())),
        None => Arc::new(BuiltinCatalog::new()),
    };

    let store = ParameterStore::open(config, JsonFileStorage::new(&cli.state), SystemClock);
    let mut generator = Generator::new(store, TemplateResolver::new(Arc::clone(&catalog)));

    match cli.command {
        Command::Set { key, value } => {
            generator.store_mut().set(&key, value)?;
        }
        Command::Show => print_params(generator.store().get()),
        Command::Clear => {
            generator.clear();
            println!("Cleared all parameters.");
        }
        Command::Templates => {
            for info in catalog.list() {
                println!("{:<12} {}", info.id, info.title);
                println!("{:<12} {}", "", info.description);
            }
            println!("{:<12} Upload your own template with --custom FILE", CUSTOM_SELECTION);
        }
        Command::Inspect { template, file } => {
            let (name, text) = if file {
                let path = PathBuf::from(&template);
                (template, read_file_as_text(&path).await?)
            } else {
                let text = catalog.fetch(&template).await?;
                (format!("{}.{}", template, generator.config().extension), text)
            };
            inspect(&name, &text, generator.config(), generator.store().get());
        }
        Command::Generate {
            template,
            custom,
            params,
            out,
            data_uri,
        } => {
            for (key, value) in params {
                generator.store_mut().set(&key, value)?;
            }

            let resolver = generator.resolver().clone();
            let load = match custom {
                Some(path) => {
                    let _ = resolver.select(TemplateSelection::Custom);
                    resolver.upload(async move { read_file_as_text(&path).await })
                }
                None => {
                    let id = template.unwrap_or_else(|| BuiltinCatalog::default_id().to_string());
                    resolver.select(TemplateSelection::builtin(id))
                }
            };
            let pending = load.spawn();
            let doc = generator.generate_when_ready().await;
            finish_load(pending).await;
            let doc = doc?;

            if data_uri {
                DataUriExporter::new(io::stdout()).export(&doc)?;
            } else {
                let mut exporter = FileExporter::new(&out);
                let path = exporter.path_for(&doc)?;
                exporter.export(&doc)?;
                println!("Wrote {}", path.display());
            }
        }
    }

    Ok(())
}

/// Wait for a spawned template load; a panicked or cancelled task is logged
async fn finish_load(handle: JoinHandle<bool>) -> bool {
    match handle.await {
        Ok(committed) => committed,
        Err(e) => {
            warn!(error = %e, "template load task did not complete");
            false
        }
    }
}

fn print_params(params: &ParameterSet) {
    let width = params.keys().map(|k| k.as_str().len()).max().unwrap_or(0);
    for (key, value) in params.iter() {
        println!("{:<width$}  {}", key.as_str(), value, width = width);
    }
}

fn inspect(name: &str, text: &str, config: &GeneratorConfig, params: &ParameterSet) {
    let used = placeholders(text, params);
    if used.is_empty() {
        println!("{}: no configured placeholders", name);
    } else {
        let names: Vec<&str> = used.iter().map(|k| k.as_str()).collect();
        println!("{}: {}", name, names.join(", "));
    }

    for warning in lint::check(text, config) {
        eprint!("{}", warning.format(text, name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("header=Hi = there"),
            Ok(("header".to_string(), "Hi = there".to_string()))
        );
        assert!(parse_assignment("header").is_err());
    }

    #[tokio::test]
    async fn test_finish_load_reports_panicked_task() {
        let handle: JoinHandle<bool> = tokio::spawn(async { panic!("fetch blew up") });
        assert!(!finish_load(handle).await);
    }

    #[tokio::test]
    async fn test_finish_load_passes_through_outcome() {
        assert!(finish_load(tokio::spawn(async { true })).await);
    }
}
