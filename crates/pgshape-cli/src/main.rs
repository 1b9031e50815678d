mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use owo_colors::OwoColorize;
use pgshape::pool::{self, DEFAULT_POOL_SIZE};
use pgshape::{
    DEFAULT_RUNTIME_CRATE, EmitOptions, Emitter, Error, GenerateOptions, GenerationReport,
    Generator, TableModel,
};
use pgshape_config::Config;

const DEFAULT_OUTPUT: &str = "gen";

/// Generate typed table bindings from a Postgres catalog.
#[derive(Parser, Debug)]
#[command(name = "pgshape", version)]
struct Cli {
    /// Config file to use instead of searching for .config/pgshape.styx
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Introspect tables and write one Rust module per table
    Generate {
        #[command(flatten)]
        select: SelectArgs,

        /// Output directory for generated files
        #[arg(long, short)]
        output: Option<String>,

        /// Crate path the generated code imports its prelude from
        #[arg(long)]
        runtime_crate: Option<String>,
    },
    /// Introspect tables and print their models
    Inspect {
        #[command(flatten)]
        select: SelectArgs,
    },
}

/// Which tables to read, and how.
#[derive(Args, Debug, Default)]
struct SelectArgs {
    /// Database connection URL (falls back to DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    /// Catalog (database) name; defaults to the connected database
    #[arg(long)]
    catalog: Option<String>,

    /// Schema to introspect
    #[arg(long, short)]
    schema: Option<String>,

    /// Table to generate; repeat for several. Omit for every table
    #[arg(long = "table", short)]
    tables: Vec<String>,

    /// Default mutability policy: none, all or non-key
    #[arg(long)]
    mutability: Option<String>,

    /// Number of tables introspected at once
    #[arg(long)]
    concurrency: Option<u32>,

    /// Per-query timeout for catalog reads, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl SelectArgs {
    fn into_config(self) -> Config {
        Config {
            database_url: self.database_url,
            catalog: self.catalog,
            schema: self.schema,
            tables: self.tables,
            mutability: self.mutability,
            concurrency: self.concurrency,
            timeout_secs: self.timeout_secs,
            ..Default::default()
        }
    }
}

/// How a run ended, as a process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    /// Some table or artifact failed
    Partial,
    /// Configuration or connection problem; nothing was generated
    Fatal,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::Partial => ExitCode::from(1),
            Outcome::Fatal => ExitCode::from(2),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pgshape=info")),
        )
        .init();

    let cli = Cli::parse();
    run(cli).await.into()
}

async fn run(cli: Cli) -> Outcome {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let file_config = match config::load(cli.config.as_deref(), &cwd) {
        Ok(loaded) => loaded.config,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            return Outcome::Fatal;
        }
    };

    match cli.command {
        Commands::Generate {
            select,
            output,
            runtime_crate,
        } => {
            let overrides = Config {
                output,
                runtime_crate,
                ..select.into_config()
            };
            let config = file_config.merge(overrides);
            generate(&config).await
        }
        Commands::Inspect { select } => {
            let config = file_config.merge(select.into_config());
            inspect(&config).await
        }
    }
}

async fn generate(config: &Config) -> Outcome {
    let report = match introspect(config).await {
        Ok(report) => report,
        Err(outcome) => return outcome,
    };
    print_diagnostics(&report);

    let out_dir = Utf8PathBuf::from(config.output.as_deref().unwrap_or(DEFAULT_OUTPUT));
    let options = EmitOptions {
        runtime_crate: config
            .runtime_crate
            .clone()
            .unwrap_or_else(|| DEFAULT_RUNTIME_CRATE.to_string()),
    };
    let emitted = match Emitter::new(out_dir, options).emit_all(&report.tables) {
        Ok(emitted) => emitted,
        Err(e) => {
            print_error(&e);
            return Outcome::Fatal;
        }
    };

    for path in &emitted.written {
        println!("{} {}", "wrote".green(), path);
    }
    for e in &emitted.failures {
        print_error(e);
    }

    if report.is_success() && emitted.is_success() {
        Outcome::Success
    } else {
        Outcome::Partial
    }
}

async fn inspect(config: &Config) -> Outcome {
    let report = match introspect(config).await {
        Ok(report) => report,
        Err(outcome) => return outcome,
    };
    print_diagnostics(&report);

    for table in report.tables.iter() {
        print_table(table);
    }

    if report.is_success() {
        Outcome::Success
    } else {
        Outcome::Partial
    }
}

/// Connect and run the generation pipeline, printing per-table failures.
async fn introspect(config: &Config) -> Result<GenerationReport, Outcome> {
    let Some(database_url) = database_url(config) else {
        print_error(&Error::Config(
            "no database URL: pass --database-url, set database_url in the config file, or set DATABASE_URL".to_string(),
        ));
        return Err(Outcome::Fatal);
    };

    let options = GenerateOptions::from_config(config).map_err(|e| {
        print_error(&e);
        Outcome::Fatal
    })?;

    let pool_size = config
        .concurrency
        .map(|n| n as usize)
        .unwrap_or(DEFAULT_POOL_SIZE);
    tracing::info!(
        database = %mask_password(&database_url),
        schema = %options.schema,
        timeout_secs = ?options.timeout.map(|t| t.as_secs()),
        "connecting"
    );
    let pool = pool::connect(&database_url, pool_size).map_err(|e| {
        print_error(&e);
        Outcome::Fatal
    })?;

    let report = Generator::new(pool, options).run().await.map_err(|e| {
        print_error(&e);
        match e {
            Error::Connection(_) | Error::Config(_) => Outcome::Fatal,
            _ => Outcome::Partial,
        }
    })?;

    for e in &report.failures {
        print_error(e);
    }
    Ok(report)
}

fn database_url(config: &Config) -> Option<String> {
    config
        .database_url
        .clone()
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .filter(|url| !url.is_empty())
}

fn print_error(e: &Error) {
    eprintln!("{} {}", "error:".red().bold(), e);
}

fn print_diagnostics(report: &GenerationReport) {
    for (table, unmapped) in report.diagnostics() {
        eprintln!(
            "{} {}.{} has unmapped type '{}', treated as text",
            "warning:".yellow().bold(),
            table,
            unmapped.column,
            unmapped.raw_data_type
        );
    }
}

fn print_table(table: &TableModel) {
    println!(
        "{} ({} columns, {} mutable)",
        table.qualified_name().bold(),
        table.columns.len(),
        table.mutable_columns().len()
    );
    let width = table
        .all_columns()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0);
    for col in table.all_columns() {
        let mutable = table.mutable_columns().any(|m| m.name == col.name);
        println!(
            "  {:width$}  {:<16} {:<16} {}",
            col.name,
            col.kind.builder_name(),
            col.ty.to_string(),
            if mutable { "mutable".dimmed().to_string() } else { String::new() },
            width = width
        );
    }
    println!();
}

/// Hide the password part of a connection URL.
fn mask_password(url: &str) -> String {
    if let Some(start) = url.find("://") {
        if let Some(at) = url.rfind('@') {
            if at > start + 3 {
                let prefix = &url[..start + 3];
                let suffix = &url[at..];
                if let Some(colon) = url[start + 3..at].find(':') {
                    let user = &url[start + 3..start + 3 + colon];
                    return format!("{}{}:***{}", prefix, user, suffix);
                }
            }
        }
    }
    url.to_string()
}
