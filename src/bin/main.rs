//! odoo-rpc CLI - Query an object-relational service over JSON-RPC
//!
//! Usage:
//!   odoo-rpc read <model> <id> [--fields a,b] [--resolve a,b]
//!   odoo-rpc list <model> [--offset N] [--limit N] [--fields a,b] [--resolve a,b]
//!   odoo-rpc search <model> --domain <json> [--fields a,b] [--resolve a,b]
//!   odoo-rpc relation <model> <field>
//!   odoo-rpc call <model> <method> [--args <json>] [--kwargs <json>]
//!
//! Connections come from the settings file (`--config`, `$ODOO_RPC_CONFIG`,
//! `./odoo-rpc.toml`, then the user config dir) or, when none is configured,
//! from `ODOO_URL`, `ODOO_DB`, `ODOO_LOGIN` and `ODOO_PASSWORD`.
//!
//! Examples:
//!   odoo-rpc read res.users 7 --resolve company_id
//!   odoo-rpc search res.partner --domain '[["is_company", "=", true]]' --fields name
//!   odoo-rpc relation res.partner category_id

use clap::{Args, Parser, Subcommand};
use odoo_rpc::config::{ConnectionConfig, Settings};
use odoo_rpc::domain::Domain;
use odoo_rpc::transport::HttpTransport;
use odoo_rpc::{ListOptions, OdooClient, ReadOptions};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "odoo-rpc")]
#[command(about = "odoo-rpc - Read and write records over JSON-RPC with relation resolution")]
#[command(version)]
struct Cli {
    /// Path to a settings file (defaults to the standard lookup order)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Named connection from the settings file
    #[arg(long, global = true)]
    connection: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FieldArgs {
    /// Fields to return
    #[arg(long, value_delimiter = ',')]
    fields: Vec<String>,

    /// Relational fields to expand into records
    #[arg(long, value_delimiter = ',')]
    resolve: Vec<String>,
}

impl FieldArgs {
    fn into_options(self) -> ReadOptions {
        let options = ReadOptions::new().resolve(self.resolve);
        if self.fields.is_empty() {
            options
        } else {
            options.fields(self.fields)
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Read one record by id
    Read {
        model: String,
        id: i64,
        #[command(flatten)]
        fields: FieldArgs,
    },

    /// List records of a model
    List {
        model: String,
        #[arg(long, default_value_t = 0)]
        offset: u64,
        #[arg(long, default_value_t = 100)]
        limit: u64,
        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Search records with a JSON domain
    Search {
        model: String,
        /// Domain in prefix notation, e.g. '[["name", "=", "Acme"]]'
        #[arg(long)]
        domain: String,
        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Show the target model and cardinality of a relational field
    Relation { model: String, field: String },

    /// Call any model method
    Call {
        model: String,
        method: String,
        /// Positional arguments as a JSON array
        #[arg(long, default_value = "[]")]
        args: String,
        /// Keyword arguments as a JSON object
        #[arg(long, default_value = "{}")]
        kwargs: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::load()?,
    };

    // Without a settings file, fall back to the ODOO_* environment variables.
    let config = match cli.connection.as_deref() {
        None if settings.connections.is_empty() => ConnectionConfig::from_env()?,
        name => settings.connection_config(name)?,
    };
    let transport = HttpTransport::connect(&config, &settings.transport).await?;
    let client = OdooClient::with_policy(Arc::new(transport), settings.resolution);

    match cli.command {
        Commands::Read { model, id, fields } => {
            let record = client.read(&model, id, &fields.into_options()).await?;
            print_json(&record)
        }
        Commands::List {
            model,
            offset,
            limit,
            fields,
        } => {
            let options = ListOptions::new()
                .offset(offset)
                .limit(limit)
                .read(fields.into_options());
            let records = client.list(&model, &options).await?;
            print_json(&records)
        }
        Commands::Search {
            model,
            domain,
            fields,
        } => {
            let domain: Domain = serde_json::from_str(&domain)?;
            let records = client
                .search_many(&model, &domain, &fields.into_options())
                .await?;
            print_json(&records)
        }
        Commands::Relation { model, field } => {
            let relation = client.resolve_relation(&model, &field).await?;
            print_json(&relation)
        }
        Commands::Call {
            model,
            method,
            args,
            kwargs,
        } => {
            let args: Vec<Value> = serde_json::from_str(&args)?;
            let kwargs: Map<String, Value> = serde_json::from_str(&kwargs)?;
            let result = client.call(&model, &method, args, kwargs).await?;
            print_json(&result)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
