use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use redwire_catalog::{Connection, PostgresConnector, RedshiftClient};
use redwire_core::{Config, ConnectParams, TableNode};

/// redwire - Redshift catalog browser
#[derive(Parser)]
#[command(name = "redwire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: redwire.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Connection settings; each one overrides the config file
#[derive(Args, Debug, Default)]
struct ConnectionArgs {
    /// Cluster endpoint
    #[arg(long, global = true, env = "REDSHIFT_HOST")]
    host: Option<String>,

    #[arg(long, global = true, env = "REDSHIFT_USER")]
    user: Option<String>,

    #[arg(long, global = true, env = "REDSHIFT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[arg(long, global = true, env = "REDSHIFT_PORT")]
    port: Option<u16>,

    #[arg(long, global = true, env = "REDSHIFT_DATABASE")]
    database: Option<String>,

    /// Full connection URL, replaces host/user/password/port/database
    #[arg(long, global = true, env = "REDSHIFT_URL", hide_env_values = true)]
    url: Option<String>,

    #[arg(long, global = true, env = "REDSHIFT_DRIVER")]
    driver: Option<String>,

    /// Default schema (default: public)
    #[arg(long, global = true, env = "REDSHIFT_SCHEMA")]
    schema: Option<String>,

    /// Connect over TLS (needs the `tls` feature)
    #[arg(long, global = true)]
    tls: bool,
}

impl ConnectionArgs {
    fn to_params(&self) -> ConnectParams {
        ConnectParams {
            host: self.host.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            port: self.port,
            database: self.database.clone(),
            url: self.url.clone(),
            driver: self.driver.clone(),
            schema: self.schema.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List databases on the cluster
    Databases,

    /// List tables in a schema
    Tables {
        /// Only show tables whose name contains this text
        #[arg(short, long)]
        like: Option<String>,

        /// Schema to list (default: the connection's schema)
        #[arg(short = 'f', long = "from")]
        from: Option<String>,
    },

    /// Show the reflected columns of a table
    Describe {
        /// Table name
        table: String,

        /// Schema holding the table (default: the connection's schema)
        #[arg(short = 'f', long = "from")]
        from: Option<String>,

        /// Print the schema as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the current database, schema and connection URL
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let params = config.connection.clone().overlay(cli.connection.to_params());
    tracing::debug!(params = ?params, "resolved connection parameters");

    let connector = if cli.connection.tls {
        PostgresConnector::with_tls()
    } else {
        PostgresConnector::new()
    };

    let client = RedshiftClient::connect_with(&connector, &params)
        .await
        .context("Failed to connect to warehouse")?;

    let mut stdout = std::io::stdout().lock();
    let result = match cli.command {
        Commands::Databases => databases_command(&client, &mut stdout).await,
        Commands::Tables { like, from } => {
            tables_command(&client, like.as_deref(), from.as_deref(), &mut stdout).await
        }
        Commands::Describe { table, from, json } => {
            describe_command(&client, &table, from.as_deref(), json, &mut stdout).await
        }
        Commands::Info => info_command(&client, config.redact_credentials, &mut stdout),
    };

    client.close().await;
    result
}

/// Log to stderr; RUST_LOG wins over the verbosity flag
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Explicit --config, else ./redwire.toml when present, else defaults
fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        return Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    let default_path = Path::new("redwire.toml");
    if default_path.exists() {
        Config::from_file(default_path).context("Failed to load redwire.toml")
    } else {
        tracing::debug!("no config file found, using defaults");
        Ok(Config::default())
    }
}

async fn databases_command<C: Connection>(
    client: &RedshiftClient<C>,
    out: &mut impl Write,
) -> Result<()> {
    let databases = client.list_databases().await?;

    for name in databases {
        if Some(name.as_str()) == client.current_database() {
            writeln!(out, "{} {}", name.green().bold(), "(current)".dimmed())?;
        } else {
            writeln!(out, "{}", name)?;
        }
    }
    Ok(())
}

async fn tables_command<C: Connection>(
    client: &RedshiftClient<C>,
    like: Option<&str>,
    from: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    let tables = client.list_tables(like, from).await?;

    if tables.is_empty() {
        let schema = from.unwrap_or(client.current_schema());
        writeln!(out, "{} {}", "No tables found in".yellow(), schema)?;
        return Ok(());
    }

    for name in tables {
        writeln!(out, "{}", name)?;
    }
    Ok(())
}

async fn describe_command<C: Connection>(
    client: &RedshiftClient<C>,
    table: &str,
    from: Option<&str>,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let expr = client
        .table(table, from)
        .await
        .with_context(|| format!("Failed to reflect table '{}'", table))?;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(expr.schema())?)?;
        return Ok(());
    }

    writeln!(out, "{}", expr.op().qualified_name().bold())?;
    for column in &expr.schema().columns {
        let native = column.native_type.as_deref().unwrap_or("-");
        writeln!(
            out,
            "  {:<32} {:<20} {:<32} {:?}",
            column.name,
            column.logical_type.to_string().cyan(),
            native.dimmed(),
            column.nullable
        )?;
    }
    Ok(())
}

fn info_command<C: Connection>(
    client: &RedshiftClient<C>,
    redact: bool,
    out: &mut impl Write,
) -> Result<()> {
    let url = if redact {
        client.url().redacted()
    } else {
        client.url().as_str().to_string()
    };

    writeln!(out, "{} {}", "Database:".cyan(), client.current_database().unwrap_or("-"))?;
    writeln!(out, "{} {}", "Schema:".cyan(), client.current_schema())?;
    writeln!(out, "{} {}", "URL:".cyan(), url)?;
    Ok(())
}
