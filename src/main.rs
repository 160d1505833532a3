//! schemascope CLI - inspect a PostgreSQL schema or an ORM manifest
//!
//! Usage:
//!   schemascope tables [--schema <name>]
//!   schemascope ddl <TABLE>...
//!   schemascope describe <TABLE>...
//!   schemascope entity --manifest <FILE> <NAME>...

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use schemascope::db::SslMode;
use schemascope::{
    ConnectionConfig, EntityExtractor, MetadataRegistry, PgCatalog, SchemaContext,
    SchemaIntrospector, TableFormat,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schemascope")]
#[command(about = "Rebuild table DDL and entity definitions from live metadata")]
#[command(version)]
struct Cli {
    /// Log catalog queries and name resolution
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List base tables
    Tables {
        /// Only tables in this schema
        #[arg(long)]
        schema: Option<String>,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Print CREATE TABLE / CREATE INDEX statements
    Ddl {
        #[arg(required = true)]
        tables: Vec<String>,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Print a readable metadata report per table
    Describe {
        #[arg(required = true)]
        tables: Vec<String>,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Print entity definitions from a JSON metadata manifest
    Entity {
        /// Path to the manifest
        #[arg(short, long)]
        manifest: PathBuf,

        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(Args)]
struct ConnectionArgs {
    /// TOML connection file; overrides the flags below
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, env = "PGHOST", default_value = "localhost")]
    host: String,

    #[arg(long, env = "PGPORT", default_value_t = 5432)]
    port: u16,

    #[arg(long, env = "PGDATABASE", default_value = "postgres")]
    database: String,

    #[arg(long, env = "PGUSER", default_value = "postgres")]
    user: String,

    #[arg(long, env = "PGPASSWORD", hide_env_values = true, default_value = "")]
    password: String,

    #[arg(long, default_value = "prefer")]
    ssl_mode: SslArg,
}

#[derive(Clone, ValueEnum)]
enum SslArg {
    Prefer,
    Require,
    Disable,
}

impl From<SslArg> for SslMode {
    fn from(arg: SslArg) -> Self {
        match arg {
            SslArg::Prefer => SslMode::Prefer,
            SslArg::Require => SslMode::Require,
            SslArg::Disable => SslMode::Disable,
        }
    }
}

impl ConnectionArgs {
    fn into_config(self) -> anyhow::Result<ConnectionConfig> {
        if let Some(path) = self.config {
            return ConnectionConfig::load(&path)
                .with_context(|| format!("loading {}", path.display()));
        }
        let mut config = ConnectionConfig::new(
            &self.host,
            self.port,
            &self.database,
            &self.user,
            &self.password,
        );
        config.ssl_mode = self.ssl_mode.into();
        Ok(config)
    }

    fn introspector(self) -> anyhow::Result<SchemaIntrospector<PgCatalog>> {
        let config = self.into_config()?;
        let catalog = PgCatalog::connect(&config)
            .with_context(|| format!("connecting to {}:{}", config.host, config.port))?;
        Ok(SchemaIntrospector::new(catalog))
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("schemascope=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn print_context(context: &SchemaContext) {
    match context.sections.as_slice() {
        [only] => print!("{}", only.body),
        _ => print!("{}", context.to_prompt_text()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Tables { schema, connection } => {
            let introspector = connection.introspector()?;
            for name in introspector.table_names(schema.as_deref()).await? {
                println!("{name}");
            }
        }
        Commands::Ddl { tables, connection } => {
            let introspector = connection.introspector()?;
            let context =
                SchemaContext::for_tables(&introspector, &tables, TableFormat::Ddl).await?;
            print_context(&context);
        }
        Commands::Describe { tables, connection } => {
            let introspector = connection.introspector()?;
            let context =
                SchemaContext::for_tables(&introspector, &tables, TableFormat::Report).await?;
            print_context(&context);
        }
        Commands::Entity { manifest, names } => {
            let registry = MetadataRegistry::load(&manifest)?;
            let extractor = EntityExtractor::new(&registry);
            let context = SchemaContext::for_entities(&extractor, &names)?;
            print_context(&context);
        }
    }

    Ok(())
}
