mod commands;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use lakeform_types::WriteMode;

#[derive(Parser)]
#[command(
    name = "lakeform",
    version,
    about = "Convention-enforcing lakehouse transformations"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a transformation
    Run {
        /// Path to transformation YAML file
        definition: PathBuf,
        /// Source lakehouse directory
        #[arg(long)]
        source: PathBuf,
        /// Target lakehouse directory
        #[arg(long)]
        target: PathBuf,
        /// Compute the output and print it instead of writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a transformation definition
    Check {
        /// Path to transformation YAML file
        definition: PathBuf,
    },
    /// Show the output columns a transformation would produce
    Plan {
        /// Path to transformation YAML file
        definition: PathBuf,
        /// Source lakehouse directory
        #[arg(long)]
        source: PathBuf,
    },
    /// Land a delimited file as a table
    Ingest {
        /// Path to the delimited file
        file: PathBuf,
        /// Path to the table schema YAML file
        #[arg(long)]
        schema: PathBuf,
        /// Target table name
        #[arg(long)]
        table: String,
        /// Target lakehouse directory
        #[arg(long)]
        target: PathBuf,
        /// Zone naive timestamps are in (default: the column's zone)
        #[arg(long)]
        local_timezone: Option<String>,
        #[arg(long, value_enum, default_value_t = ModeArg::Overwrite)]
        mode: ModeArg,
        /// Field delimiter
        #[arg(long, default_value_t = ',')]
        delimiter: char,
    },
    /// Resolve source and target lakehouse paths from a mappings file
    Resolve {
        /// Path to the lakehouse mappings JSON file
        #[arg(long)]
        mappings: PathBuf,
        /// Executing workspace
        #[arg(long)]
        workspace: String,
        /// Executing lakehouse
        #[arg(long)]
        lakehouse: String,
        /// Transformation context
        #[arg(long)]
        context: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Overwrite,
    Append,
}

impl From<ModeArg> for WriteMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Overwrite => Self::Overwrite,
            ModeArg::Append => Self::Append,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level);

    match cli.command {
        Commands::Run {
            definition,
            source,
            target,
            dry_run,
        } => commands::run::execute(&definition, &source, &target, dry_run),
        Commands::Check { definition } => commands::check::execute(&definition),
        Commands::Plan { definition, source } => commands::plan::execute(&definition, &source),
        Commands::Ingest {
            file,
            schema,
            table,
            target,
            local_timezone,
            mode,
            delimiter,
        } => commands::ingest::execute(&commands::ingest::IngestArgs {
            file,
            schema,
            table,
            target,
            local_timezone,
            mode: mode.into(),
            delimiter,
        }),
        Commands::Resolve {
            mappings,
            workspace,
            lakehouse,
            context,
        } => commands::resolve::execute(&mappings, &workspace, &lakehouse, &context),
    }
}
