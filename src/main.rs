//! lazy-ir - inspect lazy-tensor IR graph files

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lazy_tensor_ir::ir::DumpFormat;
use lazy_tensor_ir::util::{config, logger};
use lazy_tensor_ir::{dump_file, order_file, size_file, NAME, VERSION};

/// Post-order, size and dumps of lazy-tensor IR graphs
#[derive(Parser, Debug)]
#[command(name = "lazy-ir")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Config file (RON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the post-order of a graph file, one node per line
    Order {
        /// Graph file (.ron or .json)
        #[arg(value_name = "GRAPH")]
        file: PathBuf,
    },

    /// Print the number of nodes reachable from the sinks
    Size {
        /// Graph file (.ron or .json)
        #[arg(value_name = "GRAPH")]
        file: PathBuf,
    },

    /// Dump a graph file as text or DOT
    Dump {
        /// Graph file (.ron or .json)
        #[arg(value_name = "GRAPH")]
        file: PathBuf,

        /// Output format: text or dot
        #[arg(short, long)]
        format: Option<DumpFormat>,
    },

    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = config::load_config_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    if args.verbose {
        config.log.level = logger::LogLevel::Debug;
    }
    logger::init_with_level(config.log.level);

    match args.command {
        Commands::Order { file } => {
            for line in order_file(&file)? {
                println!("{}", line);
            }
        }
        Commands::Size { file } => {
            println!("{}", size_file(&file)?);
        }
        Commands::Dump { file, format } => {
            if let Some(format) = format {
                config.dump.format = format;
            }
            print!("{}", dump_file(&file, &config.dump)?);
        }
        Commands::Version => {
            println!("{} {}", NAME, VERSION);
        }
    }

    Ok(())
}
