use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use avail_core::InterfaceId;
use avail_runner::{load_updates, Runner};

#[derive(Parser)]
#[command(name = "avail", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create .avail/ with a default config and an empty database
    Init,

    /// Add an interface row with default availability
    InterfaceAdd {
        #[arg(long)]
        id: u64,
    },

    /// Send JSON availability updates to the availability manager
    Report {
        #[arg(long)]
        input: PathBuf,
    },

    /// Write JSON availability updates as a serialized batch file
    Encode {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },

    /// Apply a serialized batch file to the database
    Apply {
        #[arg(long)]
        input: PathBuf,
    },

    /// Print the stored availability of an interface
    Show {
        #[arg(long)]
        interface: u64,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let dir = std::env::current_dir()?;

    match cli.cmd {
        Command::Init => {
            Runner::init_dir(&dir)?;
            println!("Initialized availability store in {}", dir.display());
        }
        Command::InterfaceAdd { id } => {
            let r = Runner::open(dir)?;
            r.storage()?.insert_interface(InterfaceId(id))?;
            println!("Added interface {}", id);
        }
        Command::Report { input } => {
            let mut r = Runner::open(dir)?;
            let batch = load_updates(&input)?;
            if let Err(err) = r.report(&batch) {
                // a broken reporting channel is a deployment fault
                error!(error = %err, "availability reporting failed, terminating");
                std::process::exit(1);
            }
            println!("Reported {} availability records", batch.len());
        }
        Command::Encode { input, output } => {
            let batch = load_updates(&input)?;
            std::fs::write(&output, avail_core::serialize(&batch))?;
            println!("Wrote {} records to {}", batch.len(), output.display());
        }
        Command::Apply { input } => {
            let r = Runner::open(dir)?;
            let report = r.apply_file(&input)?;
            println!(
                "Applied {} updates ({} skipped, {} rejected) in {} pass(es)",
                report.updated, report.skipped, report.rejected, report.passes
            );
        }
        Command::Show { interface } => {
            let r = Runner::open(dir)?;
            match r.storage()?.load_interface(InterfaceId(interface))? {
                Some(row) => println!(
                    "{} available={:?} error={:?} errors_from={} disable_until={}",
                    row.interface_id, row.available, row.error, row.errors_from, row.disable_until
                ),
                None => println!("interface {} not found", interface),
            }
        }
    }

    Ok(())
}
