use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{self, CommandReport};

#[derive(Debug, Parser)]
#[command(
    name = "timeledger",
    version,
    about = "Reconcile approved weekly timesheets into a monthly ledger"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fold approved timesheets into the month sheet of a ledger.
    Reconcile {
        #[arg(long)]
        ledger: PathBuf,
        /// Ledger sheet to write; defaults to the month in the first source name.
        #[arg(long)]
        sheet: Option<String>,
        #[arg(long)]
        remove_duplicates: bool,
        /// Suppress per-phase progress on stderr.
        #[arg(long)]
        quiet: bool,
        #[arg(long)]
        json: bool,
        #[arg(required = true)]
        sources: Vec<PathBuf>,
    },
    /// List (and optionally remove) duplicate rows in a ledger sheet.
    Duplicates {
        #[arg(long)]
        ledger: PathBuf,
        #[arg(long)]
        sheet: String,
        #[arg(long)]
        remove: bool,
        #[arg(long)]
        json: bool,
    },
    /// Create an empty ledger, optionally with an approver reference list.
    Init {
        #[arg(long)]
        ledger: PathBuf,
        #[arg(long = "approver")]
        approvers: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show resolved paths, configuration, and active env overrides.
    Status {
        #[arg(long)]
        json: bool,
    },
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let verdict = if report.ok { "ok" } else { "issues" };
    println!("{}: {verdict}", report.command);
    for detail in &report.details {
        println!("  {detail}");
    }
    for issue in &report.issues {
        println!("  ! {issue}");
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let (report, json) = match cli.command {
        Command::Reconcile {
            ledger,
            sheet,
            remove_duplicates,
            quiet,
            json,
            sources,
        } => {
            let opts = commands::reconcile::ReconcileOptions {
                ledger,
                sheet,
                remove_duplicates,
                sources,
                quiet,
            };
            (commands::reconcile::run(&opts)?, json)
        }
        Command::Duplicates {
            ledger,
            sheet,
            remove,
            json,
        } => {
            let opts = commands::duplicates::DuplicatesOptions {
                ledger,
                sheet,
                remove,
            };
            (commands::duplicates::run(&opts)?, json)
        }
        Command::Init {
            ledger,
            approvers,
            json,
        } => {
            let opts = commands::init::InitOptions { ledger, approvers };
            (commands::init::run(&opts)?, json)
        }
        Command::Status { json } => (commands::status::run()?, json),
    };

    print_report(&report, json)?;
    if !report.ok {
        std::process::exit(1);
    }
    Ok(())
}
