use crate::commands::{self, CommandReport};
use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "sspgeo",
    version,
    about = "SSP-SP incident data: processing cache, city filtering, and radius search"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Radius search across every available category/year artifact
    Search {
        /// Street name, address fragment, or a "lat,lon" literal
        #[arg(long, allow_hyphen_values = true)]
        query: String,
        /// Search radius in kilometers (defaults to the configured radius)
        #[arg(long)]
        radius: Option<f64>,
        /// Restrict the scan to these category keys (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,
        /// Write the full result set to a JSON file in the output dir
        #[arg(long)]
        export: bool,
        /// Export file name (implies --export)
        #[arg(long)]
        output_file: Option<String>,
    },
    /// Record an on-disk category/year artifact as processed
    Register {
        #[arg(long)]
        category: String,
        #[arg(long)]
        year: i32,
    },
    /// Produce the per-city filtered sibling of a registered artifact
    FilterCity {
        #[arg(long)]
        category: String,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        city: String,
    },
    /// Summarize the processing cache ledger
    CacheStatus,
    /// Drop cache entries so the next run redoes the work
    CacheInvalidate {
        #[arg(long)]
        category: String,
        #[arg(long)]
        year: i32,
        /// Only drop this city's filter entry
        #[arg(long)]
        city: Option<String>,
    },
    /// Reset the cache ledger to empty (destructive, irreversible)
    CacheClear {
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },
}

fn render(report: &CommandReport) {
    for detail in &report.details {
        println!("{detail}");
    }
    for issue in &report.issues {
        eprintln!("issue: {issue}");
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let report = match cli.command {
        Commands::Search {
            query,
            radius,
            categories,
            export,
            output_file,
        } => commands::search::run(&query, radius, &categories, export, output_file.as_deref())?,
        Commands::Register { category, year } => commands::register::run(&category, year)?,
        Commands::FilterCity {
            category,
            year,
            city,
        } => commands::filter_city::run(&category, year, &city)?,
        Commands::CacheStatus => commands::cache_status::run()?,
        Commands::CacheInvalidate {
            category,
            year,
            city,
        } => commands::cache_invalidate::run(&category, year, city.as_deref())?,
        Commands::CacheClear { yes } => commands::cache_clear::run(yes)?,
    };

    render(&report);
    if !report.ok {
        anyhow::bail!("{} completed with issues", report.command);
    }
    Ok(())
}
