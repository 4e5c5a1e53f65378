//! stockroute CLI
//!
//! Command-line tool for matching order exports against location stock exports
//! and suggesting which location should ship each order.

use clap::{Parser, Subcommand};
use stockroute_core::{
    discover_locations, export_report, find_group_column, identify_columns, parse_csv,
    write_report, FulfillmentReport, LocationSource, RunConfig,
};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stockroute")]
#[command(about = "Match orders to stock and suggest dispatch locations", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level for stockroute output (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match a product/order export against stock exports
    Fulfill {
        /// Product or order export (CSV)
        #[arg(short, long)]
        products: PathBuf,

        /// Stock export as NAME=PATH, repeat in dispatch priority order
        #[arg(short, long = "location")]
        locations: Vec<String>,

        /// Directory of stock exports, one CSV per location (appended after --location)
        #[arg(long)]
        stock_dir: Option<PathBuf>,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (csv or json)
        #[arg(long, default_value = "csv")]
        format: String,
    },

    /// Run from a JSON run config
    Run {
        /// Path to run config (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Create a run config file
    CreateConfig {
        /// Product or order export (CSV)
        #[arg(short, long)]
        products: PathBuf,

        /// Stock export as NAME=PATH, repeat in dispatch priority order
        #[arg(short, long = "location")]
        locations: Vec<String>,

        /// Where the run should write its result
        #[arg(long)]
        result: Option<PathBuf>,

        /// Output path for the config file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show which columns would be used from a CSV
    Inspect {
        /// Path to CSV file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List the locations found in a stock directory
    Locations {
        /// Directory of stock exports
        #[arg(long)]
        stock_dir: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stockroute={level},stockroute_core={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(command: Commands) -> stockroute_core::Result<()> {
    match command {
        Commands::Fulfill {
            products,
            locations,
            stock_dir,
            output,
            format,
        } => cmd_fulfill(&products, &locations, stock_dir.as_deref(), output, &format),
        Commands::Run { config } => cmd_run(&config),
        Commands::CreateConfig {
            products,
            locations,
            result,
            output,
        } => cmd_create_config(&products, &locations, result, &output),
        Commands::Inspect { file } => cmd_inspect(&file),
        Commands::Locations { stock_dir } => cmd_locations(&stock_dir),
    }
}

fn collect_locations(specs: &[String], stock_dir: Option<&Path>) -> stockroute_core::Result<Vec<LocationSource>> {
    let mut sources = specs
        .iter()
        .map(|s| LocationSource::parse_spec(s))
        .collect::<stockroute_core::Result<Vec<_>>>()?;

    if let Some(dir) = stock_dir {
        sources.extend(discover_locations(dir)?);
    }

    if sources.is_empty() {
        tracing::warn!("no stock locations given, every line will be unmatched");
    }
    Ok(sources)
}

fn cmd_fulfill(
    products: &Path,
    specs: &[String],
    stock_dir: Option<&Path>,
    output: Option<PathBuf>,
    format: &str,
) -> stockroute_core::Result<()> {
    let mut config = RunConfig::new(products);
    for source in collect_locations(specs, stock_dir)? {
        config.add_location(source);
    }
    config.output = output;
    config.format = format.parse()?;

    execute(&config)
}

fn cmd_run(config_path: &Path) -> stockroute_core::Result<()> {
    let config = RunConfig::load(config_path)?;
    tracing::info!(
        locations = config.locations.len(),
        config = %config_path.display(),
        "loaded run config"
    );
    execute(&config)
}

fn execute(config: &RunConfig) -> stockroute_core::Result<()> {
    let report = stockroute_core::run(config)?;

    match &config.output {
        Some(path) => {
            export_report(&report, path, config.format)?;
            print_summary(&report);
            println!();
            println!("Wrote {} rows to {}", report.table.row_count(), path.display());
        }
        None => {
            let stdout = io::stdout();
            write_report(&report, config.format, stdout.lock())?;
        }
    }

    Ok(())
}

fn print_summary(report: &FulfillmentReport) {
    println!("Locations ({}): {}", report.locations.len(), report.locations.join(", "));
    println!("Lines: {} ({} matched)", report.lines.len(), report.matched_lines);

    match &report.group_column {
        Some(col) => {
            let parcels = report.parcels();
            let split = parcels.values().filter(|&&n| n > 1).count();
            println!("Orders grouped by '{}': {} ({} split)", col, parcels.len(), split);
        }
        None => println!("No order/phone column found, dispatch not suggested"),
    }

    if !report.warnings.is_empty() {
        println!("\nWarnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  - {}", warning);
        }
    }
}

fn cmd_create_config(
    products: &Path,
    specs: &[String],
    result: Option<PathBuf>,
    output: &Path,
) -> stockroute_core::Result<()> {
    let mut config = RunConfig::new(products);
    for source in collect_locations(specs, None)? {
        config.add_location(source);
    }

    // Placeholder so the file shows the expected shape
    if config.locations.is_empty() {
        config.add_location(LocationSource::new("Ecom", "stock/ecom.csv"));
    }
    config.output = result;

    config.save(output)?;
    println!("Created run config: {}", output.display());
    println!("Locations: {}", config.locations.len());
    println!();
    println!("Edit the file to list your stock exports in priority order, then run:");
    println!("  stockroute run --config {}", output.display());

    Ok(())
}

fn cmd_inspect(file: &Path) -> stockroute_core::Result<()> {
    let table = parse_csv(file)?;
    let roles = identify_columns(&table);
    let name = |idx: Option<usize>| {
        idx.map(|i| table.columns[i].name.clone())
            .unwrap_or_else(|| "-".to_string())
    };

    println!("File: {}", file.display());
    println!("Columns: {}", table.column_count());
    println!("Rows: {}", table.row_count());
    println!();
    println!("Title:    {}", name(roles.title));
    println!("Size:     {}", name(roles.size));
    println!("Quantity: {}", name(roles.quantity));
    println!("SKU:      {}", name(roles.sku));
    println!("Group:    {}", name(find_group_column(&table)));

    if !roles.is_matchable() {
        println!();
        println!("No title column: this file cannot be matched and would be skipped as stock");
    }

    Ok(())
}

fn cmd_locations(stock_dir: &Path) -> stockroute_core::Result<()> {
    let sources = discover_locations(stock_dir)?;

    println!("Locations ({}):", sources.len());
    for (i, source) in sources.iter().enumerate() {
        println!("  {}. {} ({})", i + 1, source.name, source.path.display());
    }

    Ok(())
}
