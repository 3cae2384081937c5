//! Roamcost CLI - redistribute roaming costs in fleet billing extracts
//!
//! # Main Commands
//!
//! ```bash
//! roamcost serve                        # Start HTTP server (port 3000)
//! roamcost process extract.xlsx         # Process an extract to a styled workbook
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! roamcost parse extract.xlsx           # Dump normalized records as JSON
//! ```

use clap::{Parser, Subcommand};
use roamcost::{
    normalize_rows, process_bytes, read_table_bytes, write_workbook, ProcessOptions, TableOrigin,
    DOWNLOAD_NAME,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "roamcost")]
#[command(about = "Redistribute roaming costs across fleet billing extracts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: extract → merged + redistributed → styled workbook
    Process {
        /// Input extract (.xlsx or delimited text)
        input: PathBuf,

        /// Output workbook path
        #[arg(short, long, default_value = DOWNLOAD_NAME)]
        output: PathBuf,

        /// Inclusive lower bound for a "large" total
        #[arg(short, long)]
        cutoff: Option<f64>,

        /// Workbook sheet to read (first sheet if not specified)
        #[arg(long)]
        sheet: Option<String>,

        /// Leading banner rows to skip before the header row
        #[arg(long)]
        skip_rows: Option<usize>,

        /// Backup-line marker token
        #[arg(long)]
        marker: Option<String>,

        /// Fail on unparseable numeric cells instead of zeroing them
        #[arg(long)]
        strict: bool,

        /// Fixed RNG seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Parse and normalize an extract, output records as JSON
    Parse {
        /// Input extract (.xlsx or delimited text)
        input: PathBuf,

        /// Workbook sheet to read (first sheet if not specified)
        #[arg(long)]
        sheet: Option<String>,

        /// Leading banner rows to skip before the header row
        #[arg(long)]
        skip_rows: Option<usize>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Process {
            input,
            output,
            cutoff,
            sheet,
            skip_rows,
            marker,
            strict,
            seed,
        } => cmd_process(&input, &output, cutoff, sheet, skip_rows, marker, strict, seed),

        Commands::Parse {
            input,
            sheet,
            skip_rows,
            output,
        } => cmd_parse(&input, sheet, skip_rows, output.as_deref()),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_process(
    input: &Path,
    output: &Path,
    cutoff: Option<f64>,
    sheet: Option<String>,
    skip_rows: Option<usize>,
    marker: Option<String>,
    strict: bool,
    seed: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let mut options = ProcessOptions::from_env();
    if let Some(cutoff) = cutoff {
        options.cutoff = cutoff;
    }
    if sheet.is_some() {
        options.sheet = sheet;
    }
    if let Some(skip_rows) = skip_rows {
        options.skip_rows = skip_rows;
    }
    if let Some(marker) = marker {
        options.marker = marker;
    }
    options.strict = strict;
    options.seed = seed;

    let outcome = process_bytes(&fs::read(input)?, &options)?;

    eprintln!("\n📊 Summary:");
    eprintln!("   Input rows:     {}", outcome.report.input_rows);
    eprintln!("   Merged lines:   {}", outcome.report.merged_duplicates);
    eprintln!("   Groups:         {}", outcome.report.group_count);
    eprintln!("   Redistributed:  {}", outcome.report.redistributed_rows);
    if outcome.report.unmoved_rows > 0 {
        eprintln!("   ⚠️  Unmoved:     {}", outcome.report.unmoved_rows);
    }
    eprintln!("   Old total:      {:.2}", outcome.report.total_old);
    eprintln!("   New total:      {:.2}", outcome.report.total_new);

    write_workbook(&outcome.rows, output)?;
    eprintln!("\n💾 Workbook written to: {}", output.display());
    eprintln!("✨ Done!");
    Ok(())
}

fn cmd_parse(
    input: &Path,
    sheet: Option<String>,
    skip_rows: Option<usize>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing: {}", input.display());

    let mut options = ProcessOptions::from_env();
    if sheet.is_some() {
        options.sheet = sheet;
    }
    if let Some(skip_rows) = skip_rows {
        options.skip_rows = skip_rows;
    }

    let table = read_table_bytes(
        &fs::read(input)?,
        options.sheet.as_deref(),
        options.skip_rows,
    )?;

    match &table.origin {
        TableOrigin::Workbook { sheet } => eprintln!("   Sheet: {}", sheet),
        TableOrigin::Delimited {
            encoding,
            delimiter,
        } => eprintln!(
            "   Encoding: {}, delimiter: '{}'",
            encoding,
            match delimiter {
                '\t' => "\\t".to_string(),
                c => c.to_string(),
            }
        ),
    }
    eprintln!("   Columns: {}", table.headers.join(", "));
    eprintln!("✅ Read {} data rows", table.rows.len());

    let records = normalize_rows(&table.rows, &options.marker, options.strict)?;
    let json = serde_json::to_string_pretty(&records)?;
    write_output(&json, output)?;

    Ok(())
}

async fn cmd_serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    roamcost::server::start_server(port).await
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
