//! Percepciones CLI - process ARCA withholding/perception spreadsheets
//!
//! # Commands
//!
//! ```bash
//! percepciones process retenciones.xlsx -c "Juan Pérez"   # Preview + write .xlsx
//! percepciones process retenciones.xlsx -c "Ana" --json -q # JSON only, no logs
//! percepciones inspect retenciones.xlsx                    # Show source headers
//! percepciones serve                                       # Start the form host
//! ```

use clap::{Parser, Subcommand};
use percepciones::api::logs::LOG_BROADCASTER;
use percepciones::{parse_file, process_bytes, FormState, ServerConfig};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "percepciones")]
#[command(about = "Normalize ARCA withholding spreadsheets into a totaled report", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: spreadsheet → preview → formatted .xlsx
    Process {
        /// Input spreadsheet (.xlsx or .xls)
        input: PathBuf,

        /// Taxpayer name shown in the report title
        #[arg(short, long = "contribuyente")]
        contribuyente: Option<String>,

        /// Output workbook (default: datos_procesados.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the preview as JSON instead of a text grid
        #[arg(long)]
        json: bool,

        /// Do not echo pipeline logs to stderr
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show the headers and row count of a spreadsheet
    Inspect {
        /// Input spreadsheet (.xlsx or .xls)
        input: PathBuf,
    },

    /// Start HTTP form host
    Serve {
        /// Port to listen on (overrides PERCEPCIONES_PORT)
        #[arg(short, long)]
        port: Option<u16>,
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
            contribuyente,
            output,
            json,
            quiet,
        } => {
            LOG_BROADCASTER.set_echo(!quiet);
            cmd_process(&input, contribuyente.as_deref(), output.as_deref(), json)
        }

        Commands::Inspect { input } => cmd_inspect(&input),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_process(
    input: &Path,
    contribuyente: Option<&str>,
    output: Option<&Path>,
    as_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());
    let bytes = fs::read(input)?;

    let (taxpayer, bytes) = match FormState::from_inputs(contribuyente, Some(bytes.as_slice())) {
        FormState::Ready { taxpayer, file } => (taxpayer, file),
        other => return Err(other.prompt().unwrap_or_default().into()),
    };

    let result = process_bytes(bytes, taxpayer).map_err(|e| e.user_message())?;

    eprintln!("   Format: {}", result.sheet_info.format);
    eprintln!("   Sheet: {}", result.sheet_info.sheet_name);
    eprintln!("   Rows: {}", result.sheet_info.row_count);

    if as_json {
        let payload = json!({
            "preview": result.preview,
            "sheet": result.sheet_info,
            "warnings": result.warnings.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("{}", result.preview.taxpayer);
        println!("{}\n", result.preview.subtitle);
        print!("{}", result.preview.render_text());
        println!();
        for line in result.preview.diagnostics() {
            println!("{}", line);
        }
    }

    let path = output.unwrap_or_else(|| Path::new(result.filename));
    fs::write(path, &result.workbook)?;
    eprintln!("💾 Workbook written to: {}", path.display());

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_inspect(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Inspecting: {}", input.display());

    let sheet = parse_file(input)?;

    println!("Format: {}", sheet.format.extension());
    println!("Sheet: {}", sheet.sheet_name);
    println!("Rows: {}", sheet.row_count());
    println!("Columns ({}):", sheet.headers.len());
    for header in &sheet.headers {
        println!("  - {}", header);
    }

    Ok(())
}

async fn cmd_serve(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env().with_port(port);
    percepciones::server::start_server(config).await?;
    Ok(())
}
