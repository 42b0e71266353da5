//! cabletrack-print: HTTP print server that sits next to the label printer.

use anyhow::{Context, Result};
use cabletrack_print::server::PrintService;
use cabletrack_print::{DriverRegistry, TsplDriver};
use clap::Parser;
use may_minihttp::HttpServer;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cabletrack-print")]
#[command(about = "Render and send cable box labels to a TSPL printer", long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:5003")]
    listen: String,

    /// Printer device node or spool file (`-` or omitted writes to stdout)
    #[arg(long)]
    device: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let driver = match cli.device.as_deref() {
        Some(path) if path.as_os_str() != "-" => TsplDriver::open_device(path)
            .with_context(|| format!("failed to open printer device {}", path.display()))?,
        _ => TsplDriver::stdout(),
    };
    let registry = Arc::new(DriverRegistry::new().with_driver(Arc::new(driver)));

    let server = HttpServer(PrintService::new(registry))
        .start(&cli.listen)
        .map_err(|e| anyhow::anyhow!("failed to start print server on {}: {}", cli.listen, e))?;
    log::info!("print server listening on {}", cli.listen);
    server
        .join()
        .map_err(|e| anyhow::anyhow!("print server stopped: {:?}", e))?;
    Ok(())
}
