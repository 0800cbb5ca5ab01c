use anyhow::{Context, Result};
use clap::Parser;
use syscall_hunter::cli::{Cli, OutputFormat};
use syscall_hunter::config::HunterConfig;
use syscall_hunter::pipeline::{self, RunSummary};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; --debug raises everything to TRACE
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Print the per-repository summary
fn print_summary(summary: &RunSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for report in &summary.reports {
                println!("{}", report.summary());
            }
            for (name, reason) in &summary.failures {
                println!("{}: FAILED ({})", name, reason);
            }
            println!(
                "Time elapsed: {:.2} seconds.",
                summary.elapsed.as_secs_f64()
            );
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&summary.reports)
                .context("Failed to serialize reports")?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    // Load configuration file if provided, then let flags override it
    let base = if let Some(path) = &args.config {
        HunterConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?
    } else {
        HunterConfig::default()
    };
    let config = args.apply(base);

    if config.repositories.as_os_str().is_empty() {
        anyhow::bail!("Missing --mrepo. Usage: syscall-hunter --mrepo DIR --include-root DIR --output DIR");
    }
    if config.include_root.as_os_str().is_empty() {
        anyhow::bail!("Missing --include-root. Usage: syscall-hunter --mrepo DIR --include-root DIR --output DIR");
    }
    if config.output.as_os_str().is_empty() {
        anyhow::bail!("Missing --output. Usage: syscall-hunter --mrepo DIR --include-root DIR --output DIR");
    }

    let summary = pipeline::run(&config)?;
    print_summary(&summary, args.format)?;

    if !summary.failures.is_empty() && summary.reports.is_empty() {
        anyhow::bail!("All {} repositories failed", summary.failures.len());
    }
    Ok(())
}
