use anyhow::{Context, Result};
use csvtable::{config, Config, Table};
use std::{fs, path::Path, process::ExitCode};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> ExitCode {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_new(config::log_filter()).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when at least one input failed or nothing matched.
fn run() -> Result<bool> {
    // ─── 2) configure ────────────────────────────────────────────────
    let cfg = Config::from_env()?;
    if cfg.help {
        println!("{}", config::USAGE);
        return Ok(true);
    }
    if let Some(dir) = &cfg.out_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
    }

    // ─── 3) expand inputs ────────────────────────────────────────────
    let paths = cfg.input_paths()?;
    if paths.is_empty() {
        error!("no input files matched");
        return Ok(false);
    }
    info!("{} file(s) to load", paths.len());

    // ─── 4) load, report, rewrite ────────────────────────────────────
    let mut failed = 0usize;
    for path in &paths {
        if let Err(e) = process_file(path, &cfg) {
            error!(path = %path.display(), "{:#}", e);
            failed += 1;
        }
    }

    info!(loaded = paths.len() - failed, failed, "done");
    Ok(failed == 0)
}

fn process_file(path: &Path, cfg: &Config) -> Result<()> {
    let (mut table, report) = Table::from_path(path)?;
    if cfg.trim {
        let changed = table.trim_fields();
        info!(path = %path.display(), changed, "trimmed fields");
    }

    let summary = table.summary(path.display().to_string(), report);
    if cfg.json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!(
            "{}: {} rows x {} columns ({} skipped, {} blank lines, {} lossy lines)",
            summary.path,
            summary.row_count,
            summary.column_count,
            report.rows_skipped,
            report.blank_lines,
            report.lossy_lines
        );
        println!("  columns: {}", table.headers().join(", "));
    }
    if cfg.print {
        print!("{}", table);
    }

    if let Some(dir) = &cfg.out_dir {
        let name = path
            .file_name()
            .with_context(|| format!("{} has no file name", path.display()))?;
        let dest = dir.join(name);
        table
            .write(&dest)
            .with_context(|| format!("rewriting {} to {}", path.display(), dest.display()))?;
    }
    Ok(())
}
