use anyhow::{bail, Context, Result};
use glob::glob;
use std::{env, path::PathBuf};

pub const USAGE: &str = "Usage: csvtable [--trim] [--json] [--print] [--out-dir <DIR>] <PATTERN>...";

/// Settings for the `csvtable` binary: command-line flags with env fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// File paths or glob patterns to load.
    pub patterns: Vec<String>,
    /// Re-write each loaded table to `<out_dir>/<file name>` (`CSVTABLE_OUT_DIR`).
    pub out_dir: Option<PathBuf>,
    /// Trim whitespace after load (`CSVTABLE_TRIM=true`).
    pub trim: bool,
    pub json: bool,
    pub print: bool,
    pub help: bool,
}

impl Config {
    /// Parse the real process arguments and environment.
    pub fn from_env() -> Result<Self> {
        Self::parse(env::args().skip(1), |key| env::var(key).ok())
    }

    /// Parse `args` (without the program name); `var` looks up env fallbacks.
    pub fn parse<I, F>(args: I, var: F) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Config {
            out_dir: var("CSVTABLE_OUT_DIR")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            trim: var("CSVTABLE_TRIM").is_some_and(|v| v == "true" || v == "1"),
            ..Config::default()
        };

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--trim" => cfg.trim = true,
                "--json" => cfg.json = true,
                "--print" => cfg.print = true,
                "-h" | "--help" => cfg.help = true,
                "--out-dir" => {
                    let dir = args.next().context("--out-dir needs a directory")?;
                    cfg.out_dir = Some(PathBuf::from(dir));
                }
                flag if flag.starts_with('-') => bail!("unknown option `{}`\n{}", flag, USAGE),
                _ => cfg.patterns.push(arg),
            }
        }

        if cfg.patterns.is_empty() && !cfg.help {
            bail!("no input files given\n{}", USAGE);
        }
        Ok(cfg)
    }

    /// Expand every pattern with `glob`, in pattern order.
    pub fn input_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for pattern in &self.patterns {
            let matched: Vec<PathBuf> = glob(pattern)
                .with_context(|| format!("Failed to read glob pattern '{}'", pattern))?
                .filter_map(|entry| entry.ok())
                .filter(|p| p.is_file())
                .collect();
            if matched.is_empty() {
                tracing::warn!(pattern = %pattern, "pattern matched no files");
            }
            paths.extend(matched);
        }
        Ok(paths)
    }
}

/// Log filter: `RUST_LOG`, then `CSVTABLE_LOG`, then `info`.
pub fn log_filter() -> String {
    env::var("RUST_LOG")
        .or_else(|_| env::var("CSVTABLE_LOG"))
        .unwrap_or_else(|_| "info".to_string())
}
