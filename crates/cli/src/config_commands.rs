use std::{io::Write, path::Path};

use {anyhow::Result, clap::Subcommand};

use rollcall_config::validate::{self, Severity, ValidationResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// Print the effective configuration (token redacted).
    Show,
}

pub fn handle_config(action: ConfigAction, path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Check { verbose } => check(path, verbose),
        ConfigAction::Show => show(path),
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(path: Option<&Path>, verbose: bool) -> Result<()> {
    let result = validate::validate(path);
    report(&result, verbose, &mut std::io::stderr())?;
    let errors = result.count(Severity::Error);
    if errors > 0 {
        anyhow::bail!("config check failed with {errors} error(s)");
    }
    Ok(())
}

fn report(result: &ValidationResult, verbose: bool, out: &mut impl Write) -> std::io::Result<()> {
    match &result.config_path {
        Some(path) => writeln!(out, "Checking {}\n", path.display())?,
        None => writeln!(out, "No config file found; checking defaults.\n")?,
    }

    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let color = match d.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
            Severity::Info => CYAN,
        };

        if d.path.is_empty() {
            writeln!(out, "  {BOLD}{color}{}{RESET} {}", d.severity, d.message)?;
        } else {
            writeln!(
                out,
                "  {BOLD}{color}{}{RESET} {}: {}",
                d.severity, d.path, d.message
            )?;
        }
        shown += 1;
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if shown > 0 {
        writeln!(out)?;
    }

    if errors == 0 && warnings == 0 {
        writeln!(out, "No issues found.")
    } else {
        writeln!(out, "{errors} error(s), {warnings} warning(s)")
    }
}

fn show(path: Option<&Path>) -> Result<()> {
    let mut config = rollcall_config::discover_and_load(path)?;
    rollcall_config::apply_env_overrides(&mut config);
    if let Some(token) = config.discord.get_mut("token")
        && token.as_str().is_some_and(|t| !t.is_empty())
    {
        *token = serde_json::Value::String("[REDACTED]".into());
    }
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
