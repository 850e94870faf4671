//! Doctor command - verify system requirements and configuration.

use crate::acquire::ensure_tool;
use crate::cli::Output;
use crate::config::Settings;
use console::style;

/// Check result for a single item.
#[derive(Debug)]
struct CheckResult {
    name: String,
    ok: bool,
    message: String,
    hint: Option<String>,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            ok: true,
            message: message.to_string(),
            hint: None,
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            ok: false,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = if self.ok {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);
        if let Some(hint) = &self.hint {
            println!("      {}", style(hint).dim());
        }
    }
}

/// Run the doctor command.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Arkiv Doctor");
    println!();

    let mut checks = Vec::new();

    for tool in ["yt-dlp", "ffmpeg", "ffprobe"] {
        checks.push(match ensure_tool(tool) {
            Ok(()) => CheckResult::ok(tool, "available"),
            Err(e) => CheckResult::error(tool, &e.to_string(), "Install it and add it to PATH"),
        });
    }

    checks.push(match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => CheckResult::ok("OPENAI_API_KEY", "set"),
        _ => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "export OPENAI_API_KEY='sk-...' (needed for Whisper, enrichment, embeddings)",
        ),
    });

    checks.push(match settings.youtube.resolve_api_key() {
        Some(_) => CheckResult::ok("YouTube API key", "configured"),
        None => CheckResult::error(
            "YouTube API key",
            "not configured",
            "Set youtube.api_key in config or export YOUTUBE_API_KEY",
        ),
    });

    let config_path = Settings::default_config_path();
    checks.push(if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::error(
            "Config file",
            "not found (defaults in use)",
            "Run `arkiv config init` to write one",
        )
    });

    let db_path = settings.sqlite_path();
    checks.push(if db_path.exists() {
        CheckResult::ok("Database", &db_path.display().to_string())
    } else {
        CheckResult::error(
            "Database",
            "not created yet",
            "It will be created on first ingest",
        )
    });

    for check in &checks {
        check.print();
    }
    println!();

    let failures = checks.iter().filter(|c| !c.ok).count();
    if failures == 0 {
        Output::success("All checks passed.");
    } else {
        Output::warning(&format!("{} check(s) need attention.", failures));
    }

    Ok(())
}
