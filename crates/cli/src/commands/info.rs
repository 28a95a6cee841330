//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use config_loader::{ConfigLoader, LoggerConfig};

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    name: String,
    level: String,
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    /// Level as written in the configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    configured_level: Option<String>,
    /// Level after registration with the logger
    effective_level: String,
    inherited: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    params: Vec<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&config);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(config: &LoggerConfig) -> ConfigInfo {
    let sinks = config
        .sinks
        .iter()
        .map(|s| {
            let mut params: Vec<String> = s
                .params
                .iter()
                .map(|(key, value)| {
                    if key == "access_key" {
                        format!("{key}=***")
                    } else {
                        format!("{key}={value}")
                    }
                })
                .collect();
            params.sort();

            SinkInfo {
                name: s.name.clone(),
                sink_type: s.sink_type.as_str().to_string(),
                configured_level: s.level.map(|l| l.to_string()),
                effective_level: s.effective_level(config.level).to_string(),
                inherited: s.initial_level().is_none(),
                params,
            }
        })
        .collect();

    ConfigInfo {
        name: config.name.clone(),
        level: config.level.to_string(),
        sinks,
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  Logger Configuration                        ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📋 Logger");
    println!("   ├─ Name: {}", info.name);
    println!("   └─ Level: {}", info.level);

    println!("\n📤 Sinks ({})", info.sinks.len());
    for (i, sink) in info.sinks.iter().enumerate() {
        let is_last = i == info.sinks.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!("   {} {} ({})", prefix, sink.name, sink.sink_type);
        let source = if sink.inherited { " (inherited)" } else { "" };
        println!(
            "   {}  ├─ Level: {}{}",
            child_prefix, sink.effective_level, source
        );
        if sink.params.is_empty() {
            println!("   {}  └─ Params: (none)", child_prefix);
        } else {
            println!("   {}  └─ Params: {}", child_prefix, sink.params.join(", "));
        }
    }

    println!();
}
