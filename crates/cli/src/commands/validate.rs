//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use config_loader::{ConfigLoader, LoggerConfig};

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    name: String,
    level: String,
    sink_count: usize,
    telemetry_sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = ConfigLoader::warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(summarize(&config)),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

fn summarize(config: &LoggerConfig) -> ConfigSummary {
    ConfigSummary {
        name: config.name.clone(),
        level: config.level.to_string(),
        sink_count: config.sinks.len(),
        telemetry_sink_count: config
            .sinks
            .iter()
            .filter(|s| s.sink_type == contracts::SinkType::Telemetry)
            .count(),
    }
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Logger: {}", summary.name);
            println!("  Level: {}", summary.level);
            println!("  Sinks: {}", summary.sink_count);
            println!("  Telemetry sinks: {}", summary.telemetry_sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_valid_config_summary() {
        let file = write_config(
            r#"
name = "svc"
level = "error|warning"

[[sinks]]
name = "console"
sink_type = "console"
"#,
        );
        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        });
        assert!(result.valid);
        let summary = result.summary.unwrap();
        assert_eq!(summary.name, "svc");
        assert_eq!(summary.level, "error|warning");
        assert_eq!(summary.sink_count, 1);
        assert!(result.warnings.is_none());
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&ValidateArgs {
            config: PathBuf::from("/nonexistent/logger.toml"),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }

    #[test]
    fn test_invalid_config_reports_error() {
        let file = write_config(
            r#"
[[sinks]]
name = "appInsights"
sink_type = "telemetry"
"#,
        );
        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("access_key"));
    }

    #[test]
    fn test_empty_config_warns() {
        let file = write_config("name = \"quiet\"\n");
        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        });
        assert!(result.valid);
        assert_eq!(result.warnings.unwrap().len(), 1);
    }
}
