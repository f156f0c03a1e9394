use anyhow::Result;
use std::path::Path;

use crate::builders::kinds;
use crate::builders::reporter::{ConsoleReporter, ReportFormat, StatusReporter};
use crate::core::config::{ConfigManager, ConfigProvider};
use crate::core::engine::PolicyEngine;
use crate::core::registry::normalize_path;

pub fn initialize_repository(config_manager: &ConfigManager) -> Result<()> {
    config_manager.initialize()?;
    println!(
        "✓ Initialized {}",
        config_manager.get_config_path()?.display()
    );
    println!("Run 'tsgen-config add <dir> <directive> <value>' to declare policies");
    Ok(())
}

pub fn add_directive(
    config_manager: &mut ConfigManager,
    directory: String,
    directive: String,
    value: String,
) -> Result<()> {
    let directory = normalize_path(&directory);
    config_manager.add_directive(directory.clone(), directive.clone(), value)?;
    println!("✓ Added {directive} to '{directory}'");
    Ok(())
}

pub fn remove_directives(
    config_manager: &mut ConfigManager,
    directory: &str,
    directive: Option<&str>,
) -> Result<()> {
    let directory = normalize_path(directory);
    let removed = config_manager.remove_directives(&directory, directive)?;
    println!("✓ Removed {removed} directive(s) from '{directory}'");
    Ok(())
}

pub fn list_directives(config_manager: &ConfigManager) -> Result<()> {
    let config = config_manager.load_config()?;

    if config.directories.is_empty() {
        println!("No directives configured.");
        return Ok(());
    }

    for (directory, entries) in &config.directories {
        let shown = if directory.is_empty() { "(root)" } else { directory };
        println!("\n📁 Directory: {shown}");
        for entry in entries {
            println!("  🔍 {} = {}", entry.directive, entry.value);
        }
    }
    Ok(())
}

pub fn validate(config_manager: &ConfigManager) -> Result<()> {
    let issues = config_manager.validate_config()?;

    if issues.is_empty() {
        println!("✓ Configuration is valid.");
        Ok(())
    } else {
        println!("⚠️  Found issues in configuration:");
        for issue in issues {
            println!("  - {issue}");
        }
        anyhow::bail!("Configuration validation failed.");
    }
}

pub fn classify(
    config_manager: &ConfigManager,
    files: &[String],
    format: ReportFormat,
) -> Result<()> {
    let engine = load_engine(config_manager)?;
    let classes: Vec<_> = files
        .iter()
        .map(|file| {
            let file = normalize_path(file);
            let class = engine.classify(&file);
            (file, class)
        })
        .collect();

    let report = ConsoleReporter::new(format).classification_report(&classes)?;
    println!("{report}");
    Ok(())
}

pub fn show(config_manager: &ConfigManager, directory: &str, format: ReportFormat) -> Result<()> {
    let engine = load_engine(config_manager)?;
    let policy = engine.describe(&normalize_path(directory));
    let report = ConsoleReporter::new(format).policy_report(&policy)?;
    println!("{report}");
    Ok(())
}

pub fn show_kinds(format: ReportFormat) -> Result<()> {
    let report = ConsoleReporter::new(format).kinds_report(kinds::kinds(), kinds::loads())?;
    println!("{report}");
    Ok(())
}

pub fn export(config_manager: &ConfigManager, file_path: &Path, format: &str) -> Result<()> {
    config_manager.export_config(file_path, format)?;
    println!("✓ Exported configuration to {}", file_path.display());
    Ok(())
}

fn load_engine(config_manager: &ConfigManager) -> Result<PolicyEngine> {
    let config = config_manager.load_config()?;
    Ok(PolicyEngine::from_config(&config))
}
