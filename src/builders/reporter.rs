use anyhow::{Context, Result};
use std::collections::BTreeMap;

use crate::builders::kinds::{KindInfo, LoadInfo};
use crate::core::engine::{EffectivePolicy, FileClass};

/// Output format of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

pub trait StatusReporter {
    fn classification_report(&self, files: &[(String, FileClass)]) -> Result<String>;
    fn policy_report(&self, policy: &EffectivePolicy) -> Result<String>;
    fn kinds_report(&self, kinds: &[(&str, KindInfo)], loads: &[LoadInfo]) -> Result<String>;
}

/// Renders reports for the terminal, either as text or as JSON.
pub struct ConsoleReporter {
    format: ReportFormat,
}

impl ConsoleReporter {
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    fn class_icon(class: FileClass) -> &'static str {
        match class {
            FileClass::Source => "🟢",
            FileClass::Test => "🧪",
            FileClass::Data => "📄",
            FileClass::Excluded => "🚫",
            FileClass::Disabled => "⏸️ ",
            FileClass::Other => "⚪",
        }
    }

    fn list(items: &[String]) -> String {
        if items.is_empty() {
            "(none)".to_string()
        } else {
            items.join(", ")
        }
    }
}

impl StatusReporter for ConsoleReporter {
    fn classification_report(&self, files: &[(String, FileClass)]) -> Result<String> {
        if self.format == ReportFormat::Json {
            let map: BTreeMap<&str, FileClass> =
                files.iter().map(|(path, class)| (path.as_str(), *class)).collect();
            return serde_json::to_string_pretty(&map).context("Failed to serialize report");
        }

        let mut out = String::from("📊 File Classification\n=====================\n");
        let mut totals: BTreeMap<String, usize> = BTreeMap::new();
        for (path, class) in files {
            out.push_str(&format!("{} {path} ({class})\n", Self::class_icon(*class)));
            *totals.entry(class.to_string()).or_default() += 1;
        }

        out.push_str("\n📈 Summary:\n");
        for (class, count) in totals {
            out.push_str(&format!("  {class}: {count}\n"));
        }
        Ok(out)
    }

    fn policy_report(&self, policy: &EffectivePolicy) -> Result<String> {
        if self.format == ReportFormat::Json {
            return serde_json::to_string_pretty(policy).context("Failed to serialize report");
        }

        let directory = if policy.directory.is_empty() {
            "(root)"
        } else {
            policy.directory.as_str()
        };
        let mut out = format!("📁 Directory: {directory}\n");
        if policy.resolved_from != policy.directory {
            out.push_str(&format!("  └─ inherited from '{}'\n", policy.resolved_from));
        }
        out.push_str(&format!("  Generation enabled: {}\n", policy.generation_enabled));
        out.push_str(&format!(
            "  Validate import statements: {}\n",
            policy.validate_import_statements
        ));
        out.push_str(&format!("  Library target: {}\n", policy.library_name));
        out.push_str(&format!("  Tests target: {}\n", policy.tests_library_name));
        out.push_str(&format!("  Sources glob: {}\n", policy.srcs_file_glob));
        out.push_str(&format!("  Tests glob: {}\n", policy.tests_file_glob));
        out.push_str(&format!("  Excluded: {}\n", Self::list(&policy.excluded_patterns)));
        out.push_str(&format!("  Ignored imports: {}\n", Self::list(&policy.ignored_imports)));
        Ok(out)
    }

    fn kinds_report(&self, kinds: &[(&str, KindInfo)], loads: &[LoadInfo]) -> Result<String> {
        if self.format == ReportFormat::Json {
            let kinds: BTreeMap<&str, &KindInfo> =
                kinds.iter().map(|(name, info)| (*name, info)).collect();
            let value = serde_json::json!({ "kinds": kinds, "loads": loads });
            return serde_json::to_string_pretty(&value).context("Failed to serialize report");
        }

        let mut out = String::new();
        for (name, info) in kinds {
            out.push_str(&format!("🔧 {name}\n"));
            out.push_str(&format!("  match any: {}\n", info.match_any));
            out.push_str(&format!("  non-empty: {}\n", info.non_empty_attrs.join(", ")));
            out.push_str(&format!("  substitute: {}\n", info.substitute_attrs.join(", ")));
            out.push_str(&format!("  mergeable: {}\n", info.mergeable_attrs.join(", ")));
            out.push_str(&format!("  resolve: {}\n", info.resolve_attrs.join(", ")));
        }
        for load in loads {
            out.push_str(&format!("📦 load(\"{}\", {})\n", load.name, load.symbols.join(", ")));
        }
        Ok(out)
    }
}
