pub mod build;
pub mod completions;
pub mod resolve;
pub mod validate;

use deckhand_core::{Builder, CoreError};
use deckhand_schema::{BuildConfig, Manifest};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_CONFIG_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

/// Prefix descriptor problems so `main` can pick the manifest exit code.
pub fn describe_error(err: &CoreError) -> String {
    if err.is_manifest_error() {
        format!("manifest error: {err}")
    } else {
        err.to_string()
    }
}

pub fn load_builder(config_path: &Path) -> Result<Builder, String> {
    let config = BuildConfig::load(config_path)
        .map_err(|e| format!("config error: {}: {e}", config_path.display()))?;
    tracing::debug!(
        "loaded config from {}, project at {}",
        config_path.display(),
        config.project_path.display()
    );
    Ok(Builder::new(config))
}

/// Resource count per type, ordered by type name.
pub fn type_summary(manifest: &Manifest) -> BTreeMap<String, usize> {
    let mut summary = BTreeMap::new();
    for (_, entry) in manifest.iter() {
        let kind = entry.resource_type_str().unwrap_or("unknown").to_owned();
        *summary.entry(kind).or_insert(0) += 1;
    }
    summary
}

pub fn print_summary(manifest: &Manifest) {
    use console::Style;
    let dim = Style::new().dim();
    for (kind, count) in type_summary(manifest) {
        println!("  {} {count}", dim.apply_to(format!("{kind:<24}")));
    }
}
