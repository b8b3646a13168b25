use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::compile::CompiledPlan;
use crate::output;

/// Handles the 'export' command - writes the compiled artifacts to disk for
/// standalone/offline rendering
pub struct ExportCommand;

impl ExportCommand {
    /// Execute the export command
    pub fn execute(compiled: &CompiledPlan, out_dir: &Path, js_globals: bool) -> Result<()> {
        fs::create_dir_all(out_dir).with_context(|| {
            format!("Failed to create output directory: {}", out_dir.display())
        })?;

        write_json(&out_dir.join("rso.json"), &compiled.overview)?;
        write_json(&out_dir.join("graph.json"), &compiled.graph)?;
        write_json(&out_dir.join("map.json"), &compiled.map)?;
        write_json(&out_dir.join("plan.json"), &compiled.plan)?;
        write_json(&out_dir.join("diagnostics.json"), &compiled.diagnostics)?;

        if js_globals {
            let data = format!(
                "window.PLANSIGHT_RSO = {};\nwindow.PLANSIGHT_GRAPH = {};\nwindow.PLANSIGHT_MAP = {};\n",
                serde_json::to_string(&compiled.overview)?,
                serde_json::to_string(&compiled.graph)?,
                serde_json::to_string(&compiled.map)?,
            );
            let path = out_dir.join("data.js");
            fs::write(&path, data)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }

        output::success_with_details("Exported artifacts", &out_dir.display().to_string());
        Ok(())
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
