//! Exported capture log files.
//!
//! The file is a single JSON document: a `meta` header followed by the
//! window's events in log order.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::browser::WindowId;
use crate::capture::event::CapturedEvent;
use crate::capture::log::{CaptureLog, CaptureSource};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMeta {
    pub exported_at: DateTime<Utc>,
    #[serde(default)]
    pub extension_version: String,
    pub window_id: WindowId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogExport {
    pub meta: ExportMeta,
    pub logs: Vec<CapturedEvent>,
}

impl LogExport {
    /// Snapshot a window of `source` into an export document
    pub fn from_source(source: &dyn CaptureSource, window: WindowId) -> Self {
        Self {
            meta: ExportMeta {
                exported_at: Utc::now(),
                extension_version: env!("CARGO_PKG_VERSION").to_string(),
                window_id: window,
            },
            logs: source.snapshot(window),
        }
    }

    pub fn window(&self) -> WindowId {
        self.meta.window_id
    }

    pub fn read_from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read capture log {}", path.display()))?;
        let export = serde_json::from_str(&contents)
            .with_context(|| format!("invalid capture log {}", path.display()))?;
        Ok(export)
    }

    /// Write atomically: the target is replaced only once the document is complete.
    pub fn write_to_path(&self, path: &Path) -> anyhow::Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        let json = serde_json::to_string_pretty(self)?;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.persist(path)
            .with_context(|| format!("failed to write capture log {}", path.display()))?;
        Ok(())
    }

    /// Load the events into `log` under `window` (defaults to the exported window)
    pub fn import_into(&self, log: &CaptureLog, window: Option<WindowId>) -> WindowId {
        let window = window.unwrap_or(self.meta.window_id);
        log.extend(window, self.logs.iter().cloned());
        tracing::debug!(window_id = %window, events = self.logs.len(), "Imported capture log");
        window
    }
}
