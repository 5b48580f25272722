use crate::variables::VariableStore;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

static GLOBAL_TRACKER: Lazy<Arc<SaveTracker>> = Lazy::new(|| Arc::new(SaveTracker::new()));

/// Remembers whether a configuration save has happened yet.
///
/// Contexts share [`SaveTracker::global`] unless built with their own, so by
/// default only the very first save in the process is forced; later saves
/// happen only when archived variables changed.
#[derive(Debug, Default)]
pub struct SaveTracker {
    saved_before: AtomicBool,
}

impl SaveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide tracker.
    pub fn global() -> Arc<SaveTracker> {
        Arc::clone(&GLOBAL_TRACKER)
    }

    pub fn saved_before(&self) -> bool {
        self.saved_before.load(Ordering::Acquire)
    }

    pub fn mark_saved(&self) {
        self.saved_before.store(true, Ordering::Release);
    }
}

/// Render archived variables as `seta` lines the console can run again.
///
/// Line breaks are dropped so each variable stays one line. A value ending
/// in `\` is written without its closing quote: the tokenizer would read
/// `\"` as an escaped quote, while an open quote simply runs to the end of
/// the line.
pub fn render_config(store: &VariableStore) -> String {
    let mut out = String::new();
    for variable in store.archived() {
        let name = escape(variable.name());
        if name.ends_with('\\') {
            tracing::warn!(target: "cmd", name = %name, "can't archive a variable whose name ends in a backslash");
            continue;
        }

        let value = escape(&variable.value());
        let close = if value.ends_with('\\') { "" } else { "\"" };
        // Writing to a String can't fail.
        let _ = writeln!(out, "seta \"{}\" \"{}{}", name, value, close);
    }
    out
}

fn escape(s: &str) -> String {
    s.replace(['\r', '\n'], "").replace('"', "\\\"")
}

/// Write archived variables from `store` to `path`, creating parent
/// directories as needed.
pub fn save_variables(path: &Path, store: &VariableStore) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("can't create directory {}", parent.display()))?;
    }

    fs::write(path, render_config(store))
        .with_context(|| format!("can't write config to {}", path.display()))
}
