use crate::arguments::ProgramArguments;
use crate::context::Context;
use anyhow::Result;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Callback run when a command is invoked.
///
/// It receives the context that owns the command and the arguments that
/// followed the command name. An error is reported to the console output;
/// it never stops the rest of the buffer from running.
pub type CommandFn = dyn Fn(&Context, &ProgramArguments) -> Result<()> + Send + Sync;

/// Handle returned by [`CommandRegistry::add`], used to remove the entry again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId(u64);

struct Entry {
    id: CommandId,
    callback: Arc<CommandFn>,
}

/// Name to callback storage for one context.
///
/// Several entries may share a name; the most recently added one is the one
/// that runs. Lookups hand out a cloned callback so the registry lock is never
/// held while a command runs.
#[derive(Default)]
pub struct CommandRegistry {
    entries: RwLock<BTreeMap<String, Vec<Entry>>>,
    next_id: AtomicU64,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` under `name`.
    pub fn add<F>(&self, name: &str, callback: F) -> CommandId
    where
        F: Fn(&Context, &ProgramArguments) -> Result<()> + Send + Sync + 'static,
    {
        let id = CommandId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries
            .write()
            .entry(name.to_string())
            .or_default()
            .push(Entry {
                id,
                callback: Arc::new(callback),
            });
        id
    }

    /// Remove a single entry. Returns `false` if it was already gone.
    pub fn remove(&self, id: CommandId) -> bool {
        let mut entries = self.entries.write();
        let mut emptied = None;
        let mut found = false;

        for (name, list) in entries.iter_mut() {
            if let Some(pos) = list.iter().position(|e| e.id == id) {
                list.remove(pos);
                found = true;
                if list.is_empty() {
                    emptied = Some(name.clone());
                }
                break;
            }
        }

        if let Some(name) = emptied {
            entries.remove(&name);
        }
        found
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// The callback that would run for `name`.
    pub fn find(&self, name: &str) -> Option<Arc<CommandFn>> {
        self.entries
            .read()
            .get(name)
            .and_then(|list| list.last())
            .map(|e| Arc::clone(&e.callback))
    }

    /// Visit the name of every entry, duplicates included.
    pub fn for_each_name(&self, mut visitor: impl FnMut(&str)) {
        for (name, list) in self.entries.read().iter() {
            for _ in list {
                visitor(name);
            }
        }
    }

    /// Number of entries, duplicates included.
    pub fn len(&self) -> usize {
        self.entries.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
