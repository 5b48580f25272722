use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use thiserror::Error;

bitflags::bitflags! {
    /// Per-variable flags; the same bits make up a context's "modified since
    /// last save" mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VariableFlags: u32 {
        /// Written to the saved configuration.
        const ARCHIVE = 1 << 0;
        /// Can't be changed from the console.
        const READ_ONLY = 1 << 1;
        /// Meant to be mirrored to remote peers by the host.
        const REPLICATED = 1 << 2;
        /// Created by a `set` command rather than by the host.
        const USER_CREATED = 1 << 3;
    }
}

/// Errors reported by [`VariableStore`] writes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VariableError {
    #[error("no such variable: {0}")]
    NotFound(String),
    #[error("variable {0} is read-only")]
    ReadOnly(String),
    #[error("value for {0} can't contain line breaks")]
    InvalidValue(String),
}

/// Refuse values that can't be written back as a single config line.
pub fn check_value(name: &str, value: &str) -> Result<(), VariableError> {
    if value.contains(['\r', '\n']) {
        return Err(VariableError::InvalidValue(name.to_string()));
    }
    Ok(())
}

/// Lock-free bitmask of [`VariableFlags`] raised by variable writes.
#[derive(Debug, Default)]
pub struct ModifiedFlags(AtomicU32);

impl ModifiedFlags {
    pub fn insert(&self, flags: VariableFlags) {
        self.0.fetch_or(flags.bits(), Ordering::AcqRel);
    }

    pub fn remove(&self, flags: VariableFlags) {
        self.0.fetch_and(!flags.bits(), Ordering::AcqRel);
    }

    pub fn get(&self) -> VariableFlags {
        VariableFlags::from_bits_retain(self.0.load(Ordering::Acquire))
    }

    pub fn contains(&self, flags: VariableFlags) -> bool {
        self.get().contains(flags)
    }
}

#[derive(Debug)]
struct VariableState {
    value: String,
    flags: VariableFlags,
}

/// A named console variable. Values are kept as strings.
#[derive(Debug)]
pub struct Variable {
    name: String,
    default: String,
    state: RwLock<VariableState>,
}

impl Variable {
    fn new(name: &str, default: &str, flags: VariableFlags) -> Self {
        Self {
            name: name.to_string(),
            default: default.to_string(),
            state: RwLock::new(VariableState {
                value: default.to_string(),
                flags,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value as a string.
    pub fn value(&self) -> String {
        self.state.read().value.clone()
    }

    pub fn default_value(&self) -> &str {
        &self.default
    }

    pub fn flags(&self) -> VariableFlags {
        self.state.read().flags
    }

    fn add_flags(&self, flags: VariableFlags) {
        self.state.write().flags |= flags;
    }

    /// Returns whether the value actually changed.
    fn set_value(&self, value: &str) -> Result<bool, VariableError> {
        check_value(&self.name, value)?;
        let mut state = self.state.write();
        if state.flags.contains(VariableFlags::READ_ONLY) {
            return Err(VariableError::ReadOnly(self.name.clone()));
        }
        if state.value == value {
            return Ok(false);
        }
        state.value = value.to_string();
        Ok(true)
    }
}

/// Name to variable map owned by one context.
///
/// Every change raises the variable's flags in the shared [`ModifiedFlags`]
/// mask, which is how a context knows it has unsaved archived values.
#[derive(Debug)]
pub struct VariableStore {
    entries: RwLock<BTreeMap<String, Arc<Variable>>>,
    modified: Arc<ModifiedFlags>,
}

impl VariableStore {
    pub fn new(modified: Arc<ModifiedFlags>) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            modified,
        }
    }

    /// Create a variable, or add `flags` to an existing one.
    ///
    /// The second value is `true` if the variable didn't exist before.
    pub fn register(
        &self,
        name: &str,
        default: &str,
        flags: VariableFlags,
    ) -> (Arc<Variable>, bool) {
        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(name) {
            existing.add_flags(flags);
            return (Arc::clone(existing), false);
        }

        let variable = Arc::new(Variable::new(name, default, flags));
        entries.insert(name.to_string(), Arc::clone(&variable));
        (variable, true)
    }

    pub fn find(&self, name: &str) -> Option<Arc<Variable>> {
        self.entries.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Set an existing variable. Returns whether the value changed.
    pub fn set(&self, name: &str, value: &str) -> Result<bool, VariableError> {
        let variable = self
            .find(name)
            .ok_or_else(|| VariableError::NotFound(name.to_string()))?;

        let changed = variable.set_value(value)?;
        if changed {
            self.modified.insert(variable.flags());
        }
        Ok(changed)
    }

    /// Add flags to an existing variable and mark them modified.
    pub fn add_flags(&self, name: &str, flags: VariableFlags) -> Result<(), VariableError> {
        let variable = self
            .find(name)
            .ok_or_else(|| VariableError::NotFound(name.to_string()))?;

        if !variable.flags().contains(flags) {
            variable.add_flags(flags);
            self.modified.insert(flags);
        }
        Ok(())
    }

    /// Restore a variable's default value.
    pub fn reset(&self, name: &str) -> Result<bool, VariableError> {
        let default = self
            .find(name)
            .map(|v| v.default_value().to_string())
            .ok_or_else(|| VariableError::NotFound(name.to_string()))?;
        self.set(name, &default)
    }

    /// Visit every variable in name order.
    pub fn for_each(&self, mut visitor: impl FnMut(&Variable)) {
        for variable in self.snapshot() {
            visitor(&variable);
        }
    }

    /// Variables flagged [`VariableFlags::ARCHIVE`], in name order.
    pub fn archived(&self) -> Vec<Arc<Variable>> {
        self.snapshot()
            .into_iter()
            .filter(|v| v.flags().contains(VariableFlags::ARCHIVE))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn snapshot(&self) -> Vec<Arc<Variable>> {
        self.entries.read().values().cloned().collect()
    }
}
