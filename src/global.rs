//! The process-wide default context and free functions forwarding to it.
//!
//! The default context is built on first use, exactly once even when several
//! threads race for it, and is never torn down. It has no fallback. Tests and
//! hosts that need isolation should build their own [`Context`] instead.

use crate::arguments::ProgramArguments;
use crate::context::Context;
use crate::variables::VariableFlags;
use anyhow::Result;
use once_cell::sync::Lazy;
use std::path::Path;
use std::sync::Arc;

static DEFAULT_CONTEXT: Lazy<Arc<Context>> = Lazy::new(|| Context::new(None));

/// The root context every free function forwards to.
pub fn default_context() -> &'static Arc<Context> {
    &DEFAULT_CONTEXT
}

/// Create a context that falls back to `parent`, or to the default context.
pub fn create_context(parent: Option<&Arc<Context>>) -> Arc<Context> {
    let parent = parent.unwrap_or_else(|| default_context());
    Context::new(Some(Arc::clone(parent)))
}

pub fn execute_single(line: &str) {
    default_context().execute_single(line)
}

pub fn execute_arguments(arguments: &ProgramArguments) {
    default_context().execute_arguments(arguments)
}

pub fn append_to_buffer(text: &str) {
    default_context().append_to_buffer(text)
}

pub fn execute_buffer() {
    default_context().execute_buffer()
}

pub fn save_configuration_if_needed(path: impl AsRef<Path>) -> Result<bool> {
    default_context().save_configuration_if_needed(path)
}

pub fn set_variable_modified_flags(flags: VariableFlags) {
    default_context().set_variable_modified_flags(flags)
}
