use crate::arguments::ProgramArguments;
use crate::buffer::CommandBuffer;
use crate::builtin;
use crate::command::CommandRegistry;
use crate::output::{ConsoleOutput, TracingOutput};
use crate::persistence::{self, SaveTracker};
use crate::tokenizer::tokenize;
use crate::variables::{
    ModifiedFlags, Variable, VariableError, VariableFlags, VariableStore, check_value,
};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

/// Channel used for command system messages, e.g. `help` output.
pub const CHANNEL_CMD_SYSTEM: &str = "CmdSystem";
/// Channel used for dispatch and persistence messages.
pub const CHANNEL_CMD: &str = "cmd";

/// Settings for building a [`Context`].
pub struct ContextOptions {
    /// Where command output goes.
    pub output: Arc<dyn ConsoleOutput>,
    /// Tracks whether a configuration save has happened. Defaults to the
    /// process-wide tracker shared by every context.
    pub save_tracker: Arc<SaveTracker>,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            output: Arc::new(TracingOutput),
            save_tracker: SaveTracker::global(),
        }
    }
}

/// An isolated console: its own command buffer, commands and variables.
///
/// A context may point at a fallback context. Commands and variables that
/// are not found locally are looked up there, and so on up the chain. The
/// fallback is always a context that existed before this one, so the chain
/// can't loop.
///
/// ```
/// use console_commands::{Context, MemOutput};
/// use console_commands::context::ContextOptions;
///
/// let (output, printed) = MemOutput::with_handle();
/// let ctx = Context::with_options(None, ContextOptions { output, ..Default::default() });
///
/// ctx.append_to_buffer("set greeting hello; echo done\n");
/// ctx.execute_buffer();
///
/// assert_eq!(ctx.find_variable("greeting").unwrap().value(), "hello");
/// assert_eq!(printed.text(), "done\n");
/// ```
pub struct Context {
    fallback: Option<Arc<Context>>,
    buffer: CommandBuffer,
    commands: CommandRegistry,
    variables: VariableStore,
    modified: Arc<ModifiedFlags>,
    output: Arc<dyn ConsoleOutput>,
    save_tracker: Arc<SaveTracker>,
}

impl Context {
    /// Create a context with default options.
    pub fn new(fallback: Option<Arc<Context>>) -> Arc<Self> {
        Self::with_options(fallback, ContextOptions::default())
    }

    /// Create a context and register the built-in commands on it.
    pub fn with_options(fallback: Option<Arc<Context>>, options: ContextOptions) -> Arc<Self> {
        let modified = Arc::new(ModifiedFlags::default());
        let ctx = Self {
            fallback,
            buffer: CommandBuffer::new(),
            commands: CommandRegistry::new(),
            variables: VariableStore::new(Arc::clone(&modified)),
            modified,
            output: options.output,
            save_tracker: options.save_tracker,
        };
        builtin::register_all(&ctx);
        Arc::new(ctx)
    }

    pub fn fallback(&self) -> Option<&Arc<Context>> {
        self.fallback.as_ref()
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    /// Send text to this context's output.
    pub fn print(&self, channel: &str, text: &str) {
        self.output.print(channel, text);
    }

    /// Tokenize `line` and run it. Blank lines and comments do nothing.
    pub fn execute_single(&self, line: &str) {
        self.execute_arguments(&tokenize(line));
    }

    /// Run an already tokenized command: the first argument is the name.
    pub fn execute_arguments(&self, arguments: &ProgramArguments) {
        let mut local = arguments.clone();
        let Some(name) = local.shift() else {
            return;
        };

        self.invoke(&name, &local);
    }

    /// Run command `name` here or, if unknown, in the fallback chain.
    ///
    /// Returns `false` if no context knew the command. That case, like a
    /// failing command, is only reported to the output.
    pub fn invoke(&self, name: &str, args: &ProgramArguments) -> bool {
        if let Some(command) = self.commands.find(name) {
            tracing::debug!(target: "cmd", command = name, args = %args, "invoking");
            if let Err(e) = command(self, args) {
                tracing::warn!(target: "cmd", command = name, "command failed: {:#}", e);
                self.print(CHANNEL_CMD, &format!("{}: {:#}\n", name, e));
            }
            return true;
        }

        match &self.fallback {
            Some(fallback) => fallback.invoke(name, args),
            None => {
                tracing::warn!(target: "cmd", command = name, "no such command");
                self.print(CHANNEL_CMD, &format!("No such command {}.\n", name));
                false
            }
        }
    }

    /// Queue text for the next [`Context::execute_buffer`]. Safe from any thread.
    pub fn append_to_buffer(&self, text: &str) {
        self.buffer.append(text);
    }

    /// Run every line currently in the buffer, in order.
    ///
    /// The buffer lock is released before anything runs, so a command may
    /// append to the buffer; that text runs on the next call, not this one.
    pub fn execute_buffer(&self) {
        for line in self.buffer.drain() {
            self.execute_single(&line);
        }
    }

    /// Text still waiting in the buffer.
    pub fn has_pending_commands(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Drain the buffer repeatedly until it stays empty or `stop` says so.
    ///
    /// Text queued by commands such as `exec` and `vstr` runs in the same
    /// call. `stop` is checked before every drain; a command that keeps
    /// queueing itself loops until `stop` returns `true`.
    pub fn execute_buffer_until_idle(&self, stop: impl Fn() -> bool) {
        while self.has_pending_commands() && !stop() {
            self.execute_buffer();
        }
    }

    /// Write archived variables to `path` if needed.
    ///
    /// A save happens when the save tracker has never seen one, or when an
    /// archived variable changed since the last save. Returns whether a
    /// save happened. On failure the `ARCHIVE` bit is raised again, so the
    /// next call tries again.
    pub fn save_configuration_if_needed(&self, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();

        if self.save_tracker.saved_before() && !self.modified.contains(VariableFlags::ARCHIVE) {
            return Ok(false);
        }

        // Cleared before writing so a change made during the write is kept.
        self.modified.remove(VariableFlags::ARCHIVE);

        tracing::debug!(target: "cmd", "Saving configuration to {}...", path.display());
        if let Err(e) = persistence::save_variables(path, &self.variables) {
            self.modified.insert(VariableFlags::ARCHIVE);
            return Err(e);
        }

        self.save_tracker.mark_saved();
        Ok(true)
    }

    /// Mark categories of variables as changed since the last save.
    pub fn set_variable_modified_flags(&self, flags: VariableFlags) {
        self.modified.insert(flags);
    }

    pub fn variable_modified_flags(&self) -> VariableFlags {
        self.modified.get()
    }

    /// Create a variable on this context, along with a command of the same
    /// name that prints it (no arguments) or sets it.
    pub fn register_variable(&self, name: &str, default: &str, flags: VariableFlags) -> Arc<Variable> {
        let (variable, created) = self.variables.register(name, default, flags);
        if created {
            builtin::register_variable_command(self, name);
        }
        variable
    }

    /// Set a variable on this context, creating it if needed.
    ///
    /// `flags` are added to the variable once the value is accepted; a newly
    /// created one is also flagged [`VariableFlags::USER_CREATED`].
    pub fn set_variable(&self, name: &str, value: &str, flags: VariableFlags) -> Result<(), VariableError> {
        check_value(name, value)?;

        if !self.variables.contains(name) {
            let (variable, created) = self
                .variables
                .register(name, value, flags | VariableFlags::USER_CREATED);
            if created {
                builtin::register_variable_command(self, name);
                self.modified.insert(variable.flags());
                return Ok(());
            }
        }

        self.variables.set(name, value)?;
        if !flags.is_empty() {
            self.variables.add_flags(name, flags)?;
        }
        Ok(())
    }

    /// Find a variable here or in the fallback chain.
    pub fn find_variable(&self, name: &str) -> Option<Arc<Variable>> {
        self.variables
            .find(name)
            .or_else(|| self.fallback.as_ref().and_then(|f| f.find_variable(name)))
    }
}
