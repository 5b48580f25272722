//! An embeddable, thread-safe command console.
//!
//! Text is tokenized into arguments, the first argument names a command, and
//! the rest are passed to it. Commands can read and write named variables,
//! and archived variables are saved to a configuration file that the console
//! can run again at startup.
//!
//! The main entry point is [`Context`]: it owns a command buffer, a
//! [`CommandRegistry`] and a [`VariableStore`]. Any thread may append text to
//! the buffer; the host drains it with [`Context::execute_buffer`] at a time
//! of its choosing. A process-wide default context and free functions that
//! forward to it live in [`global`].

mod arguments;
mod buffer;
mod builtin;
pub mod command;
pub mod context;
pub mod global;
pub mod output;
pub mod persistence;
mod tokenizer;
pub mod variables;

pub use arguments::ProgramArguments;
pub use buffer::CommandBuffer;
pub use command::{CommandId, CommandRegistry};
pub use context::Context;
pub use global::{
    append_to_buffer, create_context, default_context, execute_arguments, execute_buffer,
    execute_single, save_configuration_if_needed, set_variable_modified_flags,
};
pub use output::{ConsoleOutput, MemOutput, StdoutOutput, TracingOutput};
pub use tokenizer::tokenize;
pub use variables::{Variable, VariableError, VariableFlags, VariableStore};
