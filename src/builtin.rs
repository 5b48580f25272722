use crate::arguments::ProgramArguments;
use crate::context::{CHANNEL_CMD, CHANNEL_CMD_SYSTEM, Context};
use crate::variables::VariableFlags;
use anyhow::{Context as _, Result};
use argh::{EarlyExit, FromArgs};
use regex::RegexBuilder;
use std::collections::BTreeSet;
use std::fs;

/// Built-in console commands known at compile time.
///
/// Arguments are parsed with [`argh`] (`FromArgs`); a parse failure or
/// `--help` prints argh's usage text instead of running the command.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Name the command is registered under, e.g. "set" or "help".
    fn name() -> &'static str;

    fn execute(self, ctx: &Context) -> Result<()>;
}

/// Register `T` on `ctx`.
fn register<T: BuiltinCommand + 'static>(ctx: &Context) {
    ctx.commands().add(T::name(), |ctx, args: &ProgramArguments| {
        match T::from_args(&[T::name()], &args.as_strs()) {
            Ok(cmd) => cmd.execute(ctx),
            Err(EarlyExit { output, status }) => {
                ctx.print(CHANNEL_CMD, &format!("{}\n", output.trim_end()));
                match status {
                    Ok(()) => Ok(()),
                    Err(()) => Err(anyhow::anyhow!("invalid arguments")),
                }
            }
        }
    });
}

/// Register every built-in command on a freshly built context.
pub(crate) fn register_all(ctx: &Context) {
    register::<Help>(ctx);
    register_set(ctx, "set", VariableFlags::empty());
    register_set(ctx, "seta", VariableFlags::ARCHIVE);
    register::<Reset>(ctx);
    register::<Toggle>(ctx);
    register::<Vstr>(ctx);
    register::<Exec>(ctx);
    register::<Echo>(ctx);
}

/// Register `set`-style command `name`, which adds `flags` to the variable.
///
/// Parsed by hand rather than with argh: values such as `-1` or `--fast`
/// are data here, not options.
fn register_set(ctx: &Context, name: &'static str, flags: VariableFlags) {
    ctx.commands().add(name, move |ctx, args| {
        let mut args = args.clone();
        let var_name = args
            .shift()
            .ok_or_else(|| anyhow::anyhow!("missing variable name"))?;
        ctx.set_variable(&var_name, &args.join(" "), flags)?;
        Ok(())
    });
}

/// Register the command that shares a variable's name.
///
/// With no arguments it prints the variable, otherwise it sets it to the
/// arguments joined by spaces.
pub(crate) fn register_variable_command(ctx: &Context, name: &str) {
    let var_name = name.to_string();
    ctx.commands().add(name, move |ctx, args| {
        if args.is_empty() {
            let variable = ctx
                .variables()
                .find(&var_name)
                .with_context(|| format!("variable {} is gone", var_name))?;
            ctx.print(
                CHANNEL_CMD_SYSTEM,
                &format!(
                    "{} = \"{}\" (default: \"{}\")\n",
                    var_name,
                    variable.value(),
                    variable.default_value()
                ),
            );
            return Ok(());
        }

        ctx.set_variable(&var_name, &args.join(" "), VariableFlags::empty())?;
        Ok(())
    });
}

#[derive(FromArgs)]
/// list commands, with the value of those that are variables.
pub struct Help {
    #[argh(positional)]
    /// only list names matching this case-insensitive regular expression.
    pub pattern: Option<String>,
}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(self, ctx: &Context) -> Result<()> {
        let filter = match &self.pattern {
            Some(pattern) => Some(
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .with_context(|| format!("bad pattern {}", pattern))?,
            ),
            None => None,
        };

        let mut names = BTreeSet::new();
        ctx.commands().for_each_name(|name| {
            names.insert(name.to_string());
        });

        for name in names {
            if filter.as_ref().is_some_and(|re| !re.is_match(&name)) {
                continue;
            }

            match ctx.variables().find(&name) {
                Some(variable) => ctx.print(
                    CHANNEL_CMD_SYSTEM,
                    &format!("{} = {}\n", name, variable.value()),
                ),
                None => ctx.print(CHANNEL_CMD_SYSTEM, &format!("{}\n", name)),
            }
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// restore a variable's default value.
pub struct Reset {
    #[argh(positional)]
    /// variable name.
    pub name: String,
}

impl BuiltinCommand for Reset {
    fn name() -> &'static str {
        "reset"
    }

    fn execute(self, ctx: &Context) -> Result<()> {
        ctx.variables().reset(&self.name)?;
        Ok(())
    }
}

#[derive(FromArgs)]
/// flip a boolean variable between its on and off values.
pub struct Toggle {
    #[argh(positional)]
    /// variable name.
    pub name: String,
}

/// The opposite of a boolean-ish value.
fn toggled(value: &str) -> &'static str {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => "false",
        "false" => "true",
        "" | "0" => "1",
        _ => "0",
    }
}

impl BuiltinCommand for Toggle {
    fn name() -> &'static str {
        "toggle"
    }

    fn execute(self, ctx: &Context) -> Result<()> {
        let variable = ctx
            .variables()
            .find(&self.name)
            .with_context(|| format!("no such variable {}", self.name))?;
        ctx.variables().set(&self.name, toggled(&variable.value()))?;
        Ok(())
    }
}

#[derive(FromArgs)]
/// run the value of a variable as console commands.
pub struct Vstr {
    #[argh(positional)]
    /// variable name.
    pub name: String,
}

impl BuiltinCommand for Vstr {
    fn name() -> &'static str {
        "vstr"
    }

    fn execute(self, ctx: &Context) -> Result<()> {
        let variable = ctx
            .find_variable(&self.name)
            .with_context(|| format!("no such variable {}", self.name))?;
        ctx.append_to_buffer(&format!("{}\n", variable.value()));
        Ok(())
    }
}

#[derive(FromArgs)]
/// run the commands in a file.
pub struct Exec {
    #[argh(positional)]
    /// path of the file to run.
    pub file: String,
}

impl BuiltinCommand for Exec {
    fn name() -> &'static str {
        "exec"
    }

    fn execute(self, ctx: &Context) -> Result<()> {
        let mut text = fs::read_to_string(&self.file)
            .with_context(|| format!("can't read {}", self.file))?;
        if !text.ends_with('\n') {
            text.push('\n');
        }

        tracing::debug!(target: "cmd", "Executing {}", self.file);
        ctx.append_to_buffer(&text);
        Ok(())
    }
}

#[derive(FromArgs)]
/// print the arguments, separated by spaces.
pub struct Echo {
    #[argh(switch, short = 'n')]
    /// do not output the trailing newline.
    pub no_newline: bool,

    #[argh(positional, greedy)]
    /// values to print as-is, separated by spaces.
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn execute(self, ctx: &Context) -> Result<()> {
        let mut s = self.args.join(" ");
        if !self.no_newline {
            s.push('\n');
        }
        ctx.print(CHANNEL_CMD, &s);
        Ok(())
    }
}
