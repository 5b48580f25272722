use anyhow::{Context as _, Result};
use argh::FromArgs;
use console_commands::context::ContextOptions;
use console_commands::{Context, StdoutOutput};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// interactive command console.
struct Args {
    #[argh(option)]
    /// configuration file to run at startup and save on exit.
    config: Option<PathBuf>,

    #[argh(option, short = 'c')]
    /// command line to run before the prompt; may be repeated.
    command: Vec<String>,

    #[argh(switch)]
    /// run the startup commands and exit without a prompt.
    no_repl: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Args = argh::from_env();

    let console = Context::with_options(
        None,
        ContextOptions {
            output: Arc::new(StdoutOutput),
            ..Default::default()
        },
    );

    let quit = Arc::new(AtomicBool::new(false));
    for name in ["quit", "exit"] {
        let quit = Arc::clone(&quit);
        console.commands().add(name, move |_, _| {
            quit.store(true, Ordering::Release);
            Ok(())
        });
    }

    if let Some(config) = args.config.as_ref().filter(|p| p.exists()) {
        let text = std::fs::read_to_string(config)
            .with_context(|| format!("can't read config {}", config.display()))?;
        console.append_to_buffer(&text);
        console.append_to_buffer("\n");
    }
    for line in &args.command {
        console.append_to_buffer(line);
        console.append_to_buffer("\n");
    }
    console.execute_buffer_until_idle(|| quit.load(Ordering::Acquire));

    if !args.no_repl && !quit.load(Ordering::Acquire) {
        repl(&console, &quit)?;
    }

    if let Some(config) = &args.config {
        console.save_configuration_if_needed(config)?;
    }
    Ok(())
}

/// Read lines from the terminal and run them until `quit` or end of input.
fn repl(console: &Context, quit: &AtomicBool) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    while !quit.load(Ordering::Acquire) {
        match rl.readline("] ") {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                console.append_to_buffer(&line);
                console.append_to_buffer("\n");
                console.execute_buffer_until_idle(|| quit.load(Ordering::Acquire));
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}
