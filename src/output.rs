use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// Destination for text printed by console commands.
///
/// `channel` is a short tag such as `"CmdSystem"` or `"cmd"`. Text is passed
/// as produced, usually ending in a newline.
pub trait ConsoleOutput: Send + Sync {
    fn print(&self, channel: &str, text: &str);
}

/// Forwards console text to `tracing` at info level.
///
/// This is the default sink; the host decides where it ends up by
/// installing a subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingOutput;

impl ConsoleOutput for TracingOutput {
    fn print(&self, channel: &str, text: &str) {
        tracing::info!(channel = %channel, "{}", text.trim_end_matches('\n'));
    }
}

/// Writes console text straight to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutOutput;

impl ConsoleOutput for StdoutOutput {
    fn print(&self, _channel: &str, text: &str) {
        let mut stdout = std::io::stdout().lock();
        // Nothing sensible to do if stdout is gone.
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}

/// Memory-backed sink that keeps everything printed, in order.
///
/// Clones share the same storage, so one copy can be handed to a context
/// while another is used to read what was printed.
#[derive(Debug, Default, Clone)]
pub struct MemOutput {
    lines: Arc<Mutex<Vec<(String, String)>>>,
}

impl MemOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience: create a sink and return it with a shared handle.
    pub fn with_handle() -> (Arc<dyn ConsoleOutput>, Self) {
        let output = MemOutput::new();
        (Arc::new(output.clone()), output)
    }

    /// Everything printed so far, concatenated.
    pub fn text(&self) -> String {
        self.lines.lock().iter().map(|(_, text)| text.as_str()).collect()
    }

    /// Everything printed so far on `channel`, concatenated.
    pub fn channel_text(&self, channel: &str) -> String {
        self.lines
            .lock()
            .iter()
            .filter(|(c, _)| c == channel)
            .map(|(_, text)| text.as_str())
            .collect()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl ConsoleOutput for MemOutput {
    fn print(&self, channel: &str, text: &str) {
        self.lines
            .lock()
            .push((channel.to_string(), text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mem_output_shares_storage_between_clones() {
        let (sink, handle) = MemOutput::with_handle();
        sink.print("cmd", "hello\n");
        sink.print("CmdSystem", "world\n");

        assert_eq!(handle.text(), "hello\nworld\n");
        assert_eq!(handle.channel_text("CmdSystem"), "world\n");

        handle.clear();
        assert!(handle.text().is_empty());
    }
}
