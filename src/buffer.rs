use parking_lot::Mutex;

/// Pending console text, waiting to be split into lines and executed.
///
/// The text is stored as one string until [`CommandBuffer::drain`] splits it
/// on `;` (outside double quotes), `\r` and `\n`. Quote tracking here is a
/// plain toggle on `"`; escaped quotes are only understood later by the
/// tokenizer.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    text: Mutex<String>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw text to the end of the buffer.
    pub fn append(&self, text: &str) {
        self.text.lock().push_str(text);
    }

    pub fn is_empty(&self) -> bool {
        self.text.lock().is_empty()
    }

    /// Length of the pending text in bytes.
    pub fn len(&self) -> usize {
        self.text.lock().len()
    }

    /// Take every pending line out of the buffer, in order.
    ///
    /// The lock is released before this returns, so the caller can execute
    /// the lines while other threads (or the lines themselves) append more.
    pub fn drain(&self) -> Vec<String> {
        let mut text = self.text.lock();
        let mut lines = Vec::new();

        while !text.is_empty() {
            let end = find_line_end(&text);

            let line = if end < text.len() {
                // the delimiter goes too
                let mut line: String = text.drain(..=end).collect();
                line.pop();
                line
            } else {
                std::mem::take(&mut *text)
            };

            lines.push(line);
        }

        lines
    }
}

/// Index of the first `;` outside quotes, or `\r`/`\n`, else the text length.
fn find_line_end(text: &str) -> usize {
    let mut in_quote = false;

    for (i, b) in text.bytes().enumerate() {
        match b {
            b'"' => in_quote = !in_quote,
            b';' if !in_quote => return i,
            b'\r' | b'\n' => return i,
            _ => {}
        }
    }

    text.len()
}
