//! Splits a console line into arguments.
//!
//! The rules are small on purpose: runs of bytes above space form a word,
//! double quotes group a word that may contain spaces (and may be empty),
//! `\"` inside quotes yields a literal quote, and `//`, `#` and `/* */`
//! start comments. The tokenizer never fails: malformed input produces
//! whatever arguments could be read before the problem.

use crate::arguments::ProgramArguments;

/// Bytes that may follow a backslash inside a quoted word.
fn is_escape_byte(b: u8) -> bool {
    b == b'"'
}

struct Tokenizer<'a> {
    input: &'a [u8],
    pos: usize,
    args: ProgramArguments,
}

impl<'a> Tokenizer<'a> {
    fn new(line: &'a str) -> Self {
        Tokenizer {
            input: line.as_bytes(),
            pos: 0,
            args: ProgramArguments::new(),
        }
    }

    fn run(mut self) -> ProgramArguments {
        while self.skip_to_next_word() {
            let keep_going = if self.peek() == Some(b'"') {
                self.read_quoted();
                true
            } else {
                self.read_unquoted()
            };

            if !keep_going {
                break;
            }
        }
        self.args
    }

    // Look-ahead past the end reads as `None`, never as a stray byte.
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.input.get(self.pos + 1).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn at_line_comment(&self) -> bool {
        match self.peek() {
            Some(b'#') => true,
            Some(b'/') => self.peek_next() == Some(b'/'),
            _ => false,
        }
    }

    fn at_block_comment(&self) -> bool {
        self.peek() == Some(b'/') && self.peek_next() == Some(b'*')
    }

    fn push(&mut self, bytes: &[u8]) {
        self.args.push(String::from_utf8_lossy(bytes).into_owned());
    }

    /// Skips blanks, control bytes and comments.
    ///
    /// Returns `false` when nothing is left to read. The comment checks are
    /// bypassed while still at offset 0; comments there are caught by the
    /// word scanner instead.
    fn skip_to_next_word(&mut self) -> bool {
        loop {
            while matches!(self.peek(), Some(b) if b <= b' ') {
                self.pos += 1;
            }

            if self.at_end() {
                return false;
            }

            if self.pos == 0 {
                return true;
            }

            if self.at_line_comment() {
                return false;
            }

            if !self.at_block_comment() {
                return true;
            }

            match self.find_block_end(self.pos + 2) {
                Some(end) => self.pos = end + 2,
                None => {
                    self.pos = self.input.len();
                    return false;
                }
            }
        }
    }

    fn find_block_end(&self, from: usize) -> Option<usize> {
        self.input
            .get(from..)?
            .windows(2)
            .position(|w| w == b"*/")
            .map(|offset| from + offset)
    }

    /// Reads a `"..."` word. An unterminated quote runs to the end of the line.
    fn read_quoted(&mut self) {
        let mut word = Vec::new();
        let mut in_escape = false;

        // opening quote
        self.pos += 1;

        while let Some(b) = self.peek() {
            if b == b'"' && !in_escape {
                break;
            }

            if b == b'\\' && self.peek_next().is_some_and(is_escape_byte) {
                in_escape = true;
            } else {
                word.push(b);
                in_escape = false;
            }

            self.pos += 1;
        }

        // closing quote, if any
        self.pos += 1;

        self.push(&word);
    }

    /// Reads a bare word. Returns `false` if a comment cut the line short;
    /// the word the comment is glued to is dropped along with it.
    fn read_unquoted(&mut self) -> bool {
        let start = self.pos;

        while let Some(b) = self.peek() {
            if b <= b' ' || b == b'"' {
                break;
            }

            if self.at_line_comment() || self.at_block_comment() {
                return false;
            }

            self.pos += 1;
        }

        self.push_unless_empty(start);
        true
    }

    fn push_unless_empty(&mut self, start: usize) {
        if self.pos > start {
            let input = self.input;
            self.push(&input[start..self.pos]);
        }
    }
}

/// Splits `line` into console arguments.
///
/// ```
/// use console_commands::tokenize;
/// let args = tokenize("say \"hello world\" // greeting");
/// assert_eq!(args.as_strs(), vec!["say", "hello world"]);
/// ```
pub fn tokenize(line: &str) -> ProgramArguments {
    Tokenizer::new(line).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(line: &str) -> Vec<String> {
        tokenize(line).into_vec()
    }

    #[test]
    fn test_plain_words() {
        assert_eq!(words("run foo bar"), vec!["run", "foo", "bar"]);
    }

    #[test]
    fn test_quoted_word_keeps_spaces() {
        assert_eq!(words("say \"hello world\""), vec!["say", "hello world"]);
    }

    #[test]
    fn test_empty_quotes_produce_empty_argument() {
        assert_eq!(words("\"\""), vec![""]);
        assert_eq!(words("set name \"\""), vec!["set", "name", ""]);
    }

    #[test]
    fn test_escaped_quote_inside_quotes() {
        assert_eq!(
            words(r#"echo "a \"quoted\" word""#),
            vec!["echo", r#"a "quoted" word"#]
        );
    }

    #[test]
    fn test_backslash_before_other_byte_is_literal() {
        assert_eq!(words(r#"echo "c:\temp""#), vec!["echo", r"c:\temp"]);
    }

    #[test]
    fn test_unterminated_quote_runs_to_end() {
        assert_eq!(words("echo \"never closed"), vec!["echo", "never closed"]);
    }

    #[test]
    fn test_quote_splits_bare_word() {
        assert_eq!(words("a\"b c\"d"), vec!["a", "b c", "d"]);
    }

    #[test]
    fn test_trailing_line_comment() {
        assert_eq!(words("cmd // trailing comment"), vec!["cmd"]);
        assert_eq!(words("cmd # trailing comment"), vec!["cmd"]);
    }

    #[test]
    fn test_whole_line_comment() {
        assert!(words("# all comment").is_empty());
        assert!(words("// all comment").is_empty());
        assert!(words("   // indented comment").is_empty());
    }

    #[test]
    fn test_comment_glued_to_word_drops_word() {
        assert!(words("cmd#rest").is_empty());
        assert_eq!(words("a b//c d"), vec!["a"]);
        assert_eq!(words("a b/*c*/ d"), vec!["a"]);
        assert_eq!(words("set x 1# note"), vec!["set", "x"]);
    }

    #[test]
    fn test_block_comment_is_skipped() {
        assert_eq!(words("a /* block */ b"), vec!["a", "b"]);
        assert_eq!(words("a /**/b"), vec!["a", "b"]);
    }

    #[test]
    fn test_unterminated_block_comment_discards_rest() {
        assert_eq!(words("a /* never closed b"), vec!["a"]);
        assert_eq!(words("a /*"), vec!["a"]);
    }

    #[test]
    fn test_block_comment_at_offset_zero_discards_line() {
        assert!(words("/* c */ x").is_empty());
        assert_eq!(words(" /* c */ x"), vec!["x"]);
    }

    #[test]
    fn test_lone_slash_at_end_is_a_word() {
        assert_eq!(words("cd /"), vec!["cd", "/"]);
        assert_eq!(words("a /"), vec!["a", "/"]);
    }

    #[test]
    fn test_control_bytes_are_separators() {
        assert_eq!(words("\t set\tfoo \x01 bar\r\n"), vec!["set", "foo", "bar"]);
    }

    #[test]
    fn test_blank_input() {
        assert!(words("").is_empty());
        assert!(words("   \t ").is_empty());
    }

    #[test]
    fn test_utf8_is_preserved() {
        assert_eq!(
            words("echo \"héllo wörld\" ünï"),
            vec!["echo", "héllo wörld", "ünï"]
        );
    }
}
