use std::collections::VecDeque;
use std::fmt;

/// Ordered list of arguments produced by the tokenizer.
///
/// Cloning gives an independent cursor: shifting a clone never changes the
/// original, which is how the command name is peeled off before dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramArguments {
    args: VecDeque<String>,
}

impl ProgramArguments {
    /// Create an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of arguments left.
    pub fn count(&self) -> usize {
        self.args.len()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Get the argument at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Remove and return the first argument.
    pub fn shift(&mut self) -> Option<String> {
        self.args.pop_front()
    }

    pub fn push(&mut self, arg: impl Into<String>) {
        self.args.push_back(arg.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(String::as_str)
    }

    /// Borrow all arguments as string slices, e.g. for `argh::FromArgs::from_args`.
    pub fn as_strs(&self) -> Vec<&str> {
        self.iter().collect()
    }

    /// Join the arguments with single spaces.
    pub fn join(&self, sep: &str) -> String {
        self.as_strs().join(sep)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.args.into()
    }
}

impl From<Vec<String>> for ProgramArguments {
    fn from(args: Vec<String>) -> Self {
        Self { args: args.into() }
    }
}

impl From<&[&str]> for ProgramArguments {
    fn from(args: &[&str]) -> Self {
        args.iter().copied().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ProgramArguments {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            args: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for ProgramArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join(" "))
    }
}
