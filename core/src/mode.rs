//! Run modes of the statement loop.

use std::fmt;

/// The context a statement loop runs in.
///
/// Fixed for the lifetime of one loop invocation. It decides which
/// operations are admissible and whether a failure ends the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunMode {
    /// A user typing at the console.
    Interactive,
    /// A script passed with `-f`.
    NonInteractive,
    /// An initialization file passed with `-i`.
    Initialization,
}

impl RunMode {
    /// Whether the first failing statement aborts the loop.
    pub fn exits_on_failure(self) -> bool {
        !matches!(self, RunMode::Interactive)
    }

    pub fn name(self) -> &'static str {
        match self {
            RunMode::Interactive => "interactive",
            RunMode::NonInteractive => "non-interactive",
            RunMode::Initialization => "initialization",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_interactive_survives_failures() {
        assert!(!RunMode::Interactive.exits_on_failure());
        assert!(RunMode::NonInteractive.exits_on_failure());
        assert!(RunMode::Initialization.exits_on_failure());
    }
}
