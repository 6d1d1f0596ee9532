//! Command stream execution
//!
//! A [`CommandStream`] only ever comes out of a fully successful template
//! expansion. Running it submits each line to the host in file order;
//! later commands may depend on state set by earlier ones (server
//! connection before channel join), so order is significant.

use confload_core::Host;

/// Ordered, non-blank command lines ready for submission to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStream {
    commands: Vec<String>,
}

impl CommandStream {
    /// Build a stream from expanded lines, skipping empty and
    /// whitespace-only ones.
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            commands: lines
                .into_iter()
                .filter(|line| !line.trim().is_empty())
                .collect(),
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(text.lines().map(str::to_string).collect())
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Submit every command to the host, in order. Per-command outcomes
    /// inside the host are not inspected; there is no retry.
    pub fn run(&self, host: &mut dyn Host) {
        for command in &self.commands {
            host.run_command(command);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confload_core::MockHost;

    #[test]
    fn test_blank_lines_skipped() {
        let stream = CommandStream::from_text("connect server1\n\n   \t\njoin #rust\n");
        assert_eq!(stream.commands(), ["connect server1", "join #rust"]);
    }

    #[test]
    fn test_run_preserves_order() {
        let stream = CommandStream::from_text("first\nsecond\n\nthird\n");
        let mut host = MockHost::new();

        stream.run(&mut host);
        assert_eq!(host.commands, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_empty_stream() {
        let stream = CommandStream::from_text("\n  \n");
        assert!(stream.is_empty());
        assert_eq!(stream.len(), 0);

        let mut host = MockHost::new();
        stream.run(&mut host);
        assert!(host.commands.is_empty());
    }
}
