//! Parsed input lines.

/// One input line split into a command word and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub command: String,
    /// Everything after the command word, trimmed.
    pub rest: String,
    /// Whitespace-separated arguments.
    pub args: Vec<String>,
    pub raw: String,
}

impl Statement {
    /// Parse `line`. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        let mut parts = trimmed.splitn(2, char::is_whitespace);
        let command = parts.next().unwrap_or("").to_string();
        let rest = parts.next().unwrap_or("").trim().to_string();
        let args = rest.split_whitespace().map(String::from).collect();

        Some(Self {
            command,
            rest,
            args,
            raw: line.to_string(),
        })
    }

    pub fn arg(&self, idx: usize) -> Option<&str> {
        self.args.get(idx).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_command_and_arguments() {
        let statement = Statement::parse("  set  name   some value ").unwrap();
        assert_eq!(statement.command, "set");
        assert_eq!(statement.rest, "name   some value");
        assert_eq!(statement.args, vec!["name", "some", "value"]);
        assert_eq!(statement.arg(0), Some("name"));
        assert_eq!(statement.arg(3), None);
    }

    #[test]
    fn command_without_arguments() {
        let statement = Statement::parse("quit").unwrap();
        assert_eq!(statement.command, "quit");
        assert!(statement.rest.is_empty());
        assert!(statement.args.is_empty());
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert!(Statement::parse("").is_none());
        assert!(Statement::parse("   ").is_none());
        assert!(Statement::parse("# note").is_none());
    }
}
