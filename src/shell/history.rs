use super::{Outcome, ReplHost, SetRegistration, ShellError, Statement};
use crate::commands::{CommandSet, CommandSetType, CommandTable};
use crate::error::CommandResult;

// Listed so `sets` and `load` know about it; discovery skips it.
inventory::submit! { SetRegistration(CommandSetType::with_arguments::<HistoryCommands>("history")) }

/// `history [n]`: print the last entries of the input history.
pub struct HistoryCommands {
    page: usize,
    table: CommandTable<Self, ReplHost>,
}

impl HistoryCommands {
    pub fn new(page: usize) -> Self {
        Self {
            page,
            table: CommandTable::new()
                .command("history", Self::history)
                .help("history", |set, _| {
                    Ok(Outcome::Text(format!(
                        "history [n]\nShow the last n inputs (default {}).",
                        set.page
                    )))
                }),
        }
    }

    fn history(&self, host: &mut ReplHost, statement: &Statement) -> CommandResult<Outcome> {
        let count = match statement.arg(0) {
            Some(n) => n.parse::<usize>().map_err(|_| ShellError::Usage("history [n]"))?,
            None => self.page,
        };

        let entries = host.history();
        // The last entry is this `history` call.
        let end = entries.len().saturating_sub(1);
        let start = end.saturating_sub(count);
        let lines: Vec<String> = entries
            .range(start..end)
            .enumerate()
            .map(|(i, line)| format!("{:>4}  {}", start + i + 1, line))
            .collect();
        Ok(Outcome::Text(lines.join("\n")))
    }
}

impl CommandSet<ReplHost> for HistoryCommands {
    const DEFAULT_CATEGORY: &'static str = "History";

    fn commands(&self) -> &CommandTable<Self, ReplHost> {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::shell::{Outcome, bootstrap};

    #[test]
    fn shows_recent_entries_without_itself() {
        let (mut host, _) = bootstrap(&Config::default(), true);
        host.execute("echo one").unwrap();
        host.execute("echo two").unwrap();
        host.execute("echo three").unwrap();

        assert_eq!(
            host.execute("history 2").unwrap(),
            Outcome::Text("   2  echo two\n   3  echo three".into())
        );
    }

    #[test]
    fn rejects_non_numeric_count() {
        let (mut host, _) = bootstrap(&Config::default(), true);
        let err = host.execute("history lots").unwrap_err();
        assert_eq!(err.to_string(), "usage: history [n]");
    }
}
