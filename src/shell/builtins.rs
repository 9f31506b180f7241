//! Commands every shell starts with.

use super::{Outcome, ReplHost, SetRegistration, ShellError, Statement};
use crate::commands::{
    CommandHost, CommandSet, CommandSetType, CommandTable, CompletionRequest, UNCATEGORIZED,
    format_listing,
};
use crate::error::CommandResult;

inventory::submit! { SetRegistration(CommandSetType::of::<CoreCommands>("core")) }
inventory::submit! { SetRegistration(CommandSetType::of::<LoaderCommands>("loader")) }

/// `help` and `quit`.
pub struct CoreCommands {
    table: CommandTable<Self, ReplHost>,
}

impl CoreCommands {
    pub fn new() -> Self {
        Self {
            table: CommandTable::new()
                .command("help", Self::help)
                .help("help", Self::help_help)
                .complete("help", Self::complete_help)
                .command("commands", Self::list_commands)
                .help("commands", |_, _| {
                    Ok(Outcome::Text(
                        "commands\nList every command with its category and owning set.".into(),
                    ))
                })
                .command("quit", Self::quit)
                .help("quit", |_, _| Ok(Outcome::Text("Exit the shell.".into()))),
        }
    }

    fn help(&self, host: &mut ReplHost, statement: &Statement) -> CommandResult<Outcome> {
        let Some(topic) = statement.arg(0) else {
            let listing = host.registry().list();
            let mut text = format_listing(&listing);
            text.push_str("Commands marked * have no help. Type 'help <command>' for details.");
            return Ok(Outcome::Text(text));
        };

        if let Some(descriptor) = host.namespace().help(topic) {
            if let Some(result) = descriptor.help(host) {
                return result;
            }
        }

        if host.namespace().contains(topic) {
            Ok(Outcome::Text(format!("No help on '{topic}'.")))
        } else {
            Err(ShellError::UnknownCommand {
                name: topic.to_string(),
                suggestion: host.suggest(topic),
            }
            .into())
        }
    }

    fn help_help(&self, _host: &mut ReplHost) -> CommandResult<Outcome> {
        Ok(Outcome::Text(
            "help [command]\nList commands by category, or show help for one command.".into(),
        ))
    }

    fn complete_help(
        &self,
        host: &ReplHost,
        request: &CompletionRequest<'_>,
    ) -> CommandResult<Vec<String>> {
        Ok(host
            .namespace()
            .names()
            .filter(|name| name.starts_with(request.text))
            .map(String::from)
            .collect())
    }

    fn list_commands(&self, host: &mut ReplHost, _statement: &Statement) -> CommandResult<Outcome> {
        let listing = host.registry().list();
        let width = listing
            .iter()
            .map(|entry| entry.name.chars().count())
            .max()
            .unwrap_or(0);

        let lines: Vec<String> = listing
            .iter()
            .map(|entry| {
                let category = if entry.category.is_empty() {
                    UNCATEGORIZED
                } else {
                    entry.category.as_str()
                };
                let owner = entry.set.unwrap_or("function");
                format!("{:width$}  {:16} {}", entry.name, category, owner)
            })
            .collect();
        Ok(Outcome::Text(lines.join("\n")))
    }

    fn quit(&self, _host: &mut ReplHost, _statement: &Statement) -> CommandResult<Outcome> {
        Ok(Outcome::Quit)
    }
}

impl Default for CoreCommands {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandSet<ReplHost> for CoreCommands {
    const DEFAULT_CATEGORY: &'static str = "Core";

    fn commands(&self) -> &CommandTable<Self, ReplHost> {
        &self.table
    }
}

/// Load and unload command sets at runtime.
pub struct LoaderCommands {
    table: CommandTable<Self, ReplHost>,
}

impl LoaderCommands {
    pub fn new() -> Self {
        Self {
            table: CommandTable::new()
                .command("load", Self::load)
                .help("load", |_, _| {
                    Ok(Outcome::Text("load <set>\nInstall the commands of a command set.".into()))
                })
                .complete("load", Self::complete_available)
                .command("unload", Self::unload)
                .help("unload", |_, _| {
                    Ok(Outcome::Text("unload <set>\nRemove the commands of a command set.".into()))
                })
                .complete("unload", Self::complete_loaded)
                .command("sets", Self::sets),
        }
    }

    fn find_type(host: &ReplHost, name: &str) -> Result<CommandSetType<ReplHost>, ShellError> {
        host.command_set_types()
            .into_iter()
            .find(|ty| ty.name() == name)
            .ok_or_else(|| ShellError::UnknownSet(name.to_string()))
    }

    fn load(&self, host: &mut ReplHost, statement: &Statement) -> CommandResult<Outcome> {
        let name = statement.arg(0).ok_or(ShellError::Usage("load <set>"))?;
        let ty = Self::find_type(host, name)?;
        let bound = ty.construct()?;

        let registry = host.registry();
        let handle = registry.register_bound(host, bound)?;
        let commands = registry.commands_of(&handle);
        host.hide_disabled(&commands);

        let visible: Vec<&str> = commands
            .iter()
            .map(String::as_str)
            .filter(|command| registry.is_enabled(command))
            .collect();
        Ok(Outcome::Text(format!("Loaded {}: {}", name, visible.join(", "))))
    }

    fn unload(&self, host: &mut ReplHost, statement: &Statement) -> CommandResult<Outcome> {
        let name = statement.arg(0).ok_or(ShellError::Usage("unload <set>"))?;
        let ty = Self::find_type(host, name)?;

        let registry = host.registry();
        let handles = registry.instances_of(ty.type_id());
        if handles.is_empty() {
            return Err(ShellError::NotLoaded(name.to_string()).into());
        }
        for handle in &handles {
            registry.unregister_handle(host, handle)?;
        }
        Ok(Outcome::Text(format!("Unloaded {name}")))
    }

    fn sets(&self, host: &mut ReplHost, _statement: &Statement) -> CommandResult<Outcome> {
        let registry = host.registry();
        let mut types = host.command_set_types();
        types.sort_by_key(|ty| ty.name());

        let lines: Vec<String> = types
            .iter()
            .map(|ty| {
                let status = if !registry.instances_of(ty.type_id()).is_empty() {
                    "loaded"
                } else if ty.is_discoverable() {
                    "available"
                } else {
                    "needs arguments"
                };
                format!("{:12} {}", ty.name(), status)
            })
            .collect();
        Ok(Outcome::Text(lines.join("\n")))
    }

    fn complete_available(
        &self,
        host: &ReplHost,
        request: &CompletionRequest<'_>,
    ) -> CommandResult<Vec<String>> {
        let registry = host.registry();
        Ok(host
            .command_set_types()
            .into_iter()
            .filter(|ty| registry.instances_of(ty.type_id()).is_empty())
            .map(|ty| ty.name())
            .filter(|name| name.starts_with(request.text))
            .map(String::from)
            .collect())
    }

    fn complete_loaded(
        &self,
        host: &ReplHost,
        request: &CompletionRequest<'_>,
    ) -> CommandResult<Vec<String>> {
        let registry = host.registry();
        Ok(host
            .command_set_types()
            .into_iter()
            .filter(|ty| !registry.instances_of(ty.type_id()).is_empty())
            .map(|ty| ty.name())
            .filter(|name| name.starts_with(request.text))
            .map(String::from)
            .collect())
    }
}

impl Default for LoaderCommands {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandSet<ReplHost> for LoaderCommands {
    const DEFAULT_CATEGORY: &'static str = "Command Loading";

    fn commands(&self) -> &CommandTable<Self, ReplHost> {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::shell::{Outcome, bootstrap};

    fn run(line: &str) -> String {
        let (mut host, _) = bootstrap(&Config::default(), true);
        match host.execute(line).unwrap() {
            Outcome::Text(text) => text,
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn help_lists_categories() {
        let text = run("help");

        assert!(text.starts_with("Command Loading\n"), "{text}");
        assert!(text.contains("Core\n===="));
        assert!(text.contains("Variables\n"));
        assert!(text.contains("sets  *"));
    }

    #[test]
    fn help_for_one_command() {
        assert_eq!(run("help quit"), "Exit the shell.");
        assert_eq!(run("help sets"), "No help on 'sets'.");
    }

    #[test]
    fn help_for_unknown_command_fails() {
        let (mut host, _) = bootstrap(&Config::default(), true);
        assert!(host.execute("help nope").is_err());
    }

    #[test]
    fn commands_shows_owner_and_category() {
        let text = run("commands");
        let lines: Vec<&str> = text.lines().collect();

        let greet = lines.iter().find(|l| l.starts_with("greet ")).unwrap();
        assert!(greet.contains("Uncategorized"));
        assert!(greet.ends_with("function"));

        let vars = lines.iter().find(|l| l.starts_with("vars ")).unwrap();
        assert!(vars.contains("Debug"));
        assert!(vars.ends_with("variables"));
    }

    #[test]
    fn commands_pads_non_ascii_names_by_chars() {
        use std::sync::Arc;

        use crate::commands::CommandDescriptor;
        use crate::shell::Statement;

        let (mut host, _) = bootstrap(&Config::default(), true);
        let registry = host.registry();
        let cafe = CommandDescriptor::new("café", |_: &mut crate::shell::ReplHost, _: &Statement| {
            Ok(Outcome::Silent)
        });
        registry
            .register_function_command(&mut host, Arc::new(cafe))
            .unwrap();

        let Outcome::Text(text) = host.execute("commands").unwrap() else {
            panic!("expected text");
        };
        let line = text.lines().find(|l| l.starts_with("café")).unwrap();
        let greet = text.lines().find(|l| l.starts_with("greet")).unwrap();

        let column = |l: &str| l.chars().position(|c| c == 'U');
        assert_eq!(column(line), column(greet));
    }

    #[test]
    fn quit_stops_the_loop() {
        let (mut host, _) = bootstrap(&Config::default(), true);
        assert_eq!(host.execute("quit").unwrap(), Outcome::Quit);
    }

    #[test]
    fn sets_reports_status() {
        let (mut host, _) = bootstrap(&Config::default(), true);
        host.execute("unload variables").unwrap();

        let Outcome::Text(text) = host.execute("sets").unwrap() else {
            panic!("expected text");
        };

        assert!(text.contains("core         loaded"));
        assert!(text.contains("history      loaded"));
        assert!(text.contains("variables    available"));
    }

    #[test]
    fn load_usage_and_unknown_sets() {
        let (mut host, _) = bootstrap(&Config::default(), true);

        assert_eq!(host.execute("load").unwrap_err().to_string(), "usage: load <set>");
        assert_eq!(
            host.execute("load bogus").unwrap_err().to_string(),
            "No command set named 'bogus'"
        );
    }
}
