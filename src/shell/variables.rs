use super::{Outcome, ReplHost, SetRegistration, ShellError, Statement};
use crate::commands::{CommandSet, CommandSetType, CommandTable, CompletionRequest};
use crate::error::CommandResult;

inventory::submit! { SetRegistration(CommandSetType::of::<VariableCommands>("variables")) }

/// Shell variables: `set`, `get`, `unset` and `vars`.
pub struct VariableCommands {
    table: CommandTable<Self, ReplHost>,
}

impl VariableCommands {
    pub fn new() -> Self {
        Self {
            table: CommandTable::new()
                .command("set", Self::set)
                .help("set", |_, _| {
                    Ok(Outcome::Text("set NAME VALUE\nAssign VALUE to the variable NAME.".into()))
                })
                .command("get", Self::get)
                .help("get", |_, _| {
                    Ok(Outcome::Text("get NAME\nPrint the value of NAME.".into()))
                })
                .complete("get", Self::complete_name)
                .command("unset", Self::unset)
                .complete("unset", Self::complete_name)
                .command("vars", Self::vars)
                .category("vars", "Debug"),
        }
    }

    fn set(&self, host: &mut ReplHost, statement: &Statement) -> CommandResult<Outcome> {
        let (name, value) = statement
            .rest
            .split_once(char::is_whitespace)
            .ok_or(ShellError::Usage("set NAME VALUE"))?;
        host.variables
            .insert(name.to_string(), value.trim().to_string());
        Ok(Outcome::Silent)
    }

    fn get(&self, host: &mut ReplHost, statement: &Statement) -> CommandResult<Outcome> {
        let name = statement.arg(0).ok_or(ShellError::Usage("get NAME"))?;
        let value = host
            .variables
            .get(name)
            .ok_or_else(|| ShellError::UnknownVariable(name.to_string()))?;
        Ok(Outcome::Text(value.clone()))
    }

    fn unset(&self, host: &mut ReplHost, statement: &Statement) -> CommandResult<Outcome> {
        let name = statement.arg(0).ok_or(ShellError::Usage("unset NAME"))?;
        host.variables
            .remove(name)
            .ok_or_else(|| ShellError::UnknownVariable(name.to_string()))?;
        Ok(Outcome::Silent)
    }

    fn vars(&self, host: &mut ReplHost, _statement: &Statement) -> CommandResult<Outcome> {
        let lines: Vec<String> = host
            .variables
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        Ok(Outcome::Text(lines.join("\n")))
    }

    fn complete_name(
        &self,
        host: &ReplHost,
        request: &CompletionRequest<'_>,
    ) -> CommandResult<Vec<String>> {
        Ok(host
            .variables
            .keys()
            .filter(|name| name.starts_with(request.text))
            .cloned()
            .collect())
    }
}

impl Default for VariableCommands {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandSet<ReplHost> for VariableCommands {
    const DEFAULT_CATEGORY: &'static str = "Variables";

    fn commands(&self) -> &CommandTable<Self, ReplHost> {
        &self.table
    }

    fn on_unregistered(&self, host: &mut ReplHost) {
        tracing::debug!(count = host.variables.len(), "variable commands unloaded");
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::shell::{Outcome, ShellError, bootstrap};

    #[test]
    fn set_get_unset() {
        let (mut host, _) = bootstrap(&Config::default(), true);

        assert_eq!(host.execute("set greeting hello there").unwrap(), Outcome::Silent);
        assert_eq!(
            host.execute("get greeting").unwrap(),
            Outcome::Text("hello there".into())
        );

        host.execute("unset greeting").unwrap();
        let err = host.execute("get greeting").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ShellError>(),
            Some(ShellError::UnknownVariable(name)) if name == "greeting"
        ));
    }

    #[test]
    fn set_needs_a_value() {
        let (mut host, _) = bootstrap(&Config::default(), true);
        let err = host.execute("set lonely").unwrap_err();
        assert_eq!(err.to_string(), "usage: set NAME VALUE");
    }

    #[test]
    fn vars_lists_sorted_assignments() {
        let (mut host, _) = bootstrap(&Config::default(), true);
        host.execute("set b 2").unwrap();
        host.execute("set a 1").unwrap();

        assert_eq!(host.execute("vars").unwrap(), Outcome::Text("a=1\nb=2".into()));
    }

    #[test]
    fn variables_survive_unload() {
        let (mut host, _) = bootstrap(&Config::default(), true);
        host.execute("set kept yes").unwrap();
        host.execute("unload variables").unwrap();
        host.execute("load variables").unwrap();

        assert_eq!(host.execute("get kept").unwrap(), Outcome::Text("yes".into()));
    }
}
