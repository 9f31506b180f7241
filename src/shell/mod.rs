//! Interactive shell built on the command registry.
//!
//! # Architecture
//!
//! - `statement`: input line parsing
//! - `builtins`: core and loading commands
//! - `variables`: shell variables
//! - `history`: input history, registered manually since it takes arguments
//! - `functions`: function commands
//! - `completer`: reedline tab completion
//!
//! Command sets and function commands register themselves with
//! `inventory::submit!` and are picked up by discovery at startup.

mod builtins;
mod completer;
mod functions;
mod history;
mod statement;
mod variables;

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, LazyLock};

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use thiserror::Error;

use crate::commands::{
    BoundSet, CommandDescriptor, CommandHost, CommandSetType, CompletionRequest, DiscoveryReport,
    FunctionItem, FunctionRegistry, Namespace, Registry,
};
use crate::config::Config;
use crate::error::CommandResult;

pub use builtins::{CoreCommands, LoaderCommands};
pub use completer::ShellCompleter;
pub use history::HistoryCommands;
pub use statement::Statement;
pub use variables::VariableCommands;

/// Discoverable command set type.
pub struct SetRegistration(pub CommandSetType<ReplHost>);
inventory::collect!(SetRegistration);

/// Statically declared function command, help or completer.
pub struct FunctionRegistration(pub FunctionItem<ReplHost>);
inventory::collect!(FunctionRegistration);

static FUNCTIONS: LazyLock<FunctionRegistry<ReplHost>> = LazyLock::new(|| {
    FunctionRegistry::from_items(inventory::iter::<FunctionRegistration>.into_iter().map(|r| &r.0))
});

/// Number of history entries `history` prints without an argument.
pub const HISTORY_PAGE: usize = 20;

/// Result of running one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Text(String),
    Silent,
    Quit,
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("Unknown command '{name}'.{}", suggestion_suffix(.suggestion))]
    UnknownCommand {
        name: String,
        suggestion: Option<String>,
    },
    #[error("No command set named '{0}'")]
    UnknownSet(String),
    #[error("Command set '{0}' is not loaded")]
    NotLoaded(String),
    #[error("Variable '{0}' is not set")]
    UnknownVariable(String),
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" Did you mean '{name}'?"),
        None => " Type 'help' for commands.".to_string(),
    }
}

/// The interpreter commands are installed on.
pub struct ReplHost {
    registry: Arc<Registry<ReplHost>>,
    namespace: Namespace<ReplHost>,
    pub variables: BTreeMap<String, String>,
    history: VecDeque<String>,
    history_limit: usize,
    /// Categories kept hidden, including for sets loaded later.
    disabled_categories: Vec<String>,
}

impl ReplHost {
    pub fn new(history_limit: usize) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            namespace: Namespace::new(),
            variables: BTreeMap::new(),
            history: VecDeque::new(),
            history_limit,
            disabled_categories: Vec::new(),
        }
    }

    pub fn registry(&self) -> Arc<Registry<ReplHost>> {
        Arc::clone(&self.registry)
    }

    pub fn namespace(&self) -> &Namespace<ReplHost> {
        &self.namespace
    }

    pub fn history(&self) -> &VecDeque<String> {
        &self.history
    }

    /// Hide every command in `category`, now and whenever a set is loaded.
    pub fn disable_category(&mut self, category: &str) -> usize {
        if !self.disabled_categories.iter().any(|c| c == category) {
            self.disabled_categories.push(category.to_string());
        }
        let registry = self.registry();
        registry.disable_category(self, category)
    }

    /// Disable those of `commands` that fall in a disabled category.
    pub fn hide_disabled(&mut self, commands: &[String]) -> usize {
        let registry = self.registry();
        let mut hidden = 0;
        for name in commands {
            let Some(descriptor) = registry.lookup(name) else {
                continue;
            };
            if !self.disabled_categories.iter().any(|c| c == descriptor.category()) {
                continue;
            }
            if registry.disable_command(self, name).is_ok() {
                hidden += 1;
            }
        }
        hidden
    }

    /// Run one input line.
    pub fn execute(&mut self, line: &str) -> CommandResult<Outcome> {
        let Some(statement) = Statement::parse(line) else {
            return Ok(Outcome::Silent);
        };
        self.record(line.trim());

        let Some(descriptor) = self.namespace.command(&statement.command) else {
            return Err(ShellError::UnknownCommand {
                suggestion: self.suggest(&statement.command),
                name: statement.command,
            }
            .into());
        };

        tracing::debug!(command = descriptor.name(), "dispatching");
        descriptor.resolve(self, &statement)
    }

    /// Candidates for the word under the cursor.
    pub fn complete(&self, request: &CompletionRequest<'_>) -> Vec<String> {
        if request.is_command_word() {
            return self
                .namespace
                .names()
                .filter(|name| name.starts_with(request.text))
                .map(String::from)
                .collect();
        }

        let command = request.line.split_whitespace().next().unwrap_or("");
        let Some(descriptor) = self.namespace.completer(command) else {
            return Vec::new();
        };

        match descriptor.complete(self, request) {
            Some(Ok(candidates)) => candidates,
            Some(Err(err)) => {
                tracing::debug!(command, "completion failed: {err}");
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Closest installed command name to `name`.
    pub fn suggest(&self, name: &str) -> Option<String> {
        let matcher = SkimMatcherV2::default();
        self.namespace
            .names()
            .filter_map(|candidate| {
                matcher
                    .fuzzy_match(candidate, name)
                    .map(|score| (score, candidate))
            })
            .max_by_key(|(score, _)| *score)
            .map(|(_, candidate)| candidate.to_string())
    }

    fn record(&mut self, line: &str) {
        if self.history_limit == 0 {
            return;
        }
        if self.history.len() >= self.history_limit {
            self.history.pop_front();
        }
        self.history.push_back(line.to_string());
    }
}

impl CommandHost for ReplHost {
    type Statement = Statement;
    type Output = Outcome;

    fn install_command(&mut self, descriptor: &Arc<CommandDescriptor<Self>>) {
        self.namespace.install(descriptor);
    }

    fn uninstall_command(&mut self, name: &str) {
        self.namespace.uninstall(name);
    }

    fn command_set_types(&self) -> Vec<CommandSetType<Self>> {
        inventory::iter::<SetRegistration>
            .into_iter()
            .map(|reg| reg.0.clone())
            .collect()
    }

    fn function_commands(&self) -> Option<&FunctionRegistry<Self>> {
        Some(&*FUNCTIONS)
    }
}

/// Build a host with the always-present sets registered, then run discovery.
pub fn bootstrap(config: &Config, auto_load: bool) -> (ReplHost, DiscoveryReport) {
    let mut host = ReplHost::new(config.history_limit);
    let registry = host.registry();

    let preset = [
        BoundSet::bind_named(Arc::new(CoreCommands::new()), "core"),
        BoundSet::bind_named(Arc::new(LoaderCommands::new()), "loader"),
        BoundSet::bind_named(Arc::new(HistoryCommands::new(HISTORY_PAGE)), "history"),
    ];
    for bound in preset {
        if let Err(err) = registry.register_bound(&mut host, bound) {
            tracing::error!("{err}");
        }
    }

    let report = if auto_load {
        registry.discover_and_install(&mut host)
    } else {
        DiscoveryReport::default()
    };

    for category in &config.disabled_categories {
        let hidden = host.disable_category(category);
        tracing::debug!(category = category.as_str(), hidden, "disabled category from config");
    }

    (host, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;

    fn host() -> ReplHost {
        bootstrap(&Config::default(), true).0
    }

    fn text(outcome: Outcome) -> String {
        match outcome {
            Outcome::Text(text) => text,
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn bootstrap_discovers_every_set_and_function() {
        let (host, report) = bootstrap(&Config::default(), true);

        assert!(report.is_clean(), "{:?}", report.conflicts);
        let installed: Vec<_> = report.installed.iter().map(|h| h.name()).collect();
        assert_eq!(installed, vec!["variables"]);
        let mut functions = report.functions.clone();
        functions.sort();
        assert_eq!(functions, vec!["echo", "greet", "version"]);
        for name in ["help", "quit", "load", "unload", "sets", "history", "set", "get", "echo"] {
            assert!(host.namespace().contains(name), "{name} missing");
        }
    }

    #[test]
    fn no_autoload_keeps_only_preset_sets() {
        let (host, report) = bootstrap(&Config::default(), false);

        assert!(report.installed.is_empty());
        assert!(host.namespace().contains("help"));
        assert!(host.namespace().contains("history"));
        assert!(!host.namespace().contains("set"));
        assert!(!host.namespace().contains("echo"));
    }

    #[test]
    fn disabled_categories_from_config_are_hidden() {
        let config = Config {
            disabled_categories: vec!["Variables".into()],
            ..Config::default()
        };
        let (host, _) = bootstrap(&config, true);

        assert!(!host.namespace().contains("set"));
        assert!(host.namespace().contains("vars"));
    }

    #[test]
    fn disabled_categories_stay_hidden_after_reload() {
        let config = Config {
            disabled_categories: vec!["Variables".into()],
            ..Config::default()
        };
        let (mut host, _) = bootstrap(&config, true);

        text(host.execute("unload variables").unwrap());
        let loaded = text(host.execute("load variables").unwrap());

        assert_eq!(loaded, "Loaded variables: vars");
        assert!(!host.namespace().contains("set"));
        assert!(!host.namespace().contains("get"));
        assert!(host.namespace().contains("vars"));
        assert!(host.registry().is_taken("set"));
    }

    #[test]
    fn unknown_command_suggests_closest_name() {
        let mut host = host();
        let err = host.execute("ech hi").unwrap_err();

        assert_eq!(err.to_string(), "Unknown command 'ech'. Did you mean 'echo'?");
    }

    #[test]
    fn blank_lines_do_nothing() {
        let mut host = host();
        assert_eq!(host.execute("   ").unwrap(), Outcome::Silent);
        assert!(host.history().is_empty());
    }

    #[test]
    fn load_and_unload_round_trip() {
        let mut host = host();
        let before: Vec<String> = host.namespace().names().map(String::from).collect();

        text(host.execute("unload variables").unwrap());
        assert!(!host.namespace().contains("set"));
        assert!(matches!(
            host.execute("unload variables").unwrap_err().downcast_ref::<ShellError>(),
            Some(ShellError::NotLoaded(_))
        ));

        text(host.execute("load variables").unwrap());
        let after: Vec<String> = host.namespace().names().map(String::from).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn loading_a_set_that_needs_arguments_fails() {
        let mut host = host();
        text(host.execute("unload history").unwrap());

        let err = host.execute("load history").unwrap_err();
        assert!(err.to_string().contains("requires arguments"), "{err}");
        assert!(!host.namespace().contains("history"));
    }

    #[test]
    fn loader_cannot_unload_itself() {
        let mut host = host();
        let err = host.execute("unload loader").unwrap_err();

        assert_eq!(
            err.downcast_ref::<RegistryError>(),
            Some(&RegistryError::InFlight("loader".into()))
        );
        assert!(host.namespace().contains("unload"));
    }

    #[test]
    fn completes_command_names_then_arguments() {
        let mut host = host();
        host.execute("set colour blue").unwrap();

        let names = host.complete(&CompletionRequest::at("lo", 2));
        assert_eq!(names, vec!["load"]);

        let vars = host.complete(&CompletionRequest::at("get co", 6));
        assert_eq!(vars, vec!["colour"]);

        let sets = host.complete(&CompletionRequest::at("unload var", 10));
        assert_eq!(sets, vec!["variables"]);

        assert!(host.complete(&CompletionRequest::at("quit x", 6)).is_empty());
    }

    #[test]
    fn history_is_capped() {
        let config = Config {
            history_limit: 2,
            ..Config::default()
        };
        let (mut host, _) = bootstrap(&config, true);
        host.execute("echo one").unwrap();
        host.execute("echo two").unwrap();
        host.execute("echo three").unwrap();

        assert_eq!(*host.history(), ["echo two", "echo three"]);
    }
}
