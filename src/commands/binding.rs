//! The seam between the registry and a host interpreter.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::descriptor::CommandDescriptor;
use super::function::FunctionRegistry;
use super::set::CommandSetType;

/// A host interpreter that commands are installed on and invoked against.
///
/// The registry never reaches into the host directly: it only calls
/// [`install_command`](Self::install_command) and
/// [`uninstall_command`](Self::uninstall_command). Hosts that just need a name
/// table can delegate both to a [`Namespace`].
pub trait CommandHost: Sized + 'static {
    /// Parsed input line handed to command handlers. Opaque to the registry.
    type Statement: ?Sized;
    /// Value produced by command and help handlers.
    type Output;

    /// Make `descriptor` invocable under its name.
    fn install_command(&mut self, descriptor: &Arc<CommandDescriptor<Self>>);

    /// Remove the command called `name`. Must be a no-op when it is absent.
    fn uninstall_command(&mut self, name: &str);

    /// Command set types this host can discover.
    fn command_set_types(&self) -> Vec<CommandSetType<Self>> {
        Vec::new()
    }

    /// Function commands declared for this host.
    fn function_commands(&self) -> Option<&FunctionRegistry<Self>> {
        None
    }
}

/// Host-side table of installed commands and their help/completion hooks.
pub struct Namespace<H: CommandHost> {
    commands: BTreeMap<String, Arc<CommandDescriptor<H>>>,
    helps: BTreeMap<String, Arc<CommandDescriptor<H>>>,
    completers: BTreeMap<String, Arc<CommandDescriptor<H>>>,
}

impl<H: CommandHost> Namespace<H> {
    pub fn new() -> Self {
        Self {
            commands: BTreeMap::new(),
            helps: BTreeMap::new(),
            completers: BTreeMap::new(),
        }
    }

    pub fn install(&mut self, descriptor: &Arc<CommandDescriptor<H>>) {
        let name = descriptor.name().to_string();
        if descriptor.has_help() {
            self.helps.insert(name.clone(), Arc::clone(descriptor));
        }
        if descriptor.has_completion() {
            self.completers.insert(name.clone(), Arc::clone(descriptor));
        }
        self.commands.insert(name, Arc::clone(descriptor));
    }

    pub fn uninstall(&mut self, name: &str) {
        self.commands.remove(name);
        self.helps.remove(name);
        self.completers.remove(name);
    }

    pub fn command(&self, name: &str) -> Option<Arc<CommandDescriptor<H>>> {
        self.commands.get(name).cloned()
    }

    pub fn help(&self, name: &str) -> Option<Arc<CommandDescriptor<H>>> {
        self.helps.get(name).cloned()
    }

    pub fn completer(&self, name: &str) -> Option<Arc<CommandDescriptor<H>>> {
        self.completers.get(name).cloned()
    }

    /// Installed command names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl<H: CommandHost> Default for Namespace<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TestHost;

    fn descriptor(name: &str) -> Arc<CommandDescriptor<TestHost>> {
        Arc::new(CommandDescriptor::new(name, |_, _| Ok(String::new())))
    }

    #[test]
    fn install_exposes_help_and_completion_only_when_present() {
        let mut ns = Namespace::<TestHost>::new();
        ns.install(&descriptor("plain"));
        ns.install(&Arc::new(
            CommandDescriptor::new("rich", |_, _| Ok(String::new()))
                .with_help(|_| Ok("help".into()))
                .with_completer(|_, _| Ok(Vec::new())),
        ));

        assert!(ns.command("plain").is_some());
        assert!(ns.help("plain").is_none());
        assert!(ns.completer("plain").is_none());
        assert!(ns.help("rich").is_some());
        assert!(ns.completer("rich").is_some());
        assert_eq!(ns.names().collect::<Vec<_>>(), vec!["plain", "rich"]);
    }

    #[test]
    fn uninstall_of_absent_name_is_a_no_op() {
        let mut ns = Namespace::<TestHost>::new();
        ns.install(&descriptor("kept"));

        ns.uninstall("missing");
        ns.uninstall("missing");

        assert_eq!(ns.len(), 1);
        assert!(ns.contains("kept"));
    }

    #[test]
    fn uninstall_removes_every_hook() {
        let mut ns = Namespace::<TestHost>::new();
        ns.install(&Arc::new(
            CommandDescriptor::new("rich", |_, _| Ok(String::new())).with_help(|_| Ok("h".into())),
        ));

        ns.uninstall("rich");

        assert!(ns.is_empty());
        assert!(ns.help("rich").is_none());
    }
}
