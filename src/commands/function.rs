//! Commands declared as free-standing functions.
//!
//! Function commands are declared once per process, usually from static
//! [`FunctionItem`]s collected at startup. A declaration is inert: nothing is
//! invocable until the registry installs it on a host.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::binding::CommandHost;
use super::descriptor::{CommandDescriptor, CompleteFn, CompletionRequest, HelpFn};
use crate::error::{CommandResult, RegistryError};

/// Command function: `(host, statement)`.
pub type FnCommand<H> =
    fn(&mut H, &<H as CommandHost>::Statement) -> CommandResult<<H as CommandHost>::Output>;

/// Help function for a function command.
pub type FnHelp<H> = fn(&mut H) -> CommandResult<<H as CommandHost>::Output>;

/// Completion function for a function command.
pub type FnComplete<H> = fn(&H, &CompletionRequest<'_>) -> CommandResult<Vec<String>>;

/// What a [`FunctionItem`] provides for its command.
pub enum FunctionKind<H: CommandHost> {
    Command {
        handler: FnCommand<H>,
        category: Option<&'static str>,
    },
    Help(FnHelp<H>),
    Complete(FnComplete<H>),
}

/// One statically declared function, identified by its scope and command name.
///
/// Help and completion items attach to the command item of the same name in
/// the same scope.
pub struct FunctionItem<H: CommandHost> {
    pub scope: &'static str,
    pub name: &'static str,
    pub kind: FunctionKind<H>,
}

impl<H: CommandHost> FunctionItem<H> {
    pub const fn command(scope: &'static str, name: &'static str, handler: FnCommand<H>) -> Self {
        Self {
            scope,
            name,
            kind: FunctionKind::Command {
                handler,
                category: None,
            },
        }
    }

    pub const fn command_in(
        scope: &'static str,
        name: &'static str,
        category: &'static str,
        handler: FnCommand<H>,
    ) -> Self {
        Self {
            scope,
            name,
            kind: FunctionKind::Command {
                handler,
                category: Some(category),
            },
        }
    }

    pub const fn help(scope: &'static str, name: &'static str, handler: FnHelp<H>) -> Self {
        Self {
            scope,
            name,
            kind: FunctionKind::Help(handler),
        }
    }

    pub const fn complete(scope: &'static str, name: &'static str, handler: FnComplete<H>) -> Self {
        Self {
            scope,
            name,
            kind: FunctionKind::Complete(handler),
        }
    }
}

/// Process-wide table of declared function commands.
pub struct FunctionRegistry<H: CommandHost> {
    declared: RwLock<BTreeMap<String, Arc<CommandDescriptor<H>>>>,
}

impl<H: CommandHost> FunctionRegistry<H> {
    pub fn new() -> Self {
        Self {
            declared: RwLock::new(BTreeMap::new()),
        }
    }

    /// Declare every command item, attaching help and completion siblings.
    ///
    /// A duplicate declaration is logged and dropped; the first one wins.
    pub fn from_items<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a FunctionItem<H>>,
    {
        let registry = Self::new();
        let items: Vec<_> = items.into_iter().collect();

        for item in &items {
            let FunctionKind::Command { handler, category } = item.kind else {
                continue;
            };
            let (help, completer) = resolve_siblings(item.scope, item.name, &items);

            let mut descriptor = CommandDescriptor::new(item.name, handler)
                .with_help_fn(help)
                .with_completer_fn(completer);
            if let Some(category) = category {
                descriptor = descriptor.with_category(category);
            }

            if let Err(err) = registry.insert(descriptor) {
                tracing::error!(scope = item.scope, "{err}");
            }
        }

        for item in &items {
            if matches!(item.kind, FunctionKind::Command { .. }) {
                continue;
            }
            let has_command = items.iter().any(|other| {
                other.scope == item.scope
                    && other.name == item.name
                    && matches!(other.kind, FunctionKind::Command { .. })
            });
            if !has_command {
                tracing::warn!(
                    scope = item.scope,
                    command = item.name,
                    "help or completion declared without a command"
                );
            }
        }

        registry
    }

    /// Declare a function command.
    pub fn declare<F>(
        &self,
        name: &str,
        handler: F,
        help: Option<HelpFn<H>>,
        completer: Option<CompleteFn<H>>,
        category: Option<&str>,
    ) -> Result<Arc<CommandDescriptor<H>>, RegistryError>
    where
        F: Fn(&mut H, &H::Statement) -> CommandResult<H::Output> + Send + Sync + 'static,
    {
        let descriptor = CommandDescriptor::new(name, handler)
            .with_help_fn(help)
            .with_completer_fn(completer)
            .with_category(category.unwrap_or_default());
        self.insert(descriptor)
    }

    /// Declare a prebuilt descriptor.
    pub fn insert(
        &self,
        descriptor: CommandDescriptor<H>,
    ) -> Result<Arc<CommandDescriptor<H>>, RegistryError> {
        let mut declared = self.declared.write();
        if declared.contains_key(descriptor.name()) {
            return Err(RegistryError::duplicate(descriptor.name(), "function command"));
        }

        let descriptor = Arc::new(descriptor);
        declared.insert(descriptor.name().to_string(), Arc::clone(&descriptor));
        tracing::debug!(command = descriptor.name(), "declared function command");
        Ok(descriptor)
    }

    pub fn get(&self, name: &str) -> Option<Arc<CommandDescriptor<H>>> {
        self.declared.read().get(name).cloned()
    }

    /// Declared commands sorted by name.
    pub fn descriptors(&self) -> Vec<Arc<CommandDescriptor<H>>> {
        self.declared.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.declared.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.declared.read().is_empty()
    }
}

impl<H: CommandHost> Default for FunctionRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the help and completion functions declared next to `name` in `scope`.
pub fn resolve_siblings<H: CommandHost>(
    scope: &str,
    name: &str,
    items: &[&FunctionItem<H>],
) -> (Option<HelpFn<H>>, Option<CompleteFn<H>>) {
    let mut help: Option<HelpFn<H>> = None;
    let mut completer: Option<CompleteFn<H>> = None;

    for item in items.iter().filter(|item| item.scope == scope && item.name == name) {
        match item.kind {
            FunctionKind::Help(f) if help.is_none() => help = Some(Arc::new(f)),
            FunctionKind::Complete(f) if completer.is_none() => completer = Some(Arc::new(f)),
            _ => {}
        }
        if help.is_some() && completer.is_some() {
            break;
        }
    }

    (help, completer)
}
