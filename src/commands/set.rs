//! Command sets: typed bundles of related commands.
//!
//! A command set lists its commands in a [`CommandTable`] built once in its
//! constructor. When the set is registered, every entry in the table becomes a
//! [`CommandDescriptor`] whose handler holds the instance weakly, so the
//! registry stays the only owner of the set.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use super::binding::CommandHost;
use super::descriptor::{CommandDescriptor, CommandFn, CompleteFn, CompletionRequest, HelpFn};
use crate::error::{CommandError, CommandResult, RegistryError};

/// Command method of a set: `(set, host, statement)`.
pub type SetCommandFn<S, H> =
    fn(&S, &mut H, &<H as CommandHost>::Statement) -> CommandResult<<H as CommandHost>::Output>;

/// Help method of a set.
pub type SetHelpFn<S, H> = fn(&S, &mut H) -> CommandResult<<H as CommandHost>::Output>;

/// Completion method of a set.
pub type SetCompleteFn<S, H> = fn(&S, &H, &CompletionRequest<'_>) -> CommandResult<Vec<String>>;

/// A group of related commands sharing a default category.
pub trait CommandSet<H: CommandHost>: Send + Sync + Sized + 'static {
    /// Category for commands without an explicit override.
    const DEFAULT_CATEGORY: &'static str = "";

    /// The set's command table.
    fn commands(&self) -> &CommandTable<Self, H>;

    /// Called once the set's commands are visible on the host.
    fn on_registered(&self, _host: &mut H) {}

    /// Called once the set's commands have been removed from the host.
    fn on_unregistered(&self, _host: &mut H) {}
}

/// Commands declared by a command set, keyed by command name.
///
/// Help handlers, completion handlers and category overrides are correlated
/// with commands by name; the order in which they are added does not matter.
pub struct CommandTable<S, H: CommandHost> {
    commands: Vec<(&'static str, SetCommandFn<S, H>)>,
    helps: HashMap<&'static str, SetHelpFn<S, H>>,
    completers: HashMap<&'static str, SetCompleteFn<S, H>>,
    categories: HashMap<&'static str, &'static str>,
}

impl<S, H: CommandHost> CommandTable<S, H> {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            helps: HashMap::new(),
            completers: HashMap::new(),
            categories: HashMap::new(),
        }
    }

    pub fn command(mut self, name: &'static str, handler: SetCommandFn<S, H>) -> Self {
        self.commands.push((name, handler));
        self
    }

    pub fn help(mut self, name: &'static str, handler: SetHelpFn<S, H>) -> Self {
        self.helps.insert(name, handler);
        self
    }

    pub fn complete(mut self, name: &'static str, handler: SetCompleteFn<S, H>) -> Self {
        self.completers.insert(name, handler);
        self
    }

    /// Override the category of one command.
    pub fn category(mut self, name: &'static str, category: &'static str) -> Self {
        self.categories.insert(name, category);
        self
    }

    /// Command names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.iter().map(|(name, _)| *name)
    }

    /// Category of `name`: its override, else `default`.
    pub fn category_for(&self, name: &str, default: &'static str) -> &'static str {
        self.categories.get(name).copied().unwrap_or(default)
    }

    fn orphans(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.helps
            .keys()
            .chain(self.completers.keys())
            .chain(self.categories.keys())
            .copied()
            .filter(|name| !self.commands.iter().any(|(cmd, _)| cmd == name))
    }
}

impl<S, H: CommandHost> Default for CommandTable<S, H> {
    fn default() -> Self {
        Self::new()
    }
}

static NEXT_SET_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a live command set instance.
///
/// Every bound instance gets a fresh id, so a handle kept after its set was
/// unregistered never matches a later instance.
#[derive(Clone)]
pub struct SetHandle {
    id: u64,
    key: usize,
    type_id: TypeId,
    name: &'static str,
}

impl SetHandle {
    pub(crate) fn of<S: 'static>(set: &Arc<S>, name: &'static str) -> Self {
        Self {
            id: NEXT_SET_ID.fetch_add(1, Ordering::Relaxed),
            key: instance_key(set),
            type_id: TypeId::of::<S>(),
            name,
        }
    }

    /// Short name of the set's type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Address of the instance; only meaningful while the set is live.
    pub(crate) fn key(&self) -> usize {
        self.key
    }
}

pub(crate) fn instance_key<S>(set: &Arc<S>) -> usize {
    Arc::as_ptr(set) as *const () as usize
}

impl PartialEq for SetHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SetHandle {}

impl fmt::Debug for SetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SetHandle({}#{})", self.name, self.id)
    }
}

/// Lifecycle hooks of a registered set, with the concrete type erased.
pub(crate) trait SetHooks<H>: Send + Sync {
    fn on_registered(&self, host: &mut H);
    fn on_unregistered(&self, host: &mut H);
}

impl<H: CommandHost, S: CommandSet<H>> SetHooks<H> for S {
    fn on_registered(&self, host: &mut H) {
        CommandSet::on_registered(self, host)
    }

    fn on_unregistered(&self, host: &mut H) {
        CommandSet::on_unregistered(self, host)
    }
}

/// A command set instance with its descriptors built and owner bound.
pub struct BoundSet<H: CommandHost> {
    pub(crate) handle: SetHandle,
    pub(crate) instance: Arc<dyn SetHooks<H>>,
    pub(crate) descriptors: Vec<CommandDescriptor<H>>,
    pub(crate) active: Arc<AtomicUsize>,
}

impl<H: CommandHost> BoundSet<H> {
    /// Bind every command in `set`'s table to the instance.
    pub fn bind<S: CommandSet<H>>(set: Arc<S>) -> Self {
        Self::bind_named(set, short_type_name::<S>())
    }

    /// Bind `set`, naming it `name` in listings and errors.
    pub fn bind_named<S: CommandSet<H>>(set: Arc<S>, name: &'static str) -> Self {
        let handle = SetHandle::of(&set, name);
        let active = Arc::new(AtomicUsize::new(0));
        let table = set.commands();

        for orphan in table.orphans() {
            tracing::warn!(set = name, command = orphan, "handler attached to an undeclared command");
        }

        let descriptors = table
            .commands
            .iter()
            .map(|&(command, handler)| {
                let weak = Arc::downgrade(&set);
                let counter = Arc::clone(&active);
                let bound: CommandFn<H> = Arc::new(
                    move |host: &mut H, statement: &H::Statement| -> CommandResult<H::Output> {
                        let (owner, _call) = enter(&weak, &counter, command)?;
                        handler(&owner, host, statement)
                    },
                );

                let help: Option<HelpFn<H>> = table.helps.get(command).map(|&help| {
                    let weak = Arc::downgrade(&set);
                    let counter = Arc::clone(&active);
                    Arc::new(move |host: &mut H| -> CommandResult<H::Output> {
                        let (owner, _call) = enter(&weak, &counter, command)?;
                        help(&owner, host)
                    }) as HelpFn<H>
                });

                let completer: Option<CompleteFn<H>> =
                    table.completers.get(command).map(|&complete| {
                        let weak = Arc::downgrade(&set);
                        let counter = Arc::clone(&active);
                        Arc::new(
                            move |host: &H,
                                  request: &CompletionRequest<'_>|
                                  -> CommandResult<Vec<String>> {
                                let (owner, _call) = enter(&weak, &counter, command)?;
                                complete(&owner, host, request)
                            },
                        ) as CompleteFn<H>
                    });

                CommandDescriptor::from_parts(command.to_string(), bound)
                    .with_category(table.category_for(command, S::DEFAULT_CATEGORY))
                    .with_help_fn(help)
                    .with_completer_fn(completer)
                    .with_owner(handle.clone())
            })
            .collect();

        Self {
            handle,
            instance: set,
            descriptors,
            active,
        }
    }

    pub fn handle(&self) -> &SetHandle {
        &self.handle
    }

    pub fn descriptors(&self) -> &[CommandDescriptor<H>] {
        &self.descriptors
    }
}

/// Marks one running call of a set's handler.
struct ActiveCall(Arc<AtomicUsize>);

impl Drop for ActiveCall {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn enter<S>(
    weak: &Weak<S>,
    counter: &Arc<AtomicUsize>,
    command: &str,
) -> Result<(Arc<S>, ActiveCall), CommandError> {
    let owner = weak
        .upgrade()
        .ok_or_else(|| RegistryError::OwnerDropped(command.to_string()))?;
    counter.fetch_add(1, Ordering::SeqCst);
    Ok((owner, ActiveCall(Arc::clone(counter))))
}

fn short_type_name<S>() -> &'static str {
    let full = std::any::type_name::<S>();
    full.rsplit("::").next().unwrap_or(full)
}

/// How discovery obtains an instance of a set type.
enum Constructor<H: CommandHost> {
    Default(fn(&'static str) -> CommandResult<BoundSet<H>>),
    RequiresArguments,
}

/// A command set type that can be discovered by the registry.
pub struct CommandSetType<H: CommandHost> {
    name: &'static str,
    type_id: fn() -> TypeId,
    constructor: Constructor<H>,
}

impl<H: CommandHost> CommandSetType<H> {
    /// A set type that discovery can build through `Default`.
    pub const fn of<S: CommandSet<H> + Default>(name: &'static str) -> Self {
        Self {
            name,
            type_id: TypeId::of::<S>,
            constructor: Constructor::Default(construct_default::<H, S>),
        }
    }

    /// A set type whose constructor can fail.
    pub const fn fallible<S: FallibleConstruct<H>>(name: &'static str) -> Self {
        Self {
            name,
            type_id: TypeId::of::<S>,
            constructor: Constructor::Default(construct_fallible::<H, S>),
        }
    }

    /// A set type that needs constructor arguments; discovery skips it.
    pub const fn with_arguments<S: CommandSet<H>>(name: &'static str) -> Self {
        Self {
            name,
            type_id: TypeId::of::<S>,
            constructor: Constructor::RequiresArguments,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Whether discovery can build this type without arguments.
    pub fn is_discoverable(&self) -> bool {
        matches!(self.constructor, Constructor::Default(_))
    }

    /// Build and bind an instance with no arguments.
    pub fn construct(&self) -> Result<BoundSet<H>, ConstructionSkipped> {
        match &self.constructor {
            Constructor::Default(build) => build(self.name).map_err(|err| ConstructionSkipped {
                set: self.name,
                reason: err.to_string(),
            }),
            Constructor::RequiresArguments => Err(ConstructionSkipped {
                set: self.name,
                reason: "constructor requires arguments".to_string(),
            }),
        }
    }
}

impl<H: CommandHost> Clone for CommandSetType<H> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            type_id: self.type_id,
            constructor: match &self.constructor {
                Constructor::Default(build) => Constructor::Default(*build),
                Constructor::RequiresArguments => Constructor::RequiresArguments,
            },
        }
    }
}

impl<H: CommandHost> fmt::Debug for CommandSetType<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSetType")
            .field("name", &self.name)
            .field("discoverable", &self.is_discoverable())
            .finish()
    }
}

/// Zero-argument constructor that may fail.
pub trait FallibleConstruct<H: CommandHost>: CommandSet<H> {
    fn try_new() -> CommandResult<Self>;
}

fn construct_default<H: CommandHost, S: CommandSet<H> + Default>(
    name: &'static str,
) -> CommandResult<BoundSet<H>> {
    Ok(BoundSet::bind_named(Arc::new(S::default()), name))
}

fn construct_fallible<H: CommandHost, S: FallibleConstruct<H>>(
    name: &'static str,
) -> CommandResult<BoundSet<H>> {
    Ok(BoundSet::bind_named(Arc::new(S::try_new()?), name))
}

/// A discoverable set type that could not be built with no arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructionSkipped {
    pub set: &'static str,
    pub reason: String,
}

impl fmt::Display for ConstructionSkipped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skipped command set '{}': {}", self.set, self.reason)
    }
}

impl std::error::Error for ConstructionSkipped {}
