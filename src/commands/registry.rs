//! Per-host command registry and discovery engine.
//!
//! The registry tracks which command sets are live and which command names
//! are taken. Every mutation runs under the write side of a single lock and is
//! all-or-nothing: a failed call leaves both the name table and the host
//! exactly as they were.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use regex::Regex;

use super::binding::CommandHost;
use super::descriptor::CommandDescriptor;
use super::set::{BoundSet, CommandSet, SetHandle, SetHooks, instance_key};
use super::types::{CommandListing, DiscoveryReport};
use crate::error::RegistryError;

static VALID_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^[^\s"'|<>;&]+$"#).expect("command name pattern is valid"));

/// Check that `name` can be typed as a single command word.
pub fn validate_name(name: &str) -> Result<(), RegistryError> {
    let reason = if name.is_empty() {
        "cannot be empty"
    } else if !VALID_NAME.is_match(name) {
        "cannot contain whitespace, quotes, or any of | < > ; &"
    } else {
        return Ok(());
    };

    Err(RegistryError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

struct Entry<H: CommandHost> {
    descriptor: Arc<CommandDescriptor<H>>,
    enabled: bool,
}

struct LiveSet<H: CommandHost> {
    handle: SetHandle,
    instance: Arc<dyn SetHooks<H>>,
    commands: Vec<String>,
    active: Arc<AtomicUsize>,
}

struct State<H: CommandHost> {
    commands: BTreeMap<String, Entry<H>>,
    sets: HashMap<TypeId, Vec<LiveSet<H>>>,
}

impl<H: CommandHost> State<H> {
    fn find_set(&self, handle: &SetHandle) -> Option<&LiveSet<H>> {
        self.sets
            .get(&handle.type_id())?
            .iter()
            .find(|live| live.handle == *handle)
    }

    /// Live set wrapping the instance at `key`, under any handle.
    fn find_instance(&self, type_id: TypeId, key: usize) -> Option<&LiveSet<H>> {
        self.sets
            .get(&type_id)?
            .iter()
            .find(|live| live.handle.key() == key)
    }

    fn take_set(&mut self, handle: &SetHandle) -> Option<LiveSet<H>> {
        let live = self.sets.get_mut(&handle.type_id())?;
        let idx = live.iter().position(|set| set.handle == *handle)?;
        let removed = live.remove(idx);
        if live.is_empty() {
            self.sets.remove(&handle.type_id());
        }
        Some(removed)
    }

    /// Reject `names` if any is invalid, taken, or repeated.
    fn check_names<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
        context: &str,
    ) -> Result<(), RegistryError> {
        let mut seen = Vec::new();
        for name in names {
            validate_name(name)?;
            if self.commands.contains_key(name) || seen.contains(&name) {
                return Err(RegistryError::duplicate(name, context));
            }
            seen.push(name);
        }
        Ok(())
    }
}

/// Command registry scoped to one host interpreter.
pub struct Registry<H: CommandHost> {
    state: RwLock<State<H>>,
}

impl<H: CommandHost> Registry<H> {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                commands: BTreeMap::new(),
                sets: HashMap::new(),
            }),
        }
    }

    /// Install every declared function command and every discoverable set.
    ///
    /// Set types are visited in name order. Function commands that are already
    /// installed and types that already have a live instance are left alone, types that cannot be built without arguments
    /// are skipped, and name conflicts are reported without aborting discovery.
    pub fn discover_and_install(&self, host: &mut H) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();

        let functions = host
            .function_commands()
            .map(|registry| registry.descriptors())
            .unwrap_or_default();
        for descriptor in functions {
            let name = descriptor.name().to_string();
            let installed = self
                .state
                .read()
                .commands
                .get(&name)
                .is_some_and(|entry| Arc::ptr_eq(&entry.descriptor, &descriptor));
            if installed {
                tracing::debug!(command = name.as_str(), "already installed, not discovering");
                continue;
            }
            match self.register_function_command(host, descriptor) {
                Ok(()) => report.functions.push(name),
                Err(err) => {
                    tracing::error!("{err}");
                    report.conflicts.push(err);
                }
            }
        }

        let mut types = host.command_set_types();
        types.sort_by_key(|ty| ty.name());

        for ty in types {
            if self.state.read().sets.contains_key(&ty.type_id()) {
                tracing::debug!(set = ty.name(), "already registered, not discovering");
                continue;
            }

            let bound = match ty.construct() {
                Ok(bound) => bound,
                Err(skipped) => {
                    tracing::warn!("{skipped}");
                    report.skipped.push(skipped);
                    continue;
                }
            };

            match self.register_bound(host, bound) {
                Ok(handle) => report.installed.push(handle),
                Err(err) => {
                    tracing::error!("{err}");
                    report.conflicts.push(err);
                }
            }
        }

        report
    }

    /// Register and install an already constructed command set.
    pub fn register<S: CommandSet<H>>(
        &self,
        host: &mut H,
        set: Arc<S>,
    ) -> Result<SetHandle, RegistryError> {
        self.register_bound(host, BoundSet::bind(set))
    }

    /// Register a set that has already been bound.
    pub fn register_bound(&self, host: &mut H, bound: BoundSet<H>) -> Result<SetHandle, RegistryError> {
        let BoundSet {
            handle,
            instance,
            descriptors,
            active,
        } = bound;
        let name = handle.name();

        {
            let mut state = self.state.write();
            if state.find_instance(handle.type_id(), handle.key()).is_some() {
                return Err(RegistryError::AlreadyRegistered(name.to_string()));
            }
            let context = format!("command set {name}");
            state.check_names(descriptors.iter().map(|d| d.name()), &context)?;

            let mut commands = Vec::with_capacity(descriptors.len());
            for descriptor in descriptors {
                let descriptor = Arc::new(descriptor);
                host.install_command(&descriptor);
                commands.push(descriptor.name().to_string());
                state.commands.insert(
                    descriptor.name().to_string(),
                    Entry {
                        descriptor,
                        enabled: true,
                    },
                );
            }

            tracing::debug!(set = name, commands = commands.len(), "registered command set");
            state
                .sets
                .entry(handle.type_id())
                .or_default()
                .push(LiveSet {
                    handle: handle.clone(),
                    instance: Arc::clone(&instance),
                    commands,
                    active,
                });
        }

        instance.on_registered(host);
        Ok(handle)
    }

    /// Uninstall and discard a command set instance.
    ///
    /// Must not be called from inside one of the set's own handlers; such a
    /// call is refused with [`RegistryError::InFlight`].
    pub fn unregister<S: CommandSet<H>>(
        &self,
        host: &mut H,
        set: &Arc<S>,
    ) -> Result<(), RegistryError> {
        let handle = self
            .state
            .read()
            .find_instance(TypeId::of::<S>(), instance_key(set))
            .map(|live| live.handle.clone())
            .ok_or_else(|| RegistryError::NotRegistered(std::any::type_name::<S>().to_string()))?;
        self.unregister_handle(host, &handle)
    }

    /// Uninstall and discard the command set behind `handle`.
    pub fn unregister_handle(&self, host: &mut H, handle: &SetHandle) -> Result<(), RegistryError> {
        let live = {
            let mut state = self.state.write();
            let live = state
                .find_set(handle)
                .ok_or_else(|| RegistryError::NotRegistered(handle.name().to_string()))?;
            if live.active.load(Ordering::SeqCst) > 0 {
                return Err(RegistryError::InFlight(handle.name().to_string()));
            }

            let live = state
                .take_set(handle)
                .ok_or_else(|| RegistryError::NotRegistered(handle.name().to_string()))?;
            for name in &live.commands {
                host.uninstall_command(name);
                state.commands.remove(name);
            }
            tracing::debug!(set = handle.name(), "unregistered command set");
            live
        };

        live.instance.on_unregistered(host);
        Ok(())
    }

    /// Install a single function command. Descriptors owned by a command set
    /// are refused.
    pub fn register_function_command(
        &self,
        host: &mut H,
        descriptor: Arc<CommandDescriptor<H>>,
    ) -> Result<(), RegistryError> {
        if let Some(owner) = descriptor.owner() {
            return Err(RegistryError::OwnedBySet {
                name: descriptor.name().to_string(),
                set: owner.name().to_string(),
            });
        }

        let mut state = self.state.write();
        state.check_names([descriptor.name()], "function command")?;

        host.install_command(&descriptor);
        tracing::debug!(command = descriptor.name(), "installed function command");
        state.commands.insert(
            descriptor.name().to_string(),
            Entry {
                descriptor,
                enabled: true,
            },
        );
        Ok(())
    }

    /// Uninstall a function command by name.
    pub fn unregister_function_command(&self, host: &mut H, name: &str) -> Result<(), RegistryError> {
        let mut state = self.state.write();
        let is_function = state
            .commands
            .get(name)
            .is_some_and(|entry| entry.descriptor.owner().is_none());
        if !is_function {
            return Err(RegistryError::NotRegistered(name.to_string()));
        }

        host.uninstall_command(name);
        state.commands.remove(name);
        tracing::debug!(command = name, "uninstalled function command");
        Ok(())
    }

    /// Hide a registered command from the host. Its name stays reserved.
    pub fn disable_command(&self, host: &mut H, name: &str) -> Result<(), RegistryError> {
        let mut state = self.state.write();
        let entry = state
            .commands
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotRegistered(name.to_string()))?;
        if entry.enabled {
            host.uninstall_command(name);
            entry.enabled = false;
        }
        Ok(())
    }

    /// Make a disabled command visible again.
    pub fn enable_command(&self, host: &mut H, name: &str) -> Result<(), RegistryError> {
        let mut state = self.state.write();
        let entry = state
            .commands
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotRegistered(name.to_string()))?;
        if !entry.enabled {
            host.install_command(&entry.descriptor);
            entry.enabled = true;
        }
        Ok(())
    }

    /// Disable every command in `category`, returning how many were hidden.
    pub fn disable_category(&self, host: &mut H, category: &str) -> usize {
        self.set_category_enabled(host, category, false)
    }

    /// Enable every command in `category`, returning how many were restored.
    pub fn enable_category(&self, host: &mut H, category: &str) -> usize {
        self.set_category_enabled(host, category, true)
    }

    fn set_category_enabled(&self, host: &mut H, category: &str, enabled: bool) -> usize {
        let mut state = self.state.write();
        let mut changed = 0;
        for (name, entry) in state.commands.iter_mut() {
            if entry.descriptor.category() != category || entry.enabled == enabled {
                continue;
            }
            if enabled {
                host.install_command(&entry.descriptor);
            } else {
                host.uninstall_command(name);
            }
            entry.enabled = enabled;
            changed += 1;
        }
        tracing::debug!(category, enabled, changed, "toggled category");
        changed
    }

    /// Active descriptor for `name`, if it is registered and enabled.
    pub fn lookup(&self, name: &str) -> Option<Arc<CommandDescriptor<H>>> {
        self.state
            .read()
            .commands
            .get(name)
            .filter(|entry| entry.enabled)
            .map(|entry| Arc::clone(&entry.descriptor))
    }

    /// True if `name` is registered, enabled or not.
    pub fn is_taken(&self, name: &str) -> bool {
        self.state.read().commands.contains_key(name)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Host-visible commands ordered by category, then name.
    pub fn list(&self) -> Vec<CommandListing> {
        let state = self.state.read();
        let mut listing: Vec<_> = state
            .commands
            .values()
            .filter(|entry| entry.enabled)
            .map(|entry| CommandListing::of(&entry.descriptor))
            .collect();
        listing.sort_by(|a, b| (&a.category, &a.name).cmp(&(&b.category, &b.name)));
        listing
    }

    /// Names of enabled commands, sorted.
    pub fn names(&self) -> Vec<String> {
        self.state
            .read()
            .commands
            .iter()
            .filter(|(_, entry)| entry.enabled)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Live command sets sorted by name.
    pub fn command_sets(&self) -> Vec<SetHandle> {
        let state = self.state.read();
        let mut handles: Vec<_> = state
            .sets
            .values()
            .flatten()
            .map(|live| live.handle.clone())
            .collect();
        handles.sort_by_key(|handle| (handle.name(), handle.id()));
        handles
    }

    /// Live instances of the set type `type_id`.
    pub fn instances_of(&self, type_id: TypeId) -> Vec<SetHandle> {
        self.state
            .read()
            .sets
            .get(&type_id)
            .map(|live| live.iter().map(|set| set.handle.clone()).collect())
            .unwrap_or_default()
    }

    pub fn is_registered(&self, handle: &SetHandle) -> bool {
        self.state.read().find_set(handle).is_some()
    }

    /// Commands owned by the set behind `handle`.
    pub fn commands_of(&self, handle: &SetHandle) -> Vec<String> {
        self.state
            .read()
            .find_set(handle)
            .map(|live| live.commands.clone())
            .unwrap_or_default()
    }

    /// Remove every command and set from the host.
    pub fn clear(&self, host: &mut H) {
        let removed: Vec<LiveSet<H>> = {
            let mut state = self.state.write();
            for (name, entry) in &state.commands {
                if entry.enabled {
                    host.uninstall_command(name);
                }
            }
            state.commands.clear();
            state.sets.drain().flat_map(|(_, live)| live).collect()
        };

        for live in removed {
            live.instance.on_unregistered(host);
        }
    }
}

impl<H: CommandHost> Default for Registry<H> {
    fn default() -> Self {
        Self::new()
    }
}
