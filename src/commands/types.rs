//! Read-only views of the registry.

use super::binding::CommandHost;
use super::descriptor::CommandDescriptor;
use super::set::{ConstructionSkipped, SetHandle};
use crate::error::RegistryError;

/// One host-visible command as shown in help listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandListing {
    pub name: String,
    pub category: String,
    pub has_help: bool,
    pub has_completion: bool,
    /// Owning command set, `None` for function commands.
    pub set: Option<&'static str>,
}

impl CommandListing {
    pub fn of<H: CommandHost>(descriptor: &CommandDescriptor<H>) -> Self {
        Self {
            name: descriptor.name().to_string(),
            category: descriptor.category().to_string(),
            has_help: descriptor.has_help(),
            has_completion: descriptor.has_completion(),
            set: descriptor.owner().map(SetHandle::name),
        }
    }
}

/// Outcome of [`Registry::discover_and_install`](super::Registry::discover_and_install).
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Command sets built and installed, in discovery order.
    pub installed: Vec<SetHandle>,
    /// Function commands installed.
    pub functions: Vec<String>,
    /// Set types that could not be built without arguments.
    pub skipped: Vec<ConstructionSkipped>,
    /// Sets or functions rejected because of name conflicts.
    pub conflicts: Vec<RegistryError>,
}

impl DiscoveryReport {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}
