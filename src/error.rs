//! Error types shared by the registry and command handlers.

use thiserror::Error;

/// Failure raised by a command, help or completion handler.
///
/// The registry never wraps or inspects these; whatever the handler returns
/// reaches the caller of `resolve` as-is.
pub type CommandError = Box<dyn std::error::Error + Send + Sync>;

/// Result returned by command, help and completion handlers.
pub type CommandResult<T> = Result<T, CommandError>;

/// Registry integrity errors surfaced by the mutating operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A command with this name is already registered.
    #[error("command '{name}' is already registered ({context})")]
    DuplicateName { name: String, context: String },

    /// The command name cannot be typed as a single command word.
    #[error("invalid command name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// The command set instance or function command is not part of the registry.
    #[error("'{0}' is not registered")]
    NotRegistered(String),

    /// The same command set instance was registered twice.
    #[error("command set '{0}' is already registered")]
    AlreadyRegistered(String),

    /// The command set has a handler running right now.
    #[error("command set '{0}' cannot be unregistered while one of its commands is running")]
    InFlight(String),

    /// A command set's descriptor was offered as a function command.
    #[error("command '{name}' belongs to command set '{set}' and cannot be registered as a function")]
    OwnedBySet { name: String, set: String },

    /// A descriptor outlived the command set that owned it.
    #[error("command '{0}' belongs to a command set that has been unregistered")]
    OwnerDropped(String),
}

impl RegistryError {
    pub(crate) fn duplicate(name: &str, context: impl Into<String>) -> Self {
        Self::DuplicateName {
            name: name.to_string(),
            context: context.into(),
        }
    }
}
