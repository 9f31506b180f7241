pub mod commands;
pub mod config;
pub mod error;
pub mod shell;

pub use commands::{CommandHost, CommandSet, CommandTable, Registry};
pub use error::{CommandError, CommandResult, RegistryError};

#[cfg(test)]
pub mod test_helpers;
