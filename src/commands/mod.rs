//! Dynamic command registry.
//!
//! Commands are declared away from any central dispatch table and installed on
//! a host interpreter at runtime.
//!
//! # Architecture
//!
//! - `descriptor`: one record per command, with its bound handler
//! - `function`: commands declared as free functions
//! - `set`: command sets grouping related commands under a default category
//! - `registry`: discovery, registration and the name table
//! - `binding`: the trait a host implements to expose commands
//! - `types`: listing and discovery report types
//! - `render`: help text generation from a listing

mod binding;
mod descriptor;
mod function;
mod registry;
mod render;
mod set;
mod types;

pub use binding::{CommandHost, Namespace};
pub use descriptor::{CommandDescriptor, CommandFn, CompleteFn, CompletionRequest, HelpFn};
pub use function::{FunctionItem, FunctionKind, FunctionRegistry, resolve_siblings};
pub use registry::{Registry, validate_name};
pub use render::{UNCATEGORIZED, format_listing, group_by_category};
pub use set::{
    BoundSet, CommandSet, CommandSetType, CommandTable, ConstructionSkipped, FallibleConstruct,
    SetHandle,
};
pub use types::{CommandListing, DiscoveryReport};
