use std::sync::Arc;

use crate::commands::{CommandDescriptor, CommandHost, CommandSetType, FunctionRegistry, Namespace, Registry};
use crate::error::CommandResult;

/// Minimal host: statements are raw strings, outputs are strings.
pub struct TestHost {
    pub registry: Arc<Registry<TestHost>>,
    pub namespace: Namespace<TestHost>,
    pub functions: FunctionRegistry<TestHost>,
    pub types: Vec<CommandSetType<TestHost>>,
    /// Lifecycle hook calls, in order.
    pub events: Vec<String>,
}

impl Default for TestHost {
    fn default() -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            namespace: Namespace::new(),
            functions: FunctionRegistry::new(),
            types: Vec::new(),
            events: Vec::new(),
        }
    }
}

impl TestHost {
    /// Dispatch `name` through the namespace, as an interpreter would.
    pub fn run(&mut self, name: &str, statement: &str) -> CommandResult<String> {
        let descriptor = self
            .namespace
            .command(name)
            .ok_or_else(|| format!("unknown command: {name}"))?;
        descriptor.resolve(self, statement)
    }
}

impl CommandHost for TestHost {
    type Statement = str;
    type Output = String;

    fn install_command(&mut self, descriptor: &Arc<CommandDescriptor<Self>>) {
        self.namespace.install(descriptor);
    }

    fn uninstall_command(&mut self, name: &str) {
        self.namespace.uninstall(name);
    }

    fn command_set_types(&self) -> Vec<CommandSetType<Self>> {
        self.types.clone()
    }

    fn function_commands(&self) -> Option<&FunctionRegistry<Self>> {
        Some(&self.functions)
    }
}

/// Names currently visible on the host.
pub fn visible(host: &TestHost) -> Vec<String> {
    host.namespace.names().map(String::from).collect()
}
