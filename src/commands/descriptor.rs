//! Command descriptors: one record per host-visible command.

use std::fmt;
use std::sync::Arc;

use super::binding::CommandHost;
use super::set::SetHandle;
use crate::error::CommandResult;

/// Command handler with its receiver already bound.
pub type CommandFn<H> = Arc<
    dyn Fn(&mut H, &<H as CommandHost>::Statement) -> CommandResult<<H as CommandHost>::Output>
        + Send
        + Sync,
>;

/// Help handler paired with a command.
pub type HelpFn<H> = Arc<dyn Fn(&mut H) -> CommandResult<<H as CommandHost>::Output> + Send + Sync>;

/// Completion handler paired with a command.
pub type CompleteFn<H> =
    Arc<dyn Fn(&H, &CompletionRequest<'_>) -> CommandResult<Vec<String>> + Send + Sync>;

/// The word under the cursor and its surrounding line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionRequest<'a> {
    /// Partial word being completed.
    pub text: &'a str,
    /// The full input line.
    pub line: &'a str,
    /// Byte offset where `text` starts.
    pub begidx: usize,
    /// Byte offset where `text` ends (the cursor).
    pub endidx: usize,
}

impl<'a> CompletionRequest<'a> {
    /// Build a request for the word ending at `pos`.
    pub fn at(line: &'a str, pos: usize) -> Self {
        let mut end = pos.min(line.len());
        while !line.is_char_boundary(end) {
            end -= 1;
        }
        let begin = line[..end]
            .rfind(char::is_whitespace)
            .map(|idx| idx + 1)
            .unwrap_or(0);

        Self {
            text: &line[begin..end],
            line,
            begidx: begin,
            endidx: end,
        }
    }

    /// True when the cursor is still inside the command word.
    pub fn is_command_word(&self) -> bool {
        self.line[..self.begidx].trim().is_empty()
    }
}

/// Identity and bindings of a single command.
///
/// Descriptors are immutable once built. For command-set commands the owning
/// instance is captured weakly inside the handler, so the public invocation
/// signature is always `(host, statement)`.
pub struct CommandDescriptor<H: CommandHost> {
    name: String,
    category: String,
    owner: Option<SetHandle>,
    handler: CommandFn<H>,
    help: Option<HelpFn<H>>,
    completer: Option<CompleteFn<H>>,
}

impl<H: CommandHost> CommandDescriptor<H> {
    /// Create a descriptor with no owner, help, completion or category.
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut H, &H::Statement) -> CommandResult<H::Output> + Send + Sync + 'static,
    {
        Self::from_parts(name.into(), Arc::new(handler))
    }

    pub(crate) fn from_parts(name: String, handler: CommandFn<H>) -> Self {
        Self {
            name,
            category: String::new(),
            owner: None,
            handler,
            help: None,
            completer: None,
        }
    }

    pub fn with_help<F>(self, help: F) -> Self
    where
        F: Fn(&mut H) -> CommandResult<H::Output> + Send + Sync + 'static,
    {
        self.with_help_fn(Some(Arc::new(help)))
    }

    pub fn with_completer<F>(self, completer: F) -> Self
    where
        F: Fn(&H, &CompletionRequest<'_>) -> CommandResult<Vec<String>> + Send + Sync + 'static,
    {
        self.with_completer_fn(Some(Arc::new(completer)))
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub(crate) fn with_help_fn(mut self, help: Option<HelpFn<H>>) -> Self {
        self.help = help;
        self
    }

    pub(crate) fn with_completer_fn(mut self, completer: Option<CompleteFn<H>>) -> Self {
        self.completer = completer;
        self
    }

    pub(crate) fn with_owner(mut self, owner: SetHandle) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// The command set this command belongs to, `None` for function commands.
    pub fn owner(&self) -> Option<&SetHandle> {
        self.owner.as_ref()
    }

    pub fn has_help(&self) -> bool {
        self.help.is_some()
    }

    pub fn has_completion(&self) -> bool {
        self.completer.is_some()
    }

    /// Invoke the command handler. Handler errors are returned untouched.
    pub fn resolve(&self, host: &mut H, statement: &H::Statement) -> CommandResult<H::Output> {
        (self.handler)(host, statement)
    }

    /// Invoke the help handler, if the command has one.
    pub fn help(&self, host: &mut H) -> Option<CommandResult<H::Output>> {
        self.help.as_ref().map(|help| help(host))
    }

    /// Invoke the completion handler, if the command has one.
    pub fn complete(
        &self,
        host: &H,
        request: &CompletionRequest<'_>,
    ) -> Option<CommandResult<Vec<String>>> {
        self.completer.as_ref().map(|complete| complete(host, request))
    }
}

impl<H: CommandHost> Clone for CommandDescriptor<H> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            category: self.category.clone(),
            owner: self.owner.clone(),
            handler: Arc::clone(&self.handler),
            help: self.help.clone(),
            completer: self.completer.clone(),
        }
    }
}

impl<H: CommandHost> fmt::Debug for CommandDescriptor<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("owner", &self.owner.as_ref().map(SetHandle::name))
            .field("has_help", &self.has_help())
            .field("has_completion", &self.has_completion())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TestHost;

    #[test]
    fn resolve_passes_statement_through() {
        let descriptor =
            CommandDescriptor::<TestHost>::new("echo", |_host, statement: &str| Ok(statement.to_string()));
        let mut host = TestHost::default();

        assert_eq!(descriptor.resolve(&mut host, "a b c").unwrap(), "a b c");
    }

    #[test]
    fn handler_errors_are_not_wrapped() {
        #[derive(Debug)]
        struct Boom;
        impl fmt::Display for Boom {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "boom")
            }
        }
        impl std::error::Error for Boom {}

        let descriptor = CommandDescriptor::<TestHost>::new("fail", |_, _| Err(Box::new(Boom)));
        let err = descriptor.resolve(&mut TestHost::default(), "").unwrap_err();

        assert!(err.downcast_ref::<Boom>().is_some());
    }

    #[test]
    fn help_and_completion_are_optional() {
        let bare = CommandDescriptor::<TestHost>::new("bare", |_, _| Ok(String::new()));
        let mut host = TestHost::default();
        let request = CompletionRequest::at("bare x", 6);
        assert!(bare.help(&mut host).is_none());
        assert!(bare.complete(&host, &request).is_none());

        let full = bare
            .with_help(|_| Ok("usage: bare".to_string()))
            .with_completer(|_, req| Ok(vec![format!("{}yz", req.text)]));
        assert!(full.has_help());
        assert!(full.has_completion());
        assert_eq!(full.help(&mut host).unwrap().unwrap(), "usage: bare");
        assert_eq!(full.complete(&host, &request).unwrap().unwrap(), vec!["xyz"]);
    }

    #[test]
    fn completion_request_finds_current_word() {
        let request = CompletionRequest::at("get fo", 6);
        assert_eq!(request.text, "fo");
        assert_eq!(request.begidx, 4);
        assert_eq!(request.endidx, 6);
        assert!(!request.is_command_word());

        let request = CompletionRequest::at("ge", 2);
        assert_eq!(request.text, "ge");
        assert!(request.is_command_word());

        let request = CompletionRequest::at("get ", 4);
        assert_eq!(request.text, "");
        assert_eq!(request.begidx, 4);
    }
}
