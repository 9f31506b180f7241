use std::sync::Arc;

use parking_lot::Mutex;
use reedline::{Completer, Span, Suggestion};

use super::ReplHost;
use crate::commands::CompletionRequest;

/// Tab completion backed by whatever is installed on the host right now.
pub struct ShellCompleter {
    host: Arc<Mutex<ReplHost>>,
}

impl ShellCompleter {
    pub fn new(host: Arc<Mutex<ReplHost>>) -> Self {
        Self { host }
    }
}

impl Completer for ShellCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let request = CompletionRequest::at(line, pos);
        let candidates = self.host.lock().complete(&request);

        candidates
            .into_iter()
            .map(|value| Suggestion {
                value,
                span: Span::new(request.begidx, request.endidx),
                append_whitespace: true,
                ..Default::default()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::shell::bootstrap;

    #[test]
    fn suggestions_replace_the_word_under_the_cursor() {
        let (host, _) = bootstrap(&Config::default(), true);
        let mut completer = ShellCompleter::new(Arc::new(Mutex::new(host)));

        let suggestions = completer.complete("help qu", 7);

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].value, "quit");
        assert_eq!(suggestions[0].span, Span::new(5, 7));
    }
}
