//! Commands declared as plain functions.

use super::{FunctionRegistration, Outcome, ReplHost, Statement};
use crate::commands::{CompletionRequest, FunctionItem};
use crate::error::CommandResult;

const GREETINGS: &[&str] = &["world", "everyone", "friend"];

inventory::submit! { FunctionRegistration(FunctionItem::command_in(module_path!(), "echo", "Utilities", echo)) }
inventory::submit! { FunctionRegistration(FunctionItem::help(module_path!(), "echo", help_echo)) }
inventory::submit! { FunctionRegistration(FunctionItem::command(module_path!(), "greet", greet)) }
inventory::submit! { FunctionRegistration(FunctionItem::complete(module_path!(), "greet", complete_greet)) }
inventory::submit! { FunctionRegistration(FunctionItem::command_in(module_path!(), "version", "Utilities", version)) }

fn echo(host: &mut ReplHost, statement: &Statement) -> CommandResult<Outcome> {
    let words: Vec<&str> = statement
        .args
        .iter()
        .map(|word| match word.strip_prefix('$') {
            Some(name) => host.variables.get(name).map_or(word.as_str(), String::as_str),
            None => word.as_str(),
        })
        .collect();
    Ok(Outcome::Text(words.join(" ")))
}

fn help_echo(_host: &mut ReplHost) -> CommandResult<Outcome> {
    Ok(Outcome::Text(
        "echo [words...]\nPrint the arguments. $NAME expands to a variable.".into(),
    ))
}

fn greet(_host: &mut ReplHost, statement: &Statement) -> CommandResult<Outcome> {
    let who = statement.arg(0).unwrap_or(GREETINGS[0]);
    Ok(Outcome::Text(format!("Hello, {who}!")))
}

fn complete_greet(_host: &ReplHost, request: &CompletionRequest<'_>) -> CommandResult<Vec<String>> {
    Ok(GREETINGS
        .iter()
        .filter(|name| name.starts_with(request.text))
        .map(|name| name.to_string())
        .collect())
}

fn version(_host: &mut ReplHost, _statement: &Statement) -> CommandResult<Outcome> {
    Ok(Outcome::Text(format!("cmdset {}", env!("CARGO_PKG_VERSION"))))
}

#[cfg(test)]
mod tests {
    use crate::commands::CompletionRequest;
    use crate::config::Config;
    use crate::shell::{Outcome, bootstrap};

    #[test]
    fn echo_expands_variables() {
        let (mut host, _) = bootstrap(&Config::default(), true);
        host.execute("set name ada").unwrap();

        assert_eq!(
            host.execute("echo hi $name $missing").unwrap(),
            Outcome::Text("hi ada $missing".into())
        );
    }

    #[test]
    fn function_commands_keep_their_help_and_completion() {
        let (mut host, _) = bootstrap(&Config::default(), true);

        assert_eq!(host.execute("greet").unwrap(), Outcome::Text("Hello, world!".into()));
        assert!(matches!(host.execute("help echo").unwrap(), Outcome::Text(t) if t.starts_with("echo [words...]")));
        assert_eq!(
            host.complete(&CompletionRequest::at("greet ev", 8)),
            vec!["everyone"]
        );
    }

    #[test]
    fn version_reports_the_package_version() {
        let (mut host, _) = bootstrap(&Config::default(), true);
        assert_eq!(
            host.execute("version").unwrap(),
            Outcome::Text(format!("cmdset {}", env!("CARGO_PKG_VERSION")))
        );
    }
}
