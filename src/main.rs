use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use cmdset::commands::DiscoveryReport;
use cmdset::config::{self, Config};
use cmdset::shell::{Outcome, ReplHost, ShellCompleter, bootstrap};
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use parking_lot::Mutex;
use reedline::{
    ColumnarMenu, DefaultPrompt, DefaultPromptSegment, Emacs, KeyCode, KeyModifiers, MenuBuilder,
    Reedline, ReedlineEvent, ReedlineMenu, Signal, default_emacs_keybindings,
};
use tracing_subscriber::EnvFilter;

const COMPLETION_MENU: &str = "completion_menu";

#[derive(Parser, Debug)]
#[command(name = "cmdset")]
#[command(about = "Interactive shell with loadable command sets")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.config/cmdset.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only register the built-in sets; skip discovery
    #[arg(long)]
    no_autoload: bool,

    /// Log filter, e.g. `cmdset=debug`
    #[arg(long)]
    log: Option<String>,

    /// Run these commands and exit instead of starting the shell
    #[arg(short = 'c', long = "command")]
    commands: Vec<String>,
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match config::load_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            print_colored_message(&format!("Warning: {}\nUsing defaults.\n", e), Color::DarkYellow);
            Config::default()
        }
    };

    init_logging(cli.log.as_deref().or(config.log_filter.as_deref()));

    let auto_load = config.auto_load && !cli.no_autoload;
    let (host, report) = bootstrap(&config, auto_load);
    print_report(&report);

    let host = Arc::new(Mutex::new(host));

    if !cli.commands.is_empty() {
        for line in &cli.commands {
            if !run_line(&host, line) {
                break;
            }
        }
        shutdown(&host);
        return;
    }

    print_colored_message("Type 'help' for commands, 'quit' to exit.\n", Color::DarkMagenta);

    let mut rl = line_editor(Arc::clone(&host));
    let prompt = match &config.prompt {
        Some(prompt) => DefaultPrompt::new(
            DefaultPromptSegment::Basic(prompt.clone()),
            DefaultPromptSegment::Empty,
        ),
        None => DefaultPrompt::default(),
    };

    loop {
        let line = match rl.read_line(&prompt) {
            Ok(Signal::Success(input)) => input,
            Ok(Signal::CtrlD) | Ok(Signal::CtrlC) => break,
            Err(e) => {
                print_colored_message(&format!("{}\n", e), Color::Red);
                break;
            }
        };

        if !run_line(&host, &line) {
            break;
        }
    }

    shutdown(&host);
}

fn init_logging(directive: Option<&str>) {
    let filter = match directive {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn line_editor(host: Arc<Mutex<ReplHost>>) -> Reedline {
    let menu = ColumnarMenu::default().with_name(COMPLETION_MENU);

    let mut keybindings = default_emacs_keybindings();
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu(COMPLETION_MENU.to_string()),
            ReedlineEvent::MenuNext,
        ]),
    );

    Reedline::create()
        .with_completer(Box::new(ShellCompleter::new(host)))
        .with_menu(ReedlineMenu::EngineCompleter(Box::new(menu)))
        .with_edit_mode(Box::new(Emacs::new(keybindings)))
}

/// Run one line, printing its output. Returns false once the shell should exit.
fn run_line(host: &Arc<Mutex<ReplHost>>, line: &str) -> bool {
    let outcome = host.lock().execute(line);
    match outcome {
        Ok(Outcome::Text(text)) => {
            if !text.is_empty() {
                println!("{}", text.trim_end());
            }
            true
        }
        Ok(Outcome::Silent) => true,
        Ok(Outcome::Quit) => false,
        Err(e) => {
            print_colored_message(&format!("{}\n", e), Color::Red);
            true
        }
    }
}

fn print_report(report: &DiscoveryReport) {
    for skipped in &report.skipped {
        tracing::info!("{skipped}");
    }
    for conflict in &report.conflicts {
        print_colored_message(&format!("{}\n", conflict), Color::Red);
    }
}

fn shutdown(host: &Arc<Mutex<ReplHost>>) {
    let mut host = host.lock();
    let registry = host.registry();
    registry.clear(&mut host);
}

fn print_colored_message(message: &str, color: Color) {
    let mut stdout = io::stdout();
    let _ = execute!(
        stdout,
        SetForegroundColor(color),
        Print(message),
        ResetColor
    );
}
