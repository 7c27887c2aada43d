//! anoi REPL - Interactive explorer for an anoi space
//!
//! Usage: anoi [OPTIONS]
//!
//! Commands:
//!   :help       - Show help
//!   :quit       - Exit REPL
//!   :name N T   - Intern T in namespace N
//!   :show X     - Show content and edges of X
//!   :save       - Flush the space

use std::fs;
use std::path::PathBuf;

use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use tracing_subscriber::EnvFilter;

use anoi::bootstrap::{bootstrap, BootstrapOutcome};
use anoi::config::{global_snapshot_path, SpaceConfig, DEFAULT_PREFIX};
use anoi::repl::{InputResult, MetaCommand, ReplState};
use anoi::types::TypeRegistry;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const PROMPT: &str = "anoi> ";

struct Args {
    config: SpaceConfig,
    verbose: bool,
}

/// Parse command line arguments on top of the `ANOI_*` environment.
///
/// Usage: anoi [-s <snapshot> | -r <url> [-p <prefix>] | -e]
///
/// Options:
///   -s, --snapshot <path>  Load and save the space at <path>
///   -r, --redis <url>      Use the Redis server at <url>
///   -p, --prefix <prefix>  Key prefix on the Redis server
///   -e, --ephemeral        Keep the space in memory only
///   -v, --verbose          Log at info level
///   -h, --help             Show help and exit
///   -V, --version          Show version and exit
fn parse_args(args: &[String]) -> Args {
    let mut config = SpaceConfig::from_env();
    let mut explicit_prefix = None;
    let mut verbose = false;
    let mut i = 0;

    let value = |i: usize, flag: &str| -> String {
        match args.get(i + 1) {
            Some(v) => v.clone(),
            None => {
                eprintln!("Error: {} requires an argument", flag);
                std::process::exit(1);
            }
        }
    };

    // With no backend configured anywhere, persist to the global snapshot
    if config == SpaceConfig::default() {
        config = SpaceConfig::Memory {
            snapshot: global_snapshot_path(),
        };
    }

    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "-s" | "--snapshot" => {
                config = SpaceConfig::Memory {
                    snapshot: Some(PathBuf::from(value(i, arg))),
                };
                i += 2;
            }
            "-r" | "--redis" => {
                config = SpaceConfig::Redis {
                    url: value(i, arg),
                    prefix: DEFAULT_PREFIX.to_string(),
                };
                i += 2;
            }
            "-p" | "--prefix" => {
                explicit_prefix = Some(value(i, arg));
                i += 2;
            }
            "-e" | "--ephemeral" => {
                config = SpaceConfig::Memory { snapshot: None };
                i += 1;
            }
            "-v" | "--verbose" => {
                verbose = true;
                i += 1;
            }
            "-h" | "--help" => {
                println!("anoi v{} - A Network of Ideas", VERSION);
                println!();
                println!("Usage: anoi [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --snapshot <path>  Load and save the space at <path>");
                println!("  -r, --redis <url>      Use the Redis server at <url>");
                println!("  -p, --prefix <prefix>  Key prefix on the Redis server (default: {})", DEFAULT_PREFIX);
                println!("  -e, --ephemeral        Keep the space in memory only");
                println!("  -v, --verbose          Log at info level");
                println!("  -h, --help             Show this help message");
                println!("  -V, --version          Show version");
                println!();
                println!("Environment:");
                println!("  ANOI_REDIS_URL, ANOI_PREFIX, ANOI_SNAPSHOT, RUST_LOG");
                println!();
                println!("Examples:");
                println!("  anoi                          Use ~/.config/anoi/space.bin");
                println!("  anoi -s ./words.bin           Use a local snapshot");
                println!("  anoi -r redis://127.0.0.1/    Share a space through Redis");
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("anoi v{}", VERSION);
                std::process::exit(0);
            }
            _ => {
                eprintln!("Error: Unknown option '{}'", arg);
                eprintln!("Try 'anoi --help' for usage information");
                std::process::exit(1);
            }
        }
    }

    if let (Some(p), SpaceConfig::Redis { prefix, .. }) = (explicit_prefix, &mut config) {
        *prefix = p;
    }

    Args { config, verbose }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = if verbose {
        EnvFilter::new(default)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Args { config, verbose } = parse_args(&args);
    init_tracing(verbose);

    println!("anoi v{} - A Network of Ideas", VERSION);
    println!("Type :help for help, :quit to exit\n");

    match &config {
        SpaceConfig::Memory { snapshot: Some(path) } => println!("Snapshot: {}", path.display()),
        SpaceConfig::Memory { snapshot: None } => println!("Space: in-memory"),
        SpaceConfig::Redis { url, prefix } => println!("Redis: {} (prefix {})", url, prefix),
    }

    let space = match config.open() {
        Ok(space) => space,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match bootstrap(space.as_ref()) {
        Ok(BootstrapOutcome::Installed) => println!("Bootstrapped a fresh space"),
        Ok(BootstrapOutcome::AlreadyBootstrapped) => {}
        Err(e) => {
            eprintln!("Error: bootstrap failed: {}", e);
            std::process::exit(1);
        }
    }
    if let Err(e) = TypeRegistry::open(space.as_ref()) {
        eprintln!("Warning: failed to open the type registry: {}", e);
    }

    let state = ReplState::new(space);

    // Set up rustyline
    let config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<(), DefaultHistory> = match Editor::with_config(config) {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Error: failed to create editor: {}", e);
            std::process::exit(1);
        }
    };

    let history_path = history_path();
    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => match state.process_line(&line) {
                InputResult::MetaCommand(MetaCommand::Quit) => break,
                InputResult::MetaCommand(cmd) => match state.execute(&cmd) {
                    Ok(out) if out.is_empty() => {}
                    Ok(out) => println!("{}", out),
                    Err(e) => eprintln!("Error: {}", e),
                },
                InputResult::Empty => {}
            },
            Err(ReadlineError::Interrupted) => {
                println!("Use :quit or Ctrl-D to exit");
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    if let Err(e) = state.space.flush() {
        eprintln!("Warning: Failed to save space: {}", e);
    }

    if let Some(ref path) = history_path {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let _ = rl.save_history(path);
    }
}

/// History lives next to the global snapshot.
fn history_path() -> Option<PathBuf> {
    global_snapshot_path().map(|p| p.with_file_name("history"))
}
