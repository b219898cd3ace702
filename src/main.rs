use clap::Parser;
use todo_board::cli::commands::{Cli, Commands};
use todo_board::cli::handlers;
use todo_board::io::{config_io, logging};

fn main() {
    let cli = Cli::parse();
    let home = config_io::resolve_home(cli.home.as_deref());

    // A broken config is reported by the command itself; logging falls
    // back to the default level
    let level = config_io::load_config(&home)
        .map(|c| c.log.level)
        .unwrap_or_else(|_| "info".to_string());
    if let Err(e) = logging::init_logging(&home, &level) {
        eprintln!("warning: logging disabled: {}", e);
    }

    match cli.command {
        None => {
            // No subcommand → launch TUI
            if let Err(e) = todo_board::tui::run(&home) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Init(args)) => {
            // Init must work before a config exists
            if let Err(e) = handlers::cmd_init(&home, args) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
        Some(_) => {
            if let Err(e) = handlers::dispatch(cli) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
