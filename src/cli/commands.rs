use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "tdb", about = concat!("todo-board v", env!("CARGO_PKG_VERSION"), " - todos as a list or a board"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different app home (default: $TDB_HOME or ~/.todo-board)
    #[arg(long, global = true)]
    pub home: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a commented config.toml into the app home
    Init(InitArgs),
    /// Show or change a config value
    Config(ConfigArgs),
    /// Create an account and sign in
    Signup(CredentialArgs),
    /// Sign in
    Login(CredentialArgs),
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List todos, newest first
    List(ListArgs),
    /// Add a todo
    Add(AddArgs),
    /// Flip a todo between pending and completed
    Toggle(IdArgs),
    /// Delete a todo
    Rm(IdArgs),
    /// Change a todo's title
    Edit(EditArgs),
    /// Show or set the default view of the board
    View(ViewArgs),
    /// Show or set the color theme
    Theme(ThemeArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config.toml
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Dotted key, e.g. service.backend or ui.cell_width
    pub key: Option<String>,
    /// New value; omit to print the current one
    pub value: Option<String>,
}

#[derive(Args)]
pub struct CredentialArgs {
    /// Account email
    pub email: String,
    /// Password (read from TDB_PASSWORD when omitted)
    #[arg(long, short = 'p', env = "TDB_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only pending todos
    #[arg(long, conflicts_with = "completed")]
    pub pending: bool,
    /// Only completed todos
    #[arg(long)]
    pub completed: bool,
}

#[derive(Args)]
pub struct AddArgs {
    /// Title words (joined with spaces)
    #[arg(required = true, num_args = 1..)]
    pub title: Vec<String>,
}

#[derive(Args)]
pub struct IdArgs {
    /// Todo id or a unique prefix of it
    pub id: String,
}

#[derive(Args)]
pub struct EditArgs {
    /// Todo id or a unique prefix of it
    pub id: String,
    /// New title words (joined with spaces)
    #[arg(required = true, num_args = 1..)]
    pub title: Vec<String>,
}

#[derive(Args)]
pub struct ViewArgs {
    /// New view mode; omit to print the current one
    #[arg(value_enum)]
    pub mode: Option<ViewArg>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ViewArg {
    List,
    Kanban,
}

#[derive(Args)]
pub struct ThemeArgs {
    /// New theme; omit to print the current one
    #[arg(value_enum)]
    pub theme: Option<ThemeArg>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ThemeArg {
    Dark,
    Light,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn title_words_are_collected() {
        let cli = Cli::try_parse_from(["tdb", "add", "Buy", "oat", "milk"]).unwrap();
        match cli.command {
            Some(Commands::Add(args)) => assert_eq!(args.title.join(" "), "Buy oat milk"),
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn pending_and_completed_conflict() {
        assert!(Cli::try_parse_from(["tdb", "list", "--pending", "--completed"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tdb", "list", "--json", "--home", "/tmp/x"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.home.as_deref(), Some("/tmp/x"));
    }
}
