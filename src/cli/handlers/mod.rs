mod init;
pub use init::{cmd_config, cmd_init};

use std::path::Path;
use std::sync::Arc;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::storage::LocalStorage;
use crate::model::{Todo, ViewMode};
use crate::service::{self, Services};
use crate::store::{AuthStore, ThemeStore, TodoStore, ViewStore};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let home = config_io::resolve_home(cli.home.as_deref());

    let Some(command) = cli.command else {
        // No subcommand is handled in main.rs (TUI)
        return Ok(());
    };
    match command {
        // Local-only commands
        Commands::Init(args) => cmd_init(&home, args),
        Commands::Config(args) => cmd_config(&home, args),
        Commands::View(args) => cmd_view(&home, args, json),
        Commands::Theme(args) => cmd_theme(&home, args, json),

        // Commands that talk to the backend
        other => {
            let config = config_io::load_config(&home)?;
            let services = service::connect(&config, &home)?;
            let rt = crate::runtime()?;
            rt.block_on(run_service_command(other, services, json))
        }
    }
}

async fn run_service_command(command: Commands, services: Services, json: bool) -> CmdResult {
    match command {
        Commands::Signup(args) => cmd_signup(&services, args, json).await,
        Commands::Login(args) => cmd_login(&services, args, json).await,
        Commands::Logout => cmd_logout(&services).await,
        Commands::Whoami => cmd_whoami(&services, json).await,
        Commands::List(args) => cmd_list(&services, args, json).await,
        Commands::Add(args) => cmd_add(&services, args, json).await,
        Commands::Toggle(args) => cmd_toggle(&services, args, json).await,
        Commands::Rm(args) => cmd_rm(&services, args).await,
        Commands::Edit(args) => cmd_edit(&services, args, json).await,
        Commands::Init(_) | Commands::Config(_) | Commands::View(_) | Commands::Theme(_) => {
            unreachable!("handled in dispatch")
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A todo store loaded with the signed-in user's todos
async fn load_store(services: &Services) -> Result<TodoStore, Box<dyn std::error::Error>> {
    if services.auth.get_session().await?.is_none() {
        return Err("not signed in (run `tdb login <email>`)".into());
    }
    let store = TodoStore::new(Arc::clone(&services.todos));
    store.fetch_all().await?;
    Ok(store)
}

/// Resolve a full id or a unique id prefix against the loaded todos
fn resolve_id(todos: &[Todo], query: &str) -> Result<String, String> {
    if let Some(todo) = todos.iter().find(|t| t.id == query) {
        return Ok(todo.id.clone());
    }
    let matches: Vec<&Todo> = todos.iter().filter(|t| t.id.starts_with(query)).collect();
    match matches.as_slice() {
        [] => Err(format!("todo not found: {}", query)),
        [todo] => Ok(todo.id.clone()),
        many => Err(format!(
            "ambiguous id prefix '{}' matches {} todos",
            query,
            many.len()
        )),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Auth commands
// ---------------------------------------------------------------------------

async fn cmd_signup(services: &Services, args: CredentialArgs, json: bool) -> CmdResult {
    let auth = AuthStore::new(Arc::clone(&services.auth));
    auth.sign_up(&args.email, &args.password, &args.password)
        .await?;
    let snapshot = auth.snapshot();
    if snapshot.session.is_none()
        && let Some(notice) = snapshot.notice
    {
        if json {
            return print_json(&serde_json::json!({ "notice": notice }));
        }
        println!("Signed up. {}", notice);
        return Ok(());
    }
    report_signed_in(&auth, json, "Signed up")
}

async fn cmd_login(services: &Services, args: CredentialArgs, json: bool) -> CmdResult {
    let auth = AuthStore::new(Arc::clone(&services.auth));
    auth.sign_in(&args.email, &args.password).await?;
    report_signed_in(&auth, json, "Signed in")
}

fn report_signed_in(auth: &AuthStore, json: bool, verb: &str) -> CmdResult {
    let snapshot = auth.snapshot();
    let user = snapshot.user().ok_or("sign-in returned no session")?;
    if json {
        return print_json(&user_to_json(user));
    }
    println!("{} as {}", verb, format_user(user));
    Ok(())
}

async fn cmd_logout(services: &Services) -> CmdResult {
    services.auth.sign_out().await?;
    println!("Signed out");
    Ok(())
}

async fn cmd_whoami(services: &Services, json: bool) -> CmdResult {
    let session = services
        .auth
        .get_session()
        .await?
        .ok_or("not signed in (run `tdb login <email>`)")?;
    if json {
        return print_json(&user_to_json(&session.user));
    }
    println!("{}", format_user(&session.user));
    Ok(())
}

// ---------------------------------------------------------------------------
// Todo commands
// ---------------------------------------------------------------------------

async fn cmd_list(services: &Services, args: ListArgs, json: bool) -> CmdResult {
    let store = load_store(services).await?;
    let snapshot = store.snapshot();
    let shown: Vec<&Todo> = snapshot
        .todos
        .iter()
        .filter(|t| {
            if args.pending {
                !t.completed
            } else if args.completed {
                t.completed
            } else {
                true
            }
        })
        .collect();

    if json {
        return print_json(&todo_list_to_json(&snapshot.todos, &shown));
    }

    if shown.is_empty() {
        let empty = if args.pending {
            "No pending todos"
        } else if args.completed {
            "No completed todos"
        } else {
            "No todos yet. Add a new todo!"
        };
        println!("{}", empty);
        return Ok(());
    }
    for todo in &shown {
        println!("{}", format_todo_line(todo));
    }
    println!("\n{}", format_counts(&snapshot.todos));
    Ok(())
}

async fn cmd_add(services: &Services, args: AddArgs, json: bool) -> CmdResult {
    let store = load_store(services).await?;
    let before: Vec<String> = store.snapshot().todos.into_iter().map(|t| t.id).collect();
    store.add(&args.title.join(" ")).await?;

    let snapshot = store.snapshot();
    let added = snapshot
        .todos
        .iter()
        .find(|t| !before.contains(&t.id))
        .ok_or("todo was added but is not visible yet")?;
    if json {
        return print_json(&todo_to_json(added));
    }
    println!("Added {}", format_todo_line(added));
    Ok(())
}

async fn cmd_toggle(services: &Services, args: IdArgs, json: bool) -> CmdResult {
    let store = load_store(services).await?;
    let id = resolve_id(&store.snapshot().todos, &args.id)?;
    store.toggle(&id).await?;

    let snapshot = store.snapshot();
    let todo = snapshot.find(&id).ok_or("todo disappeared after toggle")?;
    if json {
        return print_json(&todo_to_json(todo));
    }
    println!("{}", format_todo_line(todo));
    Ok(())
}

async fn cmd_rm(services: &Services, args: IdArgs) -> CmdResult {
    let store = load_store(services).await?;
    let snapshot = store.snapshot();
    let id = resolve_id(&snapshot.todos, &args.id)?;
    let title = snapshot
        .find(&id)
        .map(|t| t.title.clone())
        .unwrap_or_default();
    store.remove(&id).await?;
    println!("Deleted {}  {}", short_id(&id), title);
    Ok(())
}

async fn cmd_edit(services: &Services, args: EditArgs, json: bool) -> CmdResult {
    let store = load_store(services).await?;
    let id = resolve_id(&store.snapshot().todos, &args.id)?;
    store.edit(&id, &args.title.join(" ")).await?;

    let snapshot = store.snapshot();
    let todo = snapshot.find(&id).ok_or("todo disappeared after edit")?;
    if json {
        return print_json(&todo_to_json(todo));
    }
    println!("{}", format_todo_line(todo));
    Ok(())
}

// ---------------------------------------------------------------------------
// Preference commands
// ---------------------------------------------------------------------------

fn cmd_view(home: &Path, args: ViewArgs, json: bool) -> CmdResult {
    let store = ViewStore::open(Some(LocalStorage::new(home)));
    if let Some(mode) = args.mode {
        store.set_view_mode(match mode {
            ViewArg::List => ViewMode::List,
            ViewArg::Kanban => ViewMode::Kanban,
        })?;
    }
    let value = store.view_mode().as_str();
    if json {
        return print_json(&PreferenceJson { key: "view", value });
    }
    println!("{}", value);
    Ok(())
}

fn cmd_theme(home: &Path, args: ThemeArgs, json: bool) -> CmdResult {
    let store = ThemeStore::open(Some(LocalStorage::new(home)));
    if let Some(theme) = args.theme {
        store.set_dark(matches!(theme, ThemeArg::Dark))?;
    }
    let value = if store.is_dark() { "dark" } else { "light" };
    if json {
        return print_json(&PreferenceJson { key: "theme", value });
    }
    println!("{}", value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn todo(id: &str) -> Todo {
        Todo {
            id: id.into(),
            user_id: "u1".into(),
            title: id.into(),
            completed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn resolve_id_accepts_unique_prefix() {
        let todos = vec![todo("abc123"), todo("abd456"), todo("ab")];
        assert_eq!(resolve_id(&todos, "abc").unwrap(), "abc123");
        // Exact match wins over being a prefix of others
        assert_eq!(resolve_id(&todos, "ab").unwrap(), "ab");
        assert_eq!(
            resolve_id(&todos, "a").unwrap_err(),
            "ambiguous id prefix 'a' matches 3 todos"
        );
        assert_eq!(resolve_id(&todos, "zz").unwrap_err(), "todo not found: zz");
    }
}
