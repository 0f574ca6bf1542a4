use clap::Parser;
use clap::error::ErrorKind;
use std::path::PathBuf;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use todo_cli::cli::{self, Cli, Command};
use todo_core::config::{self, Config, ServerSettings};
use todo_core::error::AppError;
use todo_core::model::{DueDate, Priority, Task, TaskInput, TaskPatch};
use todo_core::storage::json_store;
use todo_core::store::TaskStore;
use todo_core::view::{self, TaskFilter, TaskSort};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const LOG_JSON_ENV_VAR: &str = "TODOAPP_LOG_JSON";

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Done")]
    done: &'static str,
    #[tabled(rename = "Priority")]
    priority: &'static str,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Added")]
    added: String,
    #[tabled(rename = "Text")]
    text: String,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            done: if task.completed { "x" } else { "" },
            priority: task.priority.label(),
            due: task
                .due_date
                .map(|due| due.to_string())
                .unwrap_or_else(|| "-".to_string()),
            added: task.created_date.date().to_string(),
            text: task.text.clone(),
        }
    }
}

fn print_tasks_table(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks.");
        return;
    }
    let rows: Vec<TaskRow> = tasks.iter().map(TaskRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{table}");
}

fn print_task_plain(task: &Task) {
    println!("ID: {}", task.id);
    println!("Text: {}", task.text);
    println!("Completed: {}", if task.completed { "yes" } else { "no" });
    println!("Priority: {}", task.priority.label());
    match task.due_date {
        Some(due) => println!("Due: {due}"),
        None => println!("Due: -"),
    }
    println!("Added: {}", task.created_date);
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let json = serde_json::to_string(value)
        .map_err(|err| AppError::invalid_data(format!("failed to encode output: {err}")))?;
    println!("{json}");
    Ok(())
}

fn parse_priority(raw: Option<&str>) -> Result<Option<Priority>, AppError> {
    raw.map(str::parse).transpose()
}

fn parse_due(raw: Option<&str>) -> Result<Option<DueDate>, AppError> {
    match raw {
        Some(raw) => DueDate::parse_optional(raw),
        None => Ok(None),
    }
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let json = std::env::var(LOG_JSON_ENV_VAR)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn resolve_config(cli: &Cli) -> Result<Config, AppError> {
    let load = config::load_config_with_fallback();
    if let Some(err) = load.error {
        warn!(error = %err, "ignoring unreadable config file");
    }
    let overrides = cli::collect_overrides(&cli.config_override).map_err(AppError::invalid_input)?;
    Ok(config::merge_overrides(&load.config, &overrides))
}

fn resolve_store_path(cli: &Cli, config: &Config) -> Result<PathBuf, AppError> {
    match &cli.store_path {
        Some(path) => Ok(path.clone()),
        None => json_store::store_path(config.store_path.as_deref()),
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config = resolve_config(&cli)?;
    let store_path = resolve_store_path(&cli, &config)?;
    debug!(path = %store_path.display(), "opening task store");
    let store = TaskStore::open(&store_path)?;

    match cli.command {
        Command::Add {
            text,
            due,
            priority,
        } => {
            let mut input = TaskInput {
                text,
                ..TaskInput::default()
            };
            input.priority = parse_priority(priority.as_deref())?;
            input.due_date = parse_due(due.as_deref())?;
            let task = store.create(input)?;
            if cli.json {
                print_json(&task)?;
            } else {
                println!("Added task: {} ({})", task.text, task.id);
            }
        }
        Command::List { filter, sort } => {
            let filter: TaskFilter = filter.parse()?;
            let sort: TaskSort = sort.parse()?;
            let tasks = view::render(&store.list()?, filter, sort);
            if cli.json {
                print_json(&tasks)?;
            } else {
                print_tasks_table(&tasks);
            }
        }
        Command::Show { id } => {
            let task = store.get(id)?;
            if cli.json {
                print_json(&task)?;
            } else {
                print_task_plain(&task);
            }
        }
        Command::Edit {
            id,
            text,
            priority,
            due,
            clear_due,
        } => {
            let due_date = if clear_due {
                Some(None)
            } else {
                due.as_deref().map(DueDate::parse_optional).transpose()?
            };
            let patch = TaskPatch {
                text,
                completed: None,
                priority: parse_priority(priority.as_deref())?,
                due_date,
            };
            if patch.is_empty() {
                return Err(AppError::invalid_input(
                    "nothing to edit; pass --text, --priority, --due or --clear-due",
                ));
            }
            let task = store.update(id, &patch)?;
            if cli.json {
                print_json(&task)?;
            } else {
                println!("Updated task: {} ({})", task.text, task.id);
            }
        }
        Command::Done { id, undo } => {
            let patch = TaskPatch {
                completed: Some(!undo),
                ..TaskPatch::default()
            };
            let task = store.update(id, &patch)?;
            if cli.json {
                print_json(&task)?;
            } else if undo {
                println!("Reopened task: {} ({})", task.text, task.id);
            } else {
                println!("Completed task: {} ({})", task.text, task.id);
            }
        }
        Command::Delete { id } => {
            let task = store.delete(id)?;
            if cli.json {
                print_json(&task)?;
            } else {
                println!("Deleted task: {} ({})", task.text, task.id);
            }
        }
        Command::Reset => {
            store.reset()?;
            if cli.json {
                print_json(&serde_json::json!({ "message": "Todos reset successfully" }))?;
            } else {
                println!("Todos reset successfully");
            }
        }
        Command::Serve { port, bind } => {
            let config = Config {
                port: port.or(config.port),
                bind: bind.or(config.bind),
                ..config
            };
            let settings = ServerSettings::from_config(&config)?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|err| AppError::io(format!("failed to start runtime: {err}")))?;
            runtime.block_on(todo_http::serve(store, settings))?;
        }
    }

    Ok(())
}

fn normalize_parse_error(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid arguments");
    first_line
        .trim()
        .trim_start_matches("error:")
        .trim()
        .to_string()
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp
                    | ErrorKind::DisplayVersion
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) {
                err.exit();
            }
            let err = AppError::invalid_input(normalize_parse_error(&err));
            eprintln!("ERROR: {err}");
            std::process::exit(1);
        }
    };

    let default_level = match cli.command {
        Command::Serve { .. } => "info",
        _ => "warn",
    };
    init_tracing(default_level);

    if let Err(err) = run(cli) {
        eprintln!("ERROR: {err}");
        std::process::exit(1);
    }
}
