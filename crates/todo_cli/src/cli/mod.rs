use clap::{Parser, Subcommand};
use std::path::PathBuf;
use todo_core::config::ConfigOverrides;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Task collection file (takes precedence over TODOAPP_STORE_PATH)
    #[arg(long, value_name = "PATH", global = true)]
    pub store_path: Option<PathBuf>,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: todo add "Buy milk" --due 2024-12-30 --priority high
    Add {
        text: Option<String>,
        /// Due date as YYYY-MM-DD or DD/MM/YYYY
        #[arg(long, value_name = "DATE")]
        due: Option<String>,
        /// low, medium or high
        #[arg(long)]
        priority: Option<String>,
    },
    /// List tasks through a filter and sort order
    ///
    /// Example: todo list --filter active --sort priority-desc
    List {
        /// all, completed, active, has-due-date, high-priority, medium-priority, low-priority
        #[arg(long, default_value = "all")]
        filter: String,
        /// added-date-asc, added-date-desc, due-date-asc, due-date-desc, priority-asc, priority-desc
        #[arg(long, default_value = "added-date-asc")]
        sort: String,
    },
    /// Show details of a task
    ///
    /// Example: todo show 1733011200000
    Show { id: u64 },
    /// Edit a task's text, priority or due date
    ///
    /// Example: todo edit 1733011200000 --text "Buy organic milk" --priority medium
    /// Example: todo edit 1733011200000 --clear-due
    Edit {
        id: u64,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long, value_name = "DATE", conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
    },
    /// Mark a task as completed
    ///
    /// Example: todo done 1733011200000
    /// Example: todo done 1733011200000 --undo
    Done {
        id: u64,
        /// Mark the task as not completed
        #[arg(long)]
        undo: bool,
    },
    /// Delete a task
    ///
    /// Example: todo delete 1733011200000
    Delete { id: u64 },
    /// Remove every task
    Reset,
    /// Serve the REST API
    ///
    /// Example: todo serve --port 3000
    Serve {
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    StorePath,
    Bind,
    Port,
    ApiRoot,
    MaxBodyBytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let field =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match field.as_str() {
        "store_path" | "store" => ConfigOverrideTarget::StorePath,
        "bind" | "host" => ConfigOverrideTarget::Bind,
        "port" => ConfigOverrideTarget::Port,
        "api_root" => ConfigOverrideTarget::ApiRoot,
        "max_body_bytes" => ConfigOverrideTarget::MaxBodyBytes,
        other => return Err(format!("unknown config field '{other}'")),
    };

    if value.is_empty() {
        return Err(format!("override for '{field}' needs a value"));
    }

    Ok(ParsedConfigOverride { target, value })
}

/// Folds every `--config-override` into one set of overrides; later entries win.
pub fn collect_overrides(raws: &[String]) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();
    for raw in raws {
        let parsed = parse_config_override(raw)?;
        match parsed.target {
            ConfigOverrideTarget::StorePath => {
                overrides.store_path = Some(PathBuf::from(parsed.value));
            }
            ConfigOverrideTarget::Bind => overrides.bind = Some(parsed.value),
            ConfigOverrideTarget::Port => {
                let port = parsed
                    .value
                    .parse()
                    .map_err(|_| format!("port '{}' is not a valid port", parsed.value))?;
                overrides.port = Some(port);
            }
            ConfigOverrideTarget::ApiRoot => overrides.api_root = Some(parsed.value),
            ConfigOverrideTarget::MaxBodyBytes => {
                let limit = parsed
                    .value
                    .parse()
                    .map_err(|_| format!("max_body_bytes '{}' is not a number", parsed.value))?;
                overrides.max_body_bytes = Some(limit);
            }
        }
    }
    Ok(overrides)
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
