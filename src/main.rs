use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use inkpad::api::{ListQuery, NotePatch};
use inkpad::cli::output::{print_error, OutputMode};
use inkpad::cli::{auth, config_cmd, files, notes};
use inkpad::{InkpadError, Runtime};

#[derive(Parser)]
#[command(name = "inkpad", version, about = "Command-line client for the inkpad notes service")]
struct Cli {
    /// Path to a config file (highest precedence)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in, sign up and manage the stored session
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Create, read, update and delete notes
    Notes {
        #[command(subcommand)]
        action: NotesAction,
    },
    /// Upload and manage files
    Files {
        #[command(subcommand)]
        action: FilesAction,
    },
    /// Restore or purge deleted items
    Recycle {
        #[command(subcommand)]
        action: RecycleAction,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
struct Credentials {
    username: String,

    /// Password (prompted on stdin when omitted)
    #[arg(long, env = "INKPAD_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum AuthAction {
    /// Log in and store the access token
    Login(Credentials),
    /// Create an account
    Register(Credentials),
    /// End the session and forget the stored token
    Logout,
    /// Show whether a token is stored
    Status,
    /// Exchange the stored session for a new access token
    Refresh,
}

#[derive(Args)]
struct Paging {
    #[arg(long)]
    page: Option<u32>,

    #[arg(long)]
    size: Option<u32>,

    /// Filter by text
    #[arg(long)]
    search: Option<String>,
}

impl From<Paging> for ListQuery {
    fn from(p: Paging) -> Self {
        ListQuery {
            page: p.page,
            size: p.size,
            search: p.search,
        }
    }
}

#[derive(Subcommand)]
enum NotesAction {
    /// List notes
    List(Paging),
    /// Show one note
    Get { id: String },
    /// Create a note
    Create {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        content: String,
    },
    /// Change a note's title or content
    Update {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        content: Option<String>,
    },
    /// Move a note to the recycle bin
    Delete { id: String },
    /// Link files to a note
    Attach {
        id: String,

        #[arg(required = true)]
        file_ids: Vec<String>,
    },
    /// Unlink files from a note
    Detach {
        id: String,

        #[arg(required = true)]
        file_ids: Vec<String>,
    },
}

#[derive(Subcommand)]
enum FilesAction {
    /// List uploaded files
    List(Paging),
    /// Upload one or more files
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Delete an uploaded file
    Delete { id: String },
}

#[derive(Subcommand)]
enum RecycleAction {
    /// List items in the recycle bin
    List,
    /// Restore items
    Restore {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Delete items permanently
    Purge {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Display the merged config and where it came from
    Show,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("INKPAD_LOG_LEVEL")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = run(cli).await {
        print_error(&e, json);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), InkpadError> {
    let mode = OutputMode::from_flag(cli.json);
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Config {
            action: ConfigAction::Show,
        } => config_cmd::run_config_show(config, mode),
        Commands::Auth {
            action: AuthAction::Status,
        } => auth::run_status(config, mode),
        Commands::Auth { action } => {
            let runtime = Runtime::from_config(config)?;
            match action {
                AuthAction::Login(c) => auth::run_login(&runtime, &c.username, c.password, mode).await,
                AuthAction::Register(c) => {
                    auth::run_register(&runtime, &c.username, c.password, mode).await
                }
                AuthAction::Logout => auth::run_logout(&runtime, mode).await,
                AuthAction::Refresh => auth::run_refresh(&runtime, mode).await,
                AuthAction::Status => auth::run_status(config, mode),
            }
        }
        Commands::Notes { action } => {
            let runtime = Runtime::from_config(config)?;
            match action {
                NotesAction::List(paging) => notes::run_list(&runtime, &paging.into(), mode).await,
                NotesAction::Get { id } => notes::run_get(&runtime, &id, mode).await,
                NotesAction::Create { title, content } => {
                    notes::run_create(&runtime, title, content, mode).await
                }
                NotesAction::Update { id, title, content } => {
                    notes::run_update(&runtime, &id, NotePatch { title, content }, mode).await
                }
                NotesAction::Delete { id } => notes::run_delete(&runtime, &id, mode).await,
                NotesAction::Attach { id, file_ids } => {
                    notes::run_attach(&runtime, &id, &file_ids, false, mode).await
                }
                NotesAction::Detach { id, file_ids } => {
                    notes::run_attach(&runtime, &id, &file_ids, true, mode).await
                }
            }
        }
        Commands::Files { action } => {
            let runtime = Runtime::from_config(config)?;
            match action {
                FilesAction::List(paging) => files::run_list(&runtime, &paging.into(), mode).await,
                FilesAction::Upload { paths } => files::run_upload(&runtime, &paths, mode).await,
                FilesAction::Delete { id } => files::run_delete(&runtime, &id, mode).await,
            }
        }
        Commands::Recycle { action } => {
            let runtime = Runtime::from_config(config)?;
            match action {
                RecycleAction::List => files::run_recycle_list(&runtime, mode).await,
                RecycleAction::Restore { ids } => {
                    files::run_recycle_restore(&runtime, &ids, mode).await
                }
                RecycleAction::Purge { ids } => files::run_recycle_purge(&runtime, &ids, mode).await,
            }
        }
    }
}
