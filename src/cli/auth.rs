use std::io::{self, BufRead, IsTerminal};

use colored::Colorize;

use crate::auth::FileStore;
use crate::config::{credentials_path, load_config};
use crate::error::InkpadError;
use crate::runtime::Runtime;

use super::output::{is_tty, print_message, print_value, OutputMode};

pub async fn run_login(
    runtime: &Runtime,
    username: &str,
    password: Option<String>,
    mode: OutputMode,
) -> Result<(), InkpadError> {
    let password = resolve_password(password)?;
    runtime.client().auth().login(username, &password).await?;
    print_message(&format!("Logged in as {username}."), mode);
    Ok(())
}

pub async fn run_register(
    runtime: &Runtime,
    username: &str,
    password: Option<String>,
    mode: OutputMode,
) -> Result<(), InkpadError> {
    let password = resolve_password(password)?;
    let body = runtime.client().auth().register(username, &password).await?;
    match mode {
        OutputMode::Json => print_value(&body, mode),
        OutputMode::Pretty => {
            println!("Registered {username}. Run: inkpad auth login {username}")
        }
    }
    Ok(())
}

pub async fn run_logout(runtime: &Runtime, mode: OutputMode) -> Result<(), InkpadError> {
    let auth = runtime.client().auth();
    if !auth.is_logged_in() {
        print_message("Not logged in.", mode);
        return Ok(());
    }
    match auth.logout().await {
        Ok(()) => {}
        // The local credential is gone either way.
        Err(e) => tracing::warn!("Server-side logout failed: {e}"),
    }
    print_message("Logged out.", mode);
    Ok(())
}

pub async fn run_refresh(runtime: &Runtime, mode: OutputMode) -> Result<(), InkpadError> {
    runtime.client().auth().refresh().await?;
    print_message("Access token refreshed.", mode);
    Ok(())
}

/// Show whether a credential is stored, without touching the network.
pub fn run_status(cli_config: Option<&str>, mode: OutputMode) -> Result<(), InkpadError> {
    let config = load_config(cli_config)?;
    let path = credentials_path();
    let credential = FileStore::open(&path).credential();

    match mode {
        OutputMode::Json => {
            let status = serde_json::json!({
                "loggedIn": credential.is_some(),
                "apiRoot": config.api_root(),
                "credentials": path,
                "savedAt": credential.as_ref().map(|c| c.saved_at.to_rfc3339()),
                "hasRefreshToken": credential.as_ref().is_some_and(|c| c.refresh_token.is_some()),
            });
            println!("{}", serde_json::to_string_pretty(&status).unwrap_or_default());
        }
        OutputMode::Pretty => {
            let tty = is_tty();
            match &credential {
                Some(cred) => {
                    let label = if tty {
                        "Logged in".green().bold().to_string()
                    } else {
                        "Logged in".to_string()
                    };
                    println!("{label} (token saved {})", cred.saved_at.format("%Y-%m-%d %H:%M UTC"));
                }
                None => println!("Not logged in."),
            }
            println!("  API: {}", config.api_root());
            println!("  Credentials: {}", path.display());
        }
    }
    Ok(())
}

/// `--password`/`INKPAD_PASSWORD` first, then a hidden prompt on a terminal,
/// then one line of piped stdin.
fn resolve_password(given: Option<String>) -> Result<String, InkpadError> {
    if let Some(password) = given.filter(|p| !p.is_empty()) {
        return Ok(password);
    }
    let stdin = io::stdin();
    if stdin.is_terminal() {
        let password = dialoguer::Password::new()
            .with_prompt("Password")
            .interact()
            .map_err(|e| InkpadError::InvalidRequest(format!("Could not read password: {e}")))?;
        return require_password(password);
    }
    read_password(&mut stdin.lock())
}

fn read_password(reader: &mut impl BufRead) -> Result<String, InkpadError> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    require_password(line.trim_end_matches(['\r', '\n']).to_string())
}

fn require_password(password: String) -> Result<String, InkpadError> {
    if password.is_empty() {
        return Err(InkpadError::InvalidRequest(
            "A password is required (pass --password or set INKPAD_PASSWORD)".into(),
        ));
    }
    Ok(password)
}
