use colored::Colorize;

use crate::config::{credentials_path, load_config, InkpadConfig};
use crate::error::InkpadError;

use super::output::{is_tty, OutputMode};

/// Display the merged configuration and the files it came from.
pub fn run_config_show(cli_config: Option<&str>, mode: OutputMode) -> Result<(), InkpadError> {
    let config = load_config(cli_config)?;
    match mode {
        OutputMode::Json => {
            let mut value = serde_json::to_value(&config).map_err(|e| {
                InkpadError::ProtocolError(format!("Failed to serialize config: {e}"))
            })?;
            value["apiRoot"] = config.api_root().into();
            value["sources"] = serde_json::json!(config.sources);
            value["credentials"] = serde_json::json!(credentials_path());
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
        }
        OutputMode::Pretty => print_config(&config, is_tty()),
    }
    Ok(())
}

fn print_config(config: &InkpadConfig, is_tty: bool) {
    let label = |text: &str| {
        if is_tty {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    };

    println!("{}: {}", label("API root"), config.api_root());
    println!("{}: {}", label("Allow HTTP"), config.allow_http);
    println!("{}: {} ms", label("Timeout"), config.timeout_ms);
    if !config.headers.is_empty() {
        let mut names: Vec<&String> = config.headers.keys().collect();
        names.sort();
        let names: Vec<&str> = names.into_iter().map(String::as_str).collect();
        println!("{}: {}", label("Headers"), names.join(", "));
    }

    let auth = &config.auth;
    println!("{}: {}", label("Login"), auth.login_path);
    println!("{}: {}", label("Refresh"), auth.refresh_path);
    println!("{}: {}", label("Logout"), auth.logout_path);
    println!("{}: {}", label("No-auth paths"), config.no_auth_paths().join(", "));
    let statuses: Vec<String> = auth.expired_statuses.iter().map(u16::to_string).collect();
    println!("{}: {}", label("Refresh on"), statuses.join(", "));
    println!("{}: {}", label("Credentials"), credentials_path().display());

    if config.sources.is_empty() {
        println!("{}: defaults only", label("Sources"));
    } else {
        println!("{}:", label("Sources"));
        for source in &config.sources {
            println!("  {}", source.display());
        }
    }
}
