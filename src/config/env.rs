use crate::error::InkpadError;

use super::types::InkpadConfig;

/// Expand environment variable references in a string.
///
/// - `${VAR}` is replaced with the value of `VAR`; an unset variable is an error
/// - `${VAR:-fallback}` uses `fallback` when `VAR` is unset or empty
///
/// A `$` not followed by `{` is kept as is.
pub fn expand_env_vars(input: &str) -> Result<String, InkpadError> {
    expand_with(input, |name| std::env::var(name).ok())
}

fn expand_with<F>(input: &str, lookup: F) -> Result<String, InkpadError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| {
            env_error(format!("Unclosed variable reference in '{input}'"))
        })?;
        let expr = &after[..end];

        let value = match expr.split_once(":-") {
            Some((name, fallback)) => lookup(name)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| fallback.to_string()),
            None => lookup(expr).ok_or_else(|| {
                env_error(format!("Environment variable '{expr}' is not set"))
            })?,
        };
        out.push_str(&value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Expand variables in the base URL and every header value.
pub fn expand_config(config: &mut InkpadConfig) -> Result<(), InkpadError> {
    config.base_url = expand_env_vars(&config.base_url)?;
    for value in config.headers.values_mut() {
        *value = expand_env_vars(value)?;
    }
    Ok(())
}

fn env_error(detail: String) -> InkpadError {
    InkpadError::ConfigError {
        path: std::path::PathBuf::from("<env>"),
        detail,
    }
}
