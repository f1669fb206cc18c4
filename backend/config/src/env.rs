//! Environment variable substitution and overrides for config values.
//!
//! `${VAR_NAME}` in any string value is replaced at load time; only
//! uppercase `[A-Z_][A-Z0-9_]*` names are matched and `$${VAR}` escapes to
//! a literal `${VAR}`. A few well-known variables then override the file.

use std::collections::HashMap;

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::schema::{OpenAiConfig, PaperVoiceConfig, ServerConfig};

/// A reference, optionally escaped with a second `$`.
static ENV_VAR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const PORT_VAR: &str = "PAPERVOICE_PORT";

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references from the process environment.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, &std::env::vars().collect())
}

/// Substitute env vars using a provided map (useful for testing).
///
/// Fails on the first reference to a variable that is unset or empty.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => arr
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() { k.clone() } else { format!("{path}.{k}") };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains("${") {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let substituted = ENV_VAR_PATTERN.replace_all(s, |caps: &regex::Captures| {
        let var_name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{var_name}}}");
        }
        match env.get(var_name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: var_name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        bail!(err);
    }
    Ok(substituted.into_owned())
}

/// Apply `OPENAI_API_KEY` and `PAPERVOICE_PORT` on top of the file.
///
/// The API key only fills a missing value; the port always wins. An
/// unparsable port is ignored (validation still sees the file value).
pub fn apply_env_overrides(mut config: PaperVoiceConfig, env: &HashMap<String, String>) -> PaperVoiceConfig {
    if let Some(key) = env.get(API_KEY_VAR).filter(|k| !k.is_empty()) {
        let openai = config.openai.get_or_insert_with(OpenAiConfig::default);
        if openai.api_key.as_deref().map_or(true, str::is_empty) {
            debug!("Using API key from {API_KEY_VAR}");
            openai.api_key = Some(key.clone());
        }
    }
    if let Some(port) = env.get(PORT_VAR).and_then(|p| p.trim().parse::<u16>().ok()) {
        config.server.get_or_insert_with(ServerConfig::default).port = Some(port);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_simple_var() {
        let v = json!({"openai": {"apiKey": "${OPENAI_API_KEY}"}});
        let env = env(&[("OPENAI_API_KEY", "sk-abc123")]);
        let result = resolve_env_vars_with(&v, &env).unwrap();
        assert_eq!(result["openai"]["apiKey"], "sk-abc123");
    }

    #[test]
    fn error_on_missing_var_names_the_path() {
        let v = json!({"openai": {"baseUrl": "${MISSING_VAR}/v1"}});
        let err = resolve_env_vars_with(&v, &HashMap::new()).unwrap_err().to_string();
        assert!(err.contains("MISSING_VAR"));
        assert!(err.contains("openai.baseUrl"));
    }

    #[test]
    fn escaped_reference_stays_literal() {
        let v = json!({"explain": {"systemPrompt": "Write $${HOME} as is, use ${NAME}"}});
        let env = env(&[("NAME", "x")]);
        let result = resolve_env_vars_with(&v, &env).unwrap();
        assert_eq!(result["explain"]["systemPrompt"], "Write ${HOME} as is, use x");
    }

    #[test]
    fn passthrough_dollar_math() {
        let v = json!({"explain": {"systemPrompt": "Enclose all math expressions in dollar signs ($)."}, "n": 3});
        let result = resolve_env_vars_with(&v, &HashMap::new()).unwrap();
        assert_eq!(result, v);
    }

    #[test]
    fn overrides_fill_key_and_force_port() {
        let mut config = PaperVoiceConfig::default();
        config.server = Some(ServerConfig {
            port: Some(3000),
            ..Default::default()
        });
        let config = apply_env_overrides(config, &env(&[("OPENAI_API_KEY", "sk-env"), ("PAPERVOICE_PORT", "9000")]));
        assert_eq!(config.openai.unwrap().api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.server.unwrap().port, Some(9000));
    }

    #[test]
    fn file_key_beats_environment() {
        let mut config = PaperVoiceConfig::default();
        config.openai = Some(OpenAiConfig {
            api_key: Some("sk-file".into()),
            ..Default::default()
        });
        let config = apply_env_overrides(config, &env(&[("OPENAI_API_KEY", "sk-env"), ("PAPERVOICE_PORT", "http")]));
        assert_eq!(config.openai.unwrap().api_key.as_deref(), Some("sk-file"));
        assert!(config.server.is_none());
    }
}
