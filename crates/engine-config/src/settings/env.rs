use crate::error::ConfigError;
use std::collections::HashMap;

/// Variables available to `${VAR}` placeholders in the configuration.
#[derive(Debug, Clone)]
pub struct EnvContext {
    vars: HashMap<String, String>,
}

impl EnvContext {
    /// Snapshot of the process environment.
    pub fn new() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn merge(&mut self, vars: HashMap<String, String>) {
        self.vars.extend(vars);
    }

    /// Replaces every `${VAR}` or `${VAR:-fallback}` in `input`.
    pub fn substitute(&self, input: &str) -> Result<String, ConfigError> {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find('}')
                .ok_or_else(|| ConfigError::Placeholder(input.to_string()))?;
            let expr = &after[..end];

            let (name, fallback) = match expr.split_once(":-") {
                Some((name, fallback)) => (name.trim(), Some(fallback)),
                None => (expr.trim(), None),
            };

            match (self.get(name), fallback) {
                (Some(value), _) => out.push_str(value),
                (None, Some(fallback)) => out.push_str(fallback),
                (None, None) => return Err(ConfigError::MissingEnv(name.to_string())),
            }

            rest = &after[end + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

impl Default for EnvContext {
    fn default() -> Self {
        Self::new()
    }
}
