use crate::error::CliError;
use engine_config::settings::env::EnvContext;
use std::{collections::HashMap, fs, path::Path};

/// Collects `KEY=VALUE` pairs from a `.env` file for config placeholders.
#[derive(Debug, Clone, Default)]
pub struct EnvManager {
    vars: HashMap<String, String>,
}

impl EnvManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load variables from a .env file
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), CliError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::EnvFile(format!("{}: {}", path.display(), e)))?;

        self.parse_env_content(&content)
    }

    /// Process environment with the loaded file variables taking precedence.
    pub fn into_context(self) -> EnvContext {
        let mut ctx = EnvContext::new();
        ctx.merge(self.vars);
        ctx
    }

    fn parse_env_content(&mut self, content: &str) -> Result<(), CliError> {
        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let line = line.strip_prefix("export ").unwrap_or(line);
            let Some((key, value)) = line.split_once('=') else {
                return Err(CliError::EnvFile(format!(
                    "malformed line {} (expected KEY=VALUE)",
                    line_num + 1
                )));
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(CliError::EnvFile(format!("empty key at line {}", line_num + 1)));
            }

            self.vars
                .insert(key.to_string(), Self::unquote_value(value));
        }

        Ok(())
    }

    fn unquote_value(value: &str) -> String {
        let value = value.trim();

        for quote in ['"', '\''] {
            if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
                return value[1..value.len() - 1].to_string();
            }
        }

        value.to_string()
    }
}
