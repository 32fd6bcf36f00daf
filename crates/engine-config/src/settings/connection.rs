use connectors::sql::base::table::TableRef;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SOURCE_TABLE: &str = "accounts_service.operation_history";
pub const DEFAULT_DESTINATION_TABLE: &str = "business_account_service.transaction";

const SSL_MODES: [&str; 3] = ["disable", "prefer", "require"];

/// Connection parameters of one Postgres store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub dbname: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_sslmode")]
    pub sslmode: String,
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    /// Schema-qualified relation read from or written to. Left empty, the
    /// store's default relation is used.
    #[serde(default)]
    pub table: String,
}

fn default_port() -> u16 {
    5432
}

fn default_sslmode() -> String {
    "prefer".to_string()
}

impl ConnectionSettings {
    /// Renders a libpq `key=value` connection string.
    pub fn to_conn_str(&self) -> String {
        let mut parts = vec![
            format!("host={}", quote_value(&self.host)),
            format!("port={}", self.port),
            format!("dbname={}", quote_value(&self.dbname)),
            format!("user={}", quote_value(&self.user)),
        ];
        if !self.password.is_empty() {
            parts.push(format!("password={}", quote_value(&self.password)));
        }
        parts.push(format!("sslmode={}", self.sslmode));
        if let Some(timeout) = self.connect_timeout_secs {
            parts.push(format!("connect_timeout={timeout}"));
        }
        parts.join(" ")
    }

    pub fn table_ref(&self) -> TableRef {
        TableRef::parse(&self.table)
    }

    /// `user@host:port/dbname`, safe to log.
    pub fn display_target(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.dbname)
    }

    pub(crate) fn is_valid_sslmode(&self) -> bool {
        SSL_MODES.contains(&self.sslmode.as_str())
    }
}

fn quote_value(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}
