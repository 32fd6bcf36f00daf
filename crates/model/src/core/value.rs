use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single column value read from or written to a ledger store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Decimal(Decimal),
    String(String),
    Timestamp(DateTime<Utc>),
    Null,
}

impl From<Option<String>> for Value {
    fn from(value: Option<String>) -> Self {
        value.map(Value::String).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_string_conversion() {
        assert_eq!(Value::from(None::<String>), Value::Null);
        assert_eq!(
            Value::from(Some("KZT".to_string())),
            Value::String("KZT".to_string())
        );
    }
}
