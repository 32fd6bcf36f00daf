use crate::core::value::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the source operation history, as fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub operation_id: String,
    pub operation_type: String,
    pub operation_time: DateTime<Utc>,
    pub operation_status: String,
    pub user_id: String,
    /// Amount in the minor currency unit.
    pub amount: i64,
    pub currency: String,
    pub from_masked_card_number: Option<String>,
    pub from_account_id: Option<String>,
    pub to_account_id: Option<String>,
    pub from_wallet_id: Option<String>,
    pub to_wallet_id: Option<String>,
    pub wallet_id: Option<String>,
    pub account_id: Option<String>,
    pub payment_operation_type: Option<String>,
    pub external_operation_id: Option<String>,
    pub original_operation_id: Option<String>,
    pub category: Option<String>,
    pub from_phone: Option<String>,
    pub to_phone: Option<String>,
    pub merchant_name: Option<String>,
}

impl SourceRecord {
    /// Looks up a field by its source column name.
    pub fn field(&self, column: &str) -> Option<Value> {
        let value = match column.to_ascii_lowercase().as_str() {
            "operation_id" => Value::String(self.operation_id.clone()),
            "operation_type" => Value::String(self.operation_type.clone()),
            "operation_time" => Value::Timestamp(self.operation_time),
            "operation_status" => Value::String(self.operation_status.clone()),
            "user_id" => Value::String(self.user_id.clone()),
            "amount" => Value::Int(self.amount),
            "currency" => Value::String(self.currency.clone()),
            "from_masked_card_number" => self.from_masked_card_number.clone().into(),
            "from_account_id" => self.from_account_id.clone().into(),
            "to_account_id" => self.to_account_id.clone().into(),
            "from_wallet_id" => self.from_wallet_id.clone().into(),
            "to_wallet_id" => self.to_wallet_id.clone().into(),
            "wallet_id" => self.wallet_id.clone().into(),
            "account_id" => self.account_id.clone().into(),
            "payment_operation_type" => self.payment_operation_type.clone().into(),
            "external_operation_id" => self.external_operation_id.clone().into(),
            "original_operation_id" => self.original_operation_id.clone().into(),
            "category" => self.category.clone().into(),
            "from_phone" => self.from_phone.clone().into(),
            "to_phone" => self.to_phone.clone().into(),
            "merchant_name" => self.merchant_name.clone().into(),
            _ => return None,
        };
        Some(value)
    }
}
