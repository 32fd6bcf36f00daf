use crate::{core::value::Value, transform::mapping::destination_columns};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A mapped transaction row, ready to be inserted into the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub transaction_time: DateTime<Utc>,
    pub status: String,
    pub user_id: String,
    /// Amount in the major currency unit.
    pub amount: Decimal,
    pub net_amount: Decimal,
    pub currency: String,
    pub from_masked_card_number: Option<String>,
    pub from_account_id: Option<String>,
    pub to_account_id: Option<String>,
    pub from_wallet_id: Option<String>,
    pub to_wallet_id: Option<String>,
    pub wallet_id: Option<String>,
    pub account_id: Option<String>,
    pub payment_transaction_type: Option<String>,
    pub order_id: Option<String>,
    pub original_transaction_id: Option<String>,
    pub category: Option<String>,
    pub from_phone: Option<String>,
    pub to_phone: Option<String>,
    pub merchant_name: Option<String>,
}

impl DestinationRecord {
    /// Looks up a field by its destination column name.
    pub fn field(&self, column: &str) -> Option<Value> {
        let value = match column.to_ascii_lowercase().as_str() {
            "id" => Value::String(self.id.clone()),
            "type" => Value::String(self.kind.clone()),
            "transaction_time" => Value::Timestamp(self.transaction_time),
            "status" => Value::String(self.status.clone()),
            "user_id" => Value::String(self.user_id.clone()),
            "amount" => Value::Decimal(self.amount),
            "net_amount" => Value::Decimal(self.net_amount),
            "currency" => Value::String(self.currency.clone()),
            "from_masked_card_number" => self.from_masked_card_number.clone().into(),
            "from_account_id" => self.from_account_id.clone().into(),
            "to_account_id" => self.to_account_id.clone().into(),
            "from_wallet_id" => self.from_wallet_id.clone().into(),
            "to_wallet_id" => self.to_wallet_id.clone().into(),
            "wallet_id" => self.wallet_id.clone().into(),
            "account_id" => self.account_id.clone().into(),
            "payment_transaction_type" => self.payment_transaction_type.clone().into(),
            "order_id" => self.order_id.clone().into(),
            "original_transaction_id" => self.original_transaction_id.clone().into(),
            "category" => self.category.clone().into(),
            "from_phone" => self.from_phone.clone().into(),
            "to_phone" => self.to_phone.clone().into(),
            "merchant_name" => self.merchant_name.clone().into(),
            _ => return None,
        };
        Some(value)
    }

    /// Values in INSERT column order (see [`destination_columns`]).
    pub fn values(&self) -> Vec<Value> {
        destination_columns()
            .into_iter()
            .map(|column| self.field(column).unwrap_or(Value::Null))
            .collect()
    }
}
