use rust_decimal::Decimal;

/// Number of decimal places between the minor and major currency unit.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Destination column derived from the converted amount rather than copied.
pub const NET_AMOUNT_COLUMN: &str = "net_amount";

/// One source column and the destination column it is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub source: &'static str,
    pub target: &'static str,
}

const fn field(source: &'static str, target: &'static str) -> FieldMapping {
    FieldMapping { source, target }
}

/// Operation history to transaction column mapping.
///
/// The order is significant: it is the SELECT projection order on the source
/// side and the INSERT column order on the destination side.
pub const OPERATION_FIELD_MAPPING: [FieldMapping; 21] = [
    field("operation_id", "id"),
    field("operation_type", "type"),
    field("operation_time", "transaction_time"),
    field("operation_status", "status"),
    field("user_id", "user_id"),
    field("amount", "amount"),
    field("currency", "currency"),
    field("from_masked_card_number", "from_masked_card_number"),
    field("from_account_id", "from_account_id"),
    field("to_account_id", "to_account_id"),
    field("from_wallet_id", "from_wallet_id"),
    field("to_wallet_id", "to_wallet_id"),
    field("wallet_id", "wallet_id"),
    field("account_id", "account_id"),
    field("payment_operation_type", "payment_transaction_type"),
    field("external_operation_id", "order_id"),
    field("original_operation_id", "original_transaction_id"),
    field("category", "category"),
    field("from_phone", "from_phone"),
    field("to_phone", "to_phone"),
    field("merchant_name", "merchant_name"),
];

/// Columns projected from the source relation, in mapping order.
pub fn source_columns() -> impl Iterator<Item = &'static str> {
    OPERATION_FIELD_MAPPING.iter().map(|m| m.source)
}

/// Columns written to the destination relation: every mapped target followed
/// by the derived net amount.
pub fn destination_columns() -> Vec<&'static str> {
    OPERATION_FIELD_MAPPING
        .iter()
        .map(|m| m.target)
        .chain(std::iter::once(NET_AMOUNT_COLUMN))
        .collect()
}

/// Converts an integer amount in minor units (cents) to the major unit.
/// The conversion is exact: `12345` becomes `123.45`.
pub fn minor_to_major(amount: i64) -> Decimal {
    Decimal::new(amount, MINOR_UNIT_SCALE)
}
