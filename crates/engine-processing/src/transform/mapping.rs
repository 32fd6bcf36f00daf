use model::{
    records::{operation::SourceRecord, transaction::DestinationRecord},
    transform::mapping::minor_to_major,
};

/// Maps source operations onto destination transactions.
///
/// The mapping is total: every field is renamed following
/// `OPERATION_FIELD_MAPPING` and the minor-unit amount is converted to the
/// major unit, with `net_amount` initialized to the same value.
#[derive(Debug, Default, Clone, Copy)]
pub struct OperationMapper;

impl OperationMapper {
    pub fn map(&self, source: &SourceRecord) -> DestinationRecord {
        let amount = minor_to_major(source.amount);

        DestinationRecord {
            id: source.operation_id.clone(),
            kind: source.operation_type.clone(),
            transaction_time: source.operation_time,
            status: source.operation_status.clone(),
            user_id: source.user_id.clone(),
            amount,
            net_amount: amount,
            currency: source.currency.clone(),
            from_masked_card_number: source.from_masked_card_number.clone(),
            from_account_id: source.from_account_id.clone(),
            to_account_id: source.to_account_id.clone(),
            from_wallet_id: source.from_wallet_id.clone(),
            to_wallet_id: source.to_wallet_id.clone(),
            wallet_id: source.wallet_id.clone(),
            account_id: source.account_id.clone(),
            payment_transaction_type: source.payment_operation_type.clone(),
            order_id: source.external_operation_id.clone(),
            original_transaction_id: source.original_operation_id.clone(),
            category: source.category.clone(),
            from_phone: source.from_phone.clone(),
            to_phone: source.to_phone.clone(),
            merchant_name: source.merchant_name.clone(),
        }
    }

    /// Maps a fetched batch, preserving its order.
    pub fn map_all(&self, sources: &[SourceRecord]) -> Vec<DestinationRecord> {
        sources.iter().map(|source| self.map(source)).collect()
    }
}
