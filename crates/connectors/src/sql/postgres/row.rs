use crate::sql::{base::error::DbError, postgres::params::PgText};
use chrono::{DateTime, NaiveDateTime, Utc};
use model::records::operation::SourceRecord;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use tokio_postgres::{
    Row,
    types::{FromSqlOwned, Type},
};

/// Decodes one row of the operation history projection.
pub fn decode_operation(row: &Row) -> Result<SourceRecord, DbError> {
    let reader = RowReader(row);

    Ok(SourceRecord {
        operation_id: reader.text("operation_id")?,
        operation_type: reader.text("operation_type")?,
        operation_time: reader.timestamp("operation_time")?,
        operation_status: reader.text("operation_status")?,
        user_id: reader.text("user_id")?,
        amount: reader.amount("amount")?,
        currency: reader.text("currency")?,
        from_masked_card_number: reader.optional_text("from_masked_card_number")?,
        from_account_id: reader.optional_text("from_account_id")?,
        to_account_id: reader.optional_text("to_account_id")?,
        from_wallet_id: reader.optional_text("from_wallet_id")?,
        to_wallet_id: reader.optional_text("to_wallet_id")?,
        wallet_id: reader.optional_text("wallet_id")?,
        account_id: reader.optional_text("account_id")?,
        payment_operation_type: reader.optional_text("payment_operation_type")?,
        external_operation_id: reader.optional_text("external_operation_id")?,
        original_operation_id: reader.optional_text("original_operation_id")?,
        category: reader.optional_text("category")?,
        from_phone: reader.optional_text("from_phone")?,
        to_phone: reader.optional_text("to_phone")?,
        merchant_name: reader.optional_text("merchant_name")?,
    })
}

struct RowReader<'a>(&'a Row);

impl RowReader<'_> {
    fn column(&self, name: &str) -> Result<(usize, &Type), DbError> {
        self.0
            .columns()
            .iter()
            .enumerate()
            .find(|(_, col)| col.name().eq_ignore_ascii_case(name))
            .map(|(idx, col)| (idx, col.type_()))
            .ok_or_else(|| decode_error(name, "column missing from result set"))
    }

    fn get<T: FromSqlOwned>(&self, name: &str, idx: usize) -> Result<T, DbError> {
        self.0
            .try_get::<_, T>(idx)
            .map_err(|e| decode_error(name, e))
    }

    fn text(&self, name: &str) -> Result<String, DbError> {
        self.optional_text(name)?
            .ok_or_else(|| decode_error(name, "unexpected NULL"))
    }

    fn optional_text(&self, name: &str) -> Result<Option<String>, DbError> {
        let (idx, ty) = self.column(name)?;
        if *ty == Type::UUID {
            let value: Option<uuid::Uuid> = self.get(name, idx)?;
            return Ok(value.map(|uuid| uuid.to_string()));
        }
        let value: Option<PgText> = self.get(name, idx)?;
        Ok(value.map(|text| text.0))
    }

    fn timestamp(&self, name: &str) -> Result<DateTime<Utc>, DbError> {
        let (idx, ty) = self.column(name)?;
        match *ty {
            Type::TIMESTAMP => {
                let naive: NaiveDateTime = self.get(name, idx)?;
                Ok(naive.and_utc())
            }
            _ => self.get(name, idx),
        }
    }

    fn amount(&self, name: &str) -> Result<i64, DbError> {
        let (idx, ty) = self.column(name)?;
        match *ty {
            Type::INT8 => self.get(name, idx),
            Type::INT4 => self.get::<i32>(name, idx).map(i64::from),
            Type::INT2 => self.get::<i16>(name, idx).map(i64::from),
            Type::NUMERIC => {
                let decimal: Decimal = self.get(name, idx)?;
                integral_amount(decimal).map_err(|msg| decode_error(name, msg))
            }
            ref other => Err(decode_error(
                name,
                format!("unsupported amount type '{}'", other.name()),
            )),
        }
    }
}

/// Minor-unit amounts stored as `numeric` must still be whole numbers.
pub(crate) fn integral_amount(value: Decimal) -> Result<i64, String> {
    if !value.fract().is_zero() {
        return Err(format!("amount {value} is not a whole number of minor units"));
    }
    value
        .to_i64()
        .ok_or_else(|| format!("amount {value} does not fit in 64 bits"))
}

fn decode_error(column: &str, message: impl ToString) -> DbError {
    DbError::Decode {
        column: column.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_amount_accepts_whole_numbers() {
        assert_eq!(integral_amount(Decimal::new(12345, 0)), Ok(12345));
        assert_eq!(integral_amount(Decimal::new(-1000, 2)), Ok(-10));
    }

    #[test]
    fn test_integral_amount_rejects_fractions() {
        let err = integral_amount(Decimal::new(1005, 1)).unwrap_err();
        assert!(err.contains("not a whole number"));
    }

    #[test]
    fn test_decode_error_names_column() {
        let err = decode_error("amount", "unexpected NULL");
        assert_eq!(
            err.to_string(),
            "Failed to decode column 'amount': unexpected NULL"
        );
    }
}
