use bytes::BytesMut;
use model::core::value::Value;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use std::error::Error;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type, to_sql_checked};

pub struct PgParam(Box<dyn ToSql + Sync + Send>);

impl PgParam {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Int(v) => PgParam(Box::new(v)),
            Value::Decimal(v) => PgParam(Box::new(v)),
            Value::String(v) => PgParam(Box::new(PgText(v))),
            Value::Timestamp(v) => PgParam(Box::new(v)),
            Value::Null => PgParam(Box::new(PgNull)),
        }
    }

    /// Coerces the value to the parameter type the server inferred for the
    /// prepared statement, so the destination may store amounts as `numeric`
    /// or floating point and identifiers as text, enums or `uuid`.
    pub fn for_type(value: Value, ty: &Type) -> Self {
        match value {
            Value::Null => PgParam(Box::new(PgNull)),
            Value::String(v) => coerce_string(v, ty),
            Value::Int(v) => coerce_int(v, ty),
            Value::Decimal(v) => coerce_decimal(v, ty),
            Value::Timestamp(v) => match *ty {
                Type::TIMESTAMP => PgParam(Box::new(v.naive_utc())),
                Type::DATE => PgParam(Box::new(v.date_naive())),
                Type::TEXT | Type::VARCHAR => PgParam(Box::new(PgText(v.to_rfc3339()))),
                _ => PgParam(Box::new(v)),
            },
        }
    }
}

fn coerce_string(v: String, ty: &Type) -> PgParam {
    if *ty == Type::UUID
        && let Ok(uuid) = uuid::Uuid::parse_str(&v)
    {
        return PgParam(Box::new(uuid));
    }
    PgParam(Box::new(PgText(v)))
}

fn coerce_int(v: i64, ty: &Type) -> PgParam {
    match *ty {
        Type::INT2 => match i16::try_from(v) {
            Ok(small) => PgParam(Box::new(small)),
            Err(_) => PgParam(Box::new(v)),
        },
        Type::INT4 => match i32::try_from(v) {
            Ok(int) => PgParam(Box::new(int)),
            Err(_) => PgParam(Box::new(v)),
        },
        Type::NUMERIC => PgParam(Box::new(Decimal::from(v))),
        Type::FLOAT8 => PgParam(Box::new(v as f64)),
        Type::TEXT | Type::VARCHAR => PgParam(Box::new(PgText(v.to_string()))),
        _ => PgParam(Box::new(v)),
    }
}

fn coerce_decimal(v: Decimal, ty: &Type) -> PgParam {
    match *ty {
        Type::FLOAT8 => match v.to_f64() {
            Some(float) => PgParam(Box::new(float)),
            None => PgParam(Box::new(v)),
        },
        Type::FLOAT4 => match v.to_f32() {
            Some(float) => PgParam(Box::new(float)),
            None => PgParam(Box::new(v)),
        },
        Type::INT8 if v.fract().is_zero() => match v.to_i64() {
            Some(int) => PgParam(Box::new(int)),
            None => PgParam(Box::new(v)),
        },
        Type::TEXT | Type::VARCHAR => PgParam(Box::new(PgText(v.to_string()))),
        _ => PgParam(Box::new(v)),
    }
}

impl AsRef<dyn ToSql + Sync> for PgParam {
    fn as_ref(&self) -> &(dyn ToSql + Sync + 'static) {
        &*self.0
    }
}

pub struct PgParamStore {
    pub params: Vec<PgParam>,
}

impl PgParamStore {
    /// Binds values against the parameter types of a prepared statement.
    pub fn typed(values: Vec<Value>, types: &[Type]) -> Self {
        let params = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| match types.get(i) {
                Some(ty) => PgParam::for_type(value, ty),
                None => PgParam::from_value(value),
            })
            .collect();
        Self { params }
    }

    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|param| param.as_ref())
            .collect::<Vec<_>>()
    }
}

/// Text sent in its raw form, accepted by character types and enums.
#[derive(Debug)]
pub struct PgText(pub String);

impl ToSql for PgText {
    fn to_sql(
        &self,
        _ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        out.extend_from_slice(self.0.as_bytes());
        Ok(IsNull::No)
    }

    fn accepts(ty: &Type) -> bool {
        is_text_like(ty)
    }

    to_sql_checked!();
}

impl<'a> FromSql<'a> for PgText {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(PgText(std::str::from_utf8(raw)?.to_string()))
    }

    fn accepts(ty: &Type) -> bool {
        is_text_like(ty)
    }
}

/// Types whose binary representation is the UTF-8 text itself.
pub(crate) fn is_text_like(ty: &Type) -> bool {
    matches!(ty.kind(), Kind::Enum(_))
        || matches!(
            *ty,
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
        )
        || ty.name().eq_ignore_ascii_case("citext")
}

/// SQL NULL, valid for a parameter of any type.
#[derive(Debug)]
pub struct PgNull;

impl ToSql for PgNull {
    fn to_sql(
        &self,
        _ty: &Type,
        _out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        Ok(IsNull::Yes)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(param: &PgParam, ty: &Type) -> Vec<u8> {
        let mut buf = BytesMut::new();
        let is_null = param.as_ref().to_sql_checked(ty, &mut buf).unwrap();
        assert!(matches!(is_null, IsNull::No));
        buf.to_vec()
    }

    #[test]
    fn test_int_narrows_to_int4() {
        let param = PgParam::for_type(Value::Int(5), &Type::INT4);
        assert_eq!(encode(&param, &Type::INT4), 5i32.to_be_bytes().to_vec());
    }

    #[test]
    fn test_decimal_to_float8() {
        let param = PgParam::for_type(Value::Decimal(Decimal::new(150, 2)), &Type::FLOAT8);
        assert_eq!(encode(&param, &Type::FLOAT8), 1.5f64.to_be_bytes().to_vec());
    }

    #[test]
    fn test_string_to_varchar() {
        let param = PgParam::for_type(Value::String("KZT".to_string()), &Type::VARCHAR);
        assert_eq!(encode(&param, &Type::VARCHAR), b"KZT".to_vec());
    }

    #[test]
    fn test_string_to_enum() {
        let ty = Type::new(
            "transaction_status".to_string(),
            90001,
            Kind::Enum(vec!["SUCCESS".to_string(), "FAILED".to_string()]),
            "public".to_string(),
        );
        let param = PgParam::for_type(Value::String("SUCCESS".to_string()), &ty);
        assert_eq!(encode(&param, &ty), b"SUCCESS".to_vec());
    }

    #[test]
    fn test_string_to_uuid() {
        let raw = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let param = PgParam::for_type(Value::String(raw.to_string()), &Type::UUID);
        let expected = uuid::Uuid::parse_str(raw).unwrap();
        assert_eq!(encode(&param, &Type::UUID), expected.as_bytes().to_vec());
    }

    #[test]
    fn test_text_rejected_for_integer_column() {
        let param = PgParam::for_type(Value::String("abc".to_string()), &Type::INT4);
        let mut buf = BytesMut::new();
        assert!(param.as_ref().to_sql_checked(&Type::INT4, &mut buf).is_err());
    }

    #[test]
    fn test_null_accepted_for_any_column() {
        for ty in [Type::TEXT, Type::INT4, Type::UUID, Type::NUMERIC] {
            let param = PgParam::for_type(Value::Null, &ty);
            let mut buf = BytesMut::new();
            let is_null = param.as_ref().to_sql_checked(&ty, &mut buf).unwrap();
            assert!(matches!(is_null, IsNull::Yes));
        }
    }
}
