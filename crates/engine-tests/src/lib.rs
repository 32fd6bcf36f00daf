#![allow(dead_code)]

use connectors::sql::{
    base::source::OperationSource,
    postgres::{source::PgOperationSource, utils::connect_client},
};
use engine_config::settings::{env::EnvContext, migration::MigrationSettings};
use model::execution::work_item::WorkItem;
use tokio_postgres::Client;


// Source and destination relations live in separate schemas of one database.
const TEST_PG_HOST: &str = "localhost";
const TEST_PG_PORT: u16 = 5432;
const TEST_PG_DB: &str = "testdb";
const TEST_PG_USER: &str = "user";
const TEST_PG_PASSWORD: &str = "password";

pub const CUTOFF: &str = "2024-06-01 12:00:00.000000 +00:00";

fn test_conn_str() -> String {
    format!(
        "host={TEST_PG_HOST} port={TEST_PG_PORT} dbname={TEST_PG_DB} user={TEST_PG_USER} password={TEST_PG_PASSWORD} sslmode=disable"
    )
}

async fn pg_client() -> Client {
    connect_client(&test_conn_str())
        .await
        .expect("connect postgres")
}

const SOURCE_DDL: &str = r#"
    DROP SCHEMA IF EXISTS accounts_service CASCADE;
    CREATE SCHEMA accounts_service;
    CREATE TABLE accounts_service.operation_history (
        operation_id            varchar PRIMARY KEY,
        operation_type          varchar NOT NULL,
        operation_time          timestamptz NOT NULL,
        operation_status        varchar NOT NULL,
        user_id                 varchar NOT NULL,
        amount                  bigint NOT NULL,
        currency                varchar(3) NOT NULL,
        from_masked_card_number varchar,
        from_account_id         varchar,
        to_account_id           varchar,
        from_wallet_id          varchar,
        to_wallet_id            varchar,
        wallet_id               varchar,
        account_id              varchar,
        payment_operation_type  varchar,
        external_operation_id   varchar,
        original_operation_id   varchar,
        category                varchar,
        from_phone              varchar,
        to_phone                varchar,
        merchant_name           varchar
    );
"#;

const DESTINATION_DDL: &str = r#"
    DROP SCHEMA IF EXISTS business_account_service CASCADE;
    CREATE SCHEMA business_account_service;
    CREATE TABLE business_account_service."transaction" (
        id                       varchar PRIMARY KEY,
        "type"                   varchar NOT NULL,
        transaction_time         timestamptz NOT NULL,
        status                   varchar NOT NULL,
        user_id                  varchar NOT NULL,
        amount                   numeric(19, 2) NOT NULL,
        net_amount               numeric(19, 2) NOT NULL,
        currency                 varchar(3) NOT NULL,
        from_masked_card_number  varchar,
        from_account_id          varchar,
        to_account_id            varchar,
        from_wallet_id           varchar,
        to_wallet_id             varchar,
        wallet_id                varchar,
        account_id               varchar,
        payment_transaction_type varchar,
        order_id                 varchar,
        original_transaction_id  varchar,
        category                 varchar,
        from_phone               varchar,
        to_phone                 varchar,
        merchant_name            varchar
    );
"#;

/// Drop & recreate both ledger schemas so each test starts empty.
pub async fn reset_schemas() {
    let client = pg_client().await;
    client
        .batch_execute(&format!("{SOURCE_DDL}{DESTINATION_DDL}"))
        .await
        .expect("reset ledger schemas");
}

/// Inserts `count` operations for `user_id`, `<user>-op-1` being the newest.
pub async fn seed_operations(user_id: &str, count: usize) {
    for i in 1..=count {
        seed_operation(user_id, &format!("{user_id}-op-{i}"), i as i32, 12_345 * i as i64).await;
    }
}

/// Inserts one operation `minutes_before` the cutoff; zero lands exactly on
/// it and negative values after it.
pub async fn seed_operation(user_id: &str, operation_id: &str, minutes_before: i32, amount: i64) {
    let client = pg_client().await;
    client
        .execute(
            "INSERT INTO accounts_service.operation_history \
             (operation_id, operation_type, operation_time, operation_status, user_id, amount, currency, merchant_name) \
             VALUES ($1, 'PAYMENT', ($2::text)::timestamptz - make_interval(mins => $3), 'SUCCESS', $4, $5, 'KZT', 'Coffee')",
            &[&operation_id, &CUTOFF, &minutes_before, &user_id, &amount],
        )
        .await
        .expect("seed operation");
}

/// Copies one source operation into the destination ahead of a run.
pub async fn preinsert_transaction(operation_id: &str) {
    let client = pg_client().await;
    client
        .execute(
            "INSERT INTO business_account_service.\"transaction\" \
             (id, \"type\", transaction_time, status, user_id, amount, net_amount, currency) \
             SELECT operation_id, operation_type, operation_time, operation_status, user_id, \
                    amount / 100.0, amount / 100.0, currency \
             FROM accounts_service.operation_history WHERE operation_id = $1",
            &[&operation_id],
        )
        .await
        .expect("preinsert transaction");
}

pub async fn destination_ids(user_id: &str) -> Vec<String> {
    let client = pg_client().await;
    client
        .query(
            "SELECT id FROM business_account_service.\"transaction\" WHERE user_id = $1 ORDER BY id",
            &[&user_id],
        )
        .await
        .expect("query destination")
        .iter()
        .map(|row| row.get(0))
        .collect()
}

pub async fn destination_amount(id: &str) -> (rust_decimal::Decimal, rust_decimal::Decimal) {
    let client = pg_client().await;
    let row = client
        .query_one(
            "SELECT amount, net_amount FROM business_account_service.\"transaction\" WHERE id = $1",
            &[&id],
        )
        .await
        .expect("query amount");
    (row.get(0), row.get(1))
}

/// Fetches through the production source adapter.
pub async fn fetch_source_ids(user_id: &str) -> Vec<String> {
    let settings = default_settings(&[]);
    let source = PgOperationSource::new(settings.source.to_conn_str(), &settings.source.table_ref());
    let cutoff = WorkItem::new(user_id, CUTOFF).cutoff_time().expect("test cutoff");
    source
        .fetch_operations(user_id, cutoff)
        .await
        .expect("fetch operations")
        .into_iter()
        .map(|record| record.operation_id)
        .collect()
}

/// Settings pointing both stores at the test database.
pub fn settings(users: &[&str], source_password: &str) -> MigrationSettings {
    let work_items: String = users
        .iter()
        .map(|u| format!("[[work_items]]\nuser_id = \"{u}\"\ncutoff = \"{CUTOFF}\"\n"))
        .collect();

    let raw = format!(
        r#"
[source]
host = "{TEST_PG_HOST}"
port = {TEST_PG_PORT}
dbname = "{TEST_PG_DB}"
user = "{TEST_PG_USER}"
password = "{source_password}"
sslmode = "disable"

[destination]
host = "{TEST_PG_HOST}"
port = {TEST_PG_PORT}
dbname = "{TEST_PG_DB}"
user = "{TEST_PG_USER}"
password = "{TEST_PG_PASSWORD}"
sslmode = "disable"

{work_items}"#
    );

    MigrationSettings::from_toml_str(&raw, &EnvContext::empty()).expect("valid test settings")
}

pub fn default_settings(users: &[&str]) -> MigrationSettings {
    settings(users, TEST_PG_PASSWORD)
}
