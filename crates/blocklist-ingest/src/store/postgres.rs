//! PostgreSQL document store
//!
//! The configured database name becomes a schema and the collection name a
//! table inside it. The table is created on connect when missing.

use super::DocumentStore;
use crate::config::StoreSettings;
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use blocklist_common::types::BlocklistDocument;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Rows per multi-value INSERT statement (5 binds per row).
pub const INSERT_CHUNK_SIZE: usize = 1000;

/// Longest identifier Postgres keeps without truncation.
const MAX_IDENTIFIER_LEN: usize = 63;

/// Table-backed store
pub struct PostgresStore {
    pool: Option<PgPool>,
    schema: String,
    table: String,
}

/// Accept `[A-Za-z_][A-Za-z0-9_]*` and return it double-quoted.
pub fn quote_identifier(name: &str) -> Result<String> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid_start || !valid_rest || name.len() > MAX_IDENTIFIER_LEN {
        return Err(IngestError::Config(format!(
            "'{}' is not a valid Postgres identifier",
            name
        )));
    }

    Ok(format!("\"{}\"", name))
}

impl PostgresStore {
    pub async fn connect(settings: &StoreSettings) -> Result<Self> {
        let schema = quote_identifier(&settings.database_name)?;
        let table = quote_identifier(&settings.collection_name)?;

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.connect_timeout())
            .connect(&settings.uri)
            .await?;

        let store = Self {
            pool: Some(pool),
            schema,
            table,
        };
        store.ensure_table().await?;

        debug!(table = %store.qualified_table(), "Postgres store ready");

        Ok(store)
    }

    fn pool(&self) -> Result<&PgPool> {
        self.pool.as_ref().ok_or(IngestError::StoreClosed)
    }

    fn qualified_table(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }

    async fn ensure_table(&self) -> Result<()> {
        let pool = self.pool()?;

        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", self.schema))
            .execute(pool)
            .await?;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                ip_address TEXT NOT NULL,
                attack_type TEXT NOT NULL,
                source TEXT NOT NULL,
                retrieved_at TIMESTAMPTZ NOT NULL,
                ingestion_timestamp TIMESTAMPTZ NOT NULL
            )
            "#,
            self.qualified_table()
        ))
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    fn describe(&self) -> String {
        format!("postgres {}", self.qualified_table())
    }

    async fn insert_many(&self, documents: &[BlocklistDocument]) -> Result<u64> {
        let mut tx = self.pool()?.begin().await?;
        let mut inserted = 0;

        for chunk in documents.chunks(INSERT_CHUNK_SIZE) {
            let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                "INSERT INTO {} (ip_address, attack_type, source, retrieved_at, ingestion_timestamp) ",
                self.qualified_table()
            ));

            query_builder.push_values(chunk, |mut b, doc| {
                b.push_bind(&doc.address)
                    .push_bind(doc.category.as_str())
                    .push_bind(&doc.origin)
                    .push_bind(doc.retrieved_at)
                    .push_bind(doc.ingested_at);
            });

            let result = query_builder.build().execute(&mut *tx).await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;

        Ok(inserted)
    }

    async fn count_documents(&self) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", self.qualified_table()))
                .fetch_one(self.pool()?)
                .await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn count_by_category(&self) -> Result<BTreeMap<String, u64>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(&format!(
            "SELECT attack_type, COUNT(*) FROM {} GROUP BY attack_type",
            self.qualified_table()
        ))
        .fetch_all(self.pool()?)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(category, count)| (category, u64::try_from(count).unwrap_or(0)))
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(self.pool()?).await?;
        Ok(())
    }

    async fn list_databases(&self) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT datname FROM pg_database WHERE NOT datistemplate ORDER BY datname",
        )
        .fetch_all(self.pool()?)
        .await?;

        Ok(names)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            info!("Postgres connection pool closed");
        }
        Ok(())
    }
}
