//! MongoDB document store

use super::DocumentStore;
use crate::config::StoreSettings;
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use blocklist_common::types::{fields, BlocklistDocument};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, DateTime as BsonDateTime, Document};
use mongodb::options::{ClientOptions, InsertManyOptions};
use mongodb::{Client, Collection};
use std::collections::BTreeMap;
use tracing::{debug, info};

struct MongoHandle {
    client: Client,
    collection: Collection<Document>,
}

/// Collection-backed store
///
/// The driver connects lazily, so an unreachable server surfaces on the first
/// operation rather than in [`MongoStore::connect`].
pub struct MongoStore {
    handle: Option<MongoHandle>,
    database_name: String,
    collection_name: String,
}

impl MongoStore {
    pub async fn connect(settings: &StoreSettings) -> Result<Self> {
        let mut options = ClientOptions::parse(&settings.uri).await?;
        options.app_name = Some("blocklist-ingest".to_string());
        options.server_selection_timeout = Some(settings.connect_timeout());
        options.connect_timeout = Some(settings.connect_timeout());

        let client = Client::with_options(options)?;
        let collection = client
            .database(&settings.database_name)
            .collection::<Document>(&settings.collection_name);

        debug!(
            database = %settings.database_name,
            collection = %settings.collection_name,
            "MongoDB client created"
        );

        Ok(Self {
            handle: Some(MongoHandle { client, collection }),
            database_name: settings.database_name.clone(),
            collection_name: settings.collection_name.clone(),
        })
    }

    fn handle(&self) -> Result<&MongoHandle> {
        self.handle.as_ref().ok_or(IngestError::StoreClosed)
    }
}

fn to_bson_datetime(at: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(at.timestamp_millis())
}

fn to_bson(document: &BlocklistDocument) -> Document {
    let mut bson = Document::new();
    bson.insert(fields::ADDRESS, document.address.as_str());
    bson.insert(fields::CATEGORY, document.category.as_str());
    bson.insert(fields::ORIGIN, document.origin.as_str());
    bson.insert(fields::RETRIEVED_AT, to_bson_datetime(document.retrieved_at));
    bson.insert(fields::INGESTED_AT, to_bson_datetime(document.ingested_at));
    bson
}

fn group_count(group: &Document) -> Result<(String, u64)> {
    let category = match group.get("_id") {
        Some(Bson::String(category)) => category.clone(),
        Some(Bson::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    let count = match group.get("count") {
        Some(Bson::Int32(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Bson::Int64(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Bson::Double(n)) if *n >= 0.0 => *n as u64,
        other => {
            return Err(IngestError::Store(format!(
                "Unexpected count in aggregation result: {:?}",
                other
            )))
        },
    };

    Ok((category, count))
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn describe(&self) -> String {
        format!("mongodb {}.{}", self.database_name, self.collection_name)
    }

    async fn insert_many(&self, documents: &[BlocklistDocument]) -> Result<u64> {
        let handle = self.handle()?;
        let options = InsertManyOptions::builder().ordered(false).build();

        let result = handle
            .collection
            .insert_many(documents.iter().map(to_bson), options)
            .await?;

        Ok(result.inserted_ids.len() as u64)
    }

    async fn count_documents(&self) -> Result<u64> {
        Ok(self.handle()?.collection.count_documents(doc! {}, None).await?)
    }

    async fn count_by_category(&self) -> Result<BTreeMap<String, u64>> {
        let pipeline = vec![doc! {
            "$group": {
                "_id": format!("${}", fields::CATEGORY),
                "count": { "$sum": 1 },
            }
        }];

        let mut cursor = self.handle()?.collection.aggregate(pipeline, None).await?;
        let mut counts = BTreeMap::new();

        while let Some(group) = cursor.try_next().await? {
            let (category, count) = group_count(&group)?;
            counts.insert(category, count);
        }

        Ok(counts)
    }

    async fn ping(&self) -> Result<()> {
        self.handle()?
            .client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }

    async fn list_databases(&self) -> Result<Vec<String>> {
        Ok(self.handle()?.client.list_database_names(None, None).await?)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(handle) = self.handle.take() {
            handle.client.shutdown().await;
            info!("MongoDB connection closed");
        }
        Ok(())
    }
}
