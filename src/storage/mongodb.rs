//! MongoDB storage backend using the official MongoDB async driver.
//!
//! Each `MongoDataService<T>` operates on a collection named after
//! `T::resource_name()` (e.g. "employees", "salary-slips").
//!
//! # Serialization strategy
//!
//! Records are serialized via `serde_json::Value` as an intermediate format,
//! then converted to BSON documents, so UUIDs and dates are stored as
//! strings. The `id` field is mapped to MongoDB's `_id` convention.

use crate::core::{DataService, Entity};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::Database;
use mongodb::bson::{Bson, Document, doc};
use uuid::Uuid;

/// Convert a JSON object into a BSON document, renaming `id` to `_id`
fn json_to_document(json: serde_json::Value) -> Result<Document> {
    let bson_val = mongodb::bson::to_bson(&json)
        .map_err(|e| anyhow!("Failed to convert JSON to BSON: {}", e))?;

    let mut doc = match bson_val {
        Bson::Document(d) => d,
        _ => return Err(anyhow!("Expected BSON document, got non-object")),
    };

    if let Some(id) = doc.remove("id") {
        doc.insert("_id", id);
    }

    Ok(doc)
}

/// Convert a BSON document back into JSON, renaming `_id` to `id`
fn document_to_json(mut doc: Document) -> serde_json::Value {
    if let Some(id) = doc.remove("_id") {
        doc.insert("id", id);
    }

    Bson::Document(doc).into_relaxed_extjson()
}

fn uuid_bson(id: &Uuid) -> Bson {
    Bson::String(id.to_string())
}

/// BSON values a search string may have been stored as
///
/// `("month", "3")` must match the integer 3 and `("active", "true")` the
/// boolean, since records keep their native types in the collection.
fn search_variants(value: &str) -> Vec<Bson> {
    let mut variants = vec![Bson::String(value.to_string())];

    match value {
        "true" => variants.push(Bson::Boolean(true)),
        "false" => variants.push(Bson::Boolean(false)),
        _ => {
            if let Ok(i) = value.parse::<i64>() {
                variants.push(Bson::Int64(i));
                if let Ok(small) = i32::try_from(i) {
                    variants.push(Bson::Int32(small));
                }
            }
            if let Ok(f) = value.parse::<f64>() {
                variants.push(Bson::Double(f));
            }
        }
    }
    variants
}

/// Record storage backed by one MongoDB collection per record type
///
/// # Example
///
/// ```rust,ignore
/// let client = mongodb::Client::with_uri_str("mongodb://localhost:27017").await?;
/// let service = MongoDataService::<Employee>::new(client.database("payroll"));
/// ```
#[derive(Clone, Debug)]
pub struct MongoDataService<T> {
    database: Database,
    _marker: std::marker::PhantomData<T>,
}

impl<T> MongoDataService<T> {
    pub fn new(database: Database) -> Self {
        Self {
            database,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T: Entity> MongoDataService<T> {
    fn collection(&self) -> mongodb::Collection<Document> {
        self.database.collection(T::resource_name())
    }

    fn entity_to_document(entity: &T) -> Result<Document> {
        let json = serde_json::to_value(entity)
            .map_err(|e| anyhow!("Failed to serialize {}: {}", T::resource_name_singular(), e))?;
        json_to_document(json)
    }

    fn document_to_entity(doc: Document) -> Result<T> {
        serde_json::from_value(document_to_json(doc)).map_err(|e| {
            anyhow!(
                "Failed to deserialize {} from document: {}",
                T::resource_name_singular(),
                e
            )
        })
    }

    async fn find(&self, filter: Document) -> Result<Vec<T>> {
        let cursor = self
            .collection()
            .find(filter)
            .sort(doc! { "created_at": 1 })
            .await
            .map_err(|e| anyhow!("Failed to query {}: {}", T::resource_name(), e))?;

        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| anyhow!("Failed to collect {}: {}", T::resource_name(), e))?;

        docs.into_iter().map(Self::document_to_entity).collect()
    }
}

#[async_trait]
impl<T: Entity> DataService<T> for MongoDataService<T> {
    async fn create(&self, entity: T) -> Result<T> {
        let doc = Self::entity_to_document(&entity)?;

        self.collection()
            .insert_one(doc)
            .await
            .map_err(|e| anyhow!("Failed to create {}: {}", T::resource_name_singular(), e))?;

        tracing::debug!(resource = T::resource_name(), id = %entity.id(), "record created");
        Ok(entity)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<T>> {
        let doc = self
            .collection()
            .find_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| anyhow!("Failed to get {}: {}", T::resource_name_singular(), e))?;

        doc.map(Self::document_to_entity).transpose()
    }

    async fn list(&self) -> Result<Vec<T>> {
        self.find(doc! {}).await
    }

    async fn list_by_company(&self, company_id: &Uuid) -> Result<Vec<T>> {
        self.find(doc! { "company_id": uuid_bson(company_id) }).await
    }

    async fn update(&self, id: &Uuid, entity: T) -> Result<T> {
        let doc = Self::entity_to_document(&entity)?;

        let result = self
            .collection()
            .replace_one(doc! { "_id": uuid_bson(id) }, doc)
            .await
            .map_err(|e| anyhow!("Failed to update {}: {}", T::resource_name_singular(), e))?;

        if result.matched_count == 0 {
            return Err(anyhow!("{} {} not found", T::resource_name_singular(), id));
        }

        tracing::debug!(resource = T::resource_name(), %id, "record updated");
        Ok(entity)
    }

    async fn delete(&self, id: &Uuid) -> Result<()> {
        self.collection()
            .delete_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| anyhow!("Failed to delete {}: {}", T::resource_name_singular(), e))?;

        tracing::debug!(resource = T::resource_name(), %id, "record deleted");
        Ok(())
    }

    async fn search(&self, company_id: &Uuid, field: &str, value: &str) -> Result<Vec<T>> {
        let filter = doc! {
            "company_id": uuid_bson(company_id),
            field: { "$in": search_variants(value) },
        };
        self.find(filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_mapped_to_underscore_id() {
        let id = Uuid::new_v4();
        let doc = json_to_document(json!({"id": id.to_string(), "name": "Pune"})).unwrap();
        assert!(doc.contains_key("_id"));
        assert!(!doc.contains_key("id"));

        let back = document_to_json(doc);
        assert_eq!(back["id"], id.to_string());
        assert_eq!(back["name"], "Pune");
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(json_to_document(json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_search_variants() {
        assert_eq!(search_variants("active").len(), 1);
        assert!(search_variants("true").contains(&Bson::Boolean(true)));
        assert!(search_variants("3").contains(&Bson::Int64(3)));
        assert!(search_variants("12.5").contains(&Bson::Double(12.5)));
    }
}
