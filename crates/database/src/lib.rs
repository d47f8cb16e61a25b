use async_trait::async_trait;
use mongodb::{
    bson::{doc, Document as BsonDocument},
    error::Error as MongoError,
    options::{ClientOptions, ReturnDocument},
    Client, Collection, Database,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// A trait that ensures the entity has an `id` field.
pub trait Identifiable {
    fn id(&self) -> Option<String>;
}

/// Definition of custom errors for repository operations.
#[derive(Debug, Serialize, Deserialize, Error, PartialEq, Eq, Clone)]
pub enum RepositoryError {
    #[error("generic: {0}")]
    Generic(String),
    #[error("missing identifier")]
    MissingIdentifier,
    #[error("target not found")]
    TargetNotFound,
}

/// Connect to a MongoDB deployment and get a handle to a database.
///
/// The deployment is pinged once so that an unreachable server is
/// reported here rather than on the first query.
pub async fn connect(mongo_uri: &str, mongo_dbn: &str) -> Result<Database, RepositoryError> {
    let client_options = ClientOptions::parse(mongo_uri).await?;
    let client = Client::with_options(client_options)?;

    let db = client.database(mongo_dbn);
    db.run_command(doc! {"ping": 1}).await?;

    tracing::info!("connected to MongoDB database {mongo_dbn}");
    Ok(db)
}

/// Definition of a trait for repository operations.
#[async_trait]
pub trait Repository<Entity>: Sync + Send
where
    Entity: Sized + Clone + Send + Sync + 'static,
    Entity: Identifiable + Unpin,
    Entity: Serialize + for<'de> Deserialize<'de>,
{
    fn get_collection(&self) -> Arc<RwLock<Collection<Entity>>>;

    /// Retrieves all entities in natural order.
    async fn find_all(&self) -> Result<Vec<Entity>, RepositoryError> {
        self.find_all_by(doc! {}, None).await
    }

    /// Counts all entities by filter.
    async fn count_by(&self, filter: BsonDocument) -> Result<usize, RepositoryError> {
        let collection = self.get_collection();

        // Lock the Mutex and get the Collection
        let collection = collection.read().await;
        collection
            .count_documents(filter)
            .await?
            .try_into()
            .map_err(|_| RepositoryError::Generic("count overflow".to_owned()))
    }

    async fn find_one(&self, id: &str) -> Result<Option<Entity>, RepositoryError> {
        self.find_one_by(doc! {"_id": id}).await
    }

    async fn find_one_by(&self, filter: BsonDocument) -> Result<Option<Entity>, RepositoryError> {
        let collection = self.get_collection();

        // Lock the Mutex and get the Collection
        let collection = collection.read().await;
        Ok(collection.find_one(filter).await?)
    }

    async fn find_all_by(
        &self,
        filter: BsonDocument,
        limit: Option<i64>,
    ) -> Result<Vec<Entity>, RepositoryError> {
        let mut entities = Vec::new();
        let collection = self.get_collection();

        // Lock the Mutex and get the Collection
        let collection = collection.read().await;

        let mut find = collection.find(filter);
        if let Some(limit) = limit {
            find = find.limit(limit);
        }

        let mut cursor = find.await?;
        while cursor.advance().await? {
            entities.push(cursor.deserialize_current()?);
        }

        Ok(entities)
    }

    /// Stores a new entity.
    ///
    /// Identifiers are assigned by callers, never by the database.
    async fn store(&self, entity: Entity) -> Result<Entity, RepositoryError> {
        if entity.id().is_none() {
            return Err(RepositoryError::MissingIdentifier);
        }
        let collection = self.get_collection();

        // Lock the Mutex and get the Collection
        let collection = collection.read().await;
        collection.insert_one(&entity).await?;

        Ok(entity)
    }

    /// Applies a `$set` of the given fields and returns the updated entity.
    async fn update_fields(
        &self,
        id: &str,
        fields: BsonDocument,
    ) -> Result<Entity, RepositoryError> {
        let collection = self.get_collection();

        // Lock the Mutex and get the Collection
        let collection = collection.read().await;
        collection
            .find_one_and_update(doc! {"_id": id}, doc! {"$set": fields})
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(RepositoryError::TargetNotFound)
    }

    async fn delete_one(&self, id: &str) -> Result<(), RepositoryError> {
        let collection = self.get_collection();

        // Lock the Mutex and get the Collection
        let collection = collection.read().await;
        let metadata = collection.delete_one(doc! {"_id": id}).await?;

        if metadata.deleted_count > 0 {
            Ok(())
        } else {
            Err(RepositoryError::TargetNotFound)
        }
    }
}

impl From<MongoError> for RepositoryError {
    fn from(error: MongoError) -> Self {
        RepositoryError::Generic(error.to_string())
    }
}
