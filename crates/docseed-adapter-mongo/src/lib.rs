use async_trait::async_trait;
use docseed_core::{
    CollectionSpec, IndexDescriptor, IndexDirection, IndexKey, IndexSpec, UserSpec,
};
use docseed_runtime::{DatabaseHandle, HandleError};
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, IndexModel};
use std::time::Duration;

pub mod errors;

#[derive(Debug, Clone)]
pub struct MongoHandleOptions {
    pub app_name: String,
    pub server_selection_timeout: Duration,
}

impl Default for MongoHandleOptions {
    fn default() -> Self {
        Self {
            app_name: "docseed".to_string(),
            server_selection_timeout: Duration::from_secs(10),
        }
    }
}

/// [`DatabaseHandle`] backed by a single MongoDB client.
///
/// MongoDB creates collections implicitly on first index, so an index
/// directive ahead of its collection directive succeeds.
pub struct MongoHandle {
    client: Client,
}

impl MongoHandle {
    /// Connect and verify the deployment answers `ping`.
    pub async fn connect(uri: &str, options: MongoHandleOptions) -> anyhow::Result<Self> {
        let mut client_options = ClientOptions::parse(uri).await?;
        client_options.app_name = Some(options.app_name);
        client_options.server_selection_timeout = Some(options.server_selection_timeout);

        let client = Client::with_options(client_options)?;
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;

        tracing::info!("Connected to MongoDB");
        Ok(Self { client })
    }

    /// Release the client and its connections.
    pub async fn close(self) {
        self.client.shutdown().await;
        tracing::debug!("MongoDB client shut down");
    }
}

#[async_trait]
impl DatabaseHandle for MongoHandle {
    async fn create_user(&self, user: &UserSpec) -> Result<(), HandleError> {
        let roles: Vec<Bson> = user
            .roles
            .iter()
            .map(|r| Bson::Document(doc! { "role": r.role.as_str(), "db": r.database.as_str() }))
            .collect();

        self.client
            .database(&user.database)
            .run_command(doc! {
                "createUser": user.username.as_str(),
                "pwd": user.password.as_str(),
                "roles": roles,
            })
            .await
            .map_err(errors::from_driver)?;
        Ok(())
    }

    async fn create_collection(&self, collection: &CollectionSpec) -> Result<(), HandleError> {
        self.client
            .database(&collection.database)
            .create_collection(&collection.name)
            .await
            .map_err(errors::from_driver)
    }

    async fn create_index(&self, index: &IndexSpec) -> Result<(), HandleError> {
        let options = IndexOptions::builder()
            .name(index.resolved_name())
            .unique(index.unique)
            .build();
        let model = IndexModel::builder()
            .keys(keys_to_document(&index.keys))
            .options(options)
            .build();

        self.client
            .database(&index.database)
            .collection::<Document>(&index.collection)
            .create_index(model)
            .await
            .map_err(errors::from_driver)?;
        Ok(())
    }

    async fn list_indexes(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<Vec<IndexDescriptor>, HandleError> {
        let cursor = match self
            .client
            .database(database)
            .collection::<Document>(collection)
            .list_indexes()
            .await
        {
            Ok(cursor) => cursor,
            Err(e) => {
                return match errors::from_driver(e) {
                    // No collection yet, so no indexes.
                    HandleError::MissingDependency(_) => Ok(Vec::new()),
                    other => Err(other),
                };
            }
        };

        let models: Vec<IndexModel> = cursor.try_collect().await.map_err(errors::from_driver)?;

        let mut descriptors = Vec::with_capacity(models.len());
        for model in models {
            let options = model.options.unwrap_or_default();
            let name = options.name.unwrap_or_default();
            match keys_from_document(&model.keys) {
                Some(keys) => descriptors.push(IndexDescriptor {
                    name,
                    keys,
                    unique: options.unique.unwrap_or(false),
                }),
                None => {
                    // text/hashed/geo indexes; the server still rejects name clashes.
                    tracing::debug!(index = %name, "Skipping index with non-directional keys");
                }
            }
        }
        Ok(descriptors)
    }

    async fn user_exists(&self, database: &str, username: &str) -> Result<bool, HandleError> {
        let reply = self
            .client
            .database(database)
            .run_command(doc! { "usersInfo": { "user": username, "db": database } })
            .await
            .map_err(errors::from_driver)?;

        Ok(reply
            .get_array("users")
            .map(|users| !users.is_empty())
            .unwrap_or(false))
    }

    async fn collection_exists(&self, database: &str, name: &str) -> Result<bool, HandleError> {
        let names = self
            .client
            .database(database)
            .list_collection_names()
            .filter(doc! { "name": name })
            .await
            .map_err(errors::from_driver)?;
        Ok(names.iter().any(|n| n == name))
    }
}

/// Ordered key document, e.g. `{ "a": 1, "b": -1 }`.
pub fn keys_to_document(keys: &[IndexKey]) -> Document {
    let mut document = Document::new();
    for key in keys {
        document.insert(key.field.clone(), key.direction.as_i32());
    }
    document
}

/// Read an index key document back. Returns `None` for non-directional
/// keys such as `"text"` or `"2dsphere"`.
pub fn keys_from_document(document: &Document) -> Option<Vec<IndexKey>> {
    let mut keys = Vec::with_capacity(document.len());
    for (field, value) in document {
        let n = match value {
            Bson::Int32(n) => *n as f64,
            Bson::Int64(n) => *n as f64,
            Bson::Double(n) => *n,
            _ => return None,
        };
        let direction = if n < 0.0 {
            IndexDirection::Descending
        } else {
            IndexDirection::Ascending
        };
        keys.push(IndexKey {
            field: field.clone(),
            direction,
        });
    }
    Some(keys)
}
