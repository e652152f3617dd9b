use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::sync::slot::{
    NoticeHub, StateSlot, StorageNotice, StorageResult, WindowId,
};

use super::{
    config::CouchConfig,
    error::{CouchResult, CouchSlotError},
};

/// Document holding the slot payload; `_id` is the slot key.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SlotDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    rev: Option<String>,
    payload: String,
}

/// Slot kept in CouchDB so it survives restarts and can live on another host.
///
/// Change notices are only raised for writes made through this process.
#[derive(Clone)]
pub struct CouchSlot {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
    notices: NoticeHub,
}

impl CouchSlot {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig, key: &str) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchSlotError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let slot = Self {
            client,
            base_url,
            database,
            auth,
            notices: NoticeHub::new(key),
        };

        slot.ensure_database().await?;
        Ok(slot)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, self.database, path);
        self.authorize(self.client.request(method, url))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.database_url();

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchSlotError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authorize(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchSlotError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                if create.status().is_success() {
                    debug!(%database, "created CouchDB database for the state slot");
                    Ok(())
                } else {
                    Err(CouchSlotError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchSlotError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document(&self) -> CouchResult<Option<SlotDocument>> {
        let doc_id = self.notices.key();
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchSlotError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<SlotDocument>()
                .await
                .map(Some)
                .map_err(|source| CouchSlotError::DecodeResponse {
                    path: doc_id.to_string(),
                    source,
                }),
            other => Err(CouchSlotError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn put_document(&self, document: &SlotDocument) -> CouchResult<StatusCode> {
        let response = self
            .request(Method::PUT, &document.id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchSlotError::RequestSend {
                path: document.id.clone(),
                source,
            })?;

        match response.status() {
            status if status.is_success() || status == StatusCode::CONFLICT => Ok(status),
            other => Err(CouchSlotError::RequestStatus {
                path: document.id.clone(),
                status: other,
            }),
        }
    }

    /// Replace the slot document, refetching the revision once on conflict.
    async fn replace_payload(&self, payload: String) -> CouchResult<()> {
        let mut document = SlotDocument {
            id: self.notices.key().to_string(),
            rev: self.get_document().await?.and_then(|doc| doc.rev),
            payload,
        };

        if self.put_document(&document).await? != StatusCode::CONFLICT {
            return Ok(());
        }

        warn!(doc_id = %document.id, "slot document changed concurrently, retrying");
        document.rev = self.get_document().await?.and_then(|doc| doc.rev);
        match self.put_document(&document).await? {
            StatusCode::CONFLICT => Err(CouchSlotError::RequestStatus {
                path: document.id,
                status: StatusCode::CONFLICT,
            }),
            _ => Ok(()),
        }
    }
}

impl StateSlot for CouchSlot {
    fn key(&self) -> &str {
        self.notices.key()
    }

    fn read(&self) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let slot = self.clone();
        Box::pin(async move {
            let document = slot.get_document().await?;
            Ok(document.map(|doc| doc.payload))
        })
    }

    fn write(&self, origin: WindowId, payload: String) -> BoxFuture<'static, StorageResult<()>> {
        let slot = self.clone();
        Box::pin(async move {
            slot.replace_payload(payload).await?;
            slot.notices.notify(origin);
            Ok(())
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageNotice> {
        self.notices.subscribe()
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let slot = self.clone();
        Box::pin(async move { slot.ensure_database().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_document_uses_couch_field_names() {
        let doc = SlotDocument {
            id: "design-patterns-game-state".into(),
            rev: None,
            payload: "{}".into(),
        };
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["_id"], "design-patterns-game-state");
        assert!(value.get("_rev").is_none());
        assert_eq!(value["payload"], "{}");

        let parsed: SlotDocument = serde_json::from_value(serde_json::json!({
            "_id": "k",
            "_rev": "3-abc",
            "payload": "x"
        }))
        .unwrap();
        assert_eq!(parsed.rev.as_deref(), Some("3-abc"));
    }
}
