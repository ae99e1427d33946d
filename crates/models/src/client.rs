use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::resource::{DocumentId, Resource, ResourceKind};

/// Uploaded media file reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Media {
    pub id: i64,
    pub url: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Client {
    pub id: i64,
    #[serde(rename = "documentId")]
    pub document_id: DocumentId,
    pub title: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub avatar: Option<Media>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct ClientDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ClientDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }
}

impl Resource for Client {
    const KIND: ResourceKind = ResourceKind::Clients;
    type Draft = ClientDraft;

    fn id(&self) -> i64 {
        self.id
    }

    fn document_id(&self) -> &DocumentId {
        &self.document_id
    }
}
