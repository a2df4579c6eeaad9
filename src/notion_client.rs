use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{Map, Value, json};

const NOTION_VERSION_HEADER: &str = "Notion-Version";

#[derive(Clone)]
pub struct NotionClient {
    http_client: Client,
    base_url: Url,
    api_version: String,
    api_token: SecretString,
    database_id: String,
}

#[derive(thiserror::Error, Debug)]
pub enum NotionApiError {
    #[error("Notion responded with {status}")]
    Upstream { status: StatusCode, body: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct CreateRecordRequest<'a> {
    parent: RecordParent<'a>,
    properties: &'a Map<String, Value>,
}

#[derive(Serialize)]
struct RecordParent<'a> {
    database_id: &'a str,
}

impl NotionClient {
    pub fn new(
        base_url: String,
        api_version: String,
        api_token: SecretString,
        database_id: String,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client: Client::builder().timeout(timeout).build().unwrap(),
            base_url: Url::parse(&base_url).expect("Failed parsing base Notion api url."),
            api_version,
            api_token,
            database_id,
        }
    }

    /// Reads the destination database's current property schema. Read fresh
    /// on every call: the database owner can reshape it at any time.
    pub async fn database_schema(&self) -> Result<DatabaseSchema, NotionApiError> {
        let url = self
            .base_url
            .join(&format!("v1/databases/{}", self.database_id))
            .expect("Failed joining route to Notion api url.");

        let response = self
            .http_client
            .get(url)
            .header(
                "Authorization",
                "Bearer ".to_owned() + self.api_token.expose_secret(),
            )
            .header(NOTION_VERSION_HEADER, &self.api_version)
            .send()
            .await?;

        let response = reject_upstream_error(response).await?;
        Ok(response.json().await?)
    }

    /// Creates one record parented under the configured database. A single
    /// attempt, no retry.
    pub async fn create_record(
        &self,
        properties: &Map<String, Value>,
    ) -> Result<(), NotionApiError> {
        let url = self
            .base_url
            .join("v1/pages")
            .expect("Failed joining route to Notion api url.");

        let body = CreateRecordRequest {
            parent: RecordParent {
                database_id: &self.database_id,
            },
            properties,
        };

        let response = self
            .http_client
            .post(url)
            .header(
                "Authorization",
                "Bearer ".to_owned() + self.api_token.expose_secret(),
            )
            .header(NOTION_VERSION_HEADER, &self.api_version)
            .json(&body)
            .send()
            .await?;

        reject_upstream_error(response).await?;
        Ok(())
    }
}

async fn reject_upstream_error(response: Response) -> Result<Response, NotionApiError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(NotionApiError::Upstream { status, body })
}

/// Property kinds the intake flow can encode directly. Anything else is
/// opaque and handled through the rich_text fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Email,
    Title,
    RichText,
    Other,
}

impl PropertyKind {
    fn of(property: &Value) -> Self {
        match property.get("type").and_then(Value::as_str) {
            Some("email") => Self::Email,
            Some("title") => Self::Title,
            Some("rich_text") => Self::RichText,
            _ => Self::Other,
        }
    }
}

/// The destination database's property schema, in declaration order.
#[derive(Debug, Default, serde::Deserialize)]
pub struct DatabaseSchema {
    #[serde(default)]
    properties: Map<String, Value>,
}

impl DatabaseSchema {
    pub fn kind_of(&self, name: &str) -> Option<PropertyKind> {
        self.properties.get(name).map(PropertyKind::of)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, PropertyKind)> {
        self.properties
            .iter()
            .map(|(name, value)| (name.as_str(), PropertyKind::of(value)))
    }
}

/// How the resolved property wraps the subscriber's address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueEncoding {
    Email,
    Title,
    RichText,
}

impl ValueEncoding {
    pub fn encode(self, content: &str) -> Value {
        match self {
            Self::Email => json!({ "email": content }),
            Self::Title => json!({ "title": [{ "text": { "content": content } }] }),
            Self::RichText => json!({ "rich_text": [{ "text": { "content": content } }] }),
        }
    }
}

/// Picks the property a new subscription record writes to, in order of
/// preference: a property literally named `Email`, then the first
/// email-kind property, then the first title-kind property, then the first
/// property of any kind. `None` for a schema with no properties.
pub fn resolve_target_property(schema: &DatabaseSchema) -> Option<(&str, ValueEncoding)> {
    if let Some(kind) = schema.kind_of("Email") {
        let encoding = match kind {
            PropertyKind::Email => ValueEncoding::Email,
            PropertyKind::Title => ValueEncoding::Title,
            PropertyKind::RichText | PropertyKind::Other => ValueEncoding::RichText,
        };
        return Some(("Email", encoding));
    }

    let first_of_kind = |kind: PropertyKind| {
        schema
            .properties()
            .find(|(_, k)| *k == kind)
            .map(|(name, _)| name)
    };

    if let Some(name) = first_of_kind(PropertyKind::Email) {
        return Some((name, ValueEncoding::Email));
    }
    if let Some(name) = first_of_kind(PropertyKind::Title) {
        return Some((name, ValueEncoding::Title));
    }

    // Last resort: the first property of whatever kind, as rich_text. The
    // write may still be rejected upstream if the kind is incompatible.
    schema
        .properties()
        .next()
        .map(|(name, _)| (name, ValueEncoding::RichText))
}

/// Builds the single-property payload for a new subscription record. An
/// empty schema produces an empty payload and the create call is left to
/// reject it.
pub fn subscription_properties(schema: &DatabaseSchema, email: &str) -> Map<String, Value> {
    let mut properties = Map::new();
    if let Some((name, encoding)) = resolve_target_property(schema) {
        properties.insert(name.to_owned(), encoding.encode(email));
    }
    properties
}
