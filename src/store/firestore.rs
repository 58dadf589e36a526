//! A [`DocumentStore`] backed by the Cloud Firestore REST API

use std::error::Error;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::RequestBuilder;
use serde_json::{json, Map};

use crate::config::Settings;
use crate::document::{Direction, Document, DocumentId, FieldOp, Fields, Query, Value};
use crate::error::{StoreError, StoreOperation};
use crate::resource::Resource;
use crate::traits::DocumentStore;


/// A Firestore database, reached over HTTPS
pub struct FirestoreClient {
    resource: Resource,
    http: reqwest::Client,
}

impl FirestoreClient {
    /// Create a client. This does not start a connection
    pub fn new(resource: Resource) -> Self {
        Self { resource, http: reqwest::Client::new() }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, Box<dyn Error>> {
        let url = settings.documents_url()?;
        Ok(Self::new(Resource::new(url, settings.api_key.clone())))
    }

    pub fn resource(&self) -> &Resource { &self.resource }

    async fn send(&self, operation: StoreOperation, request: RequestBuilder) -> Result<serde_json::Value, StoreError> {
        let request = match self.resource.api_key() {
            None => request,
            Some(key) => request.query(&[("key", key)]),
        };

        let response = request.send().await
            .map_err(|err| StoreError::new(operation, err))?;

        let status = response.status();
        if status.is_success() == false {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::new(operation, format!("Unexpected HTTP status code {:?}: {}", status, body)));
        }

        response.json().await
            .map_err(|err| StoreError::new(operation, err))
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn create(&self, collection: &str, fields: Fields) -> Result<DocumentId, StoreError> {
        let request = self.http
            .post(self.resource.collection_url(collection))
            .json(&json!({ "fields": encode_fields(&fields) }));

        let reply = self.send(StoreOperation::Create, request).await?;
        let document = decode_document(&reply)
            .map_err(|err| StoreError::new(StoreOperation::Create, err))?;
        log::debug!("Created document {} in {}", document.id(), collection);
        Ok(document.id().clone())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let body = json!({ "structuredQuery": structured_query(collection, query) });
        log::trace!("Running query {}", body);
        let request = self.http
            .post(self.resource.combine(":runQuery"))
            .json(&body);

        let reply = self.send(StoreOperation::Query, request).await?;
        decode_run_query_reply(&reply)
            .map_err(|err| StoreError::new(StoreOperation::Query, err))
    }

    async fn update(&self, collection: &str, id: &DocumentId, fields: Fields) -> Result<(), StoreError> {
        let mut params: Vec<(&str, &str)> = fields.keys()
            .map(|name| ("updateMask.fieldPaths", name.as_str()))
            .collect();
        params.push(("currentDocument.exists", "true"));

        let request = self.http
            .patch(self.resource.document_url(collection, id.as_str()))
            .query(&params)
            .json(&json!({ "fields": encode_fields(&fields) }));

        self.send(StoreOperation::Update, request).await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError> {
        let request = self.http
            .delete(self.resource.document_url(collection, id.as_str()))
            .query(&[("currentDocument.exists", "true")]);

        self.send(StoreOperation::Delete, request).await?;
        Ok(())
    }
}


/// Encode a value the way Firestore types it on the wire
pub fn encode_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Boolean(b) => json!({ "booleanValue": b }),
        // 64-bit integers are sent as strings
        Value::Integer(i) => json!({ "integerValue": i.to_string() }),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Timestamp(t) => json!({ "timestampValue": t.to_rfc3339_opts(SecondsFormat::AutoSi, true) }),
    }
}

/// Decode a Firestore typed value. Unsupported kinds read as `Value::Null`
pub fn decode_value(raw: &serde_json::Value) -> Value {
    let object = match raw.as_object() {
        Some(o) => o,
        None => {
            log::warn!("Malformed value {}. Ignoring it", raw);
            return Value::Null;
        },
    };

    if let Some(b) = object.get("booleanValue").and_then(|b| b.as_bool()) {
        return Value::Boolean(b);
    }
    if let Some(s) = object.get("stringValue").and_then(|s| s.as_str()) {
        return Value::String(s.to_string());
    }
    if let Some(i) = object.get("integerValue") {
        let parsed = match i {
            serde_json::Value::String(s) => s.parse().ok(),
            other => other.as_i64(),
        };
        if let Some(i) = parsed {
            return Value::Integer(i);
        }
    }
    if let Some(t) = object.get("timestampValue").and_then(|t| t.as_str()) {
        match DateTime::parse_from_rfc3339(t) {
            Ok(t) => return Value::Timestamp(t.with_timezone(&Utc)),
            Err(err) => log::warn!("Invalid timestamp {:?}: {}", t, err),
        }
    }
    if object.contains_key("nullValue") == false {
        log::warn!("Unsupported value {}. Reading it as null", raw);
    }
    Value::Null
}

pub fn encode_fields(fields: &Fields) -> serde_json::Value {
    let map: Map<String, serde_json::Value> = fields.iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect();
    serde_json::Value::Object(map)
}

/// Decode a Firestore `Document` resource.
///
/// Its id is the last segment of its `name` (`projects/../documents/<collection>/<id>`)
pub fn decode_document(raw: &serde_json::Value) -> Result<Document, String> {
    let name = raw.get("name")
        .and_then(|n| n.as_str())
        .ok_or_else(|| format!("No name in document {}", raw))?;
    let id = match name.rsplit('/').next() {
        Some(id) if id.is_empty() == false => DocumentId::from(id),
        _ => return Err(format!("Invalid document name {:?}", name)),
    };

    let mut fields = Fields::new();
    if let Some(raw_fields) = raw.get("fields").and_then(|f| f.as_object()) {
        for (field_name, raw_value) in raw_fields {
            fields.insert(field_name.clone(), decode_value(raw_value));
        }
    }
    Ok(Document::new(id, fields))
}

/// A `runQuery` reply is a list of results. Results without a `document` only carry a read time.
pub fn decode_run_query_reply(raw: &serde_json::Value) -> Result<Vec<Document>, String> {
    let results = raw.as_array()
        .ok_or_else(|| format!("Unexpected runQuery reply {}", raw))?;

    let mut documents = Vec::new();
    for result in results {
        if let Some(document) = result.get("document") {
            documents.push(decode_document(document)?);
        }
    }
    Ok(documents)
}

fn op_name(op: FieldOp) -> &'static str {
    match op {
        FieldOp::Equal => "EQUAL",
        FieldOp::LessThan => "LESS_THAN",
        FieldOp::LessOrEqual => "LESS_THAN_OR_EQUAL",
        FieldOp::GreaterThan => "GREATER_THAN",
        FieldOp::GreaterOrEqual => "GREATER_THAN_OR_EQUAL",
    }
}

/// Build the `structuredQuery` of a `runQuery` request
pub fn structured_query(collection: &str, query: &Query) -> serde_json::Value {
    let mut structured = json!({
        "from": [ { "collectionId": collection } ],
    });

    let mut filters: Vec<serde_json::Value> = query.filters.iter()
        .map(|f| json!({
            "fieldFilter": {
                "field": { "fieldPath": f.field },
                "op": op_name(f.op),
                "value": encode_value(&f.value),
            }
        }))
        .collect();
    let filter = match filters.len() {
        0 => None,
        1 => filters.pop(),
        _ => Some(json!({ "compositeFilter": { "op": "AND", "filters": filters } })),
    };
    if let Some(filter) = filter {
        structured["where"] = filter;
    }

    if let Some(order) = &query.order_by {
        let direction = match order.direction {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        };
        structured["orderBy"] = json!([ { "field": { "fieldPath": order.field }, "direction": direction } ]);
    }
    structured
}
