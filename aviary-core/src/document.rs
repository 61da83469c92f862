//! Core types for document representation and serialization.
//!
//! Documents are schema-less. At the edge facing clients they are an ordered
//! [`Fields`] map of JSON values; at the edge facing the store they are BSON documents
//! carrying the store-assigned `_id`. This module converts between the two.

use bson::{
    Bson, Document as BsonDocument, de::deserialize_from_bson, oid::ObjectId,
    ser::serialize_to_bson,
};
use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::{Map, Value};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// The store's native identifier: a 12-byte object id, written as 24 hex digits.
pub type DocumentId = ObjectId;

/// An ordered, schema-less mapping from field name to value.
pub type Fields = Map<String, Value>;

/// The field name under which the store keeps the identifier.
pub const STORE_ID_FIELD: &str = "_id";

/// The field name under which the identifier is exposed to clients.
pub const ID_FIELD: &str = "id";

/// Parses an externally supplied identifier string into a [`DocumentId`].
///
/// # Errors
///
/// Returns [`DocumentStoreError::InvalidId`] if `raw` is not a 24 digit hex string.
pub fn parse_id(raw: &str) -> DocumentStoreResult<DocumentId> {
    DocumentId::parse_str(raw).map_err(|_| DocumentStoreError::InvalidId(raw.to_string()))
}

/// A stored document: its assigned identifier plus its fields.
///
/// Serializes as a flat object with `id` (hex string) first, followed by the fields
/// in their stored order.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: DocumentId,
    fields: Fields,
}

impl Document {
    pub fn new(id: DocumentId, fields: Fields) -> Self {
        Self { id, fields }
    }

    /// Returns the identifier assigned by the store.
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Returns the value of a single field, if present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// Builds a document from a raw store document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidDocument`] if the `_id` field is missing or
    /// is not an object id, or a serialization error if a value has no JSON form.
    pub fn from_bson(mut raw: BsonDocument) -> DocumentStoreResult<Self> {
        let id = match raw.remove(STORE_ID_FIELD) {
            Some(Bson::ObjectId(id)) => id,
            Some(other) => {
                return Err(DocumentStoreError::InvalidDocument(format!(
                    "expected object id in {STORE_ID_FIELD}, found {other}"
                )));
            }
            None => {
                return Err(DocumentStoreError::InvalidDocument(format!(
                    "missing {STORE_ID_FIELD}"
                )));
            }
        };

        Ok(Self {
            id,
            fields: deserialize_from_bson(Bson::Document(raw))?,
        })
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(ID_FIELD, &self.id.to_hex())?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Converts client-supplied fields into a BSON document for the store.
///
/// Identifier fields (`id` and `_id`) are dropped: the identifier is assigned by the
/// store and never changes afterwards.
///
/// # Errors
///
/// Returns [`DocumentStoreError::InvalidFields`] if a value cannot be represented in
/// BSON (for example an unsigned integer above `i64::MAX`).
pub fn fields_to_bson(fields: Fields) -> DocumentStoreResult<BsonDocument> {
    let writable: Fields = fields
        .into_iter()
        .filter(|(key, _)| key != ID_FIELD && key != STORE_ID_FIELD)
        .collect();

    let converted = serialize_to_bson(&writable)
        .map_err(|err| DocumentStoreError::InvalidFields(err.to_string()))?;
    match converted {
        Bson::Document(document) => Ok(document),
        other => Err(DocumentStoreError::Serialization(format!(
            "expected a document, found {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use serde_json::json;

    #[test]
    fn parse_id_accepts_hex_and_rejects_garbage() {
        let id = ObjectId::new();

        assert_eq!(parse_id(&id.to_hex()).unwrap(), id);
        assert!(matches!(parse_id("not-an-id"), Err(DocumentStoreError::InvalidId(raw)) if raw == "not-an-id"));
        assert!(matches!(parse_id(""), Err(DocumentStoreError::InvalidId(_))));
        // one digit short
        assert!(matches!(
            parse_id(&id.to_hex()[1..]),
            Err(DocumentStoreError::InvalidId(_))
        ));
    }

    #[test]
    fn serializes_id_first_as_hex() {
        let id = ObjectId::new();
        let fields = json!({ "name": "robin", "wingspan": 22 })
            .as_object()
            .cloned()
            .unwrap();
        let document = Document::new(id, fields);

        let rendered = serde_json::to_string(&document).unwrap();

        assert_eq!(
            rendered,
            format!(r#"{{"id":"{}","name":"robin","wingspan":22}}"#, id.to_hex())
        );
    }

    #[test]
    fn from_bson_requires_object_id() {
        let missing = Document::from_bson(doc! { "name": "robin" });
        let wrong = Document::from_bson(doc! { "_id": "abc", "name": "robin" });

        assert!(matches!(missing, Err(DocumentStoreError::InvalidDocument(_))));
        assert!(matches!(wrong, Err(DocumentStoreError::InvalidDocument(_))));
    }

    #[test]
    fn from_bson_keeps_nested_values() {
        let id = ObjectId::new();
        let document = Document::from_bson(doc! {
            "_id": id,
            "name": "robin",
            "tags": ["red", "small"],
            "nest": { "height": 2.5, "occupied": true },
            "note": Bson::Null,
        })
        .unwrap();

        assert_eq!(document.id(), &id);
        assert_eq!(
            Value::Object(document.into_fields()),
            json!({
                "name": "robin",
                "tags": ["red", "small"],
                "nest": { "height": 2.5, "occupied": true },
                "note": null,
            })
        );
    }

    #[test]
    fn fields_to_bson_drops_identifier_fields() {
        let fields = json!({ "id": "x", "_id": "y", "name": "robin" })
            .as_object()
            .cloned()
            .unwrap();

        assert_eq!(fields_to_bson(fields).unwrap(), doc! { "name": "robin" });
    }

    #[test]
    fn fields_to_bson_rejects_integers_beyond_i64() {
        let fields = json!({ "name": "robin", "sightings": u64::MAX })
            .as_object()
            .cloned()
            .unwrap();

        assert!(matches!(
            fields_to_bson(fields),
            Err(DocumentStoreError::InvalidFields(_))
        ));
    }
}
