//! Task records as stored in the `taskBody` collection
//!
//! The collection is schemaless and written by an external ingestion process,
//! so a task is kept as its raw BSON document with typed accessors for the
//! fields this crate reads. Fields nobody here knows about survive untouched
//! when a task is re-serialized for a feed.

use mongodb::bson::{oid::ObjectId, Bson, Document};
use serde_json::{Map, Value};

/// Default collection holding task records
pub const COLLECTION: &str = "taskBody";

/// Field names used by the dashboard
pub mod fields {
    pub const ID: &str = "_id";
    pub const SUBJECT: &str = "subject";
    pub const SENDER: &str = "sender";
    pub const CC: &str = "cc";
    pub const STATUS: &str = "status";
    pub const REPLIES: &str = "replies";
    pub const ACTUAL_ROUND: &str = "actualRound";
    pub const CURRENT_ROUND: &str = "currentRound";
    pub const LEGACY_ROUND: &str = "Interview Round";
    pub const RECEIVED_DATE_TIME: &str = "receivedDateTime";
    pub const DATE_OF_INTERVIEW: &str = "Date of Interview";
    pub const CANDIDATE_NAME: &str = "Candidate Name";
    pub const TECHNOLOGY: &str = "Technology";
    pub const START_TIME: &str = "Start Time Of Interview";
}

/// One task document
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    doc: Document,
}

impl TaskRecord {
    pub fn new(doc: Document) -> Self {
        Self { doc }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    /// String value of a top-level field; non-string values read as absent
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.doc.get_str(key).ok()
    }

    pub fn id(&self) -> Option<&Bson> {
        self.doc.get(fields::ID)
    }

    /// The identifier as the dashboard shows it (ObjectId hex or the raw string)
    pub fn id_string(&self) -> Option<String> {
        match self.id()? {
            Bson::ObjectId(oid) => Some(oid.to_hex()),
            Bson::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn subject(&self) -> Option<&str> {
        self.str_field(fields::SUBJECT)
    }

    pub fn sender(&self) -> Option<&str> {
        self.str_field(fields::SENDER)
    }

    /// CC addresses; non-string entries are skipped
    pub fn cc(&self) -> Vec<&str> {
        self.doc
            .get_array(fields::CC)
            .map(|items| items.iter().filter_map(Bson::as_str).collect())
            .unwrap_or_default()
    }

    pub fn status(&self) -> Option<&str> {
        self.str_field(fields::STATUS)
    }

    pub fn actual_round(&self) -> Option<&str> {
        self.str_field(fields::ACTUAL_ROUND)
    }

    pub fn current_round(&self) -> Option<&str> {
        self.str_field(fields::CURRENT_ROUND)
    }

    pub fn legacy_round(&self) -> Option<&str> {
        self.str_field(fields::LEGACY_ROUND)
    }

    pub fn received_date_time(&self) -> Option<&str> {
        self.str_field(fields::RECEIVED_DATE_TIME)
    }

    pub fn date_of_interview(&self) -> Option<&str> {
        self.str_field(fields::DATE_OF_INTERVIEW)
    }

    pub fn candidate_name(&self) -> Option<&str> {
        self.str_field(fields::CANDIDATE_NAME)
    }

    pub fn technology(&self) -> Option<&str> {
        self.str_field(fields::TECHNOLOGY)
    }

    pub fn start_time(&self) -> Option<&str> {
        self.str_field(fields::START_TIME)
    }

    /// Replies in stored order; entries that are not sub-documents are skipped
    pub fn replies(&self) -> impl Iterator<Item = Reply<'_>> {
        self.doc
            .get_array(fields::REPLIES)
            .map(|items| items.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(Bson::as_document)
            .map(Reply::new)
    }

    /// Plain JSON view of the whole document
    pub fn to_json(&self) -> Value {
        document_to_json(&self.doc)
    }

    /// Plain JSON object of the whole document
    pub fn to_json_map(&self) -> Map<String, Value> {
        document_to_map(&self.doc)
    }
}

impl From<Document> for TaskRecord {
    fn from(doc: Document) -> Self {
        Self::new(doc)
    }
}

/// Borrowed view of one entry in a task's reply thread
#[derive(Debug, Clone, Copy)]
pub struct Reply<'a> {
    doc: &'a Document,
}

impl<'a> Reply<'a> {
    fn new(doc: &'a Document) -> Self {
        Self { doc }
    }

    pub fn sender(&self) -> Option<&'a str> {
        self.doc.get_str("sender").ok()
    }

    pub fn date(&self) -> Option<&'a str> {
        self.doc.get_str("date").ok()
    }

    pub fn body(&self) -> Option<&'a str> {
        self.doc.get_str("body").ok()
    }

    pub fn snippet(&self) -> Option<&'a str> {
        self.doc.get_str("snippet").ok()
    }
}

/// Identifier as it should appear in an `_id` filter
///
/// 24-character hex strings are matched as ObjectIds, anything else as a
/// plain string id.
pub fn id_to_bson(id: &str) -> Bson {
    ObjectId::parse_str(id)
        .map(Bson::ObjectId)
        .unwrap_or_else(|_| Bson::String(id.to_string()))
}

/// Convert a BSON value to the JSON shape the dashboard consumes
///
/// ObjectIds become hex strings and datetimes RFC 3339 strings; everything
/// else follows relaxed extended JSON.
pub fn bson_to_json(value: &Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => dt
            .try_to_rfc3339_string()
            .map(Value::String)
            .unwrap_or_else(|_| Value::from(dt.timestamp_millis())),
        Bson::Document(doc) => document_to_json(doc),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        other => other.clone().into_relaxed_extjson(),
    }
}

pub fn document_to_json(doc: &Document) -> Value {
    Value::Object(document_to_map(doc))
}

fn document_to_map(doc: &Document) -> Map<String, Value> {
    doc.iter()
        .map(|(key, value)| (key.clone(), bson_to_json(value)))
        .collect()
}
