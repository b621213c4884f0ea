// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Course records.
//!
//! The backend owns the course schema, so record fields are kept as an open
//! JSON object. Only the identifier is typed; `title` gets an accessor
//! because every view of the catalog shows it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::id::{RecordId, ServerId};

/// Field map of a course record (everything except its id).
pub type Fields = Map<String, Value>;

const ID_FIELD: &str = "id";
const TITLE_FIELD: &str = "title";

/// A course record as stored by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: ServerId,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Course {
    pub fn new(id: ServerId, fields: Fields) -> Self {
        Course { id, fields: without_id(fields) }
    }

    pub fn title(&self) -> Option<&str> {
        self.fields.get(TITLE_FIELD).and_then(Value::as_str)
    }
}

/// A course record as served to readers of the catalog.
///
/// `confirmed` is false when the record, or some change to it, exists
/// only in the pending operation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseView {
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: Fields,
    pub confirmed: bool,
}

impl CourseView {
    pub fn title(&self) -> Option<&str> {
        self.fields.get(TITLE_FIELD).and_then(Value::as_str)
    }
}

impl From<Course> for CourseView {
    fn from(course: Course) -> Self {
        CourseView { id: RecordId::Server(course.id), fields: course.fields, confirmed: true }
    }
}

/// Returns the fields with any `id` entry removed.
///
/// Ids are carried by the typed wrapper; a stray `id` in the field map would
/// otherwise leak a placeholder into a request body.
pub fn without_id(mut fields: Fields) -> Fields {
    fields.remove(ID_FIELD);
    fields
}

/// Shallow-merges `patch` over `target`. Keys in the patch win.
pub fn merge_patch(target: &mut Fields, patch: &Fields) {
    for (key, value) in patch {
        if key == ID_FIELD {
            continue;
        }
        target.insert(key.clone(), value.clone());
    }
}

/// Converts a JSON value into a field map.
pub fn fields_from_value(value: Value) -> Result<Fields> {
    match value {
        Value::Object(map) => Ok(without_id(map)),
        other => Err(Error::NotAnObject(json_kind(&other).to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "course_tests.rs"]
mod tests;
