//! Book model and request payloads.
//!
//! Field names on the wire are camelCase (`publishedYear`, `availableCopies`) and
//! the identifier travels as `_id`, matching the stored document layout. Fields
//! the catalog does not know about are kept in `extra` and passed through as-is.

use std::collections::BTreeMap;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use utoipa::ToSchema;
use validator::Validate;

/// Fields the store owns; never accepted from clients.
const RESERVED_FIELDS: &[&str] = &["_id", "__v"];

/// Book record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Store-assigned identifier (24 hex characters)
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i32>,
    #[serde(default)]
    pub available_copies: i64,
    /// Additional fields supplied at creation
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Book {
    pub fn new(id: impl Into<String>, data: CreateBook) -> Self {
        Self {
            id: id.into(),
            title: data.title,
            category: data.category,
            published_year: data.published_year,
            available_copies: data.available_copies,
            extra: data.extra,
        }
    }
}

/// Create book request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i32>,
    /// Defaults to 0 when omitted
    #[serde(default)]
    #[validate(range(min = 0, message = "Available copies cannot be negative"))]
    pub available_copies: i64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl CreateBook {
    /// Drop client-supplied values for store-owned fields.
    pub fn without_reserved_fields(mut self) -> Self {
        for field in RESERVED_FIELDS {
            self.extra.remove(*field);
        }
        self
    }
}

/// Copies delta request (`{"addCopies": -2}`)
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCopies {
    /// Signed number of copies to add; `2.0` is read as 2, `1.5` is rejected
    #[serde(deserialize_with = "whole_number")]
    pub add_copies: i64,
}

/// Any JSON number with no fractional part that fits in an i64
fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let number = Number::deserialize(deserializer)?;
    if let Some(n) = number.as_i64() {
        return Ok(n);
    }
    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => Ok(f as i64),
        _ => Err(de::Error::custom("expected a whole number of copies")),
    }
}

/// Category change request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateCategory {
    #[validate(length(min = 1))]
    pub category: String,
}

/// Confirmation body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
