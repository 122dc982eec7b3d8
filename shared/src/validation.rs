//! Field rules for create and update payloads.
//!
//! Validation works on the raw JSON body rather than on a deserialized struct:
//! an omitted key and an explicit `null` mean different things for an update,
//! and a mistyped field should surface as a [`ValidationError`] naming the
//! field instead of a generic decode failure.
//!
//! Only the first violated rule is reported. Known fields are checked in the
//! order `text`, `notes`, `completed`, `dueDate`, `priority`, then unknown keys.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::todo::{CreateTodoRequest, Patch, Priority, UpdateTodoRequest};

pub const TEXT_MAX_CHARS: usize = 100;
pub const NOTES_MAX_CHARS: usize = 400;

const TEXT: &str = "text";
const NOTES: &str = "notes";
const COMPLETED: &str = "completed";
const DUE_DATE: &str = "dueDate";
const PRIORITY: &str = "priority";
const FIELDS: [&str; 5] = [TEXT, NOTES, COMPLETED, DUE_DATE, PRIORITY];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    NotAnObject,
    Empty,
    Required,
    WrongType,
    TooShort,
    TooLong,
    InvalidChoice,
    UnknownField,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{detail}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub field: Option<String>,
    pub detail: String,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, field: &str, detail: String) -> Self {
        Self {
            kind,
            field: Some(field.to_string()),
            detail,
        }
    }

    fn not_an_object() -> Self {
        Self {
            kind: ValidationErrorKind::NotAnObject,
            field: None,
            detail: "\"value\" must be of type object".to_string(),
        }
    }

    fn empty() -> Self {
        Self {
            kind: ValidationErrorKind::Empty,
            field: None,
            detail: "\"value\" must have at least 1 key".to_string(),
        }
    }

    fn required(field: &str) -> Self {
        Self::new(
            ValidationErrorKind::Required,
            field,
            format!("\"{field}\" is required"),
        )
    }

    fn wrong_type(field: &str, expected: &str) -> Self {
        Self::new(
            ValidationErrorKind::WrongType,
            field,
            format!("\"{field}\" must be {expected}"),
        )
    }

    fn too_long(field: &str, max: usize) -> Self {
        Self::new(
            ValidationErrorKind::TooLong,
            field,
            format!("\"{field}\" length must be less than or equal to {max} characters long"),
        )
    }
}

/// Trims a todo's text and checks it is 1 to [`TEXT_MAX_CHARS`] characters.
pub fn check_text(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(
            ValidationErrorKind::TooShort,
            TEXT,
            format!("\"{TEXT}\" is not allowed to be empty"),
        ));
    }
    if trimmed.chars().count() > TEXT_MAX_CHARS {
        return Err(ValidationError::too_long(TEXT, TEXT_MAX_CHARS));
    }
    Ok(trimmed.to_string())
}

/// Checks notes against [`NOTES_MAX_CHARS`]. Empty notes are fine.
pub fn check_notes(raw: &str) -> Result<String, ValidationError> {
    if raw.chars().count() > NOTES_MAX_CHARS {
        return Err(ValidationError::too_long(NOTES, NOTES_MAX_CHARS));
    }
    Ok(raw.trim().to_string())
}

/// Parses a due date the way a browser date input or `Date#toISOString`
/// would send it. Anything blank or unparseable is `None`.
pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

pub fn validate_create(payload: &Value) -> Result<CreateTodoRequest, ValidationError> {
    let fields = payload.as_object().ok_or_else(ValidationError::not_an_object)?;

    let text = match fields.get(TEXT) {
        Some(value) => text_field(value)?,
        None => return Err(ValidationError::required(TEXT)),
    };
    let notes = fields.get(NOTES).map(notes_field).transpose()?;
    // Accepted for symmetry with updates; a new todo always starts active.
    fields.get(COMPLETED).map(completed_field).transpose()?;
    let due_date = match fields.get(DUE_DATE) {
        Some(value) => due_date_field(value)?.into_change().flatten(),
        None => None,
    };
    let priority = fields.get(PRIORITY).map(priority_field).transpose()?;
    reject_unknown(fields)?;

    Ok(CreateTodoRequest {
        text,
        notes,
        due_date,
        priority,
    })
}

pub fn validate_update(payload: &Value) -> Result<UpdateTodoRequest, ValidationError> {
    let fields = payload.as_object().ok_or_else(ValidationError::not_an_object)?;
    if fields.is_empty() {
        return Err(ValidationError::empty());
    }

    let request = UpdateTodoRequest {
        text: fields.get(TEXT).map(text_field).transpose()?,
        notes: fields.get(NOTES).map(notes_field).transpose()?,
        completed: fields.get(COMPLETED).map(completed_field).transpose()?,
        due_date: match fields.get(DUE_DATE) {
            Some(value) => due_date_field(value)?,
            None => Patch::Absent,
        },
        priority: fields.get(PRIORITY).map(priority_field).transpose()?,
    };
    reject_unknown(fields)?;

    Ok(request)
}

fn text_field(value: &Value) -> Result<String, ValidationError> {
    let raw = value
        .as_str()
        .ok_or_else(|| ValidationError::wrong_type(TEXT, "a string"))?;
    check_text(raw)
}

fn notes_field(value: &Value) -> Result<String, ValidationError> {
    let raw = value
        .as_str()
        .ok_or_else(|| ValidationError::wrong_type(NOTES, "a string"))?;
    check_notes(raw)
}

fn completed_field(value: &Value) -> Result<bool, ValidationError> {
    value
        .as_bool()
        .ok_or_else(|| ValidationError::wrong_type(COMPLETED, "a boolean"))
}

fn due_date_field(value: &Value) -> Result<Patch<DateTime<Utc>>, ValidationError> {
    match value {
        Value::Null => Ok(Patch::Null),
        Value::String(raw) => Ok(parse_due_date(raw).into()),
        Value::Number(millis) => Ok(millis
            .as_i64()
            .or_else(|| millis.as_f64().map(|m| m as i64))
            .and_then(DateTime::from_timestamp_millis)
            .into()),
        _ => Err(ValidationError::wrong_type(DUE_DATE, "a valid date")),
    }
}

fn priority_field(value: &Value) -> Result<Priority, ValidationError> {
    value.as_str().and_then(Priority::from_name).ok_or_else(|| {
        ValidationError::new(
            ValidationErrorKind::InvalidChoice,
            PRIORITY,
            format!("\"{PRIORITY}\" must be one of [High, Medium, Low]"),
        )
    })
}

fn reject_unknown(fields: &Map<String, Value>) -> Result<(), ValidationError> {
    match fields.keys().find(|key| !FIELDS.contains(&key.as_str())) {
        Some(key) => Err(ValidationError::new(
            ValidationErrorKind::UnknownField,
            key,
            format!("\"{key}\" is not allowed"),
        )),
        None => Ok(()),
    }
}
