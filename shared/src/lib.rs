//! Types shared by the todo server and the browser client.
//!
//! The wire shape of a [`Todo`] and of the create/update requests lives here,
//! together with the validation rules both tiers agree on.

pub mod todo;
pub mod validation;

pub use todo::{CreateTodoRequest, Patch, Priority, Todo, UpdateTodoRequest};
pub use validation::{
    check_notes, check_text, parse_due_date, validate_create, validate_update, ValidationError,
    ValidationErrorKind, NOTES_MAX_CHARS, TEXT_MAX_CHARS,
};
