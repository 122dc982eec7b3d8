use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use shared::{
    check_notes, check_text, parse_due_date, CreateTodoRequest, Priority, NOTES_MAX_CHARS,
    TEXT_MAX_CHARS,
};

pub const TEXT_REQUIRED: &str = "Todo name is required.";
pub const SUBMIT_FAILED: &str = "Failed to add todo. Please try again.";

/// The "add todo" form. Values are kept as typed until a submit succeeds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoForm {
    pub open: bool,
    pub text: String,
    pub notes: String,
    pub due_date: String,
    pub due_time: String,
    pub priority: Priority,
    pub notes_error: Option<String>,
    pub form_error: Option<String>,
    pub submitting: bool,
}

pub fn notes_error(notes: &str) -> Option<String> {
    check_notes(notes)
        .err()
        .map(|_| format!("Notes cannot exceed {NOTES_MAX_CHARS} characters."))
}

impl TodoForm {
    pub fn set_notes(&mut self, notes: String) {
        self.notes_error = notes_error(&notes);
        self.notes = notes;
    }

    pub fn set_priority(&mut self, name: &str) {
        self.priority = Priority::from_name(name).unwrap_or_default();
    }

    /// Builds the create request, or records why the form cannot be sent.
    pub fn submit(&mut self) -> Option<CreateTodoRequest> {
        self.form_error = None;

        let text = match check_text(&self.text) {
            Ok(text) => text,
            Err(_) if self.text.trim().is_empty() => {
                self.form_error = Some(TEXT_REQUIRED.to_string());
                return None;
            }
            Err(_) => {
                self.form_error = Some(format!(
                    "Todo name cannot exceed {TEXT_MAX_CHARS} characters."
                ));
                return None;
            }
        };
        let notes = match check_notes(&self.notes) {
            Ok(notes) => notes,
            Err(_) => {
                self.notes_error = notes_error(&self.notes);
                return None;
            }
        };

        self.submitting = true;
        Some(CreateTodoRequest {
            text,
            notes: Some(notes),
            due_date: self.due_date_time(),
            priority: Some(self.priority),
        })
    }

    pub fn submitted(&mut self, result: Result<(), String>) {
        self.submitting = false;
        match result {
            Ok(()) => *self = Self::default(),
            Err(_) => self.form_error = Some(SUBMIT_FAILED.to_string()),
        }
    }

    fn due_date_time(&self) -> Option<DateTime<Utc>> {
        local_due_date(&self.due_date, &self.due_time, &Local)
    }
}

/// A date alone is midnight UTC. A date with a time is read as wall-clock
/// time in `zone`; a time skipped by a DST jump yields no due date.
fn local_due_date<Tz: TimeZone>(date: &str, time: &str, zone: &Tz) -> Option<DateTime<Utc>> {
    let date = date.trim();
    if date.is_empty() {
        return None;
    }
    let time = time.trim();
    if time.is_empty() {
        return parse_due_date(date);
    }

    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let clock = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .ok()?;
    zone.from_local_datetime(&day.and_time(clock))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}
