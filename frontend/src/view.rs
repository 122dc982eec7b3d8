use chrono::{DateTime, Local, Utc};
use sauron::{
    html::{attributes::*, *},
    prelude::*,
};
use shared::{Priority, Todo, NOTES_MAX_CHARS, TEXT_MAX_CHARS};

use crate::{Model, Msg};

const INPUT_CLASS: &str = "w-full px-3 py-2 bg-ctp-surface0 border border-ctp-surface2 rounded-md text-ctp-text placeholder-ctp-subtext0 focus:outline-none focus:ring-2 focus:ring-ctp-blue focus:border-transparent";

/// Display order: High before Medium before Low, newest first within a
/// priority. The stored collection is left in server order.
pub fn sorted_for_display(todos: &[Todo]) -> Vec<&Todo> {
    let mut sorted: Vec<&Todo> = todos.iter().collect();
    sorted.sort_by(|a, b| {
        a.priority
            .rank()
            .cmp(&b.priority.rank())
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    sorted
}

fn format_due(due: DateTime<Utc>) -> String {
    due.with_timezone(&Local).format("%b %-d, %Y %H:%M").to_string()
}

fn priority_class(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "bg-ctp-red/20 text-ctp-red",
        Priority::Medium => "bg-ctp-yellow/20 text-ctp-yellow",
        Priority::Low => "bg-ctp-green/20 text-ctp-green",
    }
}

impl Model {
    pub(crate) fn view_page(&self) -> Node<Msg> {
        div(
            [class("min-h-screen bg-ctp-base text-ctp-text")],
            [
                self.view_header(),
                div(
                    [class("max-w-3xl mx-auto px-6 py-8 space-y-6")],
                    [
                        self.view_error(),
                        self.view_form(),
                        if self.state.loading && self.state.todos.is_empty() {
                            self.view_spinner()
                        } else {
                            self.view_sections()
                        },
                    ],
                ),
            ],
        )
    }

    fn view_header(&self) -> Node<Msg> {
        let active = self.state.todos.iter().filter(|t| t.is_active()).count();
        header([class("bg-ctp-mantle shadow-lg border-b border-ctp-surface0")], [
            div([class("max-w-3xl mx-auto px-6 py-4 flex items-center justify-between")], [
                h1([class("text-2xl font-bold text-ctp-text")], [text("Todos")]),
                span([class("text-sm text-ctp-subtext0")], [text(format!("{active} remaining"))]),
            ]),
        ])
    }

    fn view_error(&self) -> Node<Msg> {
        let Some(message) = &self.state.error else {
            return span([], []);
        };
        div([class("flex items-center justify-between p-4 rounded-lg border border-ctp-red bg-ctp-red/10")], [
            span([class("text-ctp-red font-medium")], [text(message)]),
            div([class("flex gap-2")], [
                button([
                    on_click(|_| Msg::LoadTodos),
                    r#type("button"),
                    class("bg-ctp-red hover:bg-ctp-maroon text-ctp-base font-medium px-3 py-1 rounded-md transition-colors duration-200"),
                ], [text("Retry")]),
                button([
                    on_click(|_| Msg::DismissError),
                    r#type("button"),
                    class("bg-ctp-overlay0 hover:bg-ctp-overlay1 text-ctp-text font-medium px-3 py-1 rounded-md transition-colors duration-200"),
                ], [text("Dismiss")]),
            ]),
        ])
    }

    fn view_spinner(&self) -> Node<Msg> {
        div([class("flex flex-col items-center py-16 text-ctp-subtext0")], [
            span([class("animate-spin text-3xl text-ctp-blue")], [text("◐")]),
            p([class("mt-4")], [text("Loading your todos...")]),
        ])
    }

    fn view_form(&self) -> Node<Msg> {
        let form = &self.form;
        if !form.open {
            return button([
                on_click(|_| Msg::ToggleForm),
                r#type("button"),
                class("w-full py-3 rounded-lg border-2 border-dashed border-ctp-surface2 text-ctp-subtext0 hover:border-ctp-blue hover:text-ctp-blue transition-colors duration-200"),
            ], [text("+ Add a todo")]);
        }

        div([class("p-6 bg-ctp-surface1 rounded-lg border border-ctp-surface2 space-y-4")], [
            h2([class("text-xl font-semibold text-ctp-text pb-2 border-b border-ctp-surface2")], [text("New Todo")]),
            input([
                r#type("text"),
                placeholder("What needs to be done?"),
                value(&form.text),
                maxlength(TEXT_MAX_CHARS),
                on_input(|event| Msg::SetText(event.value())),
                class(INPUT_CLASS),
            ], []),
            textarea([
                placeholder("Notes (optional)"),
                value(&form.notes),
                on_input(|event| Msg::SetNotes(event.value())),
                class(format!("{INPUT_CLASS} h-20 resize-y")),
            ], []),
            div([class("flex justify-between text-xs")], [
                match &form.notes_error {
                    Some(error) => span([class("text-ctp-red")], [text(error)]),
                    None => span([], []),
                },
                span([class("text-ctp-subtext0")], [
                    text(format!("{}/{NOTES_MAX_CHARS}", form.notes.chars().count())),
                ]),
            ]),
            div([class("grid grid-cols-3 gap-3")], [
                input([
                    r#type("date"),
                    value(&form.due_date),
                    on_input(|event| Msg::SetDueDate(event.value())),
                    class(INPUT_CLASS),
                ], []),
                input([
                    r#type("time"),
                    value(&form.due_time),
                    on_input(|event| Msg::SetDueTime(event.value())),
                    class(INPUT_CLASS),
                ], []),
                select(
                    [
                        value(form.priority.as_str()),
                        on_input(|event| Msg::SetPriority(event.value())),
                        class(INPUT_CLASS),
                    ],
                    Priority::ALL.iter().map(|priority| {
                        option(
                            [value(priority.as_str())],
                            [text(priority.as_str())],
                        )
                    }),
                ),
            ]),
            match &form.form_error {
                Some(error) => p([class("text-sm text-ctp-red")], [text(error)]),
                None => span([], []),
            },
            div([class("flex gap-2")], [
                button([
                    on_click(|_| Msg::SubmitForm),
                    r#type("button"),
                    disabled(form.submitting),
                    class("bg-ctp-blue hover:bg-ctp-sapphire text-ctp-base font-medium px-6 py-2 rounded-md transition-colors duration-200"),
                ], [text(if form.submitting { "Adding..." } else { "Add Todo" })]),
                button([
                    on_click(|_| Msg::ToggleForm),
                    r#type("button"),
                    class("bg-ctp-overlay0 hover:bg-ctp-overlay1 text-ctp-text font-medium px-4 py-2 rounded-md transition-colors duration-200"),
                ], [text("Cancel")]),
            ]),
        ])
    }

    fn view_sections(&self) -> Node<Msg> {
        let sorted = sorted_for_display(&self.state.todos);
        let (active, completed): (Vec<&Todo>, Vec<&Todo>) =
            sorted.into_iter().partition(|t| t.is_active());

        if active.is_empty() && completed.is_empty() {
            return p([class("text-center py-12 text-ctp-subtext0")], [
                text("Nothing to do yet. Add your first todo above."),
            ]);
        }

        div([class("space-y-8")], [
            self.view_section("Active", &active, self.show_active, Msg::ToggleActiveSection),
            self.view_section("Completed", &completed, self.show_completed, Msg::ToggleCompletedSection),
        ])
    }

    fn view_section(&self, title: &str, todos: &[&Todo], expanded: bool, toggle: Msg) -> Node<Msg> {
        div([], [
            button([
                on_click(move |_| toggle.clone()),
                r#type("button"),
                class("w-full flex items-center justify-between mb-4 pb-2 border-b border-ctp-surface2"),
            ], [
                h2([class("text-xl font-semibold text-ctp-text")], [
                    text(format!("{} {title}", if expanded { "▾" } else { "▸" })),
                ]),
                span([class("bg-ctp-blue/20 text-ctp-blue px-2 py-1 rounded-full text-sm font-medium")], [
                    text(todos.len()),
                ]),
            ]),
            if expanded {
                div([class("space-y-3")], todos.iter().map(|todo| self.view_todo(todo)))
            } else {
                span([], [])
            },
        ])
    }

    fn view_todo(&self, todo: &Todo) -> Node<Msg> {
        let todo_id = todo.id;
        let is_loading = self.pending.contains(&todo_id);
        let overdue = todo.is_overdue(Utc::now());

        div(
            [key(todo_id.to_string()),
            class(format!(
                "border rounded-xl p-4 bg-ctp-surface0 shadow-sm transition-all duration-300 {}",
                if todo.completed {
                    "border-ctp-green bg-ctp-green/10"
                } else if overdue {
                    "border-ctp-red"
                } else {
                    "border-ctp-surface1 hover:border-ctp-blue"
                }
            ))],
            [div([class("flex items-start gap-4")], [
                input([
                    r#type("checkbox"),
                    checked(todo.completed),
                    on_click(move |_| Msg::ToggleTodo(todo_id)),
                    disabled(is_loading),
                    class("mt-1 w-5 h-5 accent-ctp-green cursor-pointer"),
                ], []),
                div([class("flex-1 min-w-0 space-y-2")], [
                    self.view_todo_text(todo, is_loading),
                    div([class("flex flex-wrap items-center gap-2 text-xs")], [
                        span([class(format!("px-2 py-1 rounded-full font-medium {}", priority_class(todo.priority)))], [
                            text(todo.priority.as_str()),
                        ]),
                        match todo.due_date {
                            Some(due) => span([class(if overdue { "text-ctp-red font-medium" } else { "text-ctp-subtext0" })], [
                                text(format!("{}Due {}", if overdue { "Overdue · " } else { "" }, format_due(due))),
                            ]),
                            None => span([], []),
                        },
                    ]),
                    self.view_todo_notes(todo, is_loading),
                ]),
                button([
                    on_click(move |_| Msg::DeleteTodo(todo_id)),
                    r#type("button"),
                    disabled(is_loading),
                    class("inline-flex items-center justify-center w-8 h-8 rounded-lg bg-ctp-red/20 text-ctp-red hover:bg-ctp-red/30 transition-colors duration-200"),
                ], [text(if is_loading { "⏳" } else { "🗑️" })]),
            ])],
        )
    }

    fn view_todo_text(&self, todo: &Todo, is_loading: bool) -> Node<Msg> {
        let todo_id = todo.id;
        if self.editing_text == Some(todo_id) {
            return div([class("flex gap-2")], [
                input([
                    r#type("text"),
                    value(&self.edit_text),
                    maxlength(TEXT_MAX_CHARS),
                        on_input(|event| Msg::SetEditText(event.value())),
                    class(INPUT_CLASS),
                ], []),
                button([
                    on_click(move |_| Msg::SaveText(todo_id)),
                    r#type("button"),
                    disabled(self.edit_text.trim().is_empty()),
                    class("bg-ctp-green hover:bg-ctp-teal text-ctp-base font-medium px-3 py-1 rounded-md"),
                ], [text("Save")]),
                button([
                    on_click(|_| Msg::CancelEdit),
                    r#type("button"),
                    class("bg-ctp-overlay0 hover:bg-ctp-overlay1 text-ctp-text font-medium px-3 py-1 rounded-md"),
                ], [text("Cancel")]),
            ]);
        }

        div([class("flex items-start gap-2")], [
            h3([class(format!(
                "flex-1 text-lg font-semibold break-words {}",
                if todo.completed { "line-through text-ctp-overlay1" } else { "text-ctp-text" }
            ))], [
                if is_loading {
                    text(format!("{} (updating...)", todo.text))
                } else {
                    text(&todo.text)
                }
            ]),
            button([
                on_click(move |_| Msg::EditText(todo_id)),
                r#type("button"),
                disabled(is_loading),
                class("inline-flex items-center justify-center w-7 h-7 rounded-lg bg-ctp-blue/20 text-ctp-blue hover:bg-ctp-blue/30 transition-colors duration-200"),
            ], [text("✏️")]),
        ])
    }

    fn view_todo_notes(&self, todo: &Todo, is_loading: bool) -> Node<Msg> {
        let todo_id = todo.id;
        if self.editing_notes == Some(todo_id) {
            return div([class("space-y-2")], [
                textarea([
                    value(&self.edit_notes),
                    placeholder("Add notes..."),
                    on_input(|event| Msg::SetEditNotes(event.value())),
                    class(format!("{INPUT_CLASS} h-20 resize-y")),
                ], []),
                match &self.edit_notes_error {
                    Some(error) => p([class("text-xs text-ctp-red")], [text(error)]),
                    None => span([], []),
                },
                div([class("flex gap-2")], [
                    button([
                        on_click(move |_| Msg::SaveNotes(todo_id)),
                        r#type("button"),
                        disabled(self.edit_notes_error.is_some()),
                        class("bg-ctp-green hover:bg-ctp-teal text-ctp-base font-medium px-3 py-1 rounded-md"),
                    ], [text("Save")]),
                    button([
                        on_click(|_| Msg::CancelEdit),
                        r#type("button"),
                        class("bg-ctp-overlay0 hover:bg-ctp-overlay1 text-ctp-text font-medium px-3 py-1 rounded-md"),
                    ], [text("Cancel")]),
                ]),
            ]);
        }

        let (label, style) = if todo.notes.is_empty() {
            ("Add notes...", "italic text-ctp-overlay0")
        } else {
            (todo.notes.as_str(), "text-ctp-subtext1 whitespace-pre-wrap")
        };
        button([
            on_click(move |_| Msg::EditNotes(todo_id)),
            r#type("button"),
            disabled(is_loading),
            class(format!("block w-full text-left text-sm break-words {style}")),
        ], [text(label)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;

    fn todo(text: &str, priority: Priority, age_minutes: i64) -> Todo {
        let created = Utc::now() - Duration::minutes(age_minutes);
        Todo::new(text.into(), String::new(), None, priority, created)
    }

    fn texts(todos: Vec<&Todo>) -> Vec<&str> {
        todos.into_iter().map(|t| t.text.as_str()).collect()
    }

    #[rstest]
    fn priority_first_then_newest() {
        let todos = vec![
            todo("old low", Priority::Low, 30),
            todo("old high", Priority::High, 20),
            todo("medium", Priority::Medium, 10),
            todo("new high", Priority::High, 1),
        ];

        assert_eq!(
            texts(sorted_for_display(&todos)),
            ["new high", "old high", "medium", "old low"]
        );
    }

    #[rstest]
    fn sorting_leaves_collection_untouched() {
        let todos = vec![todo("low", Priority::Low, 2), todo("high", Priority::High, 1)];
        let _ = sorted_for_display(&todos);
        assert_eq!(todos[0].text, "low");
    }

    #[rstest]
    fn text_inputs_cap_length() {
        let mut model = Model::default();
        model.form.open = true;
        let form = model.view_form().render_to_string();
        assert!(form.contains(r#"maxlength="100""#), "{form}");

        let todo = todo("walk dog", Priority::Medium, 0);
        model.editing_text = Some(todo.id);
        model.edit_text = todo.text.clone();
        let editor = model.view_todo_text(&todo, false).render_to_string();
        assert!(editor.contains(r#"maxlength="100""#), "{editor}");
    }

    #[rstest]
    fn empty_collection_sorts_to_nothing() {
        assert!(sorted_for_display(&[]).is_empty());
    }
}
