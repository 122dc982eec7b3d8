use serde::{de::DeserializeOwned, Serialize};
use shared::{CreateTodoRequest, Todo, UpdateTodoRequest};
use thiserror::Error;
use uuid::Uuid;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{console, window, AbortController, DomException, Request, RequestInit, Response};

const API_BASE_URL: &str = "/api";
const TIMEOUT_MS: i32 = 15_000;

/// A failed request, displayed as the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Request timeout. Please try again.")]
    Timeout,

    #[error("Network error. Please check your connection.")]
    Network,

    #[error("{}", or_default(.0, "Invalid request. Please check your input."))]
    BadRequest(Option<String>),

    #[error("Todo not found.")]
    NotFound,

    #[error("Server error. Please try again later.")]
    Server,

    #[error("{}", or_default(.message, "An unexpected error occurred."))]
    Unexpected { status: u16, message: Option<String> },

    #[error("Unexpected response from server: {0}")]
    Payload(String),
}

fn or_default<'a>(message: &'a Option<String>, fallback: &'a str) -> &'a str {
    message.as_deref().unwrap_or(fallback)
}

impl ApiError {
    /// Classifies a non-2xx response, using the server's `error` field
    /// where the status alone says too little.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| value.get("error")?.as_str().map(str::to_owned));

        match status {
            400 => ApiError::BadRequest(message),
            404 => ApiError::NotFound,
            500 => ApiError::Server,
            status => ApiError::Unexpected { status, message },
        }
    }
}

pub async fn fetch_todos() -> Result<Vec<Todo>, ApiError> {
    let body = send("GET", "/todos", None).await.inspect_err(|e| log_failure("Get todos", e))?;
    decode(&body)
}

pub async fn create_todo(request: &CreateTodoRequest) -> Result<Todo, ApiError> {
    let body = send("POST", "/todos", Some(encode(request)?))
        .await
        .inspect_err(|e| log_failure("Create todo", e))?;
    decode(&body)
}

pub async fn update_todo(id: Uuid, request: &UpdateTodoRequest) -> Result<Todo, ApiError> {
    let body = send("PUT", &format!("/todos/{id}"), Some(encode(request)?))
        .await
        .inspect_err(|e| log_failure("Update todo", e))?;
    decode(&body)
}

pub async fn delete_todo(id: Uuid) -> Result<(), ApiError> {
    send("DELETE", &format!("/todos/{id}"), None)
        .await
        .inspect_err(|e| log_failure("Delete todo", e))?;
    Ok(())
}

fn encode<T: Serialize>(request: &T) -> Result<String, ApiError> {
    serde_json::to_string(request).map_err(|e| ApiError::Payload(e.to_string()))
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Payload(e.to_string()))
}

fn log_failure(operation: &str, error: &ApiError) {
    console::error_1(&format!("{operation} failed: {error:?}").into());
}

fn is_abort(error: &JsValue) -> bool {
    error
        .dyn_ref::<DomException>()
        .is_some_and(|exception| exception.name() == "AbortError")
}

/// Sends one JSON request and returns the response body of a 2xx answer.
async fn send(method: &str, path: &str, body: Option<String>) -> Result<String, ApiError> {
    let window = window().ok_or(ApiError::Network)?;
    let url = format!("{API_BASE_URL}{path}");
    console::log_1(&format!("API Request: {method} {url}").into());

    let controller = AbortController::new().map_err(|_| ApiError::Network)?;
    let opts = RequestInit::new();
    opts.set_method(method);
    opts.set_signal(Some(&controller.signal()));
    if let Some(body) = &body {
        opts.set_body(&JsValue::from_str(body));
    }

    let request = Request::new_with_str_and_init(&url, &opts).map_err(|_| ApiError::Network)?;
    request
        .headers()
        .set("Content-Type", "application/json")
        .map_err(|_| ApiError::Network)?;

    let abort = Closure::once(move || controller.abort());
    let timer = window
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            abort.as_ref().unchecked_ref(),
            TIMEOUT_MS,
        )
        .map_err(|_| ApiError::Network)?;

    let outcome = JsFuture::from(window.fetch_with_request(&request)).await;
    window.clear_timeout_with_handle(timer);

    let response: Response = match outcome {
        Ok(response) => response.into(),
        Err(error) if is_abort(&error) => return Err(ApiError::Timeout),
        Err(_) => return Err(ApiError::Network),
    };

    let text_promise = response.text().map_err(|_| ApiError::Network)?;
    let text = JsFuture::from(text_promise)
        .await
        .map_err(|_| ApiError::Network)?
        .as_string()
        .unwrap_or_default();

    console::log_1(&format!("API Response: {} {url}", response.status()).into());

    if response.ok() {
        Ok(text)
    } else {
        console::error_1(&format!("Response Error: {} {text}", response.status()).into());
        Err(ApiError::from_status(response.status(), &text))
    }
}
