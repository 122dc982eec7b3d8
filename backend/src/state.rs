use std::time::Instant;

use crate::{service::TodoService, store::TodoStore};

#[derive(Clone)]
pub struct AppState<S> {
    pub service: TodoService<S>,
    pub started_at: Instant,
}

impl<S: TodoStore> AppState<S> {
    pub fn new(store: S) -> Self {
        Self {
            service: TodoService::new(store),
            started_at: Instant::now(),
        }
    }
}
