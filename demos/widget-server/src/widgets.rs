use cbview::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Widget {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct NewWidget {
    pub name: String,
}

/// In-memory widget storage.
#[derive(Default)]
pub struct WidgetRepository {
    widgets: RwLock<BTreeMap<u64, Widget>>,
    next_id: AtomicU64,
}

impl WidgetRepository {
    pub fn find(&self, id: u64) -> Option<Widget> {
        self.widgets
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    pub fn page(&self, offset: usize, limit: usize) -> Vec<Widget> {
        self.widgets
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn insert(&self, name: String) -> Widget {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let widget = Widget { id, name };
        self.widgets
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(id, widget.clone());
        widget
    }

    pub fn remove(&self, id: u64) -> bool {
        self.widgets
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }
}

fn default_page_size() -> usize {
    20
}

#[derive(View)]
pub struct WidgetView {
    repo: Arc<WidgetRepository>,
    #[view(default = "default_page_size")]
    page_size: usize,
}

#[handlers]
impl WidgetView {
    #[get("/widgets")]
    async fn list(&self, offset: usize) -> Json<Vec<Widget>> {
        Json(self.repo.page(offset, self.page_size))
    }

    #[get("/widgets/{id}")]
    async fn get_one(&self, #[param] id: u64) -> std::result::Result<Json<Widget>, StatusCode> {
        self.repo.find(id).map(Json).ok_or(StatusCode::NOT_FOUND)
    }

    #[post("/widgets")]
    async fn create(&self, #[body] widget: NewWidget) -> (StatusCode, Json<Widget>) {
        tracing::info!(name = %widget.name, "creating widget");
        (StatusCode::CREATED, Json(self.repo.insert(widget.name)))
    }

    #[delete("/widgets/{id}")]
    async fn remove(&self, #[param] id: u64) -> StatusCode {
        if self.repo.remove(id) {
            StatusCode::NO_CONTENT
        } else {
            StatusCode::NOT_FOUND
        }
    }
}
