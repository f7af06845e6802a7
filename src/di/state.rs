use crate::di::Container;

/// Implemented by the axum state that view routes are served with.
///
/// # Example
/// ```
/// use cbview::{Container, HasContainer};
/// use std::sync::Arc;
///
/// #[derive(Clone)]
/// struct AppState {
///     container: Arc<Container>,
/// }
///
/// impl HasContainer for AppState {
///     fn get_container(&self) -> &Container {
///         &self.container
///     }
/// }
/// ```
pub trait HasContainer {
    fn get_container(&self) -> &Container;
}

impl HasContainer for Container {
    fn get_container(&self) -> &Container {
        self
    }
}

impl<T: HasContainer> HasContainer for std::sync::Arc<T> {
    fn get_container(&self) -> &Container {
        self.as_ref().get_container()
    }
}
