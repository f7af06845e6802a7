use axum::http::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ViewError>;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("Dependency not found: {type_name}")]
    DependencyNotFound { type_name: String },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },

    /// A declared dependency was absent from the keyword arguments handed to
    /// the wrapped initializer.
    #[error("Missing dependency `{name}` while constructing {class}")]
    DependencyMissing { class: String, name: String },

    #[error("Dependency `{name}` of {class} collides with an initializer parameter")]
    DependencyCollision { class: String, name: String },

    #[error("Endpoint `{endpoint}` has no receiver parameter to bind {class} to")]
    SignatureIncompatible { class: String, endpoint: String },

    #[error("Duplicate parameter `{name}` in signature")]
    DuplicateParameter { name: String },

    #[error("Missing argument `{name}`")]
    ArgumentMissing { name: String },

    #[error("Invalid argument `{name}`: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("Unexpected argument: {message}")]
    UnexpectedArgument { message: String },

    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    #[error("Route {method} {path} is registered twice")]
    DuplicateRoute { method: String, path: String },

    #[error("Unsupported HTTP method: {method}")]
    UnsupportedMethod { method: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig { key: String, message: String },

}

impl ViewError {
    pub fn status(&self) -> StatusCode {
        match self {
            ViewError::ArgumentMissing { .. }
            | ViewError::InvalidArgument { .. }
            | ViewError::UnexpectedArgument { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ViewError::InvalidBody(_) | ViewError::BodyRead(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for ViewError {
    fn into_response(self) -> axum::response::Response {
        (self.status(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn request_data_errors_are_client_errors() {
        let err = ViewError::ArgumentMissing {
            name: "id".to_string(),
        };
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn construction_failures_are_server_errors() {
        let err = ViewError::DependencyMissing {
            class: "Widget".to_string(),
            name: "repo".to_string(),
        };
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.to_string(),
            "Missing dependency `repo` while constructing Widget"
        );
    }
}
