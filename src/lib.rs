//! # cbview
//!
//! Class-based views for axum with dependency injection.
//!
//! A view groups related handlers as methods of one struct. The struct's
//! fields declare the dependencies it needs; [`cbv`] adapts the class so
//! every request gets a freshly built instance, with dependencies resolved
//! from the [`Container`] and request data resolved by parameter name.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cbview::prelude::*;
//!
//! pub struct WidgetRepository;
//!
//! #[derive(View)]
//! pub struct WidgetView {
//!     repo: Arc<WidgetRepository>,
//! }
//!
//! #[handlers]
//! impl WidgetView {
//!     #[get("/widgets/{id}")]
//!     async fn get_widget(&self, #[param] id: u64) -> String {
//!         format!("widget {id}")
//!     }
//! }
//!
//! # fn main() -> cbview::Result<()> {
//! let mut table = RouteTable::new();
//! WidgetView::register_routes(&mut table);
//! cbv(&mut table).view::<WidgetView>()?;
//!
//! let container = ContainerBuilder::new().register(WidgetRepository).build();
//! let app: Router = table.into_router()?.with_state(Arc::new(container));
//! # Ok(())
//! # }
//! ```

extern crate self as cbview;

pub mod arguments;
pub mod config;
pub mod di;
pub mod endpoint;
pub mod error;
pub mod inject;
pub mod routing;
pub mod signature;
pub mod view;

// Re-export core types
pub use arguments::{Arguments, BoundArguments, Injected, Value, value};
pub use config::{ConfigService, Settings};
pub use di::{Container, ContainerBuilder, HasContainer};
pub use endpoint::Endpoint;
pub use error::{Result, ViewError};
pub use inject::{Injector, RequestContext};
pub use routing::{Route, RouteTable, dispatch};
pub use signature::{ParamDefault, Parameter, ParameterKind, Signature, Source, TypeInfo};
pub use view::{Cbv, ClassBinding, View, ViewRegistry, cbv};

// Re-export macros
pub use cbview_macro::{View, delete, get, handlers, patch, post, put};

// Re-export commonly used types from dependencies
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use cbview::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{ConfigService, Settings};
    pub use crate::di::{Container, ContainerBuilder, HasContainer};
    pub use crate::error::{Result, ViewError};
    pub use crate::routing::RouteTable;
    pub use crate::View;
    pub use crate::view::cbv;
    pub use crate::{delete, get, handlers, patch, post, put};
    pub use axum::{
        Json, Router,
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    pub use std::sync::Arc;
}
