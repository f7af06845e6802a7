//! Class-based views.
//!
//! A view is a struct whose methods are route handlers. Its fields double as
//! dependency declarations: once adapted, the injector builds one instance
//! per request and hands it to the handler as the receiver.

mod adapter;
mod binding;

pub use adapter::{Cbv, ViewRegistry, cbv, relocate_routes, rewrite_endpoint_signature};
pub use binding::ClassBinding;

use crate::arguments::{BoundArguments, Injected, Value, value};
use crate::error::Result;
use crate::signature::{Signature, TypeInfo};

/// Implemented by handler classes, usually through `#[derive(View)]`.
pub trait View: Sized + Send + Sync + 'static {
    /// Annotated attributes in declaration order, class-scoped ones included.
    fn declarations() -> Vec<Declaration>;

    /// Parameters of the view's own initializer, dependencies excluded.
    fn init_signature() -> Signature {
        Signature::empty()
    }

    /// The original initializer. Dependencies arrive through `deps`, every
    /// other argument through `args`.
    fn init(deps: Injected, args: BoundArguments) -> Result<Self>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Instance,
    /// Shared by the class, never injected.
    Class,
}

/// An annotated attribute of a view.
#[derive(Clone)]
pub struct Declaration {
    name: String,
    ty: TypeInfo,
    scope: Scope,
    default: Option<Value>,
}

impl Declaration {
    pub fn required<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: TypeInfo::of::<T>(),
            scope: Scope::Instance,
            default: None,
        }
    }

    pub fn with_default<T: Send + Sync + 'static>(name: impl Into<String>, default: T) -> Self {
        Self {
            default: Some(value(default)),
            ..Self::required::<T>(name)
        }
    }

    pub fn class_var<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self {
            scope: Scope::Class,
            ..Self::required::<T>(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> TypeInfo {
        self.ty
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }
}

impl std::fmt::Debug for Declaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Declaration")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("scope", &self.scope)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

/// An injectable dependency of a view.
#[derive(Clone)]
pub struct Dependency {
    name: String,
    ty: TypeInfo,
    default: Option<Value>,
}

impl Dependency {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> TypeInfo {
        self.ty
    }

    /// `None` means the dependency is required.
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

impl std::fmt::Debug for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependency")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("required", &self.default.is_none())
            .finish()
    }
}

/// Keeps instance-scoped declarations, in order.
pub fn derive_dependencies(declarations: Vec<Declaration>) -> Vec<Dependency> {
    declarations
        .into_iter()
        .filter(|d| d.scope == Scope::Instance)
        .map(|d| Dependency {
            name: d.name,
            ty: d.ty,
            default: d.default,
        })
        .collect()
}
