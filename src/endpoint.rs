use crate::arguments::{Arguments, BoundArguments};
use crate::error::{Result, ViewError};
use crate::signature::{Signature, TypeInfo};
use axum::response::{IntoResponse, Response};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

type Handler = Arc<dyn Fn(BoundArguments) -> BoxFuture<Result<Response>> + Send + Sync>;

/// The callable a route dispatches to.
///
/// Cloning an `Endpoint` yields another handle to the same callable: a
/// signature written through one handle is seen by all of them.
#[derive(Clone)]
pub struct Endpoint {
    inner: Arc<EndpointInner>,
}

struct EndpointInner {
    name: String,
    owner: Option<TypeInfo>,
    /// What the handler actually accepts; calls are bound against this.
    declared: Signature,
    /// What the injector reads.
    published: RwLock<Signature>,
    handler: Handler,
}

impl Endpoint {
    fn from_parts(
        name: String,
        owner: Option<TypeInfo>,
        signature: Signature,
        handler: Handler,
    ) -> Self {
        Self {
            inner: Arc::new(EndpointInner {
                name,
                owner,
                published: RwLock::new(signature.clone()),
                declared: signature,
                handler,
            }),
        }
    }

    /// A free-function endpoint.
    pub fn function<F, Fut, R>(name: impl Into<String>, signature: Signature, f: F) -> Self
    where
        F: Fn(BoundArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        let f = Arc::new(f);
        let handler: Handler = Arc::new(
            move |bound: BoundArguments| -> BoxFuture<Result<Response>> {
                let f = Arc::clone(&f);
                Box::pin(async move { Ok::<_, ViewError>(f(bound).await.into_response()) })
            },
        );
        Self::from_parts(name.into(), None, signature, handler)
    }

    /// An endpoint declared as a method of `C`.
    ///
    /// The first parameter of `signature` is the receiver slot; its bound
    /// value must be an `Arc<C>`.
    pub fn method<C, F, Fut, R>(name: impl Into<String>, signature: Signature, f: F) -> Self
    where
        C: Send + Sync + 'static,
        F: Fn(Arc<C>, BoundArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        let name = name.into();
        let receiver = signature.first().map(|p| p.name().to_string());
        let endpoint_name = name.clone();
        let f = Arc::new(f);
        let handler: Handler = Arc::new(move |mut bound: BoundArguments| -> BoxFuture<Result<Response>> {
            let f = Arc::clone(&f);
            let receiver = receiver.clone();
            let endpoint_name = endpoint_name.clone();
            Box::pin(async move {
                let receiver = receiver.ok_or_else(|| ViewError::SignatureIncompatible {
                    class: std::any::type_name::<C>().to_string(),
                    endpoint: endpoint_name,
                })?;
                let this = bound.take::<C>(&receiver)?;
                Ok::<_, ViewError>(f(this, bound).await.into_response())
            })
        });
        Self::from_parts(name, Some(TypeInfo::of::<C>()), signature, handler)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn owner(&self) -> Option<TypeInfo> {
        self.inner.owner
    }

    pub fn is_owned_by(&self, class: TypeInfo) -> bool {
        self.inner.owner == Some(class)
    }

    pub fn ptr_eq(&self, other: &Endpoint) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn declared_signature(&self) -> &Signature {
        &self.inner.declared
    }

    /// The signature the injector currently reads.
    pub fn signature(&self) -> Signature {
        self.inner
            .published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_signature(&self, signature: Signature) {
        *self
            .inner
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner) = signature;
    }

    pub async fn call(&self, args: Arguments) -> Result<Response> {
        let bound = args.bind(&self.inner.declared)?;
        (self.inner.handler)(bound).await
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.inner.name)
            .field("owner", &self.inner.owner)
            .finish_non_exhaustive()
    }
}
