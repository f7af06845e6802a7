use crate::di::Container;
use std::sync::Arc;

/// Collects the services views depend on, then yields the [`Container`]
/// that request-time injection resolves against.
///
/// # Example
/// ```
/// use cbview::ContainerBuilder;
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {}
/// struct SystemClock;
/// impl Clock for SystemClock {}
///
/// let container = ContainerBuilder::new()
///     .register(SystemClock)
///     .bind::<dyn Clock, SystemClock, _>(|c| c as Arc<dyn Clock>)
///     .build();
/// assert!(container.contains::<dyn Clock>());
/// ```
pub struct ContainerBuilder {
    container: Container,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            container: Container::new(),
        }
    }

    /// Services are keyed by their concrete type.
    pub fn register<T: 'static + Send + Sync>(mut self, instance: T) -> Self {
        self.container.register(instance);
        self
    }

    /// Keeps a handle the caller can still inspect after `build`.
    pub fn register_arc<T: 'static + Send + Sync>(mut self, instance: Arc<T>) -> Self {
        self.container.register_arc(instance);
        self
    }

    /// Lets `Arc<dyn Trait>` view fields and `#[inject]` parameters resolve
    /// to the `Impl` registered earlier.
    pub fn bind<Trait, Impl, F>(mut self, caster: F) -> Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        Impl: 'static + Send + Sync,
        F: Fn(Arc<Impl>) -> Arc<Trait> + 'static + Send + Sync,
    {
        self.container.register_trait::<Trait, Impl, F>(caster);
        self
    }

    pub fn build(self) -> Container {
        self.container
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
