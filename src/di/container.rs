use crate::arguments::Value;
use crate::error::{Result, ViewError};
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;

/// Casts a stored implementation into an `Arc<dyn Trait>` wrapped as a value.
type CasterFn = Arc<dyn Fn(Value) -> Option<Value> + Send + Sync>;

/// Thread-safe dependency injection container.
///
/// Services are keyed by type. Trait bindings let `Arc<dyn Trait>` resolve to
/// a registered implementation.
#[derive(Clone, Default)]
pub struct Container {
    services: DashMap<TypeId, Value>,
    trait_mappings: DashMap<TypeId, TypeId>,
    casters: DashMap<TypeId, CasterFn>,
}

impl Container {
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
            trait_mappings: DashMap::new(),
            casters: DashMap::new(),
        }
    }

    pub fn register<T: 'static + Send + Sync>(&mut self, instance: T) -> &mut Self {
        self.register_arc(Arc::new(instance))
    }

    pub fn register_arc<T: 'static + Send + Sync>(&mut self, instance: Arc<T>) -> &mut Self {
        let instance: Value = instance;
        self.services.insert(TypeId::of::<T>(), instance);
        self
    }

    pub fn register_trait<Trait, Impl, F>(&mut self, caster_fn: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        Impl: 'static + Send + Sync,
        F: Fn(Arc<Impl>) -> Arc<Trait> + 'static + Send + Sync,
    {
        let trait_id = TypeId::of::<Trait>();
        self.trait_mappings.insert(trait_id, TypeId::of::<Impl>());

        let caster: CasterFn = Arc::new(move |instance: Value| {
            let concrete = instance.downcast::<Impl>().ok()?;
            let trait_obj: Arc<Trait> = caster_fn(concrete);
            // An `Arc<dyn Trait>` is sized, so it can travel as a value.
            let wrapped: Value = Arc::new(trait_obj);
            Some(wrapped)
        });
        self.casters.insert(trait_id, caster);
        self
    }

    /// Type-erased lookup used by the injector.
    ///
    /// Concrete services come back as `Arc<T>`; trait bindings come back as
    /// `Arc<Arc<dyn Trait>>`.
    pub fn resolve_value(&self, type_id: TypeId) -> Option<Value> {
        if let Some(entry) = self.services.get(&type_id) {
            return Some(Arc::clone(entry.value()));
        }
        let impl_id = *self.trait_mappings.get(&type_id)?;
        let instance = Arc::clone(self.services.get(&impl_id)?.value());
        let caster = self.casters.get(&type_id)?;
        (caster.value())(instance)
    }

    pub fn resolve<T: 'static + Send + Sync>(&self) -> Result<Arc<T>> {
        let type_name = std::any::type_name::<T>();
        let entry = self
            .services
            .get(&TypeId::of::<T>())
            .ok_or_else(|| ViewError::DependencyNotFound {
                type_name: type_name.to_string(),
            })?;
        Arc::clone(entry.value())
            .downcast::<T>()
            .map_err(|_| ViewError::DowncastFailed {
                type_name: type_name.to_string(),
            })
    }

    pub fn resolve_trait<T: ?Sized + 'static + Send + Sync>(&self) -> Result<Arc<T>> {
        let type_name = std::any::type_name::<T>();
        let wrapper = self
            .resolve_value(TypeId::of::<T>())
            .ok_or_else(|| ViewError::DependencyNotFound {
                type_name: type_name.to_string(),
            })?;
        let wrapper: Arc<Arc<T>> = wrapper
            .downcast::<Arc<T>>()
            .map_err(|_| ViewError::DowncastFailed {
                type_name: type_name.to_string(),
            })?;
        Ok(wrapper.as_ref().clone())
    }

    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        self.services.contains_key(&type_id) || self.trait_mappings.contains_key(&type_id)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("services", &self.services.len())
            .field("trait_mappings", &self.trait_mappings.len())
            .finish()
    }
}
