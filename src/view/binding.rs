use super::{Dependency, View, derive_dependencies};
use crate::arguments::{Arguments, Injected, Value};
use crate::error::{Result, ViewError};
use crate::signature::{ParamDefault, Parameter, Signature, Source, TypeInfo};
use std::fmt;
use std::sync::Arc;

type Initializer = Arc<dyn Fn(Arguments) -> Result<Value> + Send + Sync>;

/// A view whose initializer has been rewritten for injection.
pub struct ClassBinding {
    class: TypeInfo,
    dependencies: Vec<Dependency>,
    signature: Signature,
    initializer: Initializer,
}

impl ClassBinding {
    /// Derives the dependencies of `C` and wraps its initializer.
    ///
    /// The published signature lists the original initializer parameters
    /// (variadics dropped) followed by one keyword-only parameter per
    /// dependency.
    pub fn install<C: View>() -> Result<Self> {
        let class = TypeInfo::of::<C>();
        let dependencies = derive_dependencies(C::declarations());
        let original = C::init_signature();

        let mut parameters: Vec<Parameter> = original
            .parameters()
            .iter()
            .filter(|p| !p.is_variadic())
            .cloned()
            .collect();
        for dependency in &dependencies {
            if original.get(dependency.name()).is_some() {
                return Err(ViewError::DependencyCollision {
                    class: class.name().to_string(),
                    name: dependency.name().to_string(),
                });
            }
            let default = match dependency.default() {
                Some(value) => ParamDefault::Value(value.clone()),
                None => ParamDefault::Empty,
            };
            parameters.push(
                Parameter::new(dependency.name(), Source::Service)
                    .keyword_only()
                    .with_annotation(dependency.ty())
                    .with_default(default),
            );
        }
        let signature = Signature::validated(parameters)?;

        let names: Vec<String> = dependencies.iter().map(|d| d.name().to_string()).collect();
        let initializer: Initializer = Arc::new(move |mut args: Arguments| -> Result<Value> {
            let mut injected = Injected::for_class(class.name());
            for name in &names {
                let value = args
                    .pop_keyword(name)
                    .ok_or_else(|| ViewError::DependencyMissing {
                        class: class.name().to_string(),
                        name: name.clone(),
                    })?;
                injected.assign(name.clone(), value);
            }
            let bound = args.bind(&original)?;
            let instance: Value = Arc::new(C::init(injected, bound)?);
            Ok(instance)
        });

        Ok(Self {
            class,
            dependencies,
            signature,
            initializer,
        })
    }

    pub fn class(&self) -> TypeInfo {
        self.class
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// The initializer signature the injector resolves.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Runs the wrapped initializer. Every dependency must be present among
    /// the keyword arguments.
    pub fn construct(&self, args: Arguments) -> Result<Value> {
        (self.initializer)(args)
    }

    pub fn construct_as<C: View>(&self, args: Arguments) -> Result<Arc<C>> {
        self.construct(args)?
            .downcast::<C>()
            .map_err(|_| ViewError::DowncastFailed {
                type_name: std::any::type_name::<C>().to_string(),
            })
    }
}

impl fmt::Debug for ClassBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassBinding")
            .field("class", &self.class)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}
