use crate::error::{Result, ViewError};
use crate::signature::{ParamDefault, ParameterKind, Signature};
use serde::de::DeserializeOwned;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A type-erased argument value.
pub type Value = Arc<dyn Any + Send + Sync>;

pub fn value<T: Send + Sync + 'static>(inner: T) -> Value {
    Arc::new(inner)
}

fn downcast<T: Send + Sync + 'static>(name: &str, value: Value) -> Result<Arc<T>> {
    value.downcast::<T>().map_err(|_| ViewError::DowncastFailed {
        type_name: format!("{} (argument `{}`)", std::any::type_name::<T>(), name),
    })
}

/// Call-time arguments, supplied either by position or by name.
#[derive(Clone, Default)]
pub struct Arguments {
    positional: Vec<Value>,
    keyword: HashMap<String, Value>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: Value) -> &mut Self {
        self.positional.push(value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.keyword.insert(name.into(), value);
        self
    }

    pub fn with_positional(mut self, value: Value) -> Self {
        self.push(value);
        self
    }

    pub fn with_keyword(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn contains_keyword(&self, name: &str) -> bool {
        self.keyword.contains_key(name)
    }

    pub fn keyword_names(&self) -> impl Iterator<Item = &str> {
        self.keyword.keys().map(String::as_str)
    }

    pub fn pop_keyword(&mut self, name: &str) -> Option<Value> {
        self.keyword.remove(name)
    }

    /// Maps these arguments onto `signature`.
    ///
    /// Positional values fill positional-or-keyword parameters in order, named
    /// values fill the rest, and `Value` defaults cover what is left. Variadic
    /// parameters collect the surplus; without them surplus is an error.
    pub fn bind(self, signature: &Signature) -> Result<BoundArguments> {
        let Arguments {
            positional,
            mut keyword,
        } = self;
        let mut positional = positional.into_iter();
        let mut bound = BoundArguments::default();
        let mut takes_var_positional = false;
        let mut takes_var_keyword = false;

        for parameter in signature.parameters() {
            let name = parameter.name();
            let value = match parameter.kind() {
                ParameterKind::VarPositional => {
                    takes_var_positional = true;
                    continue;
                }
                ParameterKind::VarKeyword => {
                    takes_var_keyword = true;
                    continue;
                }
                ParameterKind::PositionalOrKeyword => match positional.next() {
                    Some(value) => {
                        if keyword.contains_key(name) {
                            return Err(ViewError::UnexpectedArgument {
                                message: format!("multiple values for `{name}`"),
                            });
                        }
                        Some(value)
                    }
                    None => keyword.remove(name),
                },
                ParameterKind::KeywordOnly => keyword.remove(name),
            };

            let value = match (value, parameter.default()) {
                (Some(value), _) => value,
                (None, ParamDefault::Value(default)) => default.clone(),
                (None, _) => {
                    return Err(ViewError::ArgumentMissing {
                        name: name.to_string(),
                    });
                }
            };
            bound.values.insert(name.to_string(), value);
        }

        let surplus: Vec<Value> = positional.collect();
        if !surplus.is_empty() {
            if !takes_var_positional {
                return Err(ViewError::UnexpectedArgument {
                    message: format!("{} surplus positional argument(s)", surplus.len()),
                });
            }
            bound.rest_positional = surplus;
        }
        if !keyword.is_empty() {
            if !takes_var_keyword {
                let mut names: Vec<_> = keyword.into_keys().collect();
                names.sort();
                return Err(ViewError::UnexpectedArgument {
                    message: format!("unknown keyword(s) {}", names.join(", ")),
                });
            }
            bound.rest_keyword = keyword;
        }
        Ok(bound)
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments")
            .field("positional", &self.positional.len())
            .field("keyword", &self.keyword.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Arguments after they have been matched to a signature.
#[derive(Default)]
pub struct BoundArguments {
    values: HashMap<String, Value>,
    rest_positional: Vec<Value>,
    rest_keyword: HashMap<String, Value>,
}

impl BoundArguments {
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn take_value(&mut self, name: &str) -> Result<Value> {
        self.values
            .remove(name)
            .ok_or_else(|| ViewError::ArgumentMissing {
                name: name.to_string(),
            })
    }

    pub fn take<T: Send + Sync + 'static>(&mut self, name: &str) -> Result<Arc<T>> {
        let value = self.take_value(name)?;
        downcast(name, value)
    }

    /// Takes an argument that was resolved as `Arc<dyn Trait>`.
    pub fn take_trait<T: ?Sized + Send + Sync + 'static>(&mut self, name: &str) -> Result<Arc<T>> {
        self.take::<Arc<T>>(name).map(|wrapper| wrapper.as_ref().clone())
    }

    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>> {
        let value = self
            .values
            .get(name)
            .cloned()
            .ok_or_else(|| ViewError::ArgumentMissing {
                name: name.to_string(),
            })?;
        downcast(name, value)
    }

    pub fn text(&mut self, name: &str) -> Result<String> {
        self.take::<String>(name).map(|s| s.as_ref().clone())
    }

    /// Parses a textual argument (path, query or header value).
    pub fn parse<T>(&mut self, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.take::<String>(name)?;
        raw.parse::<T>().map_err(|e| ViewError::InvalidArgument {
            name: name.to_string(),
            message: e.to_string(),
        })
    }

    /// Deserializes a JSON body argument.
    pub fn json<T: DeserializeOwned>(&mut self, name: &str) -> Result<T> {
        let raw = self.take::<serde_json::Value>(name)?;
        serde_json::from_value(raw.as_ref().clone()).map_err(|e| ViewError::InvalidArgument {
            name: name.to_string(),
            message: e.to_string(),
        })
    }

    pub fn rest_positional(&self) -> &[Value] {
        &self.rest_positional
    }

    pub fn rest_keyword(&self) -> &HashMap<String, Value> {
        &self.rest_keyword
    }
}

impl fmt::Debug for BoundArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.values.keys().collect();
        names.sort();
        f.debug_struct("BoundArguments")
            .field("values", &names)
            .field("rest_positional", &self.rest_positional.len())
            .field("rest_keyword", &self.rest_keyword.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Dependency values assigned to a view while it is constructed.
#[derive(Default)]
pub struct Injected {
    class: &'static str,
    values: HashMap<String, Value>,
}

impl Injected {
    pub(crate) fn for_class(class: &'static str) -> Self {
        Self {
            class,
            values: HashMap::new(),
        }
    }

    pub(crate) fn assign(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    fn take_value(&mut self, name: &str) -> Result<Value> {
        self.values
            .remove(name)
            .ok_or_else(|| ViewError::DependencyMissing {
                class: self.class.to_string(),
                name: name.to_string(),
            })
    }

    pub fn take<T: Send + Sync + 'static>(&mut self, name: &str) -> Result<Arc<T>> {
        let value = self.take_value(name)?;
        downcast(name, value)
    }

    pub fn take_trait<T: ?Sized + Send + Sync + 'static>(&mut self, name: &str) -> Result<Arc<T>> {
        self.take::<Arc<T>>(name).map(|wrapper| wrapper.as_ref().clone())
    }

    pub fn cloned<T: Clone + Send + Sync + 'static>(&mut self, name: &str) -> Result<T> {
        self.take::<T>(name).map(|v| v.as_ref().clone())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
