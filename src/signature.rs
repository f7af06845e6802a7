//! Explicit parameter lists for endpoints and view initializers.
//!
//! A [`Signature`] is the registration record the injector reads at request
//! time: for every parameter it knows the name, how it binds, where its value
//! comes from and what to fall back to.

use crate::arguments::Value;
use crate::error::{Result, ViewError};
use crate::view::ClassBinding;
use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// A type identity paired with its readable name.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
}

impl TypeInfo {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    PositionalOrKeyword,
    KeywordOnly,
    VarPositional,
    VarKeyword,
}

/// Where the injector looks for a parameter's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The implicit receiver slot. Only resolvable through a
    /// [`ParamDefault::Construct`] marker.
    Receiver,
    Path,
    Query,
    Header,
    Body,
    /// Resolved from the DI container by the parameter's annotation.
    Service,
}

#[derive(Clone)]
pub enum ParamDefault {
    Empty,
    Value(Value),
    /// Build one instance of the bound view per request.
    Construct(Arc<ClassBinding>),
}

impl fmt::Debug for ParamDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamDefault::Empty => f.write_str("Empty"),
            ParamDefault::Value(_) => f.write_str("Value(..)"),
            ParamDefault::Construct(binding) => {
                f.debug_tuple("Construct").field(&binding.class()).finish()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    kind: ParameterKind,
    source: Source,
    annotation: Option<TypeInfo>,
    default: ParamDefault,
}

impl Parameter {
    pub fn new(name: impl Into<String>, source: Source) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::PositionalOrKeyword,
            source,
            annotation: None,
            default: ParamDefault::Empty,
        }
    }

    pub fn receiver(name: impl Into<String>) -> Self {
        Self::new(name, Source::Receiver)
    }

    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name, Source::Path)
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self::new(name, Source::Query)
    }

    pub fn header(name: impl Into<String>) -> Self {
        Self::new(name, Source::Header)
    }

    pub fn body(name: impl Into<String>) -> Self {
        Self::new(name, Source::Body)
    }

    /// A parameter resolved from the container as `Arc<T>`.
    pub fn service<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::new(name, Source::Service).with_annotation(TypeInfo::of::<T>())
    }

    pub fn var_positional(name: impl Into<String>) -> Self {
        Self::new(name, Source::Query).with_kind(ParameterKind::VarPositional)
    }

    pub fn var_keyword(name: impl Into<String>) -> Self {
        Self::new(name, Source::Query).with_kind(ParameterKind::VarKeyword)
    }

    pub fn with_kind(mut self, kind: ParameterKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn keyword_only(self) -> Self {
        self.with_kind(ParameterKind::KeywordOnly)
    }

    pub fn with_annotation(mut self, annotation: TypeInfo) -> Self {
        self.annotation = Some(annotation);
        self
    }

    pub fn annotated<T: ?Sized + 'static>(self) -> Self {
        self.with_annotation(TypeInfo::of::<T>())
    }

    pub fn with_default(mut self, default: ParamDefault) -> Self {
        self.default = default;
        self
    }

    pub fn with_default_value(self, value: Value) -> Self {
        self.with_default(ParamDefault::Value(value))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn annotation(&self) -> Option<TypeInfo> {
        self.annotation
    }

    pub fn default(&self) -> &ParamDefault {
        &self.default
    }

    pub fn is_variadic(&self) -> bool {
        matches!(
            self.kind,
            ParameterKind::VarPositional | ParameterKind::VarKeyword
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct Signature {
    parameters: Vec<Parameter>,
}

impl Signature {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a signature, rejecting duplicate parameter names.
    pub fn validated(parameters: Vec<Parameter>) -> Result<Self> {
        let mut seen = HashSet::new();
        for parameter in &parameters {
            if !seen.insert(parameter.name()) {
                return Err(ViewError::DuplicateParameter {
                    name: parameter.name().to_string(),
                });
            }
        }
        Ok(Self { parameters })
    }

    pub fn with(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn first(&self) -> Option<&Parameter> {
        self.parameters.first()
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name() == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(Parameter::name)
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validated_rejects_duplicates() {
        let err = Signature::validated(vec![Parameter::query("a"), Parameter::path("a")])
            .unwrap_err();
        assert!(matches!(err, ViewError::DuplicateParameter { name } if name == "a"));
    }

    #[test]
    fn test_builder_keeps_declaration_order() {
        let sig = Signature::empty()
            .with(Parameter::receiver("self"))
            .with(Parameter::path("id").annotated::<String>())
            .with(Parameter::query("verbose").keyword_only());

        assert_eq!(sig.names().collect::<Vec<_>>(), ["self", "id", "verbose"]);
        assert_eq!(sig.get("id").unwrap().annotation(), Some(TypeInfo::of::<String>()));
        assert_eq!(sig.get("verbose").unwrap().kind(), ParameterKind::KeywordOnly);
        assert_eq!(sig.first().unwrap().source(), Source::Receiver);
    }
}
