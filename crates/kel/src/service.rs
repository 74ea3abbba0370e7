//! Public service surface.
//!
//! [`KelService`] binds one evaluation scope (and its type registry) to the
//! pipeline and answers editor/runtime queries against expression text:
//!
//! | operation                               | result                     |
//! |-----------------------------------------|----------------------------|
//! | [`KelService::provide_validation`]      | diagnostics, source order  |
//! | [`KelService::provide_completion`]      | ranked completion items    |
//! | [`KelService::provide_info_at_location`]| hover type / function info |
//! | [`KelService::resolve_type`]            | type named in the registry |
//! | [`KelService::resolve_expression_evaluation_type`] | inferred type   |
//!
//! The service is `Send + Sync`; the scope graph is immutable and the only
//! shared mutable state is the [`ExpressionCache`].

use std::fs;
use std::path::Path;
use std::sync::Arc;

use kel_ast::{NodeKind, Scope, SourceText, Type, TypeRegistry};
use kel_parser::ParseError;
use kel_resolve::{
    CompletionItem, Diagnostic, DiagnosticKind, FunctionLibrary, LocationInfo, ValidationOptions,
    complete, generate, info_at_location, registry_from_str, scope_from_str, validate,
};
use tracing::{debug, instrument};

use crate::cache::{CompiledExpression, ExpressionCache};
use crate::config::ServiceConfig;
use crate::error::ServiceError;

#[derive(Debug)]
pub struct KelService {
    scope: Arc<Scope>,
    options: ValidationOptions,
    cache: ExpressionCache,
}

impl KelService {
    /// Bind a service to `scope`, installing the standard library above it
    /// when configured.
    pub fn new(scope: Arc<Scope>, config: ServiceConfig) -> Self {
        let scope = if config.include_standard_library {
            FunctionLibrary::standard().install(&scope)
        } else {
            scope
        };
        debug!(
            scope = scope.name(),
            types = scope.all_types().len(),
            cache_capacity = config.cache_capacity,
            "service ready"
        );
        Self {
            scope,
            options: config.validation_options(),
            cache: ExpressionCache::new(config.cache_capacity),
        }
    }

    /// Build from the JSON text of a type registry and a scope graph.
    pub fn from_payloads(
        registry_json: &str,
        scope_json: &str,
        config: ServiceConfig,
    ) -> Result<Self, ServiceError> {
        let registry = Arc::new(registry_from_str(registry_json)?);
        let scope = scope_from_str(scope_json, registry)?;
        Ok(Self::new(scope, config))
    }

    pub fn from_files(
        registry_path: impl AsRef<Path>,
        scope_path: impl AsRef<Path>,
        config: ServiceConfig,
    ) -> Result<Self, ServiceError> {
        let registry_json = read(registry_path.as_ref())?;
        let scope_json = read(scope_path.as_ref())?;
        Self::from_payloads(&registry_json, &scope_json, config)
    }

    pub fn scope(&self) -> &Arc<Scope> {
        &self.scope
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        self.scope.all_types()
    }

    pub fn cache(&self) -> &ExpressionCache {
        &self.cache
    }

    /// Parse and type `expression`, reusing a cached entry when present.
    pub fn compile(&self, expression: &str) -> Result<Arc<CompiledExpression>, ServiceError> {
        self.cache.get_or_insert_with(expression, || {
            let parsed = kel_parser::parse(expression);
            let node = generate(&parsed.expr, &self.scope)?;
            Ok(CompiledExpression::new(node, parsed.errors))
        })
    }

    /// All diagnostics for `expression`, ordered by source position.
    ///
    /// Parser errors not already represented by an `EMPTY`/`ERROR` node
    /// (such as trailing tokens) are reported as syntax diagnostics.
    #[instrument(skip_all)]
    pub fn provide_validation(&self, expression: &str) -> Result<Vec<Diagnostic>, ServiceError> {
        let compiled = self.compile(expression)?;
        let mut diagnostics = validate(&compiled.node, &self.options);

        let source = SourceText::new(expression);
        let leftovers: Vec<_> = compiled
            .parse_errors
            .iter()
            .filter(|error| !is_reported(&diagnostics, error))
            .map(|error| syntax_diagnostic(&source, error))
            .collect();
        diagnostics.extend(leftovers);

        diagnostics.sort_by_key(|d| d.span.map_or(u32::MAX, |span| span.start));
        debug!(
            diagnostics = diagnostics.len(),
            errors = diagnostics.iter().filter(|d| d.is_error()).count(),
            "validated expression"
        );
        Ok(diagnostics)
    }

    #[instrument(skip_all, fields(cursor = cursor))]
    pub fn provide_completion(
        &self,
        expression: &str,
        cursor: u32,
    ) -> Result<Vec<CompletionItem>, ServiceError> {
        let compiled = self.compile(expression)?;
        Ok(complete(&compiled.node, cursor))
    }

    #[instrument(skip_all, fields(cursor = cursor))]
    pub fn provide_info_at_location(
        &self,
        expression: &str,
        cursor: u32,
    ) -> Result<Option<LocationInfo>, ServiceError> {
        let compiled = self.compile(expression)?;
        Ok(info_at_location(&compiled.node, cursor))
    }

    /// Resolve a type expression such as `Vehicle`, `Coverage[]` or
    /// `Number | String` against the service scope.
    pub fn resolve_type(&self, name: &str) -> Option<Type> {
        let type_expr = kel_parser::parse_type(name).ok()?;
        match self.scope.resolve_type_of(&type_expr) {
            Type::Unknown => None,
            ty => Some(ty),
        }
    }

    /// Inferred type of `expression`; `Unknown` when it cannot be typed.
    #[instrument(skip_all)]
    pub fn resolve_expression_evaluation_type(
        &self,
        expression: &str,
    ) -> Result<Type, ServiceError> {
        Ok(self.compile(expression)?.node.ty.clone())
    }
}

fn read(path: &Path) -> Result<String, ServiceError> {
    fs::read_to_string(path).map_err(|source| ServiceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn is_reported(diagnostics: &[Diagnostic], error: &ParseError) -> bool {
    diagnostics.iter().any(|diagnostic| {
        diagnostic.kind == DiagnosticKind::Syntax
            && diagnostic
                .span
                .is_some_and(|span| span.contains(error.span.start))
    })
}

fn syntax_diagnostic(source: &SourceText, error: &ParseError) -> Diagnostic {
    let text = source.snippet(&error.span).to_string();
    Diagnostic::error(
        DiagnosticKind::Syntax,
        error.span,
        NodeKind::Error { text },
        error.message.clone(),
    )
}
