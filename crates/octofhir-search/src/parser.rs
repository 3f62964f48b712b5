//! Query expression parser.
//!
//! Compiles `key=value` pairs into [`Expression`] trees. A key is
//! `segment ( '.' segment )* ( ':' modifier )?`: every segment but the last
//! names a reference parameter (optionally scoped as `ref:Type`), the last one
//! names the parameter that is finally matched.

use std::sync::Arc;

use octofhir_core::ResourceType;
use url::form_urlencoded;

use crate::chaining::parse_chain;
use crate::config::SearchCompilerConfig;
use crate::error::SearchError;
use crate::expression::Expression;
use crate::registry::{ResourceTypeManifest, SearchParameterRegistry};
use crate::types::BuildContext;
use crate::value::parse_value;

/// Parameters that control the result set rather than filter it.
const RESULT_PARAMETERS: &[&str] = &[
    "_count",
    "_offset",
    "_sort",
    "_include",
    "_revinclude",
    "_summary",
    "_elements",
    "_total",
    "_contained",
    "_containedType",
    "_format",
    "_pretty",
];

/// Compiles search keys against a parameter registry.
///
/// Holds no per-query state; one instance serves any number of concurrent
/// compilations.
#[derive(Debug, Clone)]
pub struct QueryExpressionParser {
    registry: Arc<SearchParameterRegistry>,
    config: SearchCompilerConfig,
}

impl QueryExpressionParser {
    pub fn new(registry: Arc<SearchParameterRegistry>, config: SearchCompilerConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<SearchParameterRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &SearchCompilerConfig {
        &self.config
    }

    /// Compile one `key=value` pair against `manifest`.
    pub fn parse(
        &self,
        manifest: &ResourceTypeManifest,
        key: &str,
        value: &str,
    ) -> Result<Expression, SearchError> {
        let hops = key.matches('.').count();
        if hops > self.config.max_chain_depth {
            return Err(SearchError::ChainTooDeep {
                key: key.to_string(),
                max_depth: self.config.max_chain_depth,
            });
        }

        let ctx = BuildContext::from_config(&self.config);
        let expr = self.parse_key(&ctx, manifest, key, value)?;
        tracing::trace!(
            resource_type = %manifest.resource_type(),
            key,
            value,
            expression = %expr,
            "Compiled search parameter"
        );
        Ok(expr)
    }

    /// Compile one pair for a resource type given by name.
    pub fn parse_for_type(
        &self,
        resource_type: &str,
        key: &str,
        value: &str,
    ) -> Result<Expression, SearchError> {
        let manifest = self.registry.get_manifest_by_name(resource_type)?;
        self.parse(&manifest, key, value)
    }

    /// Compile a form-encoded query string, conjoining its pairs with `And`.
    ///
    /// Result-shaping parameters such as `_count` are skipped. Returns `None`
    /// when nothing is left to filter on.
    pub fn parse_query(
        &self,
        resource_type: &str,
        query: &str,
    ) -> Result<Option<Expression>, SearchError> {
        let manifest = self.registry.get_manifest_by_name(resource_type)?;
        let query = query.strip_prefix('?').unwrap_or(query);

        let mut children = Vec::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if key.is_empty() {
                continue;
            }
            if is_result_parameter(&key) {
                tracing::debug!(key = %key, "Skipping result parameter");
                continue;
            }
            children.push(self.parse(&manifest, &key, &value)?);
        }

        if children.is_empty() {
            return Ok(None);
        }
        Ok(Some(Expression::and(children)))
    }

    /// Compile a key without the chain depth check; callers go through [`Self::parse`].
    pub(crate) fn parse_key(
        &self,
        ctx: &BuildContext,
        manifest: &ResourceTypeManifest,
        key: &str,
        value: &str,
    ) -> Result<Expression, SearchError> {
        match key.split_once('.') {
            Some((head, nested_key)) => parse_chain(self, ctx, manifest, head, nested_key, value),
            None => self.parse_leaf(ctx, manifest, key, value),
        }
    }

    pub(crate) fn manifest_for(
        &self,
        resource_type: &ResourceType,
    ) -> Result<Arc<ResourceTypeManifest>, SearchError> {
        self.registry.get_manifest(resource_type)
    }

    fn parse_leaf(
        &self,
        ctx: &BuildContext,
        manifest: &ResourceTypeManifest,
        key: &str,
        value: &str,
    ) -> Result<Expression, SearchError> {
        let (name, modifier) = split_name_and_modifier(key)?;
        let definition = manifest
            .get(name)
            .ok_or_else(|| SearchError::unknown_parameter(name, manifest.resource_type().as_str()))?;
        parse_value(ctx, definition, modifier, value)
    }
}

/// Split `name:modifier`. At most one `:` is allowed and neither side may be empty.
pub fn split_name_and_modifier(key: &str) -> Result<(&str, Option<&str>), SearchError> {
    let mut parts = key.split(':');
    let name = parts.next().unwrap_or_default();
    let modifier = parts.next();

    if parts.next().is_some() {
        return Err(SearchError::malformed_key(key, "only one ':' modifier is allowed"));
    }
    if name.is_empty() {
        return Err(SearchError::malformed_key(key, "parameter name is empty"));
    }
    if modifier == Some("") {
        return Err(SearchError::malformed_key(key, "modifier is empty"));
    }
    Ok((name, modifier))
}

pub fn is_result_parameter(key: &str) -> bool {
    let name = key.split(':').next().unwrap_or(key);
    RESULT_PARAMETERS.contains(&name)
}
