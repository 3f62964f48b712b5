//! Hot-swappable query compiler.
//!
//! Callers take a snapshot with [`ReloadableQueryParser::current`] and compile
//! against it; a reload publishes a new parser atomically without blocking
//! readers, and compilations already running keep their snapshot.

use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::info;

use crate::config::{ConfigError, SearchCompilerConfig};
use crate::parser::QueryExpressionParser;
use crate::registry::SearchParameterRegistry;

#[derive(Debug)]
pub struct ReloadableQueryParser {
    inner: ArcSwap<QueryExpressionParser>,
}

impl ReloadableQueryParser {
    pub fn new(parser: QueryExpressionParser) -> Self {
        Self {
            inner: ArcSwap::from_pointee(parser),
        }
    }

    /// Build from a registry and a configuration, validating the configuration.
    pub fn from_parts(
        registry: Arc<SearchParameterRegistry>,
        config: SearchCompilerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(QueryExpressionParser::new(registry, config)))
    }

    /// Current parser snapshot. Lock-free.
    pub fn current(&self) -> Arc<QueryExpressionParser> {
        self.inner.load_full()
    }

    /// Replace both the registry and the configuration.
    pub fn reload(
        &self,
        registry: Arc<SearchParameterRegistry>,
        config: SearchCompilerConfig,
    ) -> Result<(), ConfigError> {
        config.validate()?;
        let resource_types = registry.resource_types().len();
        self.inner
            .store(Arc::new(QueryExpressionParser::new(registry, config)));
        info!(resource_types, "Search parameter registry reloaded");
        Ok(())
    }

    /// Replace the configuration, keeping the current registry.
    pub fn update_config(&self, config: SearchCompilerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let registry = self.current().registry().clone();
        self.inner
            .store(Arc::new(QueryExpressionParser::new(registry, config)));
        info!("Search compiler configuration updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::parameters::{SearchParameterDefinition, SearchParameterType};
    use crate::registry::ParameterTable;
    use octofhir_core::ResourceType;

    fn reloadable() -> ReloadableQueryParser {
        ReloadableQueryParser::from_parts(
            Arc::new(SearchParameterRegistry::with_builtin()),
            SearchCompilerConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_reload_swaps_registry() {
        let reloadable = reloadable();
        let before = reloadable.current();
        assert!(before.parse_for_type("Patient", "family", "x").is_ok());

        let table: ParameterTable = [SearchParameterDefinition::new(
            ResourceType::Patient,
            "nickname",
            SearchParameterType::String,
        )]
        .into_iter()
        .collect();
        reloadable
            .reload(
                Arc::new(SearchParameterRegistry::new(table)),
                SearchCompilerConfig::default(),
            )
            .unwrap();

        let after = reloadable.current();
        assert!(after.parse_for_type("Patient", "nickname", "x").is_ok());
        let err = after.parse_for_type("Patient", "family", "x").unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownSearchParameter);

        // The old snapshot still works.
        assert!(before.parse_for_type("Patient", "family", "x").is_ok());
    }

    #[test]
    fn test_update_config_keeps_registry() {
        let reloadable = reloadable();
        let registry = reloadable.current().registry().clone();

        let config = SearchCompilerConfig {
            max_chain_depth: 1,
            ..SearchCompilerConfig::default()
        };
        reloadable.update_config(config).unwrap();

        let current = reloadable.current();
        assert!(Arc::ptr_eq(current.registry(), &registry));
        assert_eq!(current.config().max_chain_depth, 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let reloadable = reloadable();
        let config = SearchCompilerConfig {
            approximate_fraction: -1.0,
            ..SearchCompilerConfig::default()
        };
        assert!(reloadable.update_config(config).is_err());
        assert_eq!(reloadable.current().config().approximate_fraction, 0.1);
    }
}
