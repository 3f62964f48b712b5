//! Search parameter registry and per-resource-type manifests.
//!
//! A [`ParameterTable`] is the registration data: which parameters exist on
//! which resource types. The [`SearchParameterRegistry`] turns it into one
//! immutable [`ResourceTypeManifest`] per resource type, built on first use
//! and memoized in a DashMap so concurrent parsers read it without locking.

use dashmap::DashMap;
use indexmap::IndexMap;
use octofhir_core::ResourceType;
use std::str::FromStr;
use std::sync::Arc;

use crate::common::common_parameters;
use crate::error::SearchError;
use crate::model::builtin_table;
use crate::parameters::SearchParameterDefinition;

/// Registration table: resource type -> parameter name -> definition.
#[derive(Debug, Clone, Default)]
pub struct ParameterTable {
    entries: IndexMap<ResourceType, IndexMap<String, SearchParameterDefinition>>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition under its own resource type, replacing any
    /// definition with the same name.
    pub fn register(&mut self, definition: SearchParameterDefinition) {
        self.entries
            .entry(definition.resource_type.clone())
            .or_default()
            .insert(definition.name.clone(), definition);
    }

    /// Declare a resource type that has no parameters beyond the common ones.
    pub fn declare(&mut self, resource_type: ResourceType) {
        self.entries.entry(resource_type).or_default();
    }

    pub fn contains(&self, resource_type: &ResourceType) -> bool {
        self.entries.contains_key(resource_type)
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &ResourceType> {
        self.entries.keys()
    }

    pub fn definitions(
        &self,
        resource_type: &ResourceType,
    ) -> impl Iterator<Item = &SearchParameterDefinition> {
        self.entries
            .get(resource_type)
            .into_iter()
            .flat_map(|params| params.values())
    }

    /// Number of registered definitions across all resource types.
    pub fn len(&self) -> usize {
        self.entries.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<SearchParameterDefinition> for ParameterTable {
    fn from_iter<I: IntoIterator<Item = SearchParameterDefinition>>(iter: I) -> Self {
        let mut table = Self::new();
        for definition in iter {
            table.register(definition);
        }
        table
    }
}

/// All search parameters of one resource type, keyed by name.
///
/// Never mutated after construction.
#[derive(Debug, Clone)]
pub struct ResourceTypeManifest {
    resource_type: ResourceType,
    parameters: IndexMap<String, Arc<SearchParameterDefinition>>,
}

impl ResourceTypeManifest {
    pub fn resource_type(&self) -> &ResourceType {
        &self.resource_type
    }

    pub fn get(&self, name: &str) -> Option<&Arc<SearchParameterDefinition>> {
        self.parameters.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    /// Definitions in registration order, common parameters first.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<SearchParameterDefinition>> {
        self.parameters.values()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

/// Registry of manifests for every resource type in a [`ParameterTable`].
#[derive(Debug)]
pub struct SearchParameterRegistry {
    table: ParameterTable,
    manifests: DashMap<ResourceType, Arc<ResourceTypeManifest>>,
}

impl Default for SearchParameterRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl SearchParameterRegistry {
    pub fn new(table: ParameterTable) -> Self {
        tracing::debug!(
            resource_types = table.entries.len(),
            definitions = table.len(),
            "Created search parameter registry"
        );
        Self {
            table,
            manifests: DashMap::new(),
        }
    }

    /// Registry over the built-in FHIR R4 resource model.
    pub fn with_builtin() -> Self {
        Self::new(builtin_table())
    }

    /// Manifest for `resource_type`, building it on first access.
    pub fn get_manifest(
        &self,
        resource_type: &ResourceType,
    ) -> Result<Arc<ResourceTypeManifest>, SearchError> {
        if let Some(manifest) = self.manifests.get(resource_type) {
            return Ok(manifest.clone());
        }
        if !self.table.contains(resource_type) {
            return Err(SearchError::UnknownResourceType(
                resource_type.as_str().to_string(),
            ));
        }

        let manifest = self
            .manifests
            .entry(resource_type.clone())
            .or_insert_with(|| Arc::new(self.build_manifest(resource_type)))
            .clone();
        Ok(manifest)
    }

    /// Manifest for a resource type given by name.
    pub fn get_manifest_by_name(
        &self,
        resource_type: &str,
    ) -> Result<Arc<ResourceTypeManifest>, SearchError> {
        let parsed = ResourceType::from_str(resource_type)
            .map_err(|_| SearchError::UnknownResourceType(resource_type.to_string()))?;
        self.get_manifest(&parsed)
    }

    /// Look up one definition.
    pub fn get(
        &self,
        resource_type: &ResourceType,
        name: &str,
    ) -> Option<Arc<SearchParameterDefinition>> {
        self.get_manifest(resource_type)
            .ok()
            .and_then(|manifest| manifest.get(name).cloned())
    }

    pub fn contains(&self, resource_type: &ResourceType) -> bool {
        self.table.contains(resource_type)
    }

    /// Every known resource type, sorted by name.
    pub fn resource_types(&self) -> Vec<ResourceType> {
        let mut types: Vec<ResourceType> = self.table.resource_types().cloned().collect();
        types.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        types
    }

    /// Number of manifests built so far.
    pub fn cached_manifests(&self) -> usize {
        self.manifests.len()
    }

    fn build_manifest(&self, resource_type: &ResourceType) -> ResourceTypeManifest {
        let mut parameters = IndexMap::new();
        for definition in common_parameters(resource_type) {
            parameters.insert(definition.name.clone(), Arc::new(definition));
        }
        for definition in self.table.definitions(resource_type) {
            parameters.insert(definition.name.clone(), Arc::new(definition.clone()));
        }

        tracing::debug!(
            resource_type = %resource_type,
            count = parameters.len(),
            "Built search parameter manifest"
        );
        ResourceTypeManifest {
            resource_type: resource_type.clone(),
            parameters,
        }
    }
}
