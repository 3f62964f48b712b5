//! Common search parameters that apply to all FHIR resources.
//!
//! Every manifest starts from these; a resource-specific definition with the
//! same name replaces the common one.

use octofhir_core::ResourceType;

use crate::parameters::{SearchParameterDefinition, SearchParameterType};

const COMMON_PARAMETERS: &[(&str, SearchParameterType, &str)] = &[
    ("_id", SearchParameterType::Token, "Logical id of this artifact"),
    (
        "_lastUpdated",
        SearchParameterType::Date,
        "When the resource version last changed",
    ),
    ("_tag", SearchParameterType::Token, "Tags applied to this resource"),
    (
        "_security",
        SearchParameterType::Token,
        "Security Labels applied to this resource",
    ),
    (
        "_profile",
        SearchParameterType::Uri,
        "Profiles this resource claims to conform to",
    ),
    (
        "_source",
        SearchParameterType::Uri,
        "Identifies where the resource comes from",
    ),
];

/// The Resource-level parameters, instantiated for `resource_type`.
pub fn common_parameters(resource_type: &ResourceType) -> Vec<SearchParameterDefinition> {
    let params: Vec<_> = COMMON_PARAMETERS
        .iter()
        .map(|(name, param_type, description)| {
            let url = format!(
                "http://hl7.org/fhir/SearchParameter/Resource-{}",
                name.trim_start_matches('_')
            );
            SearchParameterDefinition::new(resource_type.clone(), *name, *param_type)
                .with_url(url)
                .with_description(*description)
        })
        .collect();

    tracing::trace!(
        resource_type = %resource_type,
        count = params.len(),
        "Instantiated common search parameters"
    );
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_parameters() {
        let params = common_parameters(&ResourceType::Patient);
        assert_eq!(params.len(), 6);

        let last_updated = params.iter().find(|p| p.name == "_lastUpdated").unwrap();
        assert_eq!(last_updated.param_type(), SearchParameterType::Date);
        assert_eq!(last_updated.resource_type, ResourceType::Patient);
        assert_eq!(
            last_updated.url.as_deref(),
            Some("http://hl7.org/fhir/SearchParameter/Resource-lastUpdated")
        );

        let profile = params.iter().find(|p| p.name == "_profile").unwrap();
        assert_eq!(profile.param_type(), SearchParameterType::Uri);
    }
}
