use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// FHIR resource types known to the built-in search model.
///
/// Any other syntactically valid type name is carried as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Patient,
    Practitioner,
    Organization,
    Encounter,
    Observation,
    Condition,
    DiagnosticReport,
    Location,
    Group,
    Device,
    StructureDefinition,
    ValueSet,
    CodeSystem,
    #[serde(untagged)]
    Custom(String),
}

impl ResourceType {
    /// The type name as it appears in queries and references.
    pub fn as_str(&self) -> &str {
        match self {
            ResourceType::Patient => "Patient",
            ResourceType::Practitioner => "Practitioner",
            ResourceType::Organization => "Organization",
            ResourceType::Encounter => "Encounter",
            ResourceType::Observation => "Observation",
            ResourceType::Condition => "Condition",
            ResourceType::DiagnosticReport => "DiagnosticReport",
            ResourceType::Location => "Location",
            ResourceType::Group => "Group",
            ResourceType::Device => "Device",
            ResourceType::StructureDefinition => "StructureDefinition",
            ResourceType::ValueSet => "ValueSet",
            ResourceType::CodeSystem => "CodeSystem",
            ResourceType::Custom(name) => name,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Patient" => Ok(ResourceType::Patient),
            "Practitioner" => Ok(ResourceType::Practitioner),
            "Organization" => Ok(ResourceType::Organization),
            "Encounter" => Ok(ResourceType::Encounter),
            "Observation" => Ok(ResourceType::Observation),
            "Condition" => Ok(ResourceType::Condition),
            "DiagnosticReport" => Ok(ResourceType::DiagnosticReport),
            "Location" => Ok(ResourceType::Location),
            "Group" => Ok(ResourceType::Group),
            "Device" => Ok(ResourceType::Device),
            "StructureDefinition" => Ok(ResourceType::StructureDefinition),
            "ValueSet" => Ok(ResourceType::ValueSet),
            "CodeSystem" => Ok(ResourceType::CodeSystem),
            name => {
                if is_valid_resource_type_name(name) {
                    Ok(ResourceType::Custom(name.to_string()))
                } else {
                    Err(CoreError::invalid_resource_type(name.to_string()))
                }
            }
        }
    }
}

/// Validate if a string is a valid FHIR resource type name
pub fn is_valid_resource_type_name(name: &str) -> bool {
    // Must start with an uppercase letter and contain only letters
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && name.chars().all(|c| c.is_ascii_alphabetic())
}
