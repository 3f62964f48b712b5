//! Built-in search parameter table for a subset of the FHIR R4 resource model.
//!
//! Data only: each resource type lists its parameters by name, type and (for
//! references) target types. Common parameters are added by the registry.

use octofhir_core::ResourceType;
use std::str::FromStr;

use crate::parameters::{SearchParameterDefinition, SearchParameterType as T};
use crate::registry::ParameterTable;

enum Param {
    Plain(&'static str, T),
    Reference(&'static str, &'static [&'static str]),
    Composite(&'static str, T),
}

use Param::{Composite, Plain, Reference};

const PATIENT: &[Param] = &[
    Plain("identifier", T::Token),
    Plain("name", T::String),
    Plain("family", T::String),
    Plain("given", T::String),
    Plain("birthdate", T::Date),
    Plain("gender", T::Token),
    Plain("address", T::String),
    Plain("address-city", T::String),
    Plain("address-postalcode", T::String),
    Plain("telecom", T::Token),
    Plain("phone", T::Token),
    Plain("email", T::Token),
    Plain("active", T::Token),
    Plain("deceased", T::Token),
    Plain("death-date", T::Date),
    Plain("language", T::Token),
    Reference(
        "general-practitioner",
        &["Organization", "Practitioner", "PractitionerRole"],
    ),
    Reference("organization", &["Organization"]),
    Reference("link", &["Patient", "RelatedPerson"]),
];

const PRACTITIONER: &[Param] = &[
    Plain("identifier", T::Token),
    Plain("name", T::String),
    Plain("family", T::String),
    Plain("given", T::String),
    Plain("active", T::Token),
    Plain("gender", T::Token),
    Plain("telecom", T::Token),
    Plain("address", T::String),
    Plain("address-city", T::String),
    Plain("communication", T::Token),
];

const ORGANIZATION: &[Param] = &[
    Plain("identifier", T::Token),
    Plain("name", T::String),
    Plain("phonetic", T::String),
    Plain("type", T::Token),
    Plain("active", T::Token),
    Plain("address", T::String),
    Plain("address-city", T::String),
    Plain("address-state", T::String),
    Reference("partof", &["Organization"]),
    Reference("endpoint", &["Endpoint"]),
];

const LOCATION: &[Param] = &[
    Plain("identifier", T::Token),
    Plain("name", T::String),
    Plain("address", T::String),
    Plain("address-city", T::String),
    Plain("status", T::Token),
    Plain("operational-status", T::Token),
    Plain("type", T::Token),
    Reference("organization", &["Organization"]),
    Reference("partof", &["Location"]),
];

const ENCOUNTER: &[Param] = &[
    Plain("identifier", T::Token),
    Plain("status", T::Token),
    Plain("class", T::Token),
    Plain("type", T::Token),
    Plain("date", T::Date),
    Plain("length", T::Quantity),
    Plain("reason-code", T::Token),
    Reference("subject", &["Patient", "Group"]),
    Reference("patient", &["Patient"]),
    Reference(
        "participant",
        &["Practitioner", "PractitionerRole", "RelatedPerson"],
    ),
    Reference("practitioner", &["Practitioner"]),
    Reference("service-provider", &["Organization"]),
    Reference("location", &["Location"]),
    Reference("part-of", &["Encounter"]),
];

const OBSERVATION: &[Param] = &[
    Plain("identifier", T::Token),
    Plain("code", T::Token),
    Plain("category", T::Token),
    Plain("status", T::Token),
    Plain("date", T::Date),
    Plain("value-quantity", T::Quantity),
    Plain("value-string", T::String),
    Plain("value-concept", T::Token),
    Plain("value-date", T::Date),
    Plain("component-code", T::Token),
    Plain("component-value-quantity", T::Quantity),
    Plain("method", T::Token),
    Reference("subject", &["Patient", "Group", "Device", "Location"]),
    Reference("patient", &["Patient"]),
    Reference(
        "performer",
        &[
            "Practitioner",
            "Organization",
            "Patient",
            "PractitionerRole",
            "CareTeam",
            "RelatedPerson",
        ],
    ),
    Reference("encounter", &["Encounter"]),
    Reference("device", &["Device", "DeviceMetric"]),
    Reference("has-member", &["Observation", "QuestionnaireResponse"]),
    Reference("derived-from", &["Observation", "DocumentReference"]),
    Reference("focus", &[]),
    Composite("code-value-quantity", T::Quantity),
    Composite("code-value-concept", T::Token),
    Composite("code-value-date", T::Date),
    Composite("code-value-string", T::String),
    Composite("component-code-value-quantity", T::Quantity),
    Composite("combo-code-value-quantity", T::Quantity),
];

const CONDITION: &[Param] = &[
    Plain("identifier", T::Token),
    Plain("code", T::Token),
    Plain("clinical-status", T::Token),
    Plain("verification-status", T::Token),
    Plain("category", T::Token),
    Plain("severity", T::Token),
    Plain("onset-date", T::Date),
    Plain("recorded-date", T::Date),
    Plain("abatement-age", T::Quantity),
    Reference("subject", &["Patient", "Group"]),
    Reference("patient", &["Patient"]),
    Reference("encounter", &["Encounter"]),
    Reference(
        "asserter",
        &["Practitioner", "Patient", "RelatedPerson", "PractitionerRole"],
    ),
];

const DIAGNOSTIC_REPORT: &[Param] = &[
    Plain("identifier", T::Token),
    Plain("code", T::Token),
    Plain("status", T::Token),
    Plain("category", T::Token),
    Plain("conclusion", T::Token),
    Plain("date", T::Date),
    Plain("issued", T::Date),
    Reference("subject", &["Patient", "Group", "Device", "Location"]),
    Reference("patient", &["Patient"]),
    Reference("encounter", &["Encounter"]),
    Reference(
        "performer",
        &["Practitioner", "Organization", "CareTeam", "PractitionerRole"],
    ),
    Reference("result", &["Observation"]),
];

const GROUP: &[Param] = &[
    Plain("identifier", T::Token),
    Plain("code", T::Token),
    Plain("type", T::Token),
    Plain("actual", T::Token),
    Plain("characteristic", T::Token),
    Reference(
        "member",
        &["Patient", "Practitioner", "Device", "Group", "PractitionerRole"],
    ),
    Reference(
        "managing-entity",
        &["Organization", "Practitioner", "PractitionerRole", "RelatedPerson"],
    ),
    Composite("characteristic-value", T::Token),
];

const DEVICE: &[Param] = &[
    Plain("identifier", T::Token),
    Plain("type", T::Token),
    Plain("status", T::Token),
    Plain("manufacturer", T::String),
    Plain("model", T::String),
    Plain("device-name", T::String),
    Plain("udi-di", T::String),
    Plain("url", T::Uri),
    Reference("patient", &["Patient"]),
    Reference("organization", &["Organization"]),
    Reference("location", &["Location"]),
];

const VALUE_SET: &[Param] = &[
    Plain("url", T::Uri),
    Plain("name", T::String),
    Plain("title", T::String),
    Plain("status", T::Token),
    Plain("version", T::Token),
    Plain("reference", T::Uri),
    Plain("code", T::Token),
    Plain("date", T::Date),
    Plain("publisher", T::String),
    Plain("context-quantity", T::Quantity),
];

const CODE_SYSTEM: &[Param] = &[
    Plain("url", T::Uri),
    Plain("name", T::String),
    Plain("title", T::String),
    Plain("status", T::Token),
    Plain("version", T::Token),
    Plain("code", T::Token),
    Plain("system", T::Uri),
    Plain("content-mode", T::Token),
    Plain("date", T::Date),
    Plain("publisher", T::String),
];

const STRUCTURE_DEFINITION: &[Param] = &[
    Plain("url", T::Uri),
    Plain("name", T::String),
    Plain("title", T::String),
    Plain("status", T::Token),
    Plain("version", T::Token),
    Plain("type", T::Uri),
    Plain("base", T::Uri),
    Plain("kind", T::Token),
    Plain("derivation", T::Token),
    Plain("experimental", T::Token),
    Plain("abstract", T::Token),
    Plain("date", T::Date),
];

fn register(table: &mut ParameterTable, resource_type: ResourceType, params: &[Param]) {
    table.declare(resource_type.clone());
    for param in params {
        let definition = match param {
            Plain(name, param_type) => {
                SearchParameterDefinition::new(resource_type.clone(), *name, *param_type)
            }
            Reference(name, targets) => SearchParameterDefinition::reference(
                resource_type.clone(),
                *name,
                targets
                    .iter()
                    .filter_map(|target| ResourceType::from_str(target).ok()),
            ),
            Composite(name, underlying) => {
                SearchParameterDefinition::composite(resource_type.clone(), *name, *underlying)
            }
        };
        table.register(definition);
    }
}

/// The built-in registration table.
pub fn builtin_table() -> ParameterTable {
    let mut table = ParameterTable::new();
    register(&mut table, ResourceType::Patient, PATIENT);
    register(&mut table, ResourceType::Practitioner, PRACTITIONER);
    register(&mut table, ResourceType::Organization, ORGANIZATION);
    register(&mut table, ResourceType::Location, LOCATION);
    register(&mut table, ResourceType::Encounter, ENCOUNTER);
    register(&mut table, ResourceType::Observation, OBSERVATION);
    register(&mut table, ResourceType::Condition, CONDITION);
    register(&mut table, ResourceType::DiagnosticReport, DIAGNOSTIC_REPORT);
    register(&mut table, ResourceType::Group, GROUP);
    register(&mut table, ResourceType::Device, DEVICE);
    register(&mut table, ResourceType::ValueSet, VALUE_SET);
    register(&mut table, ResourceType::CodeSystem, CODE_SYSTEM);
    register(&mut table, ResourceType::StructureDefinition, STRUCTURE_DEFINITION);
    table
}
