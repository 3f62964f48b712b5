use indexmap::IndexSet;
use octofhir_core::{ResourceType, is_valid_resource_type_name};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// FHIR R4 SearchParameter type enumeration
/// See: https://hl7.org/fhir/R4/search.html#table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchParameterType {
    Number,
    Date,
    String,
    Token,
    Reference,
    Composite,
    Quantity,
    Uri,
}

impl SearchParameterType {
    /// Parse a search parameter type from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "number" => Some(Self::Number),
            "date" => Some(Self::Date),
            "string" => Some(Self::String),
            "token" => Some(Self::Token),
            "reference" => Some(Self::Reference),
            "composite" => Some(Self::Composite),
            "quantity" => Some(Self::Quantity),
            "uri" => Some(Self::Uri),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Date => "date",
            Self::String => "string",
            Self::Token => "token",
            Self::Reference => "reference",
            Self::Composite => "composite",
            Self::Quantity => "quantity",
            Self::Uri => "uri",
        }
    }

    /// Whether values of this type may start with a comparator prefix (`ge`, `lt`, ...).
    pub fn supports_prefix(&self) -> bool {
        matches!(self, Self::Number | Self::Date | Self::Quantity)
    }
}

impl fmt::Display for SearchParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search modifiers, applied as suffix to the parameter name: `name:modifier`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchModifier {
    Missing,
    Exact,
    Contains,
    Not,
    Text,
    In,
    NotIn,
    Above,
    Below,
    /// Resource type restriction on a reference, e.g. `subject:Patient`
    Type(ResourceType),
}

impl SearchModifier {
    /// Parse a modifier code. Capitalized names become [`SearchModifier::Type`].
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "missing" => Some(Self::Missing),
            "exact" => Some(Self::Exact),
            "contains" => Some(Self::Contains),
            "not" => Some(Self::Not),
            "text" => Some(Self::Text),
            "in" => Some(Self::In),
            "not-in" => Some(Self::NotIn),
            "above" => Some(Self::Above),
            "below" => Some(Self::Below),
            other if is_valid_resource_type_name(other) => {
                ResourceType::from_str(other).ok().map(Self::Type)
            }
            _ => None,
        }
    }

    /// Check if this modifier is applicable to the given parameter type.
    ///
    /// `:in` and `:not-in` need a terminology service and are accepted nowhere.
    pub fn applicable_to(&self, param_type: SearchParameterType) -> bool {
        match self {
            Self::Missing => true,
            Self::Exact | Self::Contains => param_type == SearchParameterType::String,
            Self::Not | Self::Text => param_type == SearchParameterType::Token,
            Self::Above | Self::Below => param_type == SearchParameterType::Uri,
            Self::Type(_) => param_type == SearchParameterType::Reference,
            Self::In | Self::NotIn => false,
        }
    }
}

impl fmt::Display for SearchModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Missing => "missing",
            Self::Exact => "exact",
            Self::Contains => "contains",
            Self::Not => "not",
            Self::Text => "text",
            Self::In => "in",
            Self::NotIn => "not-in",
            Self::Above => "above",
            Self::Below => "below",
            Self::Type(resource_type) => resource_type.as_str(),
        };
        f.write_str(s)
    }
}

/// Comparator prefixes for number/date/quantity search values
/// e.g., `ge2020-01-01`, `lt5.0`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchPrefix {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Sa, // starts after
    Eb, // ends before
    Ap, // approximately
}

impl fmt::Display for SearchPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SearchPrefix::Eq => "eq",
            SearchPrefix::Ne => "ne",
            SearchPrefix::Gt => "gt",
            SearchPrefix::Lt => "lt",
            SearchPrefix::Ge => "ge",
            SearchPrefix::Le => "le",
            SearchPrefix::Sa => "sa",
            SearchPrefix::Eb => "eb",
            SearchPrefix::Ap => "ap",
        };
        f.write_str(s)
    }
}

impl SearchPrefix {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "gt" => Some(Self::Gt),
            "lt" => Some(Self::Lt),
            "ge" => Some(Self::Ge),
            "le" => Some(Self::Le),
            "sa" => Some(Self::Sa),
            "eb" => Some(Self::Eb),
            "ap" => Some(Self::Ap),
            _ => None,
        }
    }

    /// Split a leading two-letter prefix off `value`, if it names a known prefix.
    pub fn extract(value: &str) -> (Option<Self>, &str) {
        match value.get(..2) {
            Some(head) if head.chars().all(|c| c.is_ascii_alphabetic()) => {
                match Self::parse(head) {
                    Some(prefix) => (Some(prefix), &value[2..]),
                    None => (None, value),
                }
            }
            _ => (None, value),
        }
    }
}

/// How a parameter name resolves: a plain typed parameter, a reference with
/// its permitted targets, or a composite with the type of its second component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionKind {
    Plain(SearchParameterType),
    /// An empty target set means any resource type.
    Reference { targets: IndexSet<ResourceType> },
    Composite { underlying: SearchParameterType },
}

/// A search parameter as seen by the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParameterDefinition {
    pub resource_type: ResourceType,
    /// The code used in search queries (e.g., "name", "identifier")
    pub name: String,
    pub kind: DefinitionKind,
    /// The canonical URL, when the definition came from a SearchParameter resource
    pub url: Option<String>,
    pub description: Option<String>,
}

impl SearchParameterDefinition {
    /// Create a definition for `param_type`.
    ///
    /// References get an open target set and composites a token second
    /// component; use [`Self::reference`] or [`Self::composite`] to be specific.
    pub fn new<N: Into<String>>(
        resource_type: ResourceType,
        name: N,
        param_type: SearchParameterType,
    ) -> Self {
        let kind = match param_type {
            SearchParameterType::Reference => DefinitionKind::Reference {
                targets: IndexSet::new(),
            },
            SearchParameterType::Composite => DefinitionKind::Composite {
                underlying: SearchParameterType::Token,
            },
            other => DefinitionKind::Plain(other),
        };
        Self {
            resource_type,
            name: name.into(),
            kind,
            url: None,
            description: None,
        }
    }

    pub fn reference<N, I>(resource_type: ResourceType, name: N, targets: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = ResourceType>,
    {
        Self {
            resource_type,
            name: name.into(),
            kind: DefinitionKind::Reference {
                targets: targets.into_iter().collect(),
            },
            url: None,
            description: None,
        }
    }

    pub fn composite<N: Into<String>>(
        resource_type: ResourceType,
        name: N,
        underlying: SearchParameterType,
    ) -> Self {
        Self {
            resource_type,
            name: name.into(),
            kind: DefinitionKind::Composite { underlying },
            url: None,
            description: None,
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// The same parameter registered on another resource type.
    #[must_use]
    pub fn for_resource_type(&self, resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            ..self.clone()
        }
    }

    pub fn param_type(&self) -> SearchParameterType {
        match &self.kind {
            DefinitionKind::Plain(param_type) => *param_type,
            DefinitionKind::Reference { .. } => SearchParameterType::Reference,
            DefinitionKind::Composite { .. } => SearchParameterType::Composite,
        }
    }

    /// Target resource types of a reference parameter; `None` for other kinds.
    pub fn targets(&self) -> Option<&IndexSet<ResourceType>> {
        match &self.kind {
            DefinitionKind::Reference { targets } => Some(targets),
            _ => None,
        }
    }

    /// Whether a reference parameter may point at `resource_type`.
    pub fn targets_type(&self, resource_type: &ResourceType) -> bool {
        self.targets()
            .is_some_and(|targets| targets.is_empty() || targets.contains(resource_type))
    }
}
