pub mod chaining;
pub mod common;
pub mod config;
pub mod error;
pub mod escape;
pub mod expression;
pub mod loader;
pub mod model;
pub mod parameters;
pub mod parser;
pub mod registry;
pub mod reloadable;
pub mod types;
pub mod value;

pub use config::{ConfigError, SearchCompilerConfig};
pub use error::{ErrorCode, SearchError};
pub use expression::{
    BinaryOperator, CompareValue, Expression, ExpressionVisitor, Field, FieldName,
    MultiaryOperator, StringOperator,
};
pub use loader::{
    LoaderError, load_definitions_from_file, load_definitions_from_json,
    load_definitions_from_str,
};
pub use parameters::{
    DefinitionKind, SearchModifier, SearchParameterDefinition, SearchParameterType, SearchPrefix,
};
pub use parser::QueryExpressionParser;
pub use registry::{ParameterTable, ResourceTypeManifest, SearchParameterRegistry};
pub use reloadable::ReloadableQueryParser;
pub use types::{BuildContext, BuildRequest, build_value_expression};
pub use value::parse_value;
