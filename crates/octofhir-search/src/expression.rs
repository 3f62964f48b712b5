//! Storage-agnostic search expression tree.
//!
//! The compiler produces an [`Expression`] per query; storage translators walk
//! it with an [`ExpressionVisitor`] and map each node to a native predicate.
//! `Multiary` children keep insertion order so output is deterministic.

use std::fmt;

use octofhir_core::{FhirDateTime, ResourceType};
use serde::Serialize;

/// Indexed field a leaf expression compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldName {
    String,
    TokenCode,
    TokenSystem,
    TokenText,
    Reference,
    Uri,
    Number,
    Quantity,
    QuantitySystem,
    QuantityCode,
    DateTimeStart,
    DateTimeEnd,
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::String => "String",
            Self::TokenCode => "TokenCode",
            Self::TokenSystem => "TokenSystem",
            Self::TokenText => "TokenText",
            Self::Reference => "Reference",
            Self::Uri => "Uri",
            Self::Number => "Number",
            Self::Quantity => "Quantity",
            Self::QuantitySystem => "QuantitySystem",
            Self::QuantityCode => "QuantityCode",
            Self::DateTimeStart => "DateTimeStart",
            Self::DateTimeEnd => "DateTimeEnd",
        };
        f.write_str(s)
    }
}

/// A field, optionally qualified by the composite component it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Field {
    pub name: FieldName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<usize>,
}

impl Field {
    pub fn new(name: FieldName) -> Self {
        Self {
            name,
            component: None,
        }
    }

    pub fn component(name: FieldName, component: Option<usize>) -> Self {
        Self { name, component }
    }
}

impl From<FieldName> for Field {
    fn from(name: FieldName) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.component {
            Some(index) => write!(f, "{}[{index}]", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StringOperator {
    Equals,
    StartsWith,
    Contains,
    EndsWith,
    NotStartsWith,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MultiaryOperator {
    And,
    Or,
}

/// Right-hand side of an ordered comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CompareValue {
    Number(f64),
    DateTime(FhirDateTime),
}

impl fmt::Display for CompareValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Expression {
    /// The field has no value.
    Missing { field: Field },
    /// `param:missing=true|false`
    MissingParameter { parameter: String, is_missing: bool },
    StringCompare {
        field: Field,
        op: StringOperator,
        value: String,
        ignore_case: bool,
    },
    BinaryCompare {
        field: Field,
        op: BinaryOperator,
        value: CompareValue,
    },
    /// Criteria evaluated on resources of `target_type` referenced through
    /// `reference_parameter` of `source_type`.
    Chained {
        source_type: ResourceType,
        reference_parameter: String,
        target_type: ResourceType,
        inner: Box<Expression>,
    },
    Multiary {
        op: MultiaryOperator,
        children: Vec<Expression>,
    },
    Not { inner: Box<Expression> },
}

impl Expression {
    pub fn missing(field: impl Into<Field>) -> Self {
        Self::Missing {
            field: field.into(),
        }
    }

    pub fn missing_parameter(parameter: impl Into<String>, is_missing: bool) -> Self {
        Self::MissingParameter {
            parameter: parameter.into(),
            is_missing,
        }
    }

    pub fn string(
        field: impl Into<Field>,
        op: StringOperator,
        value: impl Into<String>,
        ignore_case: bool,
    ) -> Self {
        Self::StringCompare {
            field: field.into(),
            op,
            value: value.into(),
            ignore_case,
        }
    }

    pub fn binary(field: impl Into<Field>, op: BinaryOperator, value: CompareValue) -> Self {
        Self::BinaryCompare {
            field: field.into(),
            op,
            value,
        }
    }

    pub fn chained(
        source_type: ResourceType,
        reference_parameter: impl Into<String>,
        target_type: ResourceType,
        inner: Expression,
    ) -> Self {
        Self::Chained {
            source_type,
            reference_parameter: reference_parameter.into(),
            target_type,
            inner: Box::new(inner),
        }
    }

    pub fn and(children: Vec<Expression>) -> Self {
        Self::Multiary {
            op: MultiaryOperator::And,
            children,
        }
    }

    pub fn or(children: Vec<Expression>) -> Self {
        Self::Multiary {
            op: MultiaryOperator::Or,
            children,
        }
    }

    pub fn not(inner: Expression) -> Self {
        Self::Not {
            inner: Box::new(inner),
        }
    }

    /// Dispatch to the visitor method matching this node.
    pub fn accept<T, V>(&self, visitor: &mut V) -> T
    where
        V: ExpressionVisitor<T> + ?Sized,
    {
        match self {
            Self::Missing { field } => visitor.visit_missing(field),
            Self::MissingParameter {
                parameter,
                is_missing,
            } => visitor.visit_missing_parameter(parameter, *is_missing),
            Self::StringCompare {
                field,
                op,
                value,
                ignore_case,
            } => visitor.visit_string(field, *op, value, *ignore_case),
            Self::BinaryCompare { field, op, value } => visitor.visit_binary(field, *op, value),
            Self::Chained {
                source_type,
                reference_parameter,
                target_type,
                inner,
            } => visitor.visit_chained(source_type, reference_parameter, target_type, inner),
            Self::Multiary { op, children } => visitor.visit_multiary(*op, children),
            Self::Not { inner } => visitor.visit_not(inner),
        }
    }
}

/// Walks an [`Expression`] without matching on it directly.
pub trait ExpressionVisitor<T> {
    fn visit_missing(&mut self, field: &Field) -> T;
    fn visit_missing_parameter(&mut self, parameter: &str, is_missing: bool) -> T;
    fn visit_string(
        &mut self,
        field: &Field,
        op: StringOperator,
        value: &str,
        ignore_case: bool,
    ) -> T;
    fn visit_binary(&mut self, field: &Field, op: BinaryOperator, value: &CompareValue) -> T;
    fn visit_chained(
        &mut self,
        source_type: &ResourceType,
        reference_parameter: &str,
        target_type: &ResourceType,
        inner: &Expression,
    ) -> T;
    fn visit_multiary(&mut self, op: MultiaryOperator, children: &[Expression]) -> T;
    fn visit_not(&mut self, inner: &Expression) -> T;
}

/// Renders the tree as an s-expression, e.g. `(Or (StringStartsWith String "Smith" IgnoreCase))`.
struct SExpressionWriter<'a, 'b> {
    f: &'a mut fmt::Formatter<'b>,
}

impl SExpressionWriter<'_, '_> {
    fn write(&mut self, expr: &Expression) -> fmt::Result {
        expr.accept(self)
    }
}

impl ExpressionVisitor<fmt::Result> for SExpressionWriter<'_, '_> {
    fn visit_missing(&mut self, field: &Field) -> fmt::Result {
        write!(self.f, "(Missing {field})")
    }

    fn visit_missing_parameter(&mut self, parameter: &str, is_missing: bool) -> fmt::Result {
        write!(self.f, "(MissingParameter {parameter} {is_missing})")
    }

    fn visit_string(
        &mut self,
        field: &Field,
        op: StringOperator,
        value: &str,
        ignore_case: bool,
    ) -> fmt::Result {
        write!(self.f, "(String{op:?} {field} {value:?}")?;
        if ignore_case {
            self.f.write_str(" IgnoreCase")?;
        }
        self.f.write_str(")")
    }

    fn visit_binary(&mut self, field: &Field, op: BinaryOperator, value: &CompareValue) -> fmt::Result {
        write!(self.f, "(Field{op:?} {field} {value})")
    }

    fn visit_chained(
        &mut self,
        source_type: &ResourceType,
        reference_parameter: &str,
        target_type: &ResourceType,
        inner: &Expression,
    ) -> fmt::Result {
        write!(self.f, "(Chain {source_type}.{reference_parameter} {target_type} ")?;
        self.write(inner)?;
        self.f.write_str(")")
    }

    fn visit_multiary(&mut self, op: MultiaryOperator, children: &[Expression]) -> fmt::Result {
        write!(self.f, "({op:?}")?;
        for child in children {
            self.f.write_str(" ")?;
            self.write(child)?;
        }
        self.f.write_str(")")
    }

    fn visit_not(&mut self, inner: &Expression) -> fmt::Result {
        self.f.write_str("(Not ")?;
        self.write(inner)?;
        self.f.write_str(")")
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        SExpressionWriter { f }.write(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    /// Counts leaf comparisons.
    struct LeafCounter;

    impl ExpressionVisitor<usize> for LeafCounter {
        fn visit_missing(&mut self, _: &Field) -> usize {
            1
        }
        fn visit_missing_parameter(&mut self, _: &str, _: bool) -> usize {
            1
        }
        fn visit_string(&mut self, _: &Field, _: StringOperator, _: &str, _: bool) -> usize {
            1
        }
        fn visit_binary(&mut self, _: &Field, _: BinaryOperator, _: &CompareValue) -> usize {
            1
        }
        fn visit_chained(
            &mut self,
            _: &ResourceType,
            _: &str,
            _: &ResourceType,
            inner: &Expression,
        ) -> usize {
            inner.accept::<usize, _>(self)
        }
        fn visit_multiary(&mut self, _: MultiaryOperator, children: &[Expression]) -> usize {
            children.iter().map(|c| c.accept::<usize, _>(self)).sum()
        }
        fn visit_not(&mut self, inner: &Expression) -> usize {
            inner.accept::<usize, _>(self)
        }
    }

    #[test]
    fn test_display_string_compare() {
        let expr = Expression::or(vec![Expression::string(
            FieldName::String,
            StringOperator::StartsWith,
            "Smith",
            true,
        )]);
        assert_eq!(
            expr.to_string(),
            r#"(Or (StringStartsWith String "Smith" IgnoreCase))"#
        );
    }

    #[test]
    fn test_display_nested() {
        let inner = Expression::and(vec![
            Expression::missing(FieldName::TokenSystem),
            Expression::string(FieldName::TokenCode, StringOperator::Equals, "x", false),
        ]);
        let expr = Expression::chained(
            ResourceType::Observation,
            "subject",
            ResourceType::Patient,
            Expression::not(inner),
        );
        assert_eq!(
            expr.to_string(),
            r#"(Chain Observation.subject Patient (Not (And (Missing TokenSystem) (StringEquals TokenCode "x"))))"#
        );
    }

    #[test]
    fn test_display_binary_and_component() {
        let expr = Expression::binary(
            Field::component(FieldName::DateTimeStart, Some(1)),
            BinaryOperator::GreaterThanOrEqual,
            CompareValue::DateTime(FhirDateTime::new(datetime!(2018-01-01 0:00 UTC))),
        );
        assert_eq!(
            expr.to_string(),
            "(FieldGreaterThanOrEqual DateTimeStart[1] 2018-01-01T00:00:00Z)"
        );
    }

    #[test]
    fn test_visitor_counts_leaves() {
        let expr = Expression::or(vec![
            Expression::missing_parameter("gender", true),
            Expression::and(vec![
                Expression::binary(FieldName::Number, BinaryOperator::Equal, CompareValue::Number(1.0)),
                Expression::missing(FieldName::TokenSystem),
            ]),
        ]);
        assert_eq!(expr.accept::<usize, _>(&mut LeafCounter), 3);
    }

    #[test]
    fn test_serialize_tagged() {
        let expr = Expression::string(
            Field::component(FieldName::TokenCode, Some(0)),
            StringOperator::Equals,
            "8480-6",
            false,
        );
        let json = serde_json::to_value(&expr).unwrap();
        assert_eq!(json["kind"], "stringCompare");
        assert_eq!(json["field"]["name"], "TokenCode");
        assert_eq!(json["field"]["component"], 0);
        assert_eq!(json["op"], "Equals");
        assert_eq!(json["ignore_case"], false);
    }
}
