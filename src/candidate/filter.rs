use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison carried by a [`QueryFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterOperator {
    /// `=`
    Equals,
    /// `<>`
    NotEquals,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanEquals,
    /// `<`
    MinorThan,
    /// `<=`
    MinorThanEquals,
    /// `IN (...)`
    In,
    /// `NOT IN (...)`
    NotIn,
    /// `LIKE`
    Like,
}

impl FilterOperator {
    /// SQL spelling of the operator.
    pub fn as_sql(self) -> &'static str {
        match self {
            FilterOperator::Equals => "=",
            FilterOperator::NotEquals => "<>",
            FilterOperator::GreaterThan => ">",
            FilterOperator::GreaterThanEquals => ">=",
            FilterOperator::MinorThan => "<",
            FilterOperator::MinorThanEquals => "<=",
            FilterOperator::In => "IN",
            FilterOperator::NotIn => "NOT IN",
            FilterOperator::Like => "LIKE",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A field/operator/value constraint bound to a schema element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilter {
    /// Business name of the element.
    #[serde(default)]
    pub biz_name: String,
    /// Display name, the form used in generated SQL.
    pub name: String,
    /// Comparison.
    pub operator: FilterOperator,
    /// Scalar, or an array for `IN`/`NOT IN`.
    pub value: Value,
    /// Element the filter is bound to.
    #[serde(default)]
    pub element_id: Option<i64>,
}

impl QueryFilter {
    /// An `EQUALS` filter on `name`.
    pub fn equals(biz_name: &str, name: &str, value: Value, element_id: Option<i64>) -> Self {
        Self {
            biz_name: biz_name.to_string(),
            name: name.to_string(),
            operator: FilterOperator::Equals,
            value,
            element_id,
        }
    }

    /// Render as `<name> <operator> <value>`.
    ///
    /// Strings are single-quoted with embedded quotes doubled, numbers and
    /// booleans are written bare, and arrays become a parenthesized list.
    pub fn to_sql(&self) -> String {
        format!("{} {} {}", self.name, self.operator, sql_literal(&self.value))
    }
}

fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(sql_literal).collect();
            format!("({})", rendered.join(", "))
        }
        Value::Object(_) => format!("'{}'", value.to_string().replace('\'', "''")),
    }
}

/// Filters supplied with the request, applied on top of generated SQL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilters {
    /// Filters in request order.
    #[serde(default)]
    pub filters: Vec<QueryFilter>,
}

impl QueryFilters {
    /// Filter on `element_id`, if any.
    pub fn for_element(&self, element_id: i64) -> Option<&QueryFilter> {
        self.filters
            .iter()
            .find(|filter| filter.element_id == Some(element_id))
    }
}
