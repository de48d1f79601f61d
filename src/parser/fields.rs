use std::collections::BTreeSet;
use std::ops::ControlFlow;

use serde::Serialize;
use sqlparser::ast::{visit_expressions, BinaryOperator, Expr, SelectItem, Statement};

use crate::parser::expr::{extract_column_name, literal_text};
use crate::parser::sql_parser::outer_select;

/// A `<field> <operator> <value>` predicate found in a WHERE clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldExpression {
    /// Column name as written.
    pub field: String,
    /// SQL operator, e.g. `=`, `IN`, `NOT LIKE`.
    pub operator: String,
    /// Unquoted value text; lists render as `(a, b)`.
    pub value: String,
}

/// Every column referenced in the outer WHERE clause.
pub fn where_fields(statement: &Statement) -> BTreeSet<String> {
    let mut fields = BTreeSet::new();
    if let Some(selection) = outer_select(statement).and_then(|s| s.selection.as_ref()) {
        let _ = visit_expressions(selection, |expr| {
            if let Some(column) = plain_column(expr) {
                fields.insert(column);
            }
            ControlFlow::<()>::Continue(())
        });
    }
    fields
}

/// Column-versus-literal predicates in the outer WHERE clause, in source order.
///
/// Comparisons, `IN` lists, `LIKE` and `BETWEEN` are recognized; anything
/// else (sub-queries, column-to-column comparisons) is skipped.
pub fn where_expressions(statement: &Statement) -> Vec<FieldExpression> {
    let mut found = Vec::new();
    if let Some(selection) = outer_select(statement).and_then(|s| s.selection.as_ref()) {
        collect_predicates(selection, &mut found);
    }
    found
}

/// Columns referenced by the outer projection, first occurrence first.
pub fn select_fields(statement: &Statement) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    let Some(select) = outer_select(statement) else {
        return fields;
    };
    for item in &select.projection {
        let expr = match item {
            SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => expr,
            _ => continue,
        };
        let _ = visit_expressions(expr, |e| {
            if let Some(column) = plain_column(e) {
                if !fields.contains(&column) {
                    fields.push(column);
                }
            }
            ControlFlow::<()>::Continue(())
        });
    }
    fields
}

fn plain_column(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(_) | Expr::CompoundIdentifier(_) => extract_column_name(expr),
        _ => None,
    }
}

fn collect_predicates(expr: &Expr, out: &mut Vec<FieldExpression>) {
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And | BinaryOperator::Or,
            right,
        } => {
            collect_predicates(left, out);
            collect_predicates(right, out);
        }
        Expr::Nested(inner) => collect_predicates(inner, out),
        Expr::BinaryOp { left, op, right } if is_comparison(op) => {
            if let (Some(field), Some(value)) = (plain_column(left), literal_text(right)) {
                out.push(FieldExpression {
                    field,
                    operator: op.to_string(),
                    value,
                });
            }
        }
        Expr::InList {
            expr,
            list,
            negated,
        } => {
            let values: Option<Vec<String>> = list.iter().map(literal_text).collect();
            if let (Some(field), Some(values)) = (plain_column(expr), values) {
                out.push(FieldExpression {
                    field,
                    operator: if *negated { "NOT IN" } else { "IN" }.to_string(),
                    value: format!("({})", values.join(", ")),
                });
            }
        }
        Expr::Like {
            negated,
            expr,
            pattern,
            ..
        } => {
            if let (Some(field), Some(value)) = (plain_column(expr), literal_text(pattern)) {
                out.push(FieldExpression {
                    field,
                    operator: if *negated { "NOT LIKE" } else { "LIKE" }.to_string(),
                    value,
                });
            }
        }
        Expr::Between {
            expr,
            negated,
            low,
            high,
        } => {
            if let (Some(field), Some(low), Some(high)) =
                (plain_column(expr), literal_text(low), literal_text(high))
            {
                out.push(FieldExpression {
                    field,
                    operator: if *negated { "NOT BETWEEN" } else { "BETWEEN" }.to_string(),
                    value: format!("{low} AND {high}"),
                });
            }
        }
        _ => {}
    }
}

fn is_comparison(op: &BinaryOperator) -> bool {
    matches!(
        op,
        BinaryOperator::Eq
            | BinaryOperator::NotEq
            | BinaryOperator::Gt
            | BinaryOperator::GtEq
            | BinaryOperator::Lt
            | BinaryOperator::LtEq
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::sql_parser::parse_select;

    #[test]
    fn where_fields_cover_nested_predicates_and_functions() {
        let statement = parse_select(
            "SELECT a FROM t WHERE (城市 = '北京' OR YEAR(数据日期) = 2024) AND 歌手名 IN ('x')",
        )
        .expect("query should parse");
        let fields = where_fields(&statement);
        assert_eq!(
            fields,
            BTreeSet::from(["城市".to_string(), "数据日期".to_string(), "歌手名".to_string()])
        );
    }

    #[test]
    fn where_expressions_recognize_common_predicates() {
        let statement = parse_select(
            "SELECT a FROM t WHERE 城市 = '北京' AND 访问次数 >= 10 AND 歌手名 NOT IN ('a', 'b') \
             AND 歌曲名 LIKE '%晴%' AND 年份 BETWEEN 2020 AND 2024 AND x = y",
        )
        .expect("query should parse");
        let found = where_expressions(&statement);
        let rendered: Vec<String> = found
            .iter()
            .map(|f| format!("{} {} {}", f.field, f.operator, f.value))
            .collect();
        assert_eq!(
            rendered,
            vec![
                "城市 = 北京",
                "访问次数 >= 10",
                "歌手名 NOT IN (a, b)",
                "歌曲名 LIKE %晴%",
                "年份 BETWEEN 2020 AND 2024",
            ]
        );
    }

    #[test]
    fn select_fields_unwrap_aggregates_and_deduplicate() {
        let statement = parse_select(
            "SELECT 城市, SUM(访问次数) AS pv, 城市 FROM t GROUP BY 城市",
        )
        .expect("query should parse");
        assert_eq!(select_fields(&statement), vec!["城市", "访问次数"]);
    }

    #[test]
    fn queries_without_where_have_no_fields() {
        let statement = parse_select("SELECT a FROM t").expect("query should parse");
        assert!(where_fields(&statement).is_empty());
        assert!(where_expressions(&statement).is_empty());
    }
}
