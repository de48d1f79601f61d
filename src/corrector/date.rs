use sqlparser::ast::{Expr, Statement};
use tracing::debug;

use crate::config::TimeDimensionNames;
use crate::corrector::context::CorrectionContext;
use crate::corrector::reference_date::parse_reference_date;
use crate::error::Result;
use crate::parser::expr::{and, column_equals_string};
use crate::parser::fields::where_fields;
use crate::parser::sql_parser::outer_select_mut;

/// Append `<day> = '<reference date>'` when the WHERE clause names no time dimension.
///
/// An existing predicate is parenthesized first so the new conjunct cannot
/// change its precedence.
pub fn add_date_if_missing(
    statement: &mut Statement,
    ctx: &CorrectionContext<'_>,
    names: &TimeDimensionNames,
) -> Result<bool> {
    let Some(date) = ctx.reference_date.as_deref().and_then(parse_reference_date) else {
        debug!("no reference date, date defaulting skipped");
        return Ok(false);
    };
    let fields: Vec<String> = where_fields(statement).into_iter().collect();
    if names.contains_any(&fields) {
        return Ok(false);
    }
    let Some(select) = outer_select_mut(statement) else {
        return Ok(false);
    };

    let predicate = column_equals_string(&names.day, &date);
    select.selection = Some(match select.selection.take() {
        Some(existing @ Expr::Nested(_)) => and(existing, predicate),
        Some(existing) => and(Expr::Nested(Box::new(existing)), predicate),
        None => predicate,
    });
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::sql_parser::parse_select;
    use crate::schema::SemanticSchema;

    fn run(sql: &str, date: Option<&str>) -> (bool, String) {
        let schema = SemanticSchema::default();
        let ctx = CorrectionContext::new(&schema).with_reference_date(date.map(str::to_string));
        let mut statement = parse_select(sql).expect("query should parse");
        let changed = add_date_if_missing(&mut statement, &ctx, &TimeDimensionNames::default())
            .expect("date pass never fails");
        (changed, statement.to_string())
    }

    #[test]
    fn missing_where_gets_the_date_filter() {
        let (changed, sql) = run("SELECT a FROM t", Some("2024-01-01"));
        assert!(changed);
        assert_eq!(sql, "SELECT a FROM t WHERE 数据日期 = '2024-01-01'");
    }

    #[test]
    fn existing_where_is_parenthesized() {
        let (_, sql) = run("SELECT a FROM t WHERE b = 1 OR c = 2", Some("2024-01-01"));
        assert_eq!(
            sql,
            "SELECT a FROM t WHERE (b = 1 OR c = 2) AND 数据日期 = '2024-01-01'"
        );
    }

    #[test]
    fn any_time_dimension_suppresses_the_default() {
        for sql in [
            "SELECT a FROM t WHERE 数据日期 >= '2023-01-01'",
            "SELECT a FROM t WHERE 数据日期_月 = '2023-01'",
            "SELECT a FROM t WHERE b = 1 AND 数据日期_周 = '2023-01-02'",
        ] {
            let (changed, _) = run(sql, Some("2024-01-01"));
            assert!(!changed, "{sql}");
        }
    }

    #[test]
    fn unresolvable_dates_are_a_no_op() {
        assert!(!run("SELECT a FROM t", None).0);
        assert!(!run("SELECT a FROM t", Some("latest")).0);
    }
}
