use sqlparser::ast::{Expr, Select, SetExpr, Statement};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::Token;

use crate::error::{Error, Result};

/// Dialect used for generated and corrected SQL. Accepts CJK identifiers unquoted.
pub fn dialect() -> MySqlDialect {
    MySqlDialect {}
}

/// Parse exactly one statement.
pub fn parse_statement(sql: &str) -> Result<Statement> {
    let mut statements = Parser::parse_sql(&dialect(), sql)?;
    match statements.len() {
        1 => Ok(statements.remove(0)),
        n => Err(Error::UnsupportedStatement(format!(
            "expected one statement, found {n}"
        ))),
    }
}

/// The outermost `SELECT` of a query statement.
pub fn outer_select(statement: &Statement) -> Option<&Select> {
    match statement {
        Statement::Query(query) => match query.body.as_ref() {
            SetExpr::Select(select) => Some(select),
            _ => None,
        },
        _ => None,
    }
}

/// Mutable access to the outermost `SELECT` of a query statement.
pub fn outer_select_mut(statement: &mut Statement) -> Option<&mut Select> {
    match statement {
        Statement::Query(query) => match query.body.as_mut() {
            SetExpr::Select(select) => Some(select),
            _ => None,
        },
        _ => None,
    }
}

/// Parse a statement whose body is a plain `SELECT`.
pub fn parse_select(sql: &str) -> Result<Statement> {
    let statement = parse_statement(sql)?;
    if outer_select(&statement).is_none() {
        return Err(Error::UnsupportedStatement(
            "expected a plain SELECT query".to_string(),
        ));
    }
    Ok(statement)
}

/// Parse a standalone boolean expression, rejecting trailing input.
pub fn parse_condition(text: &str) -> Result<Expr> {
    let invalid = |reason: String| Error::InvalidFilterExpression {
        expression: text.to_string(),
        reason,
    };
    let dialect = dialect();
    let mut parser = Parser::new(&dialect)
        .try_with_sql(text)
        .map_err(|e| invalid(e.to_string()))?;
    let expr = parser.parse_expr().map_err(|e| invalid(e.to_string()))?;
    let next = parser.peek_token();
    if next.token != Token::EOF {
        return Err(invalid(format!("unexpected trailing token `{}`", next.token)));
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_select_accepts_plain_queries() {
        let statement = parse_select("SELECT 城市, SUM(访问次数) FROM t WHERE 城市 = '北京' GROUP BY 城市")
            .expect("query should parse");
        let select = outer_select(&statement).expect("outer select");
        assert!(select.selection.is_some());
    }

    #[test]
    fn parse_select_rejects_other_statements() {
        assert!(matches!(
            parse_select("DELETE FROM t"),
            Err(Error::UnsupportedStatement(_))
        ));
        assert!(matches!(
            parse_select("SELECT 1 UNION SELECT 2"),
            Err(Error::UnsupportedStatement(_))
        ));
        assert!(matches!(
            parse_statement("SELECT 1; SELECT 2"),
            Err(Error::UnsupportedStatement(_))
        ));
        assert!(matches!(parse_select("SELEC a"), Err(Error::SqlParse(_))));
    }

    #[test]
    fn parse_condition_requires_full_input() {
        let expr = parse_condition("租户 = 7 AND 城市 = '北京'").expect("condition should parse");
        assert_eq!(expr.to_string(), "租户 = 7 AND 城市 = '北京'");

        let err = parse_condition("租户 = 7 城市").expect_err("trailing token");
        assert!(matches!(err, Error::InvalidFilterExpression { .. }));
        assert!(parse_condition("= 7").is_err());
    }
}
