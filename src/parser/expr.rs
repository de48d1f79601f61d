use sqlparser::ast::{BinaryOperator, Expr, FunctionArg, FunctionArgExpr, Ident, Value};

/// Extract a simple column name from an expression.
///
/// Supports plain identifiers (`城市`) and qualified identifiers
/// (`t.城市`), returning only the terminal column component.
pub fn extract_column_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.clone()),
        Expr::CompoundIdentifier(parts) => Some(parts.last()?.value.clone()),
        Expr::Nested(inner) => extract_column_name(inner),
        Expr::Cast { expr, .. } => extract_column_name(expr),
        _ => None,
    }
}

/// Extract the expression payload from a SQL function argument.
pub fn function_arg_expr(arg: &FunctionArg) -> Option<&Expr> {
    match arg {
        FunctionArg::Unnamed(FunctionArgExpr::Expr(expr))
        | FunctionArg::Named {
            arg: FunctionArgExpr::Expr(expr),
            ..
        }
        | FunctionArg::ExprNamed {
            arg: FunctionArgExpr::Expr(expr),
            ..
        } => Some(expr),
        _ => None,
    }
}

/// Literal text of a value expression, without quotes.
pub fn literal_text(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Value(v) => match &v.value {
            Value::SingleQuotedString(s) | Value::DoubleQuotedString(s) => Some(s.clone()),
            Value::Number(n, _) => Some(n.clone()),
            Value::Boolean(b) => Some(b.to_string()),
            _ => None,
        },
        Expr::UnaryOp { op, expr } => {
            literal_text(expr).map(|inner| format!("{op}{inner}"))
        }
        Expr::Nested(inner) => literal_text(inner),
        _ => None,
    }
}

/// `<column> = '<text>'`.
pub fn column_equals_string(column: &str, text: &str) -> Expr {
    Expr::BinaryOp {
        left: Box::new(Expr::Identifier(Ident::new(column))),
        op: BinaryOperator::Eq,
        right: Box::new(Expr::value(Value::SingleQuotedString(text.to_string()))),
    }
}

/// `left AND right`.
pub fn and(left: Expr, right: Expr) -> Expr {
    Expr::BinaryOp {
        left: Box::new(left),
        op: BinaryOperator::And,
        right: Box::new(right),
    }
}

/// Split an `AND` chain into its conjuncts. Parenthesized groups stay whole.
pub fn conjuncts(expr: &Expr) -> Vec<&Expr> {
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => {
            let mut parts = conjuncts(left);
            parts.extend(conjuncts(right));
            parts
        }
        other => vec![other],
    }
}

/// True when an `OR` appears outside parentheses.
pub fn has_top_level_or(expr: &Expr) -> bool {
    match expr {
        Expr::BinaryOp {
            op: BinaryOperator::Or,
            ..
        } => true,
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => has_top_level_or(left) || has_top_level_or(right),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlparser::dialect::MySqlDialect;
    use sqlparser::parser::Parser;

    fn parse_expr(sql: &str) -> Expr {
        Parser::new(&MySqlDialect {})
            .try_with_sql(sql)
            .unwrap()
            .parse_expr()
            .unwrap()
    }

    #[test]
    fn extract_column_name_handles_simple_and_qualified_identifiers() {
        let simple = Expr::Identifier(Ident::new("城市"));
        let qualified = Expr::CompoundIdentifier(vec![Ident::new("t"), Ident::new("城市")]);
        let nested = Expr::Nested(Box::new(Expr::Identifier(Ident::new("城市"))));

        assert_eq!(extract_column_name(&simple).as_deref(), Some("城市"));
        assert_eq!(extract_column_name(&qualified).as_deref(), Some("城市"));
        assert_eq!(extract_column_name(&nested).as_deref(), Some("城市"));
        assert_eq!(extract_column_name(&parse_expr("1 + 2")), None);
    }

    #[test]
    fn literal_text_strips_quotes_and_keeps_signs() {
        assert_eq!(literal_text(&parse_expr("'北京'")).as_deref(), Some("北京"));
        assert_eq!(literal_text(&parse_expr("42")).as_deref(), Some("42"));
        assert_eq!(literal_text(&parse_expr("-3")).as_deref(), Some("-3"));
        assert_eq!(literal_text(&parse_expr("a")), None);
    }

    #[test]
    fn conjuncts_flatten_and_chains_only() {
        let expr = parse_expr("a = 1 AND (b = 2 OR c = 3) AND d = 4");
        let parts: Vec<String> = conjuncts(&expr).iter().map(ToString::to_string).collect();
        assert_eq!(parts, vec!["a = 1", "(b = 2 OR c = 3)", "d = 4"]);
    }

    #[test]
    fn top_level_or_ignores_parenthesized_groups() {
        assert!(has_top_level_or(&parse_expr("a = 1 OR b = 2")));
        assert!(has_top_level_or(&parse_expr("a = 1 AND b = 2 OR c = 3")));
        assert!(!has_top_level_or(&parse_expr("a = 1 AND (b = 2 OR c = 3)")));
    }

    #[test]
    fn column_equals_string_renders_quoted_literal() {
        let expr = and(
            parse_expr("a = 1"),
            column_equals_string("数据日期", "2024-01-01"),
        );
        assert_eq!(expr.to_string(), "a = 1 AND 数据日期 = '2024-01-01'");
    }
}
