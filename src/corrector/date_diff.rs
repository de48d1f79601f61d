use std::ops::ControlFlow;

use sqlparser::ast::{
    visit_expressions_mut, Expr, Function, FunctionArg, FunctionArgExpr, FunctionArguments,
    Ident, ObjectName, Statement,
};

use crate::error::Result;
use crate::parser::expr::{function_arg_expr, literal_text};
use crate::parser::names::normalized_function_name;

const SOURCE_FUNCTION: &str = "datediff";
const TARGET_FUNCTION: &str = "TIMESTAMPDIFF";
const UNITS: [&str; 8] = [
    "SECOND", "MINUTE", "HOUR", "DAY", "WEEK", "MONTH", "QUARTER", "YEAR",
];

/// Rewrite `DATEDIFF(unit, start, end)` to `TIMESTAMPDIFF(UNIT, start, end)` everywhere.
///
/// Two-argument `DATEDIFF` is already native to the execution dialect and is
/// left alone, as are calls whose unit is not a plain time unit.
pub fn normalize_date_diff(statement: &mut Statement) -> Result<bool> {
    let mut rewritten = 0usize;
    let _ = visit_expressions_mut(statement, |expr| {
        if let Expr::Function(func) = expr {
            if rewrite(func) {
                rewritten += 1;
            }
        }
        ControlFlow::<()>::Continue(())
    });
    Ok(rewritten > 0)
}

fn rewrite(func: &mut Function) -> bool {
    if normalized_function_name(func) != SOURCE_FUNCTION {
        return false;
    }
    let FunctionArguments::List(list) = &mut func.args else {
        return false;
    };
    if list.args.len() != 3 {
        return false;
    }
    let Some(unit) = list.args.first().and_then(function_arg_expr).and_then(unit_of) else {
        return false;
    };
    list.args[0] = FunctionArg::Unnamed(FunctionArgExpr::Expr(Expr::Identifier(Ident::new(unit))));
    func.name = ObjectName::from(vec![Ident::new(TARGET_FUNCTION)]);
    true
}

fn unit_of(expr: &Expr) -> Option<String> {
    let raw = match expr {
        Expr::Identifier(ident) => ident.value.clone(),
        other => literal_text(other)?,
    };
    let unit = raw.trim().to_uppercase();
    UNITS.contains(&unit.as_str()).then_some(unit)
}
