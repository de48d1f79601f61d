use std::collections::{HashMap, HashSet};

use serde_json::Value;
use sqlparser::ast::{BinaryOperator, Expr, Statement};
use tracing::debug;

use crate::candidate::QueryFilter;
use crate::corrector::alias::{replace_literals, value_replacements};
use crate::corrector::context::CorrectionContext;
use crate::error::{Error, Result};
use crate::parser::expr::{and, conjuncts, has_top_level_or};
use crate::parser::sql_parser::{outer_select_mut, parse_condition};

/// Tenant id meaning "no particular tenant".
pub const NO_TENANT: i64 = -1;

/// Conjoin request filters and the tenant filter into the outer WHERE clause.
///
/// Each filter must parse to one comparison on its own column; otherwise the
/// pass fails without touching the statement. Conjuncts already present, after
/// alias substitution on both sides, are not added again.
pub fn inject_filters(
    statement: &mut Statement,
    ctx: &CorrectionContext<'_>,
    tenant_biz_name: &str,
) -> Result<bool> {
    let mut filters = ctx.filters.filters.clone();
    if let Some(tenant) = tenant_filter(ctx, tenant_biz_name) {
        filters.push(tenant);
    }
    if filters.is_empty() {
        return Ok(false);
    }
    let replacements = value_replacements(ctx.schema, &ctx.model_ids);
    let mut conditions = filters
        .iter()
        .map(filter_condition)
        .collect::<Result<Vec<_>>>()?;
    for condition in &mut conditions {
        replace_literals(condition, &replacements);
    }

    let Some(select) = outer_select_mut(statement) else {
        return Ok(false);
    };
    let mut present: HashSet<String> = select
        .selection
        .as_ref()
        .map(|existing| normalized_conjuncts(existing, &replacements))
        .unwrap_or_default();
    let additions: Vec<Expr> = conditions
        .into_iter()
        .filter(|c| present.insert(c.to_string()))
        .collect();
    if additions.is_empty() {
        return Ok(false);
    }

    let mut combined = match select.selection.take() {
        Some(existing) if has_top_level_or(&existing) => Some(Expr::Nested(Box::new(existing))),
        other => other,
    };
    for addition in additions {
        combined = Some(match combined {
            Some(existing) => and(existing, addition),
            None => addition,
        });
    }
    select.selection = combined;
    Ok(true)
}

/// Parse one filter, accepting only a comparison whose left side is the filter's column.
fn filter_condition(filter: &QueryFilter) -> Result<Expr> {
    let text = filter.to_sql();
    let condition = parse_condition(&text)?;
    if compared_column(&condition) == Some(filter.name.as_str()) {
        Ok(condition)
    } else {
        Err(Error::InvalidFilterExpression {
            expression: text,
            reason: format!("`{}` is not a single column", filter.name),
        })
    }
}

fn compared_column(condition: &Expr) -> Option<&str> {
    let column = match condition {
        Expr::BinaryOp { left, op, .. } if is_comparison(op) => left,
        Expr::InList { expr, .. } | Expr::Like { expr, .. } => expr,
        _ => return None,
    };
    match &**column {
        Expr::Identifier(ident) if ident.quote_style.is_none() => Some(ident.value.as_str()),
        _ => None,
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

/// Rendered conjuncts of `existing` as they read once aliases are substituted.
/// Parenthesized groups without a top-level `OR` count as their own conjuncts.
fn normalized_conjuncts(existing: &Expr, replacements: &HashMap<String, String>) -> HashSet<String> {
    let mut rendered = HashSet::new();
    collect_conjuncts(existing, replacements, &mut rendered);
    rendered
}

fn collect_conjuncts(
    expr: &Expr,
    replacements: &HashMap<String, String>,
    rendered: &mut HashSet<String>,
) {
    for conjunct in conjuncts(expr) {
        match conjunct {
            Expr::Nested(inner) if !has_top_level_or(inner) => {
                collect_conjuncts(inner, replacements, rendered);
            }
            _ => {
                let mut conjunct = conjunct.clone();
                replace_literals(&mut conjunct, replacements);
                rendered.insert(conjunct.to_string());
            }
        }
    }
}

/// `<tenant dimension> = <tenant id>` for a real tenant whose dimension is in scope.
pub fn tenant_filter(ctx: &CorrectionContext<'_>, tenant_biz_name: &str) -> Option<QueryFilter> {
    let tenant = ctx.tenant_id.filter(|id| *id != 0 && *id != NO_TENANT)?;
    let Some(dimension) = ctx.schema.dimension_by_biz_name(&ctx.model_ids, tenant_biz_name) else {
        debug!(tenant, tenant_biz_name, "no tenant dimension in scope");
        return None;
    };
    Some(QueryFilter::equals(
        &dimension.biz_name,
        &dimension.name,
        Value::from(tenant),
        Some(dimension.id),
    ))
}
