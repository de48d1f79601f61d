use std::collections::{BTreeSet, HashMap};
use std::ops::ControlFlow;

use sqlparser::ast::{visit_expressions_mut, Expr, Statement, Value, VisitMut};

use crate::corrector::context::CorrectionContext;
use crate::error::Result;
use crate::schema::SemanticSchema;

/// Replace string literals equal to a declared business name or alias with its technical value.
pub fn substitute_aliases(statement: &mut Statement, ctx: &CorrectionContext<'_>) -> Result<bool> {
    let replacements = value_replacements(ctx.schema, &ctx.model_ids);
    if replacements.is_empty() {
        return Ok(false);
    }
    Ok(replace_literals(statement, &replacements) > 0)
}

/// Rewrite every string literal under `node` found in `replacements`.
/// Returns how many literals changed.
pub fn replace_literals<V: VisitMut>(node: &mut V, replacements: &HashMap<String, String>) -> usize {
    let mut replaced = 0usize;
    let _ = visit_expressions_mut(node, |expr| {
        if let Expr::Value(v) = expr {
            if let Value::SingleQuotedString(s) | Value::DoubleQuotedString(s) = &mut v.value {
                if let Some(tech_name) = replacements.get(s.as_str()) {
                    *s = tech_name.clone();
                    replaced += 1;
                }
            }
        }
        ControlFlow::<()>::Continue(())
    });
    replaced
}

/// Business name and alias to technical value, over the dimensions in scope.
///
/// The first declaration of a name wins; entries without a technical value
/// are skipped.
pub fn value_replacements(
    schema: &SemanticSchema,
    model_ids: &BTreeSet<i64>,
) -> HashMap<String, String> {
    let mut replacements = HashMap::new();
    for dimension in schema.dimensions(model_ids) {
        for value_map in &dimension.value_maps {
            let Some(tech_name) = value_map.tech_name.as_deref() else {
                continue;
            };
            let names = value_map.biz_name.iter().chain(value_map.alias.iter());
            for name in names {
                if name != tech_name {
                    replacements
                        .entry(name.clone())
                        .or_insert_with(|| tech_name.to_string());
                }
            }
        }
    }
    replacements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::sql_parser::parse_select;
    use crate::schema::{SchemaElement, SchemaElementType, SchemaValueMap};

    fn schema() -> SemanticSchema {
        SemanticSchema::new(vec![SchemaElement {
            id: 2,
            model_id: 1,
            name: "平台".to_string(),
            biz_name: "platform".to_string(),
            alias: Vec::new(),
            element_type: SchemaElementType::Dimension,
            value_maps: vec![
                SchemaValueMap {
                    biz_name: Some("qq_music".to_string()),
                    tech_name: Some("t_001".to_string()),
                    alias: vec!["QQ音乐".to_string()],
                },
                SchemaValueMap {
                    biz_name: Some("netease".to_string()),
                    tech_name: None,
                    alias: vec!["网易云".to_string()],
                },
            ],
        }])
    }

    fn run(sql: &str) -> (bool, String) {
        let schema = schema();
        let ctx = CorrectionContext::new(&schema);
        let mut statement = parse_select(sql).expect("query should parse");
        let changed = substitute_aliases(&mut statement, &ctx).expect("alias pass never fails");
        (changed, statement.to_string())
    }

    #[test]
    fn aliases_and_biz_names_map_to_tech_names() {
        let (changed, sql) = run("SELECT a FROM t WHERE 平台 = 'QQ音乐' OR 平台 IN ('qq_music', '网易云')");
        assert!(changed);
        assert_eq!(
            sql,
            "SELECT a FROM t WHERE 平台 = 't_001' OR 平台 IN ('t_001', '网易云')"
        );
    }

    #[test]
    fn literals_outside_where_are_replaced_too() {
        let (_, sql) = run("SELECT CONCAT('QQ音乐', a) FROM t");
        assert_eq!(sql, "SELECT CONCAT('t_001', a) FROM t");
    }

    #[test]
    fn out_of_scope_models_contribute_nothing() {
        let schema = schema();
        assert!(value_replacements(&schema, &BTreeSet::from([5])).is_empty());
        assert_eq!(value_replacements(&schema, &BTreeSet::from([1])).len(), 2);
    }
}
