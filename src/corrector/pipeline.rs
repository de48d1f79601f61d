use std::fmt;

use sqlparser::ast::Statement;
use tracing::{debug, error, warn};

use crate::candidate::SemanticParseCandidate;
use crate::config::{EngineConfig, TimeDimensionNames};
use crate::corrector::context::CorrectionContext;
use crate::corrector::{alias, date, date_diff, filter};
use crate::error::Result;
use crate::parser::sql_parser::parse_select;

/// The rewrites applied to candidate SQL, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionPass {
    /// Default date filter.
    DateDefault,
    /// `DATEDIFF` to `TIMESTAMPDIFF`.
    DateDiff,
    /// Request and tenant filters.
    FilterInjection,
    /// Business names and aliases to technical values.
    AliasSubstitution,
}

impl CorrectionPass {
    /// Fixed pass order.
    pub const ORDER: [CorrectionPass; 4] = [
        CorrectionPass::DateDefault,
        CorrectionPass::DateDiff,
        CorrectionPass::FilterInjection,
        CorrectionPass::AliasSubstitution,
    ];
}

impl fmt::Display for CorrectionPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CorrectionPass::DateDefault => "date_default",
            CorrectionPass::DateDiff => "date_diff",
            CorrectionPass::FilterInjection => "filter_injection",
            CorrectionPass::AliasSubstitution => "alias_substitution",
        };
        f.write_str(name)
    }
}

/// Rewrites generated SQL into executable, tenant-safe SQL.
#[derive(Debug, Clone)]
pub struct SqlCorrectionPipeline {
    time_dimensions: TimeDimensionNames,
    tenant_biz_name: String,
}

impl Default for SqlCorrectionPipeline {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl SqlCorrectionPipeline {
    /// Pipeline using the time dimension names and tenant business name of `config`.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            time_dimensions: config.time_dimensions.clone(),
            tenant_biz_name: config.tenant_biz_name.clone(),
        }
    }

    /// Correct `sql`, returning it unchanged when it is not a plain `SELECT`.
    pub fn correct(&self, sql: &str, ctx: &CorrectionContext<'_>) -> String {
        match self.try_correct(sql, ctx) {
            Ok(corrected) => corrected,
            Err(e) => {
                warn!(error = %e, "SQL left uncorrected");
                sql.to_string()
            }
        }
    }

    /// Correct `sql`, failing only when it cannot be parsed as a plain `SELECT`.
    ///
    /// A failing pass is logged and skipped; later passes still run.
    pub fn try_correct(&self, sql: &str, ctx: &CorrectionContext<'_>) -> Result<String> {
        let mut statement = parse_select(sql)?;
        for pass in CorrectionPass::ORDER {
            match self.apply(pass, &mut statement, ctx) {
                Ok(true) => debug!(%pass, "correction pass applied"),
                Ok(false) => {}
                Err(e) => error!(%pass, error = %e, "correction pass skipped"),
            }
        }
        Ok(statement.to_string())
    }

    /// Set `corrected_sql` from one full run over `raw_sql`.
    pub fn correct_candidate(
        &self,
        candidate: &mut SemanticParseCandidate,
        ctx: &CorrectionContext<'_>,
    ) {
        candidate.sql_info.corrected_sql = self.correct(&candidate.sql_info.raw_sql, ctx);
    }

    fn apply(
        &self,
        pass: CorrectionPass,
        statement: &mut Statement,
        ctx: &CorrectionContext<'_>,
    ) -> Result<bool> {
        match pass {
            CorrectionPass::DateDefault => {
                date::add_date_if_missing(statement, ctx, &self.time_dimensions)
            }
            CorrectionPass::DateDiff => date_diff::normalize_date_diff(statement),
            CorrectionPass::FilterInjection => {
                filter::inject_filters(statement, ctx, &self.tenant_biz_name)
            }
            CorrectionPass::AliasSubstitution => alias::substitute_aliases(statement, ctx),
        }
    }
}
