use std::collections::BTreeSet;

use crate::candidate::QueryFilters;
use crate::corrector::reference_date::ReferenceDateSource;
use crate::schema::SemanticSchema;

/// Everything a correction run reads besides the SQL itself.
#[derive(Debug, Clone)]
pub struct CorrectionContext<'a> {
    /// Schema metadata snapshot.
    pub schema: &'a SemanticSchema,
    /// Models the SQL was generated for; empty means all.
    pub model_ids: BTreeSet<i64>,
    /// Requester's tenant.
    pub tenant_id: Option<i64>,
    /// Filters supplied with the request.
    pub filters: QueryFilters,
    /// Resolved reference date, `YYYY-MM-DD`.
    pub reference_date: Option<String>,
}

impl<'a> CorrectionContext<'a> {
    /// Context over `schema` with no tenant, filters, or date.
    pub fn new(schema: &'a SemanticSchema) -> Self {
        Self {
            schema,
            model_ids: BTreeSet::new(),
            tenant_id: None,
            filters: QueryFilters::default(),
            reference_date: None,
        }
    }

    /// Scope to `model_ids`.
    pub fn with_models(mut self, model_ids: BTreeSet<i64>) -> Self {
        self.model_ids = model_ids;
        self
    }

    /// Set the requester's tenant.
    pub fn with_tenant(mut self, tenant_id: Option<i64>) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    /// Set the request filters.
    pub fn with_filters(mut self, filters: QueryFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Set the reference date directly.
    pub fn with_reference_date(mut self, date: Option<String>) -> Self {
        self.reference_date = date;
        self
    }

    /// Resolve the reference date for the current model scope from `source`.
    pub fn with_reference_date_from(mut self, source: &dyn ReferenceDateSource) -> Self {
        self.reference_date = source.reference_date(&self.model_ids);
        self
    }
}
