//! Generic keyset-paginated list endpoint.
//!
//! Each listing is a static `ListResource`: the columns it selects, the
//! tenant scope, its sort table and its allow-listed filters. One handler
//! serves them all:
//!
//! ```text
//! SELECT <columns>, <sort expr> AS sort_value
//! FROM <from>
//! WHERE <scope> [AND <filters>] [AND <resume predicate>]
//! ORDER BY <sort expr> <dir>, <id> <dir>
//! LIMIT <page size + 1>
//! ```

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, NaiveDate};
use serde_json::json;

use super::response::{ok, ApiError, CursorMeta};
use super::tenant::TenantContext;
use super::AppState;
use crate::db::{SqlParam, Statement};
use crate::pagination::{
    decode_cursor, parse_pagination, KeysetQuery, Page, PageLimits, ParamList, RequestQuery, SortDirection,
    SortTable, SORT_VALUE_COLUMN,
};

/// Which tenant id fills `$1` in the scope condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Property,
    Account,
}

impl Scope {
    fn tenant_id<'a>(&self, tenant: &'a TenantContext) -> &'a str {
        match self {
            Scope::Property => &tenant.property_id,
            Scope::Account => &tenant.account_id,
        }
    }
}

/// How a query parameter turns into a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Single text value.
    Text,
    /// One or more values, bound as `text[]`.
    TextList,
    /// Whole number; anything else is a 400.
    Integer,
    /// `YYYY-MM-DD`.
    Date,
    /// RFC 3339 timestamp or `YYYY-MM-DD`.
    Timestamp,
    /// Trimmed, wrapped in `%…%` for `ILIKE`; blank is ignored.
    Search,
    /// Parameterless condition applied when the value is `true`.
    Flag,
}

/// An allow-listed filter. `{}` in `condition` is replaced by the placeholder.
#[derive(Debug, Clone, Copy)]
pub struct Filter {
    pub param: &'static str,
    pub kind: FilterKind,
    pub condition: &'static str,
}

impl Filter {
    pub const fn new(param: &'static str, kind: FilterKind, condition: &'static str) -> Self {
        Self { param, kind, condition }
    }

    /// Condition for this filter, pushing its parameter, if the query sets it.
    pub fn apply(&self, query: &RequestQuery, params: &mut ParamList) -> Result<Option<String>, ApiError> {
        let param = match self.kind {
            FilterKind::TextList => {
                let values = query.all(self.param);
                if values.is_empty() {
                    return Ok(None);
                }
                SqlParam::text_array(values)
            }
            FilterKind::Flag => {
                return Ok((query.single(self.param) == Some("true")).then(|| self.condition.to_string()));
            }
            kind => {
                let Some(raw) = query.single(self.param) else {
                    return Ok(None);
                };
                match kind {
                    FilterKind::Integer => SqlParam::Int(raw.trim().parse::<i64>().map_err(|_| self.invalid("an integer"))?),
                    FilterKind::Date => {
                        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| self.invalid("a date (YYYY-MM-DD)"))?;
                        SqlParam::Text(raw.trim().to_string())
                    }
                    FilterKind::Timestamp => {
                        let raw = raw.trim();
                        let valid = DateTime::parse_from_rfc3339(raw).is_ok()
                            || NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok();
                        if !valid {
                            return Err(self.invalid("an ISO-8601 timestamp"));
                        }
                        SqlParam::Text(raw.to_string())
                    }
                    FilterKind::Search => {
                        let term = raw.trim();
                        if term.is_empty() {
                            return Ok(None);
                        }
                        SqlParam::Text(format!("%{}%", term))
                    }
                    _ => SqlParam::Text(raw.to_string()),
                }
            }
        };
        let placeholder = params.push(param);
        Ok(Some(self.condition.replace("{}", &placeholder)))
    }

    fn invalid(&self, expected: &str) -> ApiError {
        ApiError::Validation {
            message: format!("Query parameter '{}' must be {}.", self.param, expected),
            details: Some(json!({ "param": self.param })),
        }
    }
}

/// Static description of one list endpoint.
#[derive(Debug, Clone, Copy)]
pub struct ListResource {
    pub path: &'static str,
    /// Select list without the sort value.
    pub columns: &'static str,
    /// `FROM` clause body including joins.
    pub from: &'static str,
    pub scope: Scope,
    /// Route segments bound as `$2`, `$3`, ... in declaration order.
    pub path_params: &'static [&'static str],
    /// Tenant condition referencing `$1` and any path parameters.
    pub scope_condition: &'static str,
    pub sort: SortTable,
    pub filters: &'static [Filter],
    pub limits: PageLimits,
}

/// A statement plus what the response needs to describe the page.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPlan {
    pub statement: Statement,
    pub page_size: u32,
    pub sort_by: &'static str,
    pub sort_dir: SortDirection,
}

impl ListResource {
    /// Build the page query for a request.
    ///
    /// `path` holds the values of `path_params`, in the same order.
    pub fn plan(&self, tenant: &TenantContext, path: &[&str], query: &RequestQuery) -> Result<ListPlan, ApiError> {
        if path.len() != self.path_params.len() {
            return Err(ApiError::NotFound);
        }
        let pagination = parse_pagination(query, self.limits);
        let spec = self.sort.resolve(query.single("sort_by"));
        let cursor = decode_cursor(pagination.cursor.as_deref()).filter(|token| spec.accepts_cursor(&token.value));

        let mut params = ParamList::new();
        params.push(self.scope.tenant_id(tenant));
        for value in path {
            params.push(*value);
        }
        let mut conditions = vec![self.scope_condition.to_string()];

        for filter in self.filters {
            if let Some(condition) = filter.apply(query, &mut params)? {
                conditions.push(condition);
            }
        }

        let keyset = KeysetQuery {
            spec,
            id_column: self.sort.id_column,
            direction: pagination.sort_dir,
            cursor: cursor.as_ref(),
        };
        if let Some(predicate) = keyset.push_predicate(&mut params) {
            conditions.push(predicate);
        }
        let limit = params.push(KeysetQuery::fetch_limit(pagination.limit));

        let text = format!(
            "SELECT {}, {} AS {} FROM {} WHERE {} ORDER BY {} LIMIT {}",
            self.columns,
            spec.expr,
            SORT_VALUE_COLUMN,
            self.from,
            conditions.join(" AND "),
            keyset.order_by(),
            limit
        );

        Ok(ListPlan {
            statement: Statement::new(text, params.into_vec()),
            page_size: pagination.limit,
            sort_by: spec.key,
            sort_dir: pagination.sort_dir,
        })
    }
}

/// Handler shared by every `ListResource` route.
pub async fn list_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    resource: web::Data<ListResource>,
    tenant: TenantContext,
    query: web::Query<Vec<(String, String)>>,
) -> Result<HttpResponse, ApiError> {
    let path = resource
        .path_params
        .iter()
        .map(|name| req.match_info().get(name).ok_or(ApiError::NotFound))
        .collect::<Result<Vec<_>, _>>()?;
    let query = RequestQuery::new(query.into_inner());
    let plan = resource.plan(&tenant, &path, &query)?;

    let rows = state.db.execute(&plan.statement).await?;
    let page = Page::from_rows(rows.into_rows(), plan.page_size, SORT_VALUE_COLUMN, "id");
    log::debug!(
        "{}: {} item(s), has_more={}",
        resource.path,
        page.items.len(),
        page.has_more
    );

    Ok(ok(
        json!({ "items": page.items }),
        Some(CursorMeta {
            next_cursor: page.next_cursor,
            has_more: page.has_more,
            sort_by: plan.sort_by.to_string(),
            sort_dir: plan.sort_dir,
        }),
    ))
}
