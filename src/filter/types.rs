use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::FilterError;

/// A bound statement parameter. Values are never interpolated into SQL.
#[derive(Debug, Clone)]
pub enum SqlParam {
    Int(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

/// Id filter values arrive as JSON numbers or strings depending on the
/// client; accept both.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum IdValue {
    Int(i64),
    Text(String),
}

impl IdValue {
    pub fn as_i64(&self) -> Result<i64, FilterError> {
        match self {
            IdValue::Int(v) => Ok(*v),
            IdValue::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| FilterError::InvalidId(s.clone())),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DateRange {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Structured filter input for ticket list queries. All fields optional;
/// whatever is present is ANDed onto the role scope predicate.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TicketFilter {
    pub status: Vec<String>,
    pub priority: Vec<String>,
    pub category: Vec<String>,
    pub assigned_to: Vec<IdValue>,
    pub created_by: Vec<IdValue>,
    pub date_range: DateRange,
    pub tags: Vec<String>,
    pub search_term: String,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl TicketFilter {
    /// Resolve the effective page bounds: endpoint default, client
    /// override, config cap.
    pub fn page(&self, default_limit: i64) -> Result<(i64, i64), FilterError> {
        let max = crate::config::config().pagination.max_limit;
        let limit = match self.limit {
            Some(l) if l < 0 => return Err(FilterError::InvalidLimit),
            Some(l) => l.min(max),
            None => default_limit.min(max),
        };
        let offset = match self.offset {
            Some(o) if o < 0 => return Err(FilterError::InvalidOffset),
            Some(o) => o,
            None => 0,
        };
        Ok((limit, offset))
    }
}
