/// Sort validation. Column names are never taken from the client; the
/// requested field is matched against an allow-list and anything
/// unrecognized falls back to created_at.
const SORTABLE_COLUMNS: [&str; 5] = ["created_at", "updated_at", "title", "priority", "status"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn to_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn parse(s: Option<&str>) -> SortOrder {
        match s.map(|v| v.to_ascii_lowercase()).as_deref() {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }
}

/// Render an ORDER BY clause from client-supplied sort inputs.
pub fn order_by(sort_by: Option<&str>, sort_order: Option<&str>) -> String {
    let column = sort_by
        .filter(|c| SORTABLE_COLUMNS.contains(c))
        .unwrap_or("created_at");
    let order = SortOrder::parse(sort_order);
    format!("ORDER BY t.{} {}", column, order.to_sql())
}

/// Urgent-first ordering used by the my-tickets view: priority rank,
/// then recency.
pub fn priority_rank_order() -> &'static str {
    "ORDER BY CASE t.priority \
     WHEN 'urgent' THEN 1 \
     WHEN 'high' THEN 2 \
     WHEN 'medium' THEN 3 \
     WHEN 'low' THEN 4 \
     END, t.created_at DESC"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_listed_columns_pass_through() {
        assert_eq!(order_by(Some("updated_at"), Some("asc")), "ORDER BY t.updated_at ASC");
        assert_eq!(order_by(Some("priority"), None), "ORDER BY t.priority DESC");
    }

    #[test]
    fn unknown_column_falls_back_to_created_at() {
        assert_eq!(
            order_by(Some("password_hash; DROP TABLE tickets"), Some("desc")),
            "ORDER BY t.created_at DESC"
        );
        assert_eq!(order_by(None, None), "ORDER BY t.created_at DESC");
    }

    #[test]
    fn unknown_order_falls_back_to_desc() {
        assert_eq!(order_by(Some("title"), Some("sideways")), "ORDER BY t.title DESC");
    }
}
