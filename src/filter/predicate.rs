use crate::policy::TicketScope;

use super::error::FilterError;
use super::order::order_by;
use super::types::{SqlParam, TicketFilter};

/// Shared projection for ticket list and detail queries: the ticket row
/// joined with creator and assignee identity.
pub const TICKET_SELECT: &str = "SELECT t.id, t.title, t.description, t.category, t.priority, t.status, \
     t.created_by, t.assigned_to, t.assigned_role, t.created_at, t.updated_at, t.due_date, t.tags, \
     u1.name AS created_by_name, u1.email AS created_by_email, \
     u2.name AS assigned_to_name, u2.email AS assigned_to_email \
     FROM tickets t \
     LEFT JOIN users u1 ON t.created_by = u1.id \
     LEFT JOIN users u2 ON t.assigned_to = u2.id";

const TICKET_COUNT: &str = "SELECT COUNT(*) \
     FROM tickets t \
     LEFT JOIN users u1 ON t.created_by = u1.id \
     LEFT JOIN users u2 ON t.assigned_to = u2.id";

/// Accumulates AND-joined predicate terms with `$n` placeholders.
///
/// The role scope term goes in first and client filters are ANDed after
/// it, so an out-of-scope filter value narrows the result to nothing
/// instead of widening visibility.
#[derive(Debug, Default)]
pub struct PredicateBuilder {
    terms: Vec<String>,
    params: Vec<SqlParam>,
}

impl PredicateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a parameter, returning its 1-based placeholder index.
    fn param(&mut self, value: SqlParam) -> usize {
        self.params.push(value);
        self.params.len()
    }

    fn like_pattern(term: &str) -> String {
        format!("%{}%", term)
    }

    /// Prepend nothing, append the role scope term. Call before any
    /// filter so the scope is the leading predicate.
    pub fn scope(mut self, scope: TicketScope) -> Self {
        match scope {
            TicketScope::All => {}
            TicketScope::CreatedBy(user_id) => {
                let p = self.param(SqlParam::Int(user_id));
                self.terms.push(format!("t.created_by = ${}", p));
            }
            TicketScope::AssignedOrOpen(user_id) => {
                let p1 = self.param(SqlParam::Int(user_id));
                let p2 = self.param(SqlParam::Text("open".to_string()));
                self.terms
                    .push(format!("(t.assigned_to = ${} OR t.status = ${})", p1, p2));
            }
            TicketScope::Involved(user_id) => {
                let p1 = self.param(SqlParam::Int(user_id));
                let p2 = self.param(SqlParam::Int(user_id));
                let p3 = self.param(SqlParam::Text("open".to_string()));
                self.terms.push(format!(
                    "(t.created_by = ${} OR t.assigned_to = ${} OR (t.status = ${} AND t.assigned_to IS NULL))",
                    p1, p2, p3
                ));
            }
        }
        self
    }

    /// Single-value equality against a ticket column (plain list filters).
    pub fn eq_text(&mut self, column: &str, value: &str) {
        let p = self.param(SqlParam::Text(value.to_string()));
        self.terms.push(format!("{} = ${}", column, p));
    }

    pub fn eq_int(&mut self, column: &str, value: i64) {
        let p = self.param(SqlParam::Int(value));
        self.terms.push(format!("{} = ${}", column, p));
    }

    /// Open tickets nobody has claimed yet (my-tickets "available" view).
    pub fn unclaimed_open(&mut self) {
        let p = self.param(SqlParam::Text("open".to_string()));
        self.terms
            .push(format!("(t.status = ${} AND t.assigned_to IS NULL)", p));
    }

    /// Assigned-or-unclaimed-open relationship (my-tickets default view).
    pub fn assigned_or_unclaimed_open(&mut self, user_id: i64) {
        let p1 = self.param(SqlParam::Int(user_id));
        let p2 = self.param(SqlParam::Text("open".to_string()));
        self.terms.push(format!(
            "(t.assigned_to = ${} OR (t.status = ${} AND t.assigned_to IS NULL))",
            p1, p2
        ));
    }

    fn in_list_text(&mut self, column: &str, values: &[String]) {
        if values.is_empty() {
            return;
        }
        let placeholders: Vec<String> = values
            .iter()
            .map(|v| format!("${}", self.param(SqlParam::Text(v.clone()))))
            .collect();
        self.terms
            .push(format!("{} IN ({})", column, placeholders.join(", ")));
    }

    fn in_list_int(&mut self, column: &str, values: &[i64]) {
        if values.is_empty() {
            return;
        }
        let placeholders: Vec<String> = values
            .iter()
            .map(|v| format!("${}", self.param(SqlParam::Int(*v))))
            .collect();
        self.terms
            .push(format!("{} IN ({})", column, placeholders.join(", ")));
    }

    /// Case-insensitive substring search over title, description,
    /// category, and the creator/assignee names.
    pub fn search_term(&mut self, term: &str) {
        if term.trim().is_empty() {
            return;
        }
        let pattern = Self::like_pattern(term);
        let mut pieces = Vec::with_capacity(5);
        for column in [
            "t.title",
            "t.description",
            "t.category",
            "u1.name",
            "u2.name",
        ] {
            let p = self.param(SqlParam::Text(pattern.clone()));
            pieces.push(format!("{} ILIKE ${}", column, p));
        }
        self.terms.push(format!("({})", pieces.join(" OR ")));
    }

    /// Tag terms: substring containment against the comma-joined tags
    /// column, ORed across the requested tags. A tag that is a substring
    /// of another tag will match it too; that mirrors the stored encoding.
    pub fn tags(&mut self, tags: &[String]) {
        let wanted: Vec<&String> = tags.iter().filter(|t| !t.trim().is_empty()).collect();
        if wanted.is_empty() {
            return;
        }
        let pieces: Vec<String> = wanted
            .into_iter()
            .map(|tag| {
                let p = self.param(SqlParam::Text(Self::like_pattern(tag.trim())));
                format!("t.tags ILIKE ${}", p)
            })
            .collect();
        self.terms.push(format!("({})", pieces.join(" OR ")));
    }

    fn date_bound(&mut self, op: &str, value: &str) {
        let p = self.param(SqlParam::Text(value.to_string()));
        self.terms
            .push(format!("t.created_at::date {} ${}::date", op, p));
    }

    /// Apply a structured filter object on top of whatever is already
    /// accumulated (normally the scope).
    pub fn apply(mut self, filter: &TicketFilter) -> Result<Self, FilterError> {
        self.search_term(&filter.search_term);
        self.in_list_text("t.status", &filter.status);
        self.in_list_text("t.priority", &filter.priority);
        self.in_list_text("t.category", &filter.category);

        let assigned: Vec<i64> = filter
            .assigned_to
            .iter()
            .map(|v| v.as_i64())
            .collect::<Result<_, _>>()?;
        self.in_list_int("t.assigned_to", &assigned);

        let created: Vec<i64> = filter
            .created_by
            .iter()
            .map(|v| v.as_i64())
            .collect::<Result<_, _>>()?;
        self.in_list_int("t.created_by", &created);

        if let Some(from) = filter.date_range.from.as_deref() {
            if !from.is_empty() {
                self.date_bound(">=", from);
            }
        }
        if let Some(to) = filter.date_range.to.as_deref() {
            if !to.is_empty() {
                self.date_bound("<=", to);
            }
        }

        self.tags(&filter.tags);
        Ok(self)
    }

    pub fn where_clause(&self) -> String {
        if self.terms.is_empty() {
            "WHERE 1=1".to_string()
        } else {
            format!("WHERE {}", self.terms.join(" AND "))
        }
    }

    /// Full SELECT with ordering and bound pagination.
    pub fn select_tickets(
        mut self,
        sort_by: Option<&str>,
        sort_order: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> (String, Vec<SqlParam>) {
        let where_clause = self.where_clause();
        let order_clause = order_by(sort_by, sort_order);
        let p_limit = self.param(SqlParam::Int(limit));
        let p_offset = self.param(SqlParam::Int(offset));
        let sql = format!(
            "{} {} {} LIMIT ${} OFFSET ${}",
            TICKET_SELECT, where_clause, order_clause, p_limit, p_offset
        );
        (sql, self.params)
    }

    /// Full SELECT with an explicit ORDER BY and no pagination.
    pub fn select_tickets_ordered(self, order_clause: &str) -> (String, Vec<SqlParam>) {
        let sql = format!("{} {} {}", TICKET_SELECT, self.where_clause(), order_clause);
        (sql, self.params)
    }

    /// Mirrored COUNT over the same predicate, for hasMore computation.
    pub fn count_tickets(&self) -> (String, Vec<SqlParam>) {
        let sql = format!("{} {}", TICKET_COUNT, self.where_clause());
        (sql, self.params.clone())
    }

    /// The bare predicate, for aggregate queries that bring their own
    /// SELECT list (dashboard stats).
    pub fn into_parts(self) -> (String, Vec<SqlParam>) {
        let clause = self.where_clause();
        (clause, self.params)
    }

    /// Non-consuming variant of into_parts, when the builder is reused
    /// for the matching list query.
    pub fn parts(&self) -> (String, Vec<SqlParam>) {
        (self.where_clause(), self.params.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::IdValue;

    #[test]
    fn scope_term_comes_first() {
        let filter = TicketFilter {
            status: vec!["open".into()],
            ..Default::default()
        };
        let builder = PredicateBuilder::new()
            .scope(TicketScope::CreatedBy(42))
            .apply(&filter)
            .unwrap();
        let clause = builder.where_clause();
        let scope_pos = clause.find("t.created_by = $1").expect("scope term");
        let filter_pos = clause.find("t.status IN ($2)").expect("filter term");
        assert!(scope_pos < filter_pos);
    }

    #[test]
    fn all_scope_adds_no_term() {
        let builder = PredicateBuilder::new().scope(TicketScope::All);
        assert_eq!(builder.where_clause(), "WHERE 1=1");
    }

    #[test]
    fn search_expands_to_five_columns() {
        let mut builder = PredicateBuilder::new();
        builder.search_term("login");
        let clause = builder.where_clause();
        for column in ["t.title", "t.description", "t.category", "u1.name", "u2.name"] {
            assert!(clause.contains(&format!("{} ILIKE", column)), "{}", clause);
        }
        assert_eq!(builder.params.len(), 5);
    }

    #[test]
    fn tag_terms_or_together() {
        let mut builder = PredicateBuilder::new();
        builder.tags(&["billing".to_string(), "ui".to_string()]);
        assert_eq!(
            builder.where_clause(),
            "WHERE (t.tags ILIKE $1 OR t.tags ILIKE $2)"
        );
        match &builder.params[0] {
            SqlParam::Text(p) => assert_eq!(p, "%billing%"),
            other => panic!("unexpected param {:?}", other),
        }
    }

    #[test]
    fn blank_search_and_tags_are_ignored() {
        let mut builder = PredicateBuilder::new();
        builder.search_term("  ");
        builder.tags(&["".to_string(), " ".to_string()]);
        assert_eq!(builder.where_clause(), "WHERE 1=1");
    }

    #[test]
    fn id_filters_accept_strings_and_numbers() {
        let filter = TicketFilter {
            assigned_to: vec![IdValue::Int(3), IdValue::Text("8".into())],
            ..Default::default()
        };
        let builder = PredicateBuilder::new()
            .scope(TicketScope::All)
            .apply(&filter)
            .unwrap();
        assert_eq!(builder.where_clause(), "WHERE t.assigned_to IN ($1, $2)");
    }

    #[test]
    fn bad_id_filter_is_rejected() {
        let filter = TicketFilter {
            created_by: vec![IdValue::Text("12; DROP TABLE users".into())],
            ..Default::default()
        };
        let err = PredicateBuilder::new().apply(&filter);
        assert!(err.is_err());
    }

    #[test]
    fn pagination_parameters_are_bound() {
        let (sql, params) = PredicateBuilder::new()
            .scope(TicketScope::All)
            .select_tickets(Some("title"), Some("asc"), 50, 10);
        assert!(sql.ends_with("ORDER BY t.title ASC LIMIT $1 OFFSET $2"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn count_mirrors_predicate_without_pagination() {
        let filter = TicketFilter {
            search_term: "printer".into(),
            ..Default::default()
        };
        let builder = PredicateBuilder::new()
            .scope(TicketScope::AssignedOrOpen(5))
            .apply(&filter)
            .unwrap();
        let (count_sql, count_params) = builder.count_tickets();
        assert!(count_sql.starts_with("SELECT COUNT(*)"));
        assert!(count_sql.contains("t.assigned_to = $1 OR t.status = $2"));
        assert!(!count_sql.contains("LIMIT"));
        assert_eq!(count_params.len(), 7);
    }
}
