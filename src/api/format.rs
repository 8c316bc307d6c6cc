//! Response shaping: raw database rows into the public wire format.
//!
//! Row identifiers become string ids, the comma-joined tags column becomes
//! an ordered list, 0/1 integer flags become booleans, and absent optional
//! dates are omitted rather than serialized as sentinels.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::database::models::{CommentRow, TicketRow, TicketSummaryRow, UserRow};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub department: Option<String>,
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDto {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: String,
    pub status: String,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_role: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub comments: Vec<CommentDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to_email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub id: String,
    pub ticket_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_internal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

/// Compact ticket shape for dashboard recent/overdue lists.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSummaryDto {
    pub id: String,
    pub title: String,
    pub status: String,
    pub priority: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to_name: Option<String>,
}

/// Split the stored comma-joined tags column. Empty or missing input maps
/// to an empty list, never a list with an empty element.
pub fn split_tags(tags: Option<&str>) -> Vec<String> {
    match tags {
        None => Vec::new(),
        Some(s) if s.is_empty() => Vec::new(),
        Some(s) => s.split(',').map(|t| t.to_string()).collect(),
    }
}

/// Join tags back into the stored encoding. An empty list stores NULL.
pub fn join_tags(tags: &[String]) -> Option<String> {
    if tags.is_empty() {
        None
    } else {
        Some(tags.join(","))
    }
}

fn int_to_bool(value: i32) -> bool {
    value != 0
}

pub fn user_to_dto(row: &UserRow) -> UserDto {
    UserDto {
        id: row.id.to_string(),
        email: row.email.clone(),
        name: row.name.clone(),
        role: row.role.clone(),
        department: row.department.clone(),
        location: row.location.clone(),
        is_active: None,
        created_at: row.created_at,
    }
}

/// Admin-facing user shape includes the activity flag.
pub fn user_to_admin_dto(row: &UserRow) -> UserDto {
    UserDto {
        is_active: Some(int_to_bool(row.is_active)),
        ..user_to_dto(row)
    }
}

pub fn comment_to_dto(row: &CommentRow) -> CommentDto {
    CommentDto {
        id: row.id.to_string(),
        ticket_id: row.ticket_id.to_string(),
        user_id: row.user_id.to_string(),
        content: row.content.clone(),
        created_at: row.created_at,
        is_internal: int_to_bool(row.is_internal),
        user_name: row.user_name.clone(),
        user_email: row.user_email.clone(),
    }
}

pub fn ticket_to_dto(row: &TicketRow, comments: Vec<CommentDto>) -> TicketDto {
    TicketDto {
        id: row.id.to_string(),
        title: row.title.clone(),
        description: row.description.clone(),
        category: row.category.clone(),
        priority: row.priority.clone(),
        status: row.status.clone(),
        created_by: row.created_by.to_string(),
        assigned_to: row.assigned_to.map(|id| id.to_string()),
        assigned_role: row.assigned_role.clone(),
        created_at: row.created_at,
        updated_at: row.updated_at,
        due_date: row.due_date,
        tags: split_tags(row.tags.as_deref()),
        comments,
        created_by_name: row.created_by_name.clone(),
        created_by_email: row.created_by_email.clone(),
        assigned_to_name: row.assigned_to_name.clone(),
        assigned_to_email: row.assigned_to_email.clone(),
    }
}

pub fn tickets_to_dtos(rows: &[TicketRow]) -> Vec<TicketDto> {
    rows.iter().map(|r| ticket_to_dto(r, Vec::new())).collect()
}

pub fn ticket_summary_to_dto(row: &TicketSummaryRow) -> TicketSummaryDto {
    TicketSummaryDto {
        id: row.id.to_string(),
        title: row.title.clone(),
        status: row.status.clone(),
        priority: row.priority.clone(),
        category: row.category.clone(),
        created_at: row.created_at,
        due_date: row.due_date,
        created_by_name: row.created_by_name.clone(),
        assigned_to_name: row.assigned_to_name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket_row(tags: Option<&str>) -> TicketRow {
        TicketRow {
            id: 12,
            title: "Printer offline".into(),
            description: "The branch printer stopped responding".into(),
            category: "technical".into(),
            priority: "high".into(),
            status: "open".into(),
            created_by: 3,
            assigned_to: None,
            assigned_role: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            due_date: None,
            tags: tags.map(|s| s.to_string()),
            created_by_name: Some("Dana".into()),
            created_by_email: Some("dana@example.com".into()),
            assigned_to_name: None,
            assigned_to_email: None,
        }
    }

    #[test]
    fn tags_round_trip_preserves_order() {
        let stored = join_tags(&["a".to_string(), "b".to_string()]);
        assert_eq!(stored.as_deref(), Some("a,b"));
        assert_eq!(split_tags(stored.as_deref()), vec!["a", "b"]);
    }

    #[test]
    fn empty_tags_map_to_empty_list() {
        assert!(split_tags(None).is_empty());
        assert!(split_tags(Some("")).is_empty());
        assert_eq!(join_tags(&[]), None);
    }

    #[test]
    fn ids_are_stringified() {
        let dto = ticket_to_dto(&ticket_row(Some("billing,enterprise")), Vec::new());
        assert_eq!(dto.id, "12");
        assert_eq!(dto.created_by, "3");
        assert_eq!(dto.assigned_to, None);
        assert_eq!(dto.tags, vec!["billing", "enterprise"]);
    }

    #[test]
    fn absent_due_date_is_omitted_from_json() {
        let dto = ticket_to_dto(&ticket_row(None), Vec::new());
        let json = serde_json::to_value(&dto).unwrap();
        assert!(json.get("dueDate").is_none());
        assert_eq!(json["tags"], serde_json::json!([]));
    }

    #[test]
    fn flag_integers_become_booleans() {
        let row = CommentRow {
            id: 1,
            ticket_id: 12,
            user_id: 3,
            content: "taking this".into(),
            created_at: Utc::now(),
            is_internal: 1,
            user_name: None,
            user_email: None,
        };
        assert!(comment_to_dto(&row).is_internal);

        let user = UserRow {
            id: 4,
            email: "pat@example.com".into(),
            password_hash: String::new(),
            name: "Pat".into(),
            role: "assignee".into(),
            department: None,
            location: None,
            is_active: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(user_to_admin_dto(&user).is_active, Some(false));
        assert_eq!(user_to_dto(&user).is_active, None);
    }
}
