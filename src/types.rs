use serde::{Deserialize, Serialize};

/// User roles. A role is a fixed identity attribute, not a hierarchy:
/// every permission is enumerated per role in the policy module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    ChannelPartner,
    Assignee,
    HeadOffice,
    Technical,
    DeveloperSupport,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::ChannelPartner,
        Role::Assignee,
        Role::HeadOffice,
        Role::Technical,
        Role::DeveloperSupport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::ChannelPartner => "channel_partner",
            Role::Assignee => "assignee",
            Role::HeadOffice => "head_office",
            Role::Technical => "technical",
            Role::DeveloperSupport => "developer_support",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.as_str() == s)
    }

    pub fn expected_list() -> String {
        Role::ALL.map(|r| r.as_str()).join(", ")
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    PendingApproval,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 5] = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::PendingApproval,
        TicketStatus::Resolved,
        TicketStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::PendingApproval => "pending_approval",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<TicketStatus> {
        TicketStatus::ALL.into_iter().find(|v| v.as_str() == s)
    }

    pub fn expected_list() -> String {
        TicketStatus::ALL.map(|v| v.as_str()).join(", ")
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TicketPriority {
    pub const ALL: [TicketPriority; 4] = [
        TicketPriority::Low,
        TicketPriority::Medium,
        TicketPriority::High,
        TicketPriority::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
            TicketPriority::Urgent => "urgent",
        }
    }

    pub fn parse(s: &str) -> Option<TicketPriority> {
        TicketPriority::ALL.into_iter().find(|v| v.as_str() == s)
    }

    pub fn expected_list() -> String {
        TicketPriority::ALL.map(|v| v.as_str()).join(", ")
    }
}

impl std::fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketCategory {
    Technical,
    Billing,
    General,
    FeatureRequest,
    BugReport,
}

impl TicketCategory {
    pub const ALL: [TicketCategory; 5] = [
        TicketCategory::Technical,
        TicketCategory::Billing,
        TicketCategory::General,
        TicketCategory::FeatureRequest,
        TicketCategory::BugReport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketCategory::Technical => "technical",
            TicketCategory::Billing => "billing",
            TicketCategory::General => "general",
            TicketCategory::FeatureRequest => "feature_request",
            TicketCategory::BugReport => "bug_report",
        }
    }

    pub fn parse(s: &str) -> Option<TicketCategory> {
        TicketCategory::ALL.into_iter().find(|v| v.as_str() == s)
    }

    pub fn expected_list() -> String {
        TicketCategory::ALL.map(|v| v.as_str()).join(", ")
    }
}

impl std::fmt::Display for TicketCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a ticket is routed. A channel partner may assign "to a role"
/// rather than a person; the database encodes that as a NULL assigned_to
/// plus an assigned_role hint, and this union keeps the two cases from
/// being conflated in application code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    Unassigned,
    User(i64),
    ToRole(Role),
}

impl Assignment {
    /// Decode the (assigned_to, assigned_role) column pair.
    /// A concrete user id wins over a stale role hint.
    pub fn from_columns(assigned_to: Option<i64>, assigned_role: Option<&str>) -> Assignment {
        match (assigned_to, assigned_role.and_then(Role::parse)) {
            (Some(id), _) => Assignment::User(id),
            (None, Some(role)) => Assignment::ToRole(role),
            (None, None) => Assignment::Unassigned,
        }
    }

    /// Encode back to the column pair.
    pub fn to_columns(&self) -> (Option<i64>, Option<&'static str>) {
        match self {
            Assignment::Unassigned => (None, None),
            Assignment::User(id) => (Some(*id), None),
            Assignment::ToRole(role) => (None, Some(role.as_str())),
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            Assignment::User(id) => Some(*id),
            _ => None,
        }
    }
}
