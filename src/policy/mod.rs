//! Role policy table: the single source of truth for ticket visibility
//! scopes and per-role capability sets. Every endpoint consults this
//! module instead of restating role checks inline.

use crate::types::{Role, TicketStatus};

pub mod guard;

pub use guard::{TicketAction, TicketFacts};

/// Roles a ticket may be assigned to. One canonical set, shared by
/// ticket creation, update, and transfer.
pub const ASSIGNABLE_ROLES: [Role; 4] = [
    Role::Assignee,
    Role::Technical,
    Role::DeveloperSupport,
    Role::HeadOffice,
];

/// Role targets a channel partner may route a new ticket to,
/// in place of a concrete assignee.
pub const PARTNER_ROUTING_ROLES: [Role; 2] = [Role::Technical, Role::Assignee];

pub fn is_assignable_role(role: Role) -> bool {
    ASSIGNABLE_ROLES.contains(&role)
}

pub fn assignable_roles_list() -> String {
    ASSIGNABLE_ROLES.map(|r| r.as_str()).join(", ")
}

/// Visibility scope for ticket-listing operations. The scope predicate is
/// always ANDed ahead of any client-supplied filter and cannot be widened
/// by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketScope {
    /// Every ticket
    All,
    /// Tickets the user created
    CreatedBy(i64),
    /// Tickets assigned to the user, plus any open ticket
    AssignedOrOpen(i64),
    /// Tickets the user created or is assigned, plus unclaimed open tickets
    Involved(i64),
}

pub fn ticket_scope(role: Role, user_id: i64) -> TicketScope {
    match role {
        Role::ChannelPartner => TicketScope::CreatedBy(user_id),
        Role::Assignee => TicketScope::AssignedOrOpen(user_id),
        Role::HeadOffice | Role::Technical => TicketScope::All,
        Role::DeveloperSupport => TicketScope::Involved(user_id),
    }
}

impl TicketScope {
    /// Membership test for a single ticket. Mirrors the SQL predicate the
    /// filter module renders for list queries.
    pub fn contains(
        &self,
        created_by: i64,
        assigned_to: Option<i64>,
        status: TicketStatus,
    ) -> bool {
        match *self {
            TicketScope::All => true,
            TicketScope::CreatedBy(me) => created_by == me,
            TicketScope::AssignedOrOpen(me) => {
                assigned_to == Some(me) || status == TicketStatus::Open
            }
            TicketScope::Involved(me) => {
                created_by == me
                    || assigned_to == Some(me)
                    || (status == TicketStatus::Open && assigned_to.is_none())
            }
        }
    }
}

/// Independent capability booleans per role.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    pub can_create_ticket: bool,
    pub can_delete_ticket: bool,
    pub can_view_all_users: bool,
    pub can_search_users: bool,
    pub can_create_user: bool,
    /// Update or delete user accounts
    pub can_manage_users: bool,
    pub can_assign_tickets: bool,
    /// See the assignee picker at all
    pub can_view_assignees: bool,
}

pub fn capabilities(role: Role) -> Capabilities {
    Capabilities {
        can_create_ticket: matches!(role, Role::ChannelPartner | Role::HeadOffice),
        can_delete_ticket: matches!(role, Role::HeadOffice | Role::Technical),
        can_view_all_users: matches!(role, Role::HeadOffice | Role::Technical),
        can_search_users: matches!(role, Role::HeadOffice | Role::Technical),
        can_create_user: matches!(role, Role::HeadOffice | Role::Technical),
        can_manage_users: matches!(role, Role::HeadOffice),
        can_assign_tickets: matches!(role, Role::HeadOffice | Role::Assignee),
        can_view_assignees: !matches!(role, Role::DeveloperSupport),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_per_role() {
        assert_eq!(ticket_scope(Role::ChannelPartner, 1), TicketScope::CreatedBy(1));
        assert_eq!(ticket_scope(Role::Assignee, 2), TicketScope::AssignedOrOpen(2));
        assert_eq!(ticket_scope(Role::HeadOffice, 3), TicketScope::All);
        assert_eq!(ticket_scope(Role::Technical, 4), TicketScope::All);
        assert_eq!(ticket_scope(Role::DeveloperSupport, 5), TicketScope::Involved(5));
    }

    #[test]
    fn channel_partner_sees_only_own_tickets() {
        let scope = ticket_scope(Role::ChannelPartner, 1);
        assert!(scope.contains(1, None, TicketStatus::Open));
        assert!(!scope.contains(2, Some(1), TicketStatus::Open));
    }

    #[test]
    fn assignee_sees_assigned_and_any_open() {
        let scope = ticket_scope(Role::Assignee, 9);
        assert!(scope.contains(1, Some(9), TicketStatus::Closed));
        assert!(scope.contains(1, Some(4), TicketStatus::Open));
        assert!(!scope.contains(1, Some(4), TicketStatus::Resolved));
    }

    #[test]
    fn developer_support_needs_involvement_or_unclaimed_open() {
        let scope = ticket_scope(Role::DeveloperSupport, 9);
        assert!(scope.contains(9, None, TicketStatus::Closed));
        assert!(scope.contains(1, Some(9), TicketStatus::Resolved));
        assert!(scope.contains(1, None, TicketStatus::Open));
        // open but already claimed by someone else
        assert!(!scope.contains(1, Some(4), TicketStatus::Open));
    }

    #[test]
    fn capability_table() {
        assert!(capabilities(Role::ChannelPartner).can_create_ticket);
        assert!(!capabilities(Role::Assignee).can_create_ticket);
        assert!(capabilities(Role::Technical).can_delete_ticket);
        assert!(!capabilities(Role::Assignee).can_delete_ticket);
        assert!(capabilities(Role::Technical).can_create_user);
        assert!(!capabilities(Role::Technical).can_manage_users);
        assert!(capabilities(Role::HeadOffice).can_manage_users);
        assert!(capabilities(Role::Assignee).can_assign_tickets);
        assert!(!capabilities(Role::Technical).can_assign_tickets);
        assert!(!capabilities(Role::DeveloperSupport).can_view_assignees);
    }

    #[test]
    fn assignable_roles_exclude_channel_partner() {
        assert!(is_assignable_role(Role::Assignee));
        assert!(is_assignable_role(Role::HeadOffice));
        assert!(!is_assignable_role(Role::ChannelPartner));
    }
}
