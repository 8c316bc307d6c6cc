//! Authorization for single-ticket operations. A boolean OR of matching
//! clauses grants access; no match denies.

use crate::types::{Role, TicketStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketAction {
    View,
    Edit,
    Delete,
    Comment,
    Transfer,
}

/// The ticket fields the guard decides on.
#[derive(Debug, Clone, Copy)]
pub struct TicketFacts {
    pub created_by: i64,
    pub assigned_to: Option<i64>,
    pub status: TicketStatus,
}

impl TicketFacts {
    fn is_creator(&self, user_id: i64) -> bool {
        self.created_by == user_id
    }

    fn is_assignee(&self, user_id: i64) -> bool {
        self.assigned_to == Some(user_id)
    }

    fn is_unclaimed_open(&self) -> bool {
        self.status == TicketStatus::Open && self.assigned_to.is_none()
    }
}

pub fn allows(role: Role, user_id: i64, ticket: TicketFacts, action: TicketAction) -> bool {
    // Head office and technical staff pass every guard; delete is
    // restricted to them outright.
    let is_staff = matches!(role, Role::HeadOffice | Role::Technical);

    match action {
        TicketAction::View => {
            is_staff
                || match role {
                    Role::ChannelPartner => ticket.is_creator(user_id),
                    Role::Assignee | Role::DeveloperSupport => {
                        ticket.is_creator(user_id)
                            || ticket.is_assignee(user_id)
                            || ticket.is_unclaimed_open()
                    }
                    _ => false,
                }
        }
        TicketAction::Edit | TicketAction::Comment => {
            is_staff || ticket.is_creator(user_id) || ticket.is_assignee(user_id)
        }
        TicketAction::Delete => is_staff,
        TicketAction::Transfer => match role {
            Role::HeadOffice | Role::Technical | Role::Assignee => true,
            Role::ChannelPartner => ticket.is_creator(user_id) || ticket.is_assignee(user_id),
            Role::DeveloperSupport => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(created_by: i64, assigned_to: Option<i64>, status: TicketStatus) -> TicketFacts {
        TicketFacts { created_by, assigned_to, status }
    }

    #[test]
    fn staff_can_do_everything() {
        let t = ticket(1, Some(2), TicketStatus::InProgress);
        for role in [Role::HeadOffice, Role::Technical] {
            for action in [
                TicketAction::View,
                TicketAction::Edit,
                TicketAction::Delete,
                TicketAction::Comment,
                TicketAction::Transfer,
            ] {
                assert!(allows(role, 99, t, action), "{role} should pass {action:?}");
            }
        }
    }

    #[test]
    fn channel_partner_limited_to_own_tickets() {
        let own = ticket(5, None, TicketStatus::Open);
        let other = ticket(6, None, TicketStatus::Open);

        assert!(allows(Role::ChannelPartner, 5, own, TicketAction::View));
        assert!(allows(Role::ChannelPartner, 5, own, TicketAction::Edit));
        assert!(allows(Role::ChannelPartner, 5, own, TicketAction::Transfer));
        assert!(!allows(Role::ChannelPartner, 5, own, TicketAction::Delete));

        assert!(!allows(Role::ChannelPartner, 5, other, TicketAction::View));
        assert!(!allows(Role::ChannelPartner, 5, other, TicketAction::Edit));
        assert!(!allows(Role::ChannelPartner, 5, other, TicketAction::Transfer));
    }

    #[test]
    fn assignee_can_view_unclaimed_open_but_not_claimed() {
        let unclaimed = ticket(1, None, TicketStatus::Open);
        let claimed = ticket(1, Some(7), TicketStatus::Open);
        let theirs = ticket(1, Some(8), TicketStatus::Resolved);

        assert!(allows(Role::Assignee, 8, unclaimed, TicketAction::View));
        assert!(!allows(Role::Assignee, 8, claimed, TicketAction::View));
        assert!(allows(Role::Assignee, 8, theirs, TicketAction::View));
        // View does not imply edit without a relationship
        assert!(!allows(Role::Assignee, 8, unclaimed, TicketAction::Edit));
        // Assignees may transfer any ticket
        assert!(allows(Role::Assignee, 8, claimed, TicketAction::Transfer));
    }

    #[test]
    fn developer_support_cannot_transfer() {
        let own = ticket(3, None, TicketStatus::Open);
        assert!(allows(Role::DeveloperSupport, 3, own, TicketAction::View));
        assert!(allows(Role::DeveloperSupport, 3, own, TicketAction::Edit));
        assert!(!allows(Role::DeveloperSupport, 3, own, TicketAction::Transfer));
        assert!(!allows(Role::DeveloperSupport, 3, own, TicketAction::Delete));
    }

    #[test]
    fn comment_follows_edit_predicate() {
        let t = ticket(1, Some(2), TicketStatus::InProgress);
        assert!(allows(Role::Assignee, 2, t, TicketAction::Comment));
        assert!(allows(Role::ChannelPartner, 1, t, TicketAction::Comment));
        assert!(!allows(Role::Assignee, 3, t, TicketAction::Comment));
    }
}
