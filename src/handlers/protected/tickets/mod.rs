mod comments;
mod create;
mod detail;
mod filter;
mod list;
mod my_tickets;
mod transfer;

use crate::error::ApiError;

/// Path ids arrive as strings; anything that is not a row id cannot name
/// a ticket, so it reads as not-found rather than a malformed request.
fn parse_ticket_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::not_found("Ticket not found"))
}

pub use comments::{comments_get, comments_post};
pub use create::tickets_post;
pub use detail::{ticket_delete, ticket_get, ticket_put};
pub use filter::{filter_get, filter_post};
pub use list::tickets_get;
pub use my_tickets::my_tickets_get;
pub use transfer::{transfer_get, transfer_post};
