pub mod comment;
pub mod ticket;
pub mod user;

pub use comment::{CommentRow, TransferHistoryRow};
pub use ticket::{TicketRow, TicketSummaryRow};
pub use user::UserRow;
