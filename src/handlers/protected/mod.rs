pub mod assignees;
pub mod auth;
pub mod dashboard;
pub mod search;
pub mod tickets;
pub mod users;
