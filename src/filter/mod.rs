//! Query predicate construction for ticket listing endpoints.
//!
//! Every list endpoint builds its WHERE clause here: the role scope
//! predicate first, then any client-supplied filters, each value a bound
//! parameter. Clients can narrow their scope but never widen it.

pub mod error;
pub mod order;
pub mod predicate;
pub mod types;

pub use error::FilterError;
pub use order::{order_by, priority_rank_order, SortOrder};
pub use predicate::PredicateBuilder;
pub use types::{SqlParam, TicketFilter};

use sqlx::postgres::PgArguments;
use sqlx::query::{Query, QueryAs, QueryScalar};
use sqlx::Postgres;

/// Bind accumulated parameters onto a row-mapping query, in order.
pub fn bind_rows<'q, T>(
    mut query: QueryAs<'q, Postgres, T, PgArguments>,
    params: &[SqlParam],
) -> QueryAs<'q, Postgres, T, PgArguments> {
    for param in params {
        query = match param {
            SqlParam::Int(v) => query.bind(*v),
            SqlParam::Text(v) => query.bind(v.clone()),
            SqlParam::Timestamp(v) => query.bind(*v),
        };
    }
    query
}

/// Bind accumulated parameters onto a scalar query (counts).
pub fn bind_scalar<'q, T>(
    mut query: QueryScalar<'q, Postgres, T, PgArguments>,
    params: &[SqlParam],
) -> QueryScalar<'q, Postgres, T, PgArguments> {
    for param in params {
        query = match param {
            SqlParam::Int(v) => query.bind(*v),
            SqlParam::Text(v) => query.bind(v.clone()),
            SqlParam::Timestamp(v) => query.bind(*v),
        };
    }
    query
}

/// Bind accumulated parameters onto a plain statement.
pub fn bind_exec<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[SqlParam],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            SqlParam::Int(v) => query.bind(*v),
            SqlParam::Text(v) => query.bind(v.clone()),
            SqlParam::Timestamp(v) => query.bind(*v),
        };
    }
    query
}
