pub mod search_service;
pub mod stats_service;
pub mod ticket_service;
pub mod user_service;

/// Deserialize helper that distinguishes an absent field from an explicit
/// JSON null: absent stays `None`, null becomes `Some(None)`.
pub(crate) fn explicit<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}
