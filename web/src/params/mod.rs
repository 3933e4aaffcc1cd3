//! This module holds typed parameters for various endpoint inputs.
//!
//! Each parameter type is represented by a struct or enum, which can be
//! serialized and deserialized as needed. This keeps endpoint inputs
//! validated (by type) and correctly formatted before they reach the
//! application logic.

pub(crate) mod callback;
pub(crate) mod recording;

use domain::recording::SortDirection;
use serde::Deserialize;
use utoipa::ToSchema;

/// Common sort order values used across all entities
#[derive(Debug, Deserialize, ToSchema, Clone, Copy)]
#[schema(example = "desc")]
pub enum SortOrder {
    #[serde(rename = "asc")]
    Asc,
    #[serde(rename = "desc")]
    Desc,
}

impl From<SortOrder> for SortDirection {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => SortDirection::Ascending,
            SortOrder::Desc => SortDirection::Descending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order_deserializes_lowercase_values() {
        let asc: SortOrder = serde_json::from_str("\"asc\"").unwrap();
        let desc: SortOrder = serde_json::from_str("\"desc\"").unwrap();
        assert!(matches!(asc, SortOrder::Asc));
        assert!(matches!(desc, SortOrder::Desc));
    }

    #[test]
    fn test_sort_order_converts_to_sort_direction() {
        assert_eq!(SortDirection::from(SortOrder::Asc), SortDirection::Ascending);
        assert_eq!(
            SortDirection::from(SortOrder::Desc),
            SortDirection::Descending
        );
    }
}
