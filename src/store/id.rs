//! Record identifier generation.

use uuid::Uuid;

/// Generate a unique string identifier.
///
/// Suitable as both a record key and an opaque URL path segment. Callers may
/// rely on two calls within one process never returning equal values, with
/// no external synchronization.
pub fn generate() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_are_pairwise_distinct() {
        let ids: HashSet<String> = (0..1000).map(|_| generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_generated_id_shape() {
        let id = generate();
        assert!(!id.is_empty());
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() || c == '-'));
    }
}
