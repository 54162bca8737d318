//! Seed condition constants and lookup helpers
//!
//! The scheduler reads conditions; it never writes them. A Seed is ready
//! for scheduling when Bootstrapped and GardenletReady are True, plus
//! BackupBucketsReady when a backup bucket is configured.

use crate::crd::SeedCondition;

// Condition status values
pub const CONDITION_TRUE: &str = "True";
pub const CONDITION_FALSE: &str = "False";
pub const CONDITION_UNKNOWN: &str = "Unknown";

// Seed condition types
pub const SEED_BOOTSTRAPPED: &str = "Bootstrapped";
pub const SEED_GARDENLET_READY: &str = "GardenletReady";
pub const SEED_BACKUP_BUCKETS_READY: &str = "BackupBucketsReady";

/// Looks up a condition by type.
pub fn get_condition<'a>(
    conditions: &'a [SeedCondition],
    condition_type: &str,
) -> Option<&'a SeedCondition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Returns true if the condition is present with status True.
pub fn is_condition_true(conditions: &[SeedCondition], condition_type: &str) -> bool {
    get_condition(conditions, condition_type).is_some_and(|c| c.status == CONDITION_TRUE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(condition_type: &str, status: &str) -> SeedCondition {
        SeedCondition {
            r#type: condition_type.to_string(),
            status: status.to_string(),
            last_transition_time: None,
            reason: None,
            message: None,
        }
    }

    #[test]
    fn test_get_condition() {
        let conditions = vec![
            condition(SEED_BOOTSTRAPPED, CONDITION_TRUE),
            condition(SEED_GARDENLET_READY, CONDITION_FALSE),
        ];
        assert!(get_condition(&conditions, SEED_BOOTSTRAPPED).is_some());
        assert!(get_condition(&conditions, SEED_BACKUP_BUCKETS_READY).is_none());
    }

    #[test]
    fn test_is_condition_true() {
        let conditions = vec![
            condition(SEED_BOOTSTRAPPED, CONDITION_TRUE),
            condition(SEED_GARDENLET_READY, CONDITION_FALSE),
            condition(SEED_BACKUP_BUCKETS_READY, CONDITION_UNKNOWN),
        ];
        assert!(is_condition_true(&conditions, SEED_BOOTSTRAPPED));
        assert!(!is_condition_true(&conditions, SEED_GARDENLET_READY));
        assert!(!is_condition_true(&conditions, SEED_BACKUP_BUCKETS_READY));
        assert!(!is_condition_true(&conditions, "Missing"));
    }
}
