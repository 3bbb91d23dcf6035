use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Storage counters of a user row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserStorage {
    pub id: Uuid,
    pub storage_quota_bytes: i64,
    pub storage_used_bytes: i64,
}

/// Result of a quota check for a candidate number of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StorageQuotaCheck {
    pub has_quota: bool,
    pub quota_bytes: i64,
    pub used_bytes: i64,
    pub remaining_bytes: i64,
}

impl StorageQuotaCheck {
    /// Evaluate `candidate_bytes` against the given counters.
    ///
    /// Remaining space never goes negative even if usage overshoots the quota.
    pub fn evaluate(quota_bytes: i64, used_bytes: i64, candidate_bytes: i64) -> Self {
        let remaining_bytes = quota_bytes.saturating_sub(used_bytes).max(0);
        StorageQuotaCheck {
            has_quota: remaining_bytes >= candidate_bytes,
            quota_bytes,
            used_bytes,
            remaining_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_boundary_exact_fit() {
        let check = StorageQuotaCheck::evaluate(10_000, 4_000, 6_000);
        assert!(check.has_quota);
        assert_eq!(check.remaining_bytes, 6_000);
    }

    #[test]
    fn test_quota_boundary_one_byte_over() {
        let check = StorageQuotaCheck::evaluate(10_000, 4_000, 6_001);
        assert!(!check.has_quota);
    }

    #[test]
    fn test_quota_overshoot_clamps_remaining() {
        let check = StorageQuotaCheck::evaluate(1_000, 1_500, 0);
        assert_eq!(check.remaining_bytes, 0);
        assert!(check.has_quota);
    }
}
