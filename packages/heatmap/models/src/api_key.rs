//! API key usage shown on the developer dashboard.
//!
//! The backend does not expose key management yet, so the dashboard
//! renders [`ApiKeyUsage::mock`].

use serde::{Deserialize, Serialize};

/// Usage percentage at which the dashboard suggests upgrading.
pub const NEAR_LIMIT_PERCENT: f64 = 80.0;

/// A key and its request quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyUsage {
    /// The API key.
    pub api_key: String,
    /// Requests used in the current period.
    pub current: u32,
    /// Requests allowed in the current period.
    pub limit: u32,
}

impl ApiKeyUsage {
    /// Placeholder key and usage served until key management exists.
    #[must_use]
    pub fn mock() -> Self {
        Self {
            api_key: "mock_api_key_live_123abc456def789ghi".to_string(),
            current: 22,
            limit: 50,
        }
    }

    /// Percentage of the quota used. A zero limit reports 0%.
    #[must_use]
    pub fn progress_percentage(&self) -> f64 {
        if self.limit == 0 {
            return 0.0;
        }
        f64::from(self.current) / f64::from(self.limit) * 100.0
    }

    /// Whether usage has reached [`NEAR_LIMIT_PERCENT`].
    #[must_use]
    pub fn is_near_limit(&self) -> bool {
        self.progress_percentage() >= NEAR_LIMIT_PERCENT
    }

    /// Requests left before the quota is exhausted.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.current)
    }
}
