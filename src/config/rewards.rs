//! Coin bonus configuration.

use serde::Deserialize;

/// Unconditional credits applied on community joins.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RewardsConfig {
    /// Credited to the inviter when a join is attributed to their invite.
    pub invite_bonus: i64,
    /// Credited to a joining member who already has an account.
    pub welcome_bonus: i64,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            invite_bonus: 3,
            welcome_bonus: 2,
        }
    }
}

impl RewardsConfig {
    /// Bonuses are credits, so both must be at least one coin.
    pub fn validate(&self) -> Result<(), String> {
        for (name, amount) in [
            ("invite_bonus", self.invite_bonus),
            ("welcome_bonus", self.welcome_bonus),
        ] {
            if amount < 1 {
                return Err(format!("rewards.{name} must be positive, got {amount}"));
            }
        }
        Ok(())
    }
}
