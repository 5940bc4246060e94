//! Price table and subscription period.

use mirrorplane_common::time::DAY_MS;
use mirrorplane_entitlement::PlanTier;

use crate::error::BillingError;

/// A completed payment resets the subscription to now plus this.
pub const SUBSCRIPTION_PERIOD_MS: i64 = 30 * DAY_MS;

/// Price of a tier in whole currency units. Free has no price.
pub fn price_of(tier: PlanTier) -> Option<i64> {
    match tier {
        PlanTier::Free => None,
        PlanTier::Starter => Some(50_000),
        PlanTier::Pro => Some(100_000),
        PlanTier::Elite => Some(200_000),
    }
}

/// Resolve a paid amount to a tier by exact match. A near miss never rounds
/// to the closest plan.
pub fn plan_for_amount(amount: i64) -> Result<PlanTier, BillingError> {
    for tier in [PlanTier::Starter, PlanTier::Pro, PlanTier::Elite] {
        if price_of(tier) == Some(amount) {
            return Ok(tier);
        }
    }
    Err(BillingError::UnknownAmount(amount.to_string()))
}
