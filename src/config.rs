//! Ledger configuration and stream-creation validation.

use crate::amount::Amount;
use crate::error::{Result, StreamError};
use crate::stream::{Principal, Seconds};

/// Who may trigger the push path (`process_automatic_payment`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PushPolicy {
    /// Any caller may trigger evaluation; stream state is the authoritative
    /// constraint.
    #[default]
    AnyCaller,

    /// Only the stream's sender (acting as operator) may trigger it.
    SenderOnly,
}

/// Policy knobs for the ledger, injected at construction.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Creation is rejected when `rate * duration` exceeds
    /// `max_flow_ratio * amount`. Modest overshoot is fine since payouts
    /// are capped at the stream's total regardless.
    pub max_flow_ratio: u32,

    /// Authorization policy for the push path.
    pub push_policy: PushPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            max_flow_ratio: 2,
            push_policy: PushPolicy::default(),
        }
    }
}

impl LedgerConfig {
    /// Validates stream-creation parameters before any state mutation.
    ///
    /// Checks run in a fixed order so that a request with several problems
    /// reports the same error every time.
    pub fn validate_creation(
        &self,
        recipient: &Principal,
        amount: Amount,
        rate: Amount,
        duration: Seconds,
    ) -> Result<()> {
        if recipient.is_zero() {
            return Err(StreamError::InvalidAddress);
        }
        if amount.is_zero() {
            return Err(StreamError::ZeroAmount);
        }
        if rate.is_zero() {
            return Err(StreamError::InvalidRate);
        }
        if duration == 0 {
            return Err(StreamError::InvalidDuration);
        }

        let nominal_flow = rate.checked_mul_secs(duration);
        let bound = amount.checked_mul_secs(u64::from(self.max_flow_ratio));
        let plausible = match (nominal_flow, bound) {
            (Some(flow), Some(bound)) => flow <= bound,
            // Overflow on either side means the combination is far outside
            // any plausible configuration.
            _ => false,
        };
        if !plausible {
            return Err(StreamError::InvalidParameters {
                ratio: self.max_flow_ratio,
            });
        }

        Ok(())
    }
}
