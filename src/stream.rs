//! Payment stream model and time-based accounting.
//!
//! Maintains the invariant: `withdrawn_amount + accumulated_payments` never
//! exceeds `min(rate_per_second * effective_elapsed, total_amount)`.

use crate::amount::Amount;
use serde::Serialize;
use std::fmt;

/// Logical timestamp in seconds. Monotonic, externally driven.
pub type Timestamp = u64;

/// A span of logical time in seconds.
pub type Seconds = u64;

/// An opaque principal identifier (sender, recipient, or operator).
///
/// The empty string is the "zero" principal and is rejected wherever a real
/// party is required.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Principal(String);

impl Principal {
    /// Creates a principal from any string-like id.
    pub fn new(id: impl Into<String>) -> Self {
        Principal(id.into())
    }

    /// Returns `true` for the zero (empty) principal.
    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(id: &str) -> Self {
        Principal::new(id)
    }
}

/// A unidirectional, time-gated payment commitment.
///
/// # Invariants
///
/// - `released() <= total_amount` after every operation
/// - `withdrawn_amount` and `accumulated_payments` only ever grow
/// - Once `is_active == false` (cancelled or completed), no further funds
///   are released from this stream
///
/// # Two release paths
///
/// Funds leave a stream either by recipient-initiated withdrawal (pull) or
/// by automatic distribution (push). Both paths consult the same
/// `claimable()` calculation, so any interleaving of the two releases each
/// streamed unit exactly once.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentStream {
    /// Unique stream identifier, assigned monotonically starting at 1.
    pub id: u64,

    /// Principal funding the stream.
    pub sender: Principal,

    /// Principal receiving the streamed funds.
    pub recipient: Principal,

    /// Total value ever streamable. Fixed at creation.
    pub total_amount: Amount,

    /// Streaming rate. Fixed at creation.
    pub rate_per_second: Amount,

    /// When streaming began.
    pub start_time: Timestamp,

    /// When streaming ends: `start_time + duration`.
    pub end_time: Timestamp,

    /// Cumulative amount released via the pull path. Never decreases.
    pub withdrawn_amount: Amount,

    /// Cumulative amount released via the push path. Never decreases.
    pub accumulated_payments: Amount,

    /// Timestamp of the most recent successful automatic payment.
    /// Informational only; never consulted by the balance formula.
    pub last_payment_time: Timestamp,

    /// False once cancelled or fully released.
    pub is_active: bool,

    /// True between `pause` and the matching `resume`.
    pub is_paused: bool,

    /// Cumulative time spent paused; subtracted from elapsed time.
    pub total_paused_duration: Seconds,

    /// Set while paused; the instant accrual froze.
    pub pause_started_at: Option<Timestamp>,

    /// Consulted by the external yield engine; opaque to this ledger.
    pub yield_enabled: bool,
}

impl PaymentStream {
    /// Creates a new active stream starting at `now`.
    pub fn new(
        id: u64,
        sender: Principal,
        recipient: Principal,
        total_amount: Amount,
        rate_per_second: Amount,
        now: Timestamp,
        duration: Seconds,
    ) -> Self {
        PaymentStream {
            id,
            sender,
            recipient,
            total_amount,
            rate_per_second,
            start_time: now,
            end_time: now.saturating_add(duration),
            withdrawn_amount: Amount::ZERO,
            accumulated_payments: Amount::ZERO,
            last_payment_time: 0,
            is_active: true,
            is_paused: false,
            total_paused_duration: 0,
            pause_started_at: None,
            yield_enabled: false,
        }
    }

    /// Total amount released so far via either path.
    pub fn released(&self) -> Amount {
        self.withdrawn_amount + self.accumulated_payments
    }

    /// Effective elapsed streaming time at `now`.
    ///
    /// While paused, time is frozen at the pause instant. Elapsed time is
    /// clamped to the stream window and reduced by prior paused intervals;
    /// returns 0 before `start_time`.
    pub fn effective_elapsed(&self, now: Timestamp) -> Seconds {
        let effective_now = match self.pause_started_at {
            Some(paused_at) if self.is_paused => paused_at,
            _ => now,
        };
        let clamped = effective_now.min(self.end_time);
        clamped
            .saturating_sub(self.start_time)
            .saturating_sub(self.total_paused_duration)
    }

    /// Amount that time and rate justify having released by `now`,
    /// capped at `total_amount`.
    pub fn streamed(&self, now: Timestamp) -> Amount {
        let elapsed = self.effective_elapsed(now);
        match self.rate_per_second.checked_mul_secs(elapsed) {
            Some(earned) => earned.min(self.total_amount),
            // Overflow means the uncapped figure is far past the total.
            None => self.total_amount,
        }
    }

    /// Amount currently claimable via either release path.
    ///
    /// Zero for cancelled and completed streams: cancellation forfeits any
    /// unstreamed residue (returned to the sender by the escrow layer), and
    /// a completed stream has released everything already.
    pub fn claimable(&self, now: Timestamp) -> Amount {
        if !self.is_active {
            return Amount::ZERO;
        }
        self.streamed(now).saturating_sub(self.released())
    }

    /// Freezes accrual at `now`.
    ///
    /// Caller must have verified the stream is active and not paused.
    pub fn pause_at(&mut self, now: Timestamp) {
        self.is_paused = true;
        self.pause_started_at = Some(now);
    }

    /// Resumes accrual, folding the pause interval into
    /// `total_paused_duration`.
    ///
    /// Caller must have verified the stream is paused.
    pub fn resume_at(&mut self, now: Timestamp) {
        if let Some(paused_at) = self.pause_started_at.take() {
            self.total_paused_duration += now.saturating_sub(paused_at);
        }
        self.is_paused = false;
    }

    /// Terminates the stream. Terminal: claimable balance reads zero from
    /// here on, and no mutation path will touch this record again.
    pub fn cancel(&mut self) {
        self.is_active = false;
        self.is_paused = false;
        self.pause_started_at = None;
    }

    /// Records a pull-path release, completing the stream if fully drained.
    pub fn record_withdrawal(&mut self, amount: Amount) {
        self.withdrawn_amount += amount;
        self.complete_if_drained();
    }

    /// Records a push-path release at `now`, completing the stream if
    /// fully drained.
    pub fn record_push(&mut self, amount: Amount, now: Timestamp) {
        self.accumulated_payments += amount;
        self.last_payment_time = now;
        self.complete_if_drained();
    }

    /// Implicit completion: once everything is released the stream leaves
    /// the active state in the same call that drained it.
    fn complete_if_drained(&mut self) {
        if self.released() >= self.total_amount {
            self.is_active = false;
        }
    }

    /// Verifies the invariant: `released() <= total_amount`.
    #[cfg(debug_assertions)]
    pub fn check_invariant(&self) -> bool {
        self.released() <= self.total_amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn amt(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    fn stream_1000_at_10(start: Timestamp) -> PaymentStream {
        PaymentStream::new(
            1,
            Principal::from("alice"),
            Principal::from("bob"),
            amt("1000"),
            amt("10"),
            start,
            100,
        )
    }

    #[test]
    fn test_new_stream_starts_active_with_zero_accumulators() {
        let s = stream_1000_at_10(1000);
        assert_eq!(s.end_time, 1100);
        assert!(s.is_active);
        assert!(!s.is_paused);
        assert_eq!(s.withdrawn_amount, Amount::ZERO);
        assert_eq!(s.accumulated_payments, Amount::ZERO);
        assert_eq!(s.last_payment_time, 0);
        assert_eq!(s.total_paused_duration, 0);
    }

    #[test]
    fn test_end_time_saturates_on_extreme_duration() {
        let s = PaymentStream::new(
            1,
            Principal::from("alice"),
            Principal::from("bob"),
            amt("1000"),
            amt("10"),
            1000,
            u64::MAX,
        );
        assert_eq!(s.end_time, u64::MAX);
        assert_eq!(s.streamed(1050), amt("500"));
    }

    #[test]
    fn test_streamed_accrues_linearly() {
        let s = stream_1000_at_10(1000);
        assert_eq!(s.streamed(1000), Amount::ZERO);
        assert_eq!(s.streamed(1050), amt("500"));
        assert_eq!(s.streamed(1100), amt("1000"));
    }

    #[test]
    fn test_streamed_is_zero_before_start() {
        let s = stream_1000_at_10(1000);
        assert_eq!(s.streamed(999), Amount::ZERO);
        assert_eq!(s.streamed(0), Amount::ZERO);
    }

    #[test]
    fn test_streamed_capped_at_total_past_end() {
        let s = stream_1000_at_10(1000);
        assert_eq!(s.streamed(1100), amt("1000"));
        assert_eq!(s.streamed(5000), amt("1000"));
        assert_eq!(s.streamed(u64::MAX), amt("1000"));
    }

    #[test]
    fn test_claimable_subtracts_both_paths() {
        let mut s = stream_1000_at_10(1000);
        s.record_withdrawal(amt("100"));
        s.record_push(amt("150"), 1030);

        assert_eq!(s.claimable(1050), amt("250"));
        assert_eq!(s.last_payment_time, 1030);
    }

    #[test]
    fn test_pause_freezes_accrual() {
        let mut s = stream_1000_at_10(1000);
        s.pause_at(1020);

        assert_eq!(s.streamed(1020), amt("200"));
        assert_eq!(s.streamed(1050), amt("200"));
        assert_eq!(s.streamed(u64::MAX), amt("200"));
    }

    #[test]
    fn test_resume_excludes_paused_interval() {
        let mut s = stream_1000_at_10(1000);
        s.pause_at(1020);
        s.resume_at(1050);

        assert_eq!(s.total_paused_duration, 30);
        assert!(!s.is_paused);
        assert_eq!(s.streamed(1050), amt("200"));
        assert_eq!(s.streamed(1060), amt("300"));
    }

    #[test]
    fn test_repeated_pause_resume_accumulates_duration() {
        let mut s = stream_1000_at_10(1000);
        s.pause_at(1010);
        s.resume_at(1020);
        s.pause_at(1030);
        s.resume_at(1045);

        assert_eq!(s.total_paused_duration, 25);
        // 60 wall-clock seconds, 25 of them paused.
        assert_eq!(s.streamed(1060), amt("350"));
    }

    #[test]
    fn test_withdrawal_completes_stream_when_drained() {
        let mut s = stream_1000_at_10(1000);
        s.record_withdrawal(amt("1000"));

        assert!(!s.is_active);
        assert_eq!(s.claimable(2000), Amount::ZERO);
        assert!(s.check_invariant());
    }

    #[test]
    fn test_push_completes_stream_when_drained() {
        let mut s = stream_1000_at_10(1000);
        s.record_withdrawal(amt("400"));
        s.record_push(amt("600"), 1100);

        assert!(!s.is_active);
        assert_eq!(s.released(), amt("1000"));
        assert!(s.check_invariant());
    }

    #[test]
    fn test_cancel_zeroes_claimable() {
        let mut s = stream_1000_at_10(1000);
        assert_eq!(s.claimable(1050), amt("500"));

        s.cancel();
        assert!(!s.is_active);
        assert_eq!(s.claimable(1050), Amount::ZERO);
        assert_eq!(s.claimable(u64::MAX), Amount::ZERO);
    }

    #[test]
    fn test_zero_principal() {
        assert!(Principal::new("").is_zero());
        assert!(!Principal::from("alice").is_zero());
    }
}
