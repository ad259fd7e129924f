//! Core stream ledger: lifecycle transitions, withdrawals, and automatic
//! distribution.
//!
//! The ledger owns every stream record and the per-user indices; no other
//! component writes stream state. Each operation reads its timestamp once
//! from the caller and completes atomically before the next begins, so
//! correctness only has to hold under arbitrary call ordering, not
//! parallel races.

use crate::amount::Amount;
use crate::config::{LedgerConfig, PushPolicy};
use crate::error::{Result, StreamError};
use crate::record::{OpKind, OperationRecord, ParsedOp};
use crate::stream::{PaymentStream, Principal, Seconds, Timestamp};
use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use std::collections::HashMap;
use std::io::{Read, Write};

/// The payment-streaming ledger.
///
/// Maintains stream records keyed by id and append-only per-user indices
/// for enumeration. Terminal (cancelled or completed) streams are never
/// deleted and remain queryable.
///
/// # Release discipline
///
/// The pull path (`withdraw_from_stream`) and the push path
/// (`process_automatic_payment`) both consult `PaymentStream::claimable`,
/// never an independent running total, so any interleaving of the two
/// converges to the same total released amount for a given elapsed time.
pub struct StreamLedger {
    /// Policy knobs (flow-mismatch bound, push authorization).
    config: LedgerConfig,

    /// Stream records indexed by stream ID.
    streams: HashMap<u64, PaymentStream>,

    /// Next stream ID to assign; IDs start at 1.
    next_id: u64,

    /// Stream IDs by sending principal. Enumeration only, not authoritative.
    by_sender: HashMap<Principal, Vec<u64>>,

    /// Stream IDs by receiving principal. Enumeration only, not authoritative.
    by_recipient: HashMap<Principal, Vec<u64>>,
}

impl StreamLedger {
    /// Creates an empty ledger with default policy.
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    /// Creates an empty ledger with explicit policy.
    pub fn with_config(config: LedgerConfig) -> Self {
        StreamLedger {
            config,
            streams: HashMap::new(),
            next_id: 1,
            by_sender: HashMap::new(),
            by_recipient: HashMap::new(),
        }
    }

    /// Opens a new stream from `sender` to `recipient`, locking `amount`
    /// to unlock at `rate` per second over `duration` seconds from `now`.
    ///
    /// Validates all parameters before allocating an id; fund custody is
    /// delegated to the escrow collaborator and not modeled here.
    pub fn create_stream(
        &mut self,
        sender: &Principal,
        recipient: Principal,
        amount: Amount,
        rate: Amount,
        duration: Seconds,
        now: Timestamp,
    ) -> Result<u64> {
        if sender.is_zero() {
            return Err(StreamError::InvalidAddress);
        }
        self.config
            .validate_creation(&recipient, amount, rate, duration)?;
        // end_time = now + duration must be representable.
        if now.checked_add(duration).is_none() {
            return Err(StreamError::InvalidDuration);
        }

        let id = self.next_id;
        self.next_id += 1;

        let stream = PaymentStream::new(
            id,
            sender.clone(),
            recipient.clone(),
            amount,
            rate,
            now,
            duration,
        );

        self.by_sender.entry(sender.clone()).or_default().push(id);
        self.by_recipient.entry(recipient).or_default().push(id);
        self.streams.insert(id, stream);

        debug!("Created stream {} from {} ({} at {}/s)", id, sender, amount, rate);
        Ok(id)
    }

    /// Returns the stream record, or `StreamNotFound`.
    pub fn get_stream(&self, id: u64) -> Result<&PaymentStream> {
        self.streams.get(&id).ok_or(StreamError::StreamNotFound(id))
    }

    /// Claimable balance of a stream at `now`. Unknown ids read as zero.
    pub fn get_stream_balance(&self, id: u64, now: Timestamp) -> Amount {
        self.streams
            .get(&id)
            .map(|s| s.claimable(now))
            .unwrap_or(Amount::ZERO)
    }

    /// Whether the stream exists and is active.
    pub fn is_stream_active(&self, id: u64) -> bool {
        self.streams.get(&id).map(|s| s.is_active).unwrap_or(false)
    }

    /// Whether the stream exists and is paused.
    pub fn is_stream_paused(&self, id: u64) -> bool {
        self.streams.get(&id).map(|s| s.is_paused).unwrap_or(false)
    }

    /// Number of streams ever created.
    pub fn get_stream_count(&self) -> u64 {
        self.streams.len() as u64
    }

    /// All stream ids where `addr` is sender or recipient, ascending,
    /// deduplicated (a self-stream appears once).
    pub fn get_user_streams(&self, addr: &Principal) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .by_sender
            .get(addr)
            .into_iter()
            .chain(self.by_recipient.get(addr))
            .flatten()
            .copied()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Cumulative push-path releases for a stream. Unknown ids read as zero.
    pub fn get_accumulated_payments(&self, id: u64) -> Amount {
        self.streams
            .get(&id)
            .map(|s| s.accumulated_payments)
            .unwrap_or(Amount::ZERO)
    }

    /// Timestamp of the last successful automatic payment; 0 if none.
    pub fn get_last_payment_time(&self, id: u64) -> Timestamp {
        self.streams
            .get(&id)
            .map(|s| s.last_payment_time)
            .unwrap_or(0)
    }

    /// Freezes accrual on a stream. Sender or recipient only.
    pub fn pause_stream(&mut self, caller: &Principal, id: u64, now: Timestamp) -> Result<()> {
        let stream = self
            .streams
            .get_mut(&id)
            .ok_or(StreamError::StreamNotFound(id))?;

        if *caller != stream.sender && *caller != stream.recipient {
            return Err(StreamError::UnauthorizedAccess {
                caller: caller.to_string(),
                action: "pause",
                id,
            });
        }
        if !stream.is_active {
            return Err(StreamError::StreamNotActive(id));
        }
        if stream.is_paused {
            return Err(StreamError::StreamAlreadyPaused(id));
        }

        stream.pause_at(now);
        debug!("Paused stream {} at {}", id, now);
        Ok(())
    }

    /// Resumes accrual on a paused stream. Sender or recipient only.
    pub fn resume_stream(&mut self, caller: &Principal, id: u64, now: Timestamp) -> Result<()> {
        let stream = self
            .streams
            .get_mut(&id)
            .ok_or(StreamError::StreamNotFound(id))?;

        if *caller != stream.sender && *caller != stream.recipient {
            return Err(StreamError::UnauthorizedAccess {
                caller: caller.to_string(),
                action: "resume",
                id,
            });
        }
        if !stream.is_paused {
            return Err(StreamError::StreamNotPaused(id));
        }

        stream.resume_at(now);
        debug!(
            "Resumed stream {} at {} (paused {}s total)",
            id, now, stream.total_paused_duration
        );
        Ok(())
    }

    /// Terminates a stream. Sender only; paused streams may be cancelled.
    ///
    /// Terminal: the claimable balance reads zero afterwards, and any
    /// unstreamed residue is returned to the sender by the escrow layer.
    pub fn cancel_stream(&mut self, caller: &Principal, id: u64) -> Result<()> {
        let stream = self
            .streams
            .get_mut(&id)
            .ok_or(StreamError::StreamNotFound(id))?;

        if *caller != stream.sender {
            return Err(StreamError::UnauthorizedAccess {
                caller: caller.to_string(),
                action: "cancel",
                id,
            });
        }
        if !stream.is_active {
            return Err(StreamError::StreamNotActive(id));
        }

        stream.cancel();
        debug!("Cancelled stream {}", id);
        Ok(())
    }

    /// Pull path: releases the full claimable balance to the recipient.
    ///
    /// Fails `NoFundsAvailable` when nothing is claimable, so a repeat
    /// call at the same timestamp is a failing no-op rather than a second
    /// transfer.
    pub fn withdraw_from_stream(
        &mut self,
        caller: &Principal,
        id: u64,
        now: Timestamp,
    ) -> Result<Amount> {
        let stream = self
            .streams
            .get_mut(&id)
            .ok_or(StreamError::StreamNotFound(id))?;

        if *caller != stream.recipient {
            return Err(StreamError::UnauthorizedAccess {
                caller: caller.to_string(),
                action: "withdraw from",
                id,
            });
        }
        if !stream.is_active {
            return Err(StreamError::StreamNotActive(id));
        }

        let amount = stream.claimable(now);
        if amount.is_zero() {
            return Err(StreamError::NoFundsAvailable(id));
        }

        stream.record_withdrawal(amount);
        debug!("Withdrew {} from stream {} at {}", amount, id, now);
        Ok(amount)
    }

    /// Push path: distributes the full claimable balance to the recipient.
    ///
    /// Unlike withdrawal, a zero claimable balance returns `Ok(0)` without
    /// mutation, so operators can poll this safely. A paused stream fails
    /// with `StreamPaused` rather than silently contributing zero.
    pub fn process_automatic_payment(
        &mut self,
        caller: &Principal,
        id: u64,
        now: Timestamp,
    ) -> Result<Amount> {
        let stream = self
            .streams
            .get_mut(&id)
            .ok_or(StreamError::StreamNotFound(id))?;

        if self.config.push_policy == PushPolicy::SenderOnly && *caller != stream.sender {
            return Err(StreamError::UnauthorizedAccess {
                caller: caller.to_string(),
                action: "process payments for",
                id,
            });
        }
        if !stream.is_active {
            return Err(StreamError::StreamNotActive(id));
        }
        if stream.is_paused {
            return Err(StreamError::StreamPaused(id));
        }

        let amount = stream.claimable(now);
        if amount.is_zero() {
            return Ok(Amount::ZERO);
        }

        stream.record_push(amount, now);
        debug!("Pushed {} on stream {} at {}", amount, id, now);
        Ok(amount)
    }

    /// Batched push path with per-item failure isolation.
    ///
    /// Each id is evaluated and committed independently: a nonexistent,
    /// cancelled, or paused stream contributes zero and is skipped with no
    /// side effects on its record, never aborting payment to the healthy
    /// streams in the same batch. An empty input yields zero.
    pub fn batch_process_payments(
        &mut self,
        caller: &Principal,
        ids: &[u64],
        now: Timestamp,
    ) -> Amount {
        let mut total = Amount::ZERO;

        for &id in ids {
            match self.process_automatic_payment(caller, id, now) {
                Ok(amount) => total += amount,
                Err(e) => {
                    warn!("Batch: skipping stream {}: {}", id, e);
                }
            }
        }

        total
    }

    /// Replays operations from a CSV reader in streaming fashion.
    ///
    /// Records are read one at a time. Malformed rows and failed
    /// operations are logged at warn level and skipped.
    pub fn replay_csv<R: Read>(&mut self, reader: R) -> Result<()> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        for (row_idx, result) in csv_reader.deserialize::<OperationRecord>().enumerate() {
            let row_num = row_idx + 2; // 1-indexed, accounting for header row

            match result {
                Ok(record) => {
                    if let Some(op) = record.parse() {
                        if let Err(e) = self.apply(op) {
                            warn!("Row {}: {}", row_num, e);
                        }
                    } else {
                        warn!("Row {}: Failed to parse operation record", row_num);
                    }
                }
                Err(e) => {
                    warn!("Row {}: CSV parse error: {}", row_num, e);
                }
            }
        }

        Ok(())
    }

    /// Applies a single parsed operation.
    fn apply(&mut self, op: ParsedOp) -> Result<()> {
        let ParsedOp { caller, at, kind } = op;

        match kind {
            OpKind::Create {
                recipient,
                amount,
                rate,
                duration,
            } => {
                self.create_stream(&caller, recipient, amount, rate, duration, at)?;
            }
            OpKind::Pause(id) => self.pause_stream(&caller, id, at)?,
            OpKind::Resume(id) => self.resume_stream(&caller, id, at)?,
            OpKind::Cancel(id) => self.cancel_stream(&caller, id)?,
            OpKind::Withdraw(id) => {
                self.withdraw_from_stream(&caller, id, at)?;
            }
            OpKind::Push(id) => {
                self.process_automatic_payment(&caller, id, at)?;
            }
        }

        Ok(())
    }

    /// Writes final stream states to CSV.
    ///
    /// Output is sorted by stream ID in ascending order for deterministic
    /// results. Monetary values carry exactly 8 decimal places.
    pub fn write_output<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "stream",
            "sender",
            "recipient",
            "total",
            "rate",
            "withdrawn",
            "pushed",
            "active",
            "paused",
        ])?;

        // Sort by stream ID for deterministic output
        let mut streams: Vec<_> = self.streams.values().collect();
        streams.sort_by_key(|s| s.id);

        for stream in streams {
            csv_writer.write_record([
                stream.id.to_string(),
                stream.sender.to_string(),
                stream.recipient.to_string(),
                stream.total_amount.to_string(),
                stream.rate_per_second.to_string(),
                stream.withdrawn_amount.to_string(),
                stream.accumulated_payments.to_string(),
                stream.is_active.to_string(),
                stream.is_paused.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

impl Default for StreamLedger {
    fn default() -> Self {
        Self::new()
    }
}
