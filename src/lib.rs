//! # Stream Ledger
//!
//! A payment-streaming ledger: senders lock funds that unlock continuously
//! to a recipient at a fixed per-second rate over a bounded window, with
//! pause/resume, recipient-initiated withdrawal, and operator-driven batch
//! distribution.
//!
//! ## Design Principles
//!
//! - **Fixed-point arithmetic**: 8 decimal places via `rust_decimal`
//! - **Single balance formula**: both release paths consult the same
//!   `claimable()` calculation, so no interleaving double-pays
//! - **Explicit time**: every operation takes its timestamp as a parameter
//! - **Strict invariants**: released funds never exceed what time and rate
//!   justify, and never exceed the stream's total
//!
//! ## Example
//!
//! ```
//! use std::str::FromStr;
//! use stream_ledger::{Amount, Principal, StreamLedger};
//!
//! let mut ledger = StreamLedger::new();
//! let alice = Principal::from("alice");
//! let bob = Principal::from("bob");
//!
//! let id = ledger
//!     .create_stream(
//!         &alice,
//!         bob.clone(),
//!         Amount::from_str("1000").unwrap(),
//!         Amount::from_str("10").unwrap(),
//!         100,
//!         1000,
//!     )
//!     .unwrap();
//!
//! assert_eq!(
//!     ledger.get_stream_balance(id, 1050),
//!     Amount::from_str("500").unwrap()
//! );
//! let paid = ledger.withdraw_from_stream(&bob, id, 1050).unwrap();
//! assert_eq!(paid, Amount::from_str("500").unwrap());
//! ```

pub mod amount;
pub mod config;
pub mod error;
pub mod ledger;
pub mod record;
pub mod stream;

pub use amount::Amount;
pub use config::{LedgerConfig, PushPolicy};
pub use error::{Result, StreamError};
pub use ledger::StreamLedger;
pub use record::{OpKind, OperationRecord, ParsedOp};
pub use stream::{PaymentStream, Principal, Seconds, Timestamp};
