//! Request/response correlation for the Parley relay.
//!
//! A caller hands work to an out-of-band worker together with an opaque
//! [`RequestId`](parley_types::RequestId). The worker later writes its result,
//! keyed by that identifier, into the correlation store. The caller learns the
//! result by polling the store until a value appears or a deadline passes.
//!
//! This crate holds the three pieces of that mechanism that do not depend on
//! any transport:
//!
//! | Module | Role |
//! |--------|------|
//! | `store` | Point reads and upserts against the `results` table |
//! | `normalize` | Extracts flat answer text from whatever shape the worker wrote |
//! | `poll` | Deadline-bounded, cancellable poll loop over a [`ResultSource`] |
//!
//! # Usage
//!
//! ```rust,ignore
//! use parley_correlation::{normalize, put_result, Poller};
//!
//! let text = normalize(&payload).ok_or(BadRequest)?;
//! put_result(&conn, &request_id, &text)?;
//!
//! let poller = Poller::new(source, Duration::from_millis(500));
//! match poller.poll(&request_id, Instant::now() + Duration::from_secs(20)).await {
//!     PollOutcome::Ready { value, .. } => speak(value),
//!     _ => apologize(),
//! }
//! ```

mod error;
mod normalize;
mod poll;
mod store;

pub use error::{ReadError, StoreError};
pub use normalize::{normalize, NormalizeRule, Normalizer, PayloadShape};
pub use poll::{PollOutcome, Poller, ResultSource};
pub use store::{get_result, prune_results_before, put_result, put_result_at};
