//! Port for the advisory payment record log.
//!
//! Records are keyed by `(provider, reference)`. A record in `completed`
//! never moves to another status, so resubmitted callbacks cannot produce a
//! second completed entry for the same provider reference.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{CompletionWrite, NewPaymentRecord, PaymentProvider, PaymentRecord};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by payment record adapters.
    pub enum PaymentRecordError {
        /// Repository connection could not be established.
        Connection { message: String } => "payment record connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "payment record query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentRecordRepository: Send + Sync {
    /// Write a `pending` record, leaving any existing record untouched.
    async fn insert_pending(
        &self,
        record: &NewPaymentRecord,
        at: DateTime<Utc>,
    ) -> Result<(), PaymentRecordError>;

    /// Fetch the record for a provider reference.
    async fn find_by_reference(
        &self,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<Option<PaymentRecord>, PaymentRecordError>;

    /// Insert or transition the record into `completed`.
    async fn record_completed(
        &self,
        record: &NewPaymentRecord,
        at: DateTime<Utc>,
    ) -> Result<CompletionWrite, PaymentRecordError>;

    /// Insert or transition the record into `record.status` unless it is
    /// already `completed`.
    async fn record_unsuccessful(
        &self,
        record: &NewPaymentRecord,
        at: DateTime<Utc>,
    ) -> Result<(), PaymentRecordError>;
}
