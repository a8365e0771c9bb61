//! Checkout workflow across the payment providers.
//!
//! A purchase attempt moves from order creation through provider
//! verification to either enrollment or a failed audit record. Identifiers
//! on the return leg are resolved from the provider (or the pending M-PESA
//! record), never trusted from the client.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::enrollment_service::Enroller;
use crate::domain::ports::{
    CheckoutCommand, CheckoutCompleted, CheckoutMetrics, CheckoutOutcome, CheckoutStarted,
    CompleteCheckout, CourseRepository, MPESA_CANCELLED_RESULT_CODE, MpesaCallback,
    OrderRequest, OrderValidation, PaymentGateways, PaymentRecordRepository, PaymentStatusView,
    PurchaseLedger, StartCheckout, UserRepository,
};
use crate::domain::service_support::{
    course_url, find_published_course, find_user, map_course_error, map_gateway_error,
    map_record_error, map_user_error,
};
use crate::domain::{
    CompletionWrite, Course, CourseId, EnrollmentOutcome, Error, NewPaymentRecord,
    PaymentProvider, PaymentRecord, PaymentStatus, UserId,
};

/// Checkout service implementing [`CheckoutCommand`].
pub struct CheckoutService<C, U, L, R> {
    courses: Arc<C>,
    users: Arc<U>,
    records: Arc<R>,
    enroller: Enroller<C, U, L>,
    gateways: PaymentGateways,
    metrics: Arc<dyn CheckoutMetrics>,
    clock: Arc<dyn Clock>,
}

impl<C, U, L, R> CheckoutService<C, U, L, R> {
    pub fn new(
        courses: Arc<C>,
        users: Arc<U>,
        records: Arc<R>,
        enroller: Enroller<C, U, L>,
        gateways: PaymentGateways,
        metrics: Arc<dyn CheckoutMetrics>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            courses,
            users,
            records,
            enroller,
            gateways,
            metrics,
            clock,
        }
    }

    async fn observe(&self, provider: PaymentProvider, outcome: CheckoutOutcome) {
        if let Err(err) = self.metrics.record(provider, outcome).await {
            warn!(provider = provider.as_str(), error = %err, "checkout metric not recorded");
        }
    }

    fn return_urls(&self, provider: PaymentProvider, course_id: &CourseId) -> (String, String) {
        let base = self.enroller.public_base_url().trim_end_matches('/');
        let course_page = course_url(base, course_id);
        let cancel = format!("{course_page}?payment=cancelled");
        let success = match provider {
            PaymentProvider::PayPal => format!("{course_page}?payment=paypal"),
            PaymentProvider::Stripe => format!(
                "{base}/api/v1/checkout/stripe/success?session_id={{CHECKOUT_SESSION_ID}}&course_id={course_id}"
            ),
            PaymentProvider::Mpesa => format!("{base}/api/v1/checkout/mpesa/callback"),
        };
        (success, cancel)
    }
}

fn checked_price(course: &Course, requested: Option<Decimal>) -> Result<Decimal, Error> {
    let stored = course
        .price
        .filter(|price| !price.is_zero())
        .ok_or_else(|| Error::invalid_request("course is free; enroll directly"))?;
    match requested {
        Some(price) if price.normalize() != stored.normalize() => {
            Err(Error::invalid_request("price mismatch").with_details(json!({
                "field": "price",
                "code": "price_mismatch",
            })))
        }
        _ => Ok(stored),
    }
}

fn mpesa_preconditions(course: &Course, request: &StartCheckout) -> Result<(), Error> {
    if request.phone.is_none() {
        return Err(
            Error::invalid_request("phoneNumber is required for M-PESA").with_details(json!({
                "field": "phoneNumber",
                "code": "missing_field",
            })),
        );
    }
    if !course.currency.is_kes() {
        return Err(Error::invalid_request("M-PESA payments require KES pricing"));
    }
    Ok(())
}

impl<C, U, L, R> CheckoutService<C, U, L, R>
where
    C: CourseRepository,
    U: UserRepository,
    L: PurchaseLedger,
    R: PaymentRecordRepository,
{
    async fn sync_billing_customer(
        &self,
        provider: PaymentProvider,
        user_id: &UserId,
    ) -> Result<Option<String>, Error> {
        let user = find_user(self.users.as_ref(), user_id).await?;
        let customer = self
            .gateways
            .get(provider)
            .ensure_customer(&user)
            .await
            .map_err(|err| map_gateway_error(provider, err))?;
        let changed = customer
            .as_deref()
            .filter(|customer_id| user.billing_customer_id() != Some(*customer_id));
        if let Some(customer_id) = changed {
            self.users
                .set_billing_customer(user_id, customer_id)
                .await
                .map_err(map_user_error)?;
        }
        Ok(customer)
    }

    /// Write a non-completed audit record; failures are logged only.
    async fn record_unsuccessful(&self, record: NewPaymentRecord) {
        if let Err(err) = self
            .records
            .record_unsuccessful(&record, self.clock.utc())
            .await
        {
            warn!(
                provider = record.provider.as_str(),
                order_id = %record.reference,
                error = %err,
                "payment record not written"
            );
        }
    }

    async fn pending_record(
        &self,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<Option<PaymentRecord>, Error> {
        if provider != PaymentProvider::Mpesa {
            return Ok(None);
        }
        self.records
            .find_by_reference(provider, reference)
            .await
            .map_err(map_record_error)
    }

    async fn fail(
        &self,
        provider: PaymentProvider,
        record: NewPaymentRecord,
        error: Error,
    ) -> Result<CheckoutCompleted, Error> {
        self.record_unsuccessful(record).await;
        self.observe(provider, CheckoutOutcome::Failed).await;
        Err(error)
    }

    async fn validate(
        &self,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<OrderValidation, Error> {
        match self.gateways.get(provider).validate(reference).await {
            Ok(validation) => Ok(validation),
            Err(err) => {
                self.observe(provider, CheckoutOutcome::Failed).await;
                Err(map_gateway_error(provider, err))
            }
        }
    }

    async fn finish_enrollment(
        &self,
        provider: PaymentProvider,
        user_id: &UserId,
        course: &Course,
    ) -> Result<EnrollmentOutcome, Error> {
        let outcome = self.enroller.enroll(user_id, course).await?;
        let label = match outcome {
            EnrollmentOutcome::Enrolled => CheckoutOutcome::Enrolled,
            EnrollmentOutcome::AlreadyEnrolled => CheckoutOutcome::AlreadyEnrolled,
        };
        self.observe(provider, label).await;
        Ok(outcome)
    }

    async fn record_completed(&self, record: &NewPaymentRecord) {
        match self
            .records
            .record_completed(record, self.clock.utc())
            .await
        {
            Ok(CompletionWrite::Recorded) => {}
            Ok(CompletionWrite::AlreadyCompleted) => info!(
                provider = record.provider.as_str(),
                order_id = %record.reference,
                "payment already recorded as completed"
            ),
            Err(err) => warn!(
                provider = record.provider.as_str(),
                order_id = %record.reference,
                error = %err,
                "completed payment record not written"
            ),
        }
    }
}

#[async_trait]
impl<C, U, L, R> CheckoutCommand for CheckoutService<C, U, L, R>
where
    C: CourseRepository,
    U: UserRepository,
    L: PurchaseLedger,
    R: PaymentRecordRepository,
{
    async fn start_checkout(
        &self,
        user_id: &UserId,
        request: StartCheckout,
    ) -> Result<CheckoutStarted, Error> {
        let provider = request.provider;
        let course = find_published_course(self.courses.as_ref(), &request.course_id).await?;
        if self.enroller.is_enrolled(user_id, &course.id).await? {
            return Err(Error::already_purchased("course already purchased"));
        }
        let amount = checked_price(&course, request.price)?;
        if provider == PaymentProvider::Mpesa {
            mpesa_preconditions(&course, &request)?;
        }

        let customer_ref = self.sync_billing_customer(provider, user_id).await?;
        let (success_url, cancel_url) = self.return_urls(provider, &course.id);
        let order = OrderRequest {
            course_id: course.id,
            user_id: *user_id,
            title: course.title.clone(),
            amount,
            currency: course.currency.clone(),
            success_url,
            cancel_url,
            customer_ref,
            phone: request.phone,
        };

        let created = match self.gateways.get(provider).create_order(&order).await {
            Ok(created) => created,
            Err(err) => {
                self.observe(provider, CheckoutOutcome::Failed).await;
                return Err(map_gateway_error(provider, err));
            }
        };

        if provider == PaymentProvider::Mpesa {
            let pending = NewPaymentRecord {
                user_id: *user_id,
                course_id: course.id,
                provider,
                reference: created.order_id.clone(),
                amount,
                currency: course.currency.clone(),
                status: PaymentStatus::Pending,
                metadata: created.raw.clone(),
            };
            self.records
                .insert_pending(&pending, self.clock.utc())
                .await
                .map_err(map_record_error)?;
        }

        info!(
            provider = provider.as_str(),
            %user_id,
            course_id = %course.id,
            order_id = %created.order_id,
            "checkout order created"
        );
        self.observe(provider, CheckoutOutcome::OrderCreated).await;
        Ok(CheckoutStarted {
            provider,
            order_id: created.order_id,
            approval_url: created.approval_url,
        })
    }

    async fn complete_checkout(
        &self,
        user_id: &UserId,
        request: CompleteCheckout,
    ) -> Result<CheckoutCompleted, Error> {
        let provider = request.provider;
        let reference = request.reference.trim().to_owned();
        if reference.is_empty() {
            return Err(Error::invalid_request("orderId must not be empty"));
        }

        let validation = self.validate(provider, &reference).await?;
        let pending = self.pending_record(provider, &reference).await?;

        let course_id = validation
            .course_id
            .or_else(|| pending.as_ref().map(|record| record.course_id))
            .ok_or_else(|| Error::invalid_request("payment is not linked to a course"))?;
        if request.course_id.is_some_and(|claimed| claimed != course_id) {
            warn!(provider = provider.as_str(), order_id = %reference, "course id mismatch on return");
            return Err(Error::invalid_request("course does not match payment"));
        }
        let owner = validation
            .user_id
            .or_else(|| pending.as_ref().map(|record| record.user_id));
        if owner.is_some_and(|owner| owner != *user_id) {
            warn!(provider = provider.as_str(), order_id = %reference, %user_id, "payer mismatch on return");
            return Err(Error::forbidden("payment belongs to another user"));
        }

        let course = self
            .courses
            .find_course(&course_id)
            .await
            .map_err(map_course_error)?
            .ok_or_else(|| Error::not_found("course not found"))?;

        let mut record = NewPaymentRecord {
            user_id: *user_id,
            course_id,
            provider,
            reference: reference.clone(),
            amount: validation
                .amount
                .or(course.price)
                .unwrap_or(Decimal::ZERO),
            currency: validation
                .currency
                .clone()
                .unwrap_or_else(|| course.currency.clone()),
            status: PaymentStatus::Failed,
            metadata: json!({ "status": validation.status, "validation": validation.raw }),
        };

        if !validation.is_valid {
            warn!(provider = provider.as_str(), order_id = %reference, status = %validation.status, "payment not approved");
            return self
                .fail(provider, record, Error::invalid_request("payment was not approved"))
                .await;
        }

        if self.enroller.is_enrolled(user_id, &course.id).await? {
            self.observe(provider, CheckoutOutcome::AlreadyEnrolled).await;
            return Ok(CheckoutCompleted {
                course_id,
                outcome: EnrollmentOutcome::AlreadyEnrolled,
            });
        }

        if !validation.is_completed {
            let capture = match self.gateways.get(provider).capture(&reference).await {
                Ok(capture) => capture,
                Err(err) => {
                    let error = map_gateway_error(provider, err);
                    return self.fail(provider, record, error).await;
                }
            };
            if !capture.completed {
                warn!(provider = provider.as_str(), order_id = %reference, status = %capture.status, "capture incomplete");
                return self
                    .fail(provider, record, Error::invalid_request("payment was not completed"))
                    .await;
            }
            record.metadata = json!({
                "status": capture.status,
                "captureId": capture.reference,
                "capture": capture.raw,
            });
        }

        record.status = PaymentStatus::Completed;
        self.record_completed(&record).await;
        let outcome = self.finish_enrollment(provider, user_id, &course).await?;
        Ok(CheckoutCompleted { course_id, outcome })
    }

    async fn handle_mpesa_callback(&self, callback: MpesaCallback) -> Result<(), Error> {
        let provider = PaymentProvider::Mpesa;
        let Some(pending) = self
            .records
            .find_by_reference(provider, &callback.checkout_request_id)
            .await
            .map_err(map_record_error)?
        else {
            warn!(
                provider = provider.as_str(),
                order_id = %callback.checkout_request_id,
                "callback for unknown checkout request"
            );
            return Ok(());
        };

        let status = match callback.result_code {
            0 => PaymentStatus::Completed,
            MPESA_CANCELLED_RESULT_CODE => PaymentStatus::Cancelled,
            _ => PaymentStatus::Failed,
        };
        let record = NewPaymentRecord {
            user_id: pending.user_id,
            course_id: pending.course_id,
            provider,
            reference: pending.reference.clone(),
            amount: pending.amount,
            currency: pending.currency.clone(),
            status,
            metadata: json!({
                "merchantRequestId": callback.merchant_request_id,
                "resultCode": callback.result_code,
                "resultDesc": callback.result_desc,
                "callbackMetadata": callback.metadata,
            }),
        };

        match status {
            PaymentStatus::Completed => {
                let validation = self.validate(provider, &pending.reference).await?;
                let linked = validation.course_id.is_none_or(|id| id == pending.course_id)
                    && validation.user_id.is_none_or(|id| id == pending.user_id);
                if !(validation.is_valid && linked) {
                    warn!(
                        provider = provider.as_str(),
                        order_id = %pending.reference,
                        status = %validation.status,
                        "callback reported success but provider query did not confirm payment"
                    );
                    let mut unconfirmed = record;
                    unconfirmed.status = PaymentStatus::Failed;
                    unconfirmed.metadata = json!({
                        "callback": unconfirmed.metadata,
                        "status": validation.status,
                        "validation": validation.raw,
                    });
                    self.record_unsuccessful(unconfirmed).await;
                    self.observe(provider, CheckoutOutcome::Failed).await;
                    return Ok(());
                }
                let Some(course) = self
                    .courses
                    .find_course(&pending.course_id)
                    .await
                    .map_err(map_course_error)?
                else {
                    warn!(course_id = %pending.course_id, "paid course no longer exists");
                    return Ok(());
                };
                self.record_completed(&record).await;
                self.finish_enrollment(provider, &pending.user_id, &course)
                    .await?;
            }
            PaymentStatus::Cancelled => {
                info!(order_id = %pending.reference, "payer cancelled M-PESA prompt");
                self.record_unsuccessful(record).await;
                self.observe(provider, CheckoutOutcome::Cancelled).await;
            }
            _ => {
                warn!(order_id = %pending.reference, code = callback.result_code, "M-PESA payment failed");
                self.record_unsuccessful(record).await;
                self.observe(provider, CheckoutOutcome::Failed).await;
            }
        }
        Ok(())
    }

    async fn payment_status(
        &self,
        user_id: &UserId,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<PaymentStatusView, Error> {
        let record = self
            .records
            .find_by_reference(provider, reference)
            .await
            .map_err(map_record_error)?
            .filter(|record| record.user_id == *user_id)
            .ok_or_else(|| Error::not_found("payment not found"))?;
        let enrolled = self.enroller.is_enrolled(user_id, &record.course_id).await?;
        Ok(PaymentStatusView {
            provider,
            reference: record.reference,
            course_id: record.course_id,
            status: record.status,
            enrolled,
        })
    }
}

#[cfg(test)]
#[path = "checkout_service_tests.rs"]
mod tests;
