//! Checkout handlers for PayPal, Stripe and M-PESA.
//!
//! ```text
//! POST /api/v1/checkout/{provider} {"courseId":"...","phoneNumber":"0712345678"}
//! POST /api/v1/checkout/paypal/capture {"orderId":"..."}
//! GET  /api/v1/checkout/stripe/success?session_id=cs_...&course_id=...
//! POST /api/v1/checkout/mpesa/callback
//! GET  /api/v1/checkout/{provider}/status/{reference}
//! ```

use actix_web::http::header::LOCATION;
use actix_web::{HttpResponse, get, post, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{CompleteCheckout, MpesaCallback, PaymentStatusView, StartCheckout};
use crate::domain::{CourseId, Error, PaymentProvider, PaymentStatus, PhoneNumber};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_value_error, missing_field_error, parse_id, parse_optional_id,
    require_text,
};

const COURSE_ID: FieldName = FieldName::new("courseId");
const PROVIDER: FieldName = FieldName::new("provider");

fn parse_provider(raw: &str) -> Result<PaymentProvider, Error> {
    raw.parse()
        .map_err(|err| invalid_value_error(PROVIDER, err))
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartCheckoutRequest {
    pub course_id: String,
    /// Price shown to the buyer; rejected when it differs from the stored price.
    #[schema(value_type = Option<String>, example = "29.99")]
    pub price: Option<Decimal>,
    /// Required for M-PESA: `07XXXXXXXX`, `01XXXXXXXX` or `254...`.
    pub phone_number: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutStartedResponse {
    pub order_id: String,
    /// Where to send the payer; absent for M-PESA, which prompts the handset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_url: Option<String>,
    pub provider: PaymentProvider,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRequest {
    pub order_id: String,
    pub course_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResponse {
    /// `enrolled` or `already_enrolled`.
    #[schema(example = "enrolled")]
    pub status: String,
    pub course_id: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StripeReturnQuery {
    pub session_id: Option<String>,
    pub course_id: Option<String>,
}

/// Acknowledgement Daraja expects for every callback.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct MpesaAck {
    pub result_code: i64,
    pub result_desc: String,
}

impl MpesaAck {
    fn accepted() -> Self {
        Self {
            result_code: 0,
            result_desc: "Accepted".to_owned(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    pub provider: PaymentProvider,
    pub reference: String,
    pub course_id: String,
    pub status: PaymentStatus,
    pub enrolled: bool,
}

impl From<PaymentStatusView> for PaymentStatusResponse {
    fn from(view: PaymentStatusView) -> Self {
        Self {
            provider: view.provider,
            reference: view.reference,
            course_id: view.course_id.to_string(),
            status: view.status,
            enrolled: view.enrolled,
        }
    }
}

/// Open a provider checkout for a course.
///
/// Owned courses are refused with `already_purchased` before any provider
/// call is made.
#[utoipa::path(
    post,
    path = "/api/v1/checkout/{provider}",
    params(("provider" = PaymentProvider, Path, description = "paypal, stripe or mpesa")),
    request_body = StartCheckoutRequest,
    responses(
        (status = 200, description = "Order opened", body = CheckoutStartedResponse),
        (status = 400, description = "Invalid request or already purchased", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Course not found", body = Error),
        (status = 500, description = "Payment processing failed", body = Error)
    ),
    tags = ["checkout"],
    operation_id = "startCheckout",
    security(("SessionCookie" = []))
)]
#[post("/checkout/{provider}")]
pub async fn start_checkout(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<StartCheckoutRequest>,
) -> ApiResult<web::Json<CheckoutStartedResponse>> {
    let user_id = session.require_user_id()?;
    let provider = parse_provider(&path)?;
    let StartCheckoutRequest {
        course_id,
        price,
        phone_number,
    } = payload.into_inner();
    let course_id: CourseId = parse_id(&course_id, COURSE_ID)?;
    let phone = phone_number
        .as_deref()
        .map(PhoneNumber::normalize)
        .transpose()
        .map_err(|err| invalid_value_error(FieldName::new("phoneNumber"), err))?;
    if provider == PaymentProvider::Mpesa && phone.is_none() {
        return Err(missing_field_error(FieldName::new("phoneNumber")));
    }
    let started = state
        .checkout
        .start_checkout(
            &user_id,
            StartCheckout {
                provider,
                course_id,
                price,
                phone,
            },
        )
        .await?;
    Ok(web::Json(CheckoutStartedResponse {
        order_id: started.order_id,
        approval_url: started.approval_url,
        provider: started.provider,
    }))
}

/// Capture an approved PayPal order and enroll the payer.
///
/// Resubmitting a captured order succeeds with `already_enrolled`.
#[utoipa::path(
    post,
    path = "/api/v1/checkout/paypal/capture",
    request_body = CaptureRequest,
    responses(
        (status = 200, description = "Captured", body = CaptureResponse),
        (status = 400, description = "Payment declined or invalid", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Order belongs to another user", body = Error),
        (status = 500, description = "Payment processing failed", body = Error)
    ),
    tags = ["checkout"],
    operation_id = "capturePaypalOrder",
    security(("SessionCookie" = []))
)]
#[post("/checkout/paypal/capture")]
pub async fn capture_paypal(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CaptureRequest>,
) -> ApiResult<web::Json<CaptureResponse>> {
    let user_id = session.require_user_id()?;
    let CaptureRequest {
        order_id,
        course_id,
    } = payload.into_inner();
    let reference = require_text(Some(order_id), FieldName::new("orderId"))?;
    let course_id = parse_optional_id(course_id.as_deref(), COURSE_ID)?;
    let completed = state
        .checkout
        .complete_checkout(
            &user_id,
            CompleteCheckout {
                provider: PaymentProvider::PayPal,
                reference,
                course_id,
            },
        )
        .await?;
    Ok(web::Json(CaptureResponse {
        status: completed.outcome.as_str().to_owned(),
        course_id: completed.course_id.to_string(),
    }))
}

fn see_other(location: String) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, location))
        .finish()
}

/// Browser return leg from Stripe Checkout.
///
/// Always redirects: to the course page on success, or to the failure page
/// when the session is missing, unpaid or belongs to someone else.
#[utoipa::path(
    get,
    path = "/api/v1/checkout/stripe/success",
    params(StripeReturnQuery),
    responses(
        (status = 303, description = "Redirect to the course page", headers(("Location" = String, description = "Course or failure page")))
    ),
    tags = ["checkout"],
    operation_id = "stripeSuccess",
    security(("SessionCookie" = []))
)]
#[get("/checkout/stripe/success")]
pub async fn stripe_success(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<StripeReturnQuery>,
) -> HttpResponse {
    let StripeReturnQuery {
        session_id,
        course_id,
    } = query.into_inner();
    let hinted: Option<CourseId> = course_id
        .as_deref()
        .and_then(|raw| CourseId::parse(raw.trim()).ok());
    let failure_page = match hinted {
        Some(id) => format!("{}?payment=failed", state.course_page(&id)),
        None => format!("{}/?payment=failed", state.settings.public_base_url),
    };

    let result = async {
        let user_id = session.require_user_id()?;
        let reference = require_text(session_id, FieldName::new("session_id"))?;
        state
            .checkout
            .complete_checkout(
                &user_id,
                CompleteCheckout {
                    provider: PaymentProvider::Stripe,
                    reference,
                    course_id: hinted,
                },
            )
            .await
    }
    .await;

    match result {
        Ok(completed) => see_other(format!(
            "{}?payment=success",
            state.course_page(&completed.course_id)
        )),
        Err(error) => {
            warn!(
                provider = PaymentProvider::Stripe.as_str(),
                code = ?error.code(),
                message = error.message(),
                "stripe return leg failed"
            );
            see_other(failure_page)
        }
    }
}

/// Extract the STK callback from Daraja's `Body.stkCallback` envelope.
fn parse_mpesa_callback(body: &Value) -> Option<MpesaCallback> {
    let callback = body.get("Body")?.get("stkCallback")?;
    let text = |key: &str| callback.get(key).and_then(Value::as_str).map(str::to_owned);
    let result_code = match callback.get("ResultCode")? {
        Value::Number(number) => number.as_i64()?,
        Value::String(raw) => raw.trim().parse().ok()?,
        _ => return None,
    };
    Some(MpesaCallback {
        merchant_request_id: text("MerchantRequestID").unwrap_or_default(),
        checkout_request_id: text("CheckoutRequestID")?,
        result_code,
        result_desc: text("ResultDesc").unwrap_or_default(),
        metadata: callback
            .get("CallbackMetadata")
            .cloned()
            .unwrap_or(Value::Null),
    })
}

/// Daraja STK push result.
///
/// Always acknowledged so Safaricom does not retry; failures are logged.
#[utoipa::path(
    post,
    path = "/api/v1/checkout/mpesa/callback",
    request_body = Object,
    responses((status = 200, description = "Callback acknowledged", body = MpesaAck)),
    tags = ["checkout"],
    operation_id = "mpesaCallback",
    security([])
)]
#[post("/checkout/mpesa/callback")]
pub async fn mpesa_callback(
    state: web::Data<HttpState>,
    payload: web::Json<Value>,
) -> web::Json<MpesaAck> {
    match parse_mpesa_callback(&payload) {
        Some(callback) => {
            let order_id = callback.checkout_request_id.clone();
            if let Err(error) = state.checkout.handle_mpesa_callback(callback).await {
                warn!(
                    provider = PaymentProvider::Mpesa.as_str(),
                    order_id = %order_id,
                    code = ?error.code(),
                    message = error.message(),
                    "failed to apply M-PESA callback"
                );
            }
        }
        None => warn!(
            provider = PaymentProvider::Mpesa.as_str(),
            "ignoring malformed M-PESA callback"
        ),
    }
    web::Json(MpesaAck::accepted())
}

/// Payment state for a reference the caller started, for client polling.
#[utoipa::path(
    get,
    path = "/api/v1/checkout/{provider}/status/{reference}",
    params(
        ("provider" = PaymentProvider, Path, description = "paypal, stripe or mpesa"),
        ("reference" = String, Path, description = "Provider order id")
    ),
    responses(
        (status = 200, description = "Payment status", body = PaymentStatusResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown payment", body = Error)
    ),
    tags = ["checkout"],
    operation_id = "paymentStatus",
    security(("SessionCookie" = []))
)]
#[get("/checkout/{provider}/status/{reference}")]
pub async fn payment_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<PaymentStatusResponse>> {
    let user_id = session.require_user_id()?;
    let (provider, reference) = path.into_inner();
    let provider = parse_provider(&provider)?;
    let view = state
        .checkout
        .payment_status(&user_id, provider, reference.trim())
        .await?;
    Ok(web::Json(view.into()))
}

#[cfg(test)]
#[path = "checkout_tests.rs"]
mod tests;
