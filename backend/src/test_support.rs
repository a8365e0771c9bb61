//! Test doubles and app wiring shared by integration tests.
//!
//! Compiled with the `test-support` feature. The backend runs over the
//! in-memory store with scripted payment gateways and a recording mailer,
//! so whole checkout flows can be exercised without network access.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use async_trait::async_trait;
use mockable::DefaultClock;
use serde_json::json;

use crate::domain::ports::{
    CaptureResult, CreatedOrder, Mailer, MailerError, NoOpCheckoutMetrics, OrderRequest,
    OrderValidation, PaymentGateway, PaymentGatewayError, PaymentGateways,
};
use crate::domain::{Email, EmailMessage, PaymentProvider};
use crate::inbound::http::configure_api;
use crate::inbound::http::state::{
    HttpSettings, HttpState, HttpStatePorts, Integrations, Repositories,
};
use crate::middleware::Trace;
use crate::outbound::memory::InMemoryStore;
use crate::outbound::security::Argon2PasswordHasher;

/// Origin used for redirects in the test backend.
pub const TEST_PUBLIC_BASE_URL: &str = "https://learn.example";

/// Email granted the admin role by the test backend.
pub const TEST_ADMIN_EMAIL: &str = "root@example.com";

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Payment gateway that approves every order it created unless told the
/// payer declined it.
///
/// Orders are remembered so the return leg can report the course, payer and
/// amount the order was opened for. Unknown references are rejected the way
/// a provider answers 404.
pub struct StubGateway {
    provider: PaymentProvider,
    orders: Mutex<HashMap<String, OrderRequest>>,
    declined: Mutex<HashSet<String>>,
    created: AtomicUsize,
    captured: AtomicUsize,
}

impl StubGateway {
    #[must_use]
    pub fn new(provider: PaymentProvider) -> Self {
        Self {
            provider,
            orders: Mutex::new(HashMap::new()),
            declined: Mutex::new(HashSet::new()),
            created: AtomicUsize::new(0),
            captured: AtomicUsize::new(0),
        }
    }

    /// Number of orders created so far.
    pub fn created_orders(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Number of successful captures so far.
    pub fn captures(&self) -> usize {
        self.captured.load(Ordering::SeqCst)
    }

    /// Report `order_id` as unpaid from now on, as when the payer dismisses
    /// the prompt.
    pub fn decline(&self, order_id: &str) {
        locked(&self.declined).insert(order_id.to_owned());
    }

    fn order(&self, order_id: &str) -> Result<OrderRequest, PaymentGatewayError> {
        locked(&self.orders)
            .get(order_id)
            .cloned()
            .ok_or_else(|| PaymentGatewayError::upstream(404_u16, format!("unknown order {order_id}")))
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    fn provider(&self) -> PaymentProvider {
        self.provider
    }

    async fn create_order(
        &self,
        request: &OrderRequest,
    ) -> Result<CreatedOrder, PaymentGatewayError> {
        let sequence = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        let order_id = format!("{}-order-{sequence}", self.provider);
        locked(&self.orders).insert(order_id.clone(), request.clone());
        let approval_url = match self.provider {
            PaymentProvider::Mpesa => None,
            _ => Some(format!("https://pay.example/approve/{order_id}")),
        };
        Ok(CreatedOrder {
            order_id: order_id.clone(),
            approval_url,
            raw: json!({ "id": order_id }),
        })
    }

    async fn capture(&self, order_id: &str) -> Result<CaptureResult, PaymentGatewayError> {
        self.order(order_id)?;
        self.captured.fetch_add(1, Ordering::SeqCst);
        Ok(CaptureResult {
            reference: format!("{order_id}-capture"),
            completed: true,
            status: "COMPLETED".to_owned(),
            raw: json!({ "id": order_id, "status": "COMPLETED" }),
        })
    }

    async fn validate(&self, order_id: &str) -> Result<OrderValidation, PaymentGatewayError> {
        let order = self.order(order_id)?;
        let declined = locked(&self.declined).contains(order_id);
        let status = if declined { "DECLINED" } else { "APPROVED" };
        Ok(OrderValidation {
            is_valid: !declined,
            is_completed: false,
            status: status.to_owned(),
            course_id: Some(order.course_id),
            user_id: Some(order.user_id),
            amount: Some(order.amount),
            currency: Some(order.currency),
            raw: json!({ "id": order_id, "status": status }),
        })
    }
}

/// Mailer that keeps every message in memory.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    /// Messages sent so far, oldest first.
    pub fn sent(&self) -> Vec<EmailMessage> {
        locked(&self.sent).clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailerError> {
        locked(&self.sent).push(message.clone());
        Ok(())
    }
}

/// In-memory backend plus handles on its doubles.
pub struct TestBackend {
    pub store: InMemoryStore,
    pub paypal: Arc<StubGateway>,
    pub stripe: Arc<StubGateway>,
    pub mpesa: Arc<StubGateway>,
    pub mailer: Arc<RecordingMailer>,
    pub state: web::Data<HttpState>,
}

impl TestBackend {
    /// Build the backend; [`TEST_ADMIN_EMAIL`] registers as an admin.
    #[must_use]
    pub fn new() -> Self {
        let store = InMemoryStore::new();
        let shared = Arc::new(store.clone());
        let paypal = Arc::new(StubGateway::new(PaymentProvider::PayPal));
        let stripe = Arc::new(StubGateway::new(PaymentProvider::Stripe));
        let mpesa = Arc::new(StubGateway::new(PaymentProvider::Mpesa));
        let mailer = Arc::new(RecordingMailer::default());
        let admin_emails = Email::new(TEST_ADMIN_EMAIL).into_iter().collect();

        let ports = HttpStatePorts::assemble(
            Repositories {
                users: Arc::clone(&shared),
                courses: Arc::clone(&shared),
                ledger: Arc::clone(&shared),
                progress: Arc::clone(&shared),
                records: shared,
            },
            Integrations {
                gateways: PaymentGateways::new(paypal.clone(), mpesa.clone(), stripe.clone()),
                mailer: mailer.clone(),
                hasher: Arc::new(Argon2PasswordHasher::new()),
                checkout_metrics: Arc::new(NoOpCheckoutMetrics),
                clock: Arc::new(DefaultClock),
                admin_emails,
                public_base_url: TEST_PUBLIC_BASE_URL.to_owned(),
            },
        );
        let state = web::Data::new(HttpState::new(
            ports,
            HttpSettings::new(TEST_PUBLIC_BASE_URL, false),
        ));

        Self {
            store,
            paypal,
            stripe,
            mpesa,
            mailer,
            state,
        }
    }

    /// App serving the full `/api/v1` surface over this backend.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        let session = SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
            .cookie_name("session".to_owned())
            .cookie_secure(false)
            .build();
        App::new()
            .app_data(self.state.clone())
            .wrap(Trace)
            .service(web::scope("/api/v1").wrap(session).configure(configure_api))
    }
}

impl Default for TestBackend {
    fn default() -> Self {
        Self::new()
    }
}
