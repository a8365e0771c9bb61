//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpResponse, post, test as actix_test, web};

use crate::domain::UserId;
use crate::domain::ports::{
    MockAccountService, MockAdminService, MockCatalogueQuery, MockCheckoutCommand,
    MockCourseAuthoringCommand, MockDashboardQuery, MockEnrollmentCommand,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::{HttpSettings, HttpState, HttpStatePorts};

pub(crate) const TEST_BASE_URL: &str = "https://learn.example";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Driving-port mocks; unconfigured mocks panic when called.
#[derive(Default)]
pub(crate) struct MockPorts {
    pub accounts: MockAccountService,
    pub admin: MockAdminService,
    pub catalogue: MockCatalogueQuery,
    pub checkout: MockCheckoutCommand,
    pub enrollment: MockEnrollmentCommand,
    pub dashboards: MockDashboardQuery,
    pub authoring: MockCourseAuthoringCommand,
}

impl MockPorts {
    pub(crate) fn into_state(self) -> HttpState {
        HttpState::new(
            HttpStatePorts {
                accounts: Arc::new(self.accounts),
                admin: Arc::new(self.admin),
                catalogue: Arc::new(self.catalogue),
                checkout: Arc::new(self.checkout),
                enrollment: Arc::new(self.enrollment),
                dashboards: Arc::new(self.dashboards),
                authoring: Arc::new(self.authoring),
            },
            HttpSettings::new(TEST_BASE_URL, false),
        )
    }
}

/// Establish a session for `user_id` without going through login.
#[post("/__test/session/{user_id}")]
async fn test_sign_in(
    session: SessionContext,
    path: web::Path<UserId>,
) -> ApiResult<HttpResponse> {
    session.persist_user(&path.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}

/// App with session support, `state` and the services registered by
/// `configure` under `/api/v1`.
pub(crate) fn test_app<F>(
    state: HttpState,
    configure: F,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
>
where
    F: FnOnce(&mut web::ServiceConfig),
{
    App::new()
        .app_data(web::Data::new(state))
        .wrap(test_session_middleware())
        .service(test_sign_in)
        .service(web::scope("/api/v1").configure(configure))
}

/// Sign `user_id` in and return the session cookie.
pub(crate) async fn session_cookie<S>(app: &S, user_id: &UserId) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let request = actix_test::TestRequest::post()
        .uri(&format!("/__test/session/{user_id}"))
        .to_request();
    let response = actix_test::call_service(app, request).await;
    assert!(response.status().is_success());
    response
        .response()
        .cookies()
        .find(|c| c.name() == "session")
        .expect("session cookie")
        .into_owned()
}
