//! Shared HTTP adapter state.
//!
//! Handlers receive this via `web::Data` and depend only on driving ports,
//! so they stay testable with mocks and without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    AccountService, AdminService, CatalogueQuery, CheckoutCommand, CheckoutMetrics,
    CourseAuthoringCommand, CourseRepository, DashboardQuery, EnrollmentCommand, Mailer,
    PasswordHasher, PaymentGateways, PaymentRecordRepository, ProgressRepository,
    PurchaseLedger, UserRepository,
};
use crate::domain::{
    CatalogueService, CheckoutService, CourseAuthoringService, DashboardService, Email, Enroller,
    EnrollmentService, UserAccountService,
};

/// Parameter object bundling every driving port used by the handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub accounts: Arc<dyn AccountService>,
    pub admin: Arc<dyn AdminService>,
    pub catalogue: Arc<dyn CatalogueQuery>,
    pub checkout: Arc<dyn CheckoutCommand>,
    pub enrollment: Arc<dyn EnrollmentCommand>,
    pub dashboards: Arc<dyn DashboardQuery>,
    pub authoring: Arc<dyn CourseAuthoringCommand>,
}

/// Persistence adapters shared by every service.
pub struct Repositories<U, C, L, P, R> {
    pub users: Arc<U>,
    pub courses: Arc<C>,
    pub ledger: Arc<L>,
    pub progress: Arc<P>,
    pub records: Arc<R>,
}

/// Non-persistence collaborators of the services.
pub struct Integrations {
    pub gateways: PaymentGateways,
    pub mailer: Arc<dyn Mailer>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub checkout_metrics: Arc<dyn CheckoutMetrics>,
    pub clock: Arc<dyn Clock>,
    /// Registrations with these emails receive the admin role.
    pub admin_emails: Vec<Email>,
    /// Origin used in emails and provider return URLs.
    pub public_base_url: String,
}

impl HttpStatePorts {
    /// Wire the domain services over `repositories` and `integrations`.
    pub fn assemble<U, C, L, P, R>(
        repositories: Repositories<U, C, L, P, R>,
        integrations: Integrations,
    ) -> Self
    where
        U: UserRepository + 'static,
        C: CourseRepository + 'static,
        L: PurchaseLedger + 'static,
        P: ProgressRepository + 'static,
        R: PaymentRecordRepository + 'static,
    {
        let Repositories {
            users,
            courses,
            ledger,
            progress,
            records,
        } = repositories;
        let Integrations {
            gateways,
            mailer,
            hasher,
            checkout_metrics,
            clock,
            admin_emails,
            public_base_url,
        } = integrations;

        let accounts = Arc::new(UserAccountService::new(
            Arc::clone(&users),
            hasher,
            Arc::clone(&mailer),
            Arc::clone(&clock),
            admin_emails,
        ));
        let enroller = Enroller::new(
            Arc::clone(&courses),
            Arc::clone(&users),
            Arc::clone(&ledger),
            mailer,
            Arc::clone(&clock),
            public_base_url,
        );
        let checkout = CheckoutService::new(
            Arc::clone(&courses),
            Arc::clone(&users),
            records,
            enroller.clone(),
            gateways,
            checkout_metrics,
            Arc::clone(&clock),
        );
        let enrollment = EnrollmentService::new(
            enroller,
            Arc::clone(&courses),
            Arc::clone(&progress),
            Arc::clone(&clock),
        );

        Self {
            accounts: accounts.clone(),
            admin: accounts,
            catalogue: Arc::new(CatalogueService::new(
                Arc::clone(&courses),
                Arc::clone(&ledger),
                Arc::clone(&progress),
            )),
            checkout: Arc::new(checkout),
            enrollment: Arc::new(enrollment),
            dashboards: Arc::new(DashboardService::new(
                Arc::clone(&users),
                Arc::clone(&courses),
                ledger,
                progress,
            )),
            authoring: Arc::new(CourseAuthoringService::new(users, courses, clock)),
        }
    }
}

/// Deployment settings handlers need for redirects and cookies.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Origin used to build browser redirects, without a trailing slash.
    pub public_base_url: Arc<str>,
    /// Whether cart cookies carry the `Secure` attribute.
    pub cookie_secure: bool,
}

impl HttpSettings {
    pub fn new(public_base_url: &str, cookie_secure: bool) -> Self {
        Self {
            public_base_url: Arc::from(public_base_url.trim_end_matches('/')),
            cookie_secure,
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountService>,
    pub admin: Arc<dyn AdminService>,
    pub catalogue: Arc<dyn CatalogueQuery>,
    pub checkout: Arc<dyn CheckoutCommand>,
    pub enrollment: Arc<dyn EnrollmentCommand>,
    pub dashboards: Arc<dyn DashboardQuery>,
    pub authoring: Arc<dyn CourseAuthoringCommand>,
    pub settings: HttpSettings,
}

impl HttpState {
    /// Construct state from a ports bundle and deployment settings.
    ///
    /// # Examples
    /// ```no_run
    /// # fn build(ports: coursehub::inbound::http::state::HttpStatePorts) {
    /// use coursehub::inbound::http::state::{HttpSettings, HttpState};
    ///
    /// let state = HttpState::new(ports, HttpSettings::new("https://learn.example/", true));
    /// assert_eq!(&*state.settings.public_base_url, "https://learn.example");
    /// # }
    /// ```
    pub fn new(ports: HttpStatePorts, settings: HttpSettings) -> Self {
        let HttpStatePorts {
            accounts,
            admin,
            catalogue,
            checkout,
            enrollment,
            dashboards,
            authoring,
        } = ports;
        Self {
            accounts,
            admin,
            catalogue,
            checkout,
            enrollment,
            dashboards,
            authoring,
            settings,
        }
    }

    /// Absolute URL of a course page.
    pub fn course_page(&self, course_id: &crate::domain::CourseId) -> String {
        format!("{}/courses/{course_id}", self.settings.public_base_url)
    }
}
