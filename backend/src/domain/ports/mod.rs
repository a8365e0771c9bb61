//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, payment gateways, mailer, hashing, metrics)
//! are implemented by outbound adapters. Driving ports (commands and
//! queries) are implemented by domain services and called by inbound
//! adapters. Each driven trait exposes a typed error generated by
//! `define_port_error!` so adapters map failures into predictable variants.

mod macros;
pub(crate) use macros::define_port_error;

mod account_service;
mod catalogue_query;
mod checkout_command;
mod checkout_metrics;
mod course_authoring_command;
mod course_repository;
mod dashboard_query;
mod enrollment_command;
mod mailer;
mod password_hasher;
mod payment_gateway;
mod payment_record_repository;
mod progress_repository;
mod purchase_ledger;
mod user_repository;

#[cfg(test)]
pub use account_service::{MockAccountService, MockAdminService};
pub use account_service::{AccountService, AdminService, ProfileUpdate};
#[cfg(test)]
pub use catalogue_query::MockCatalogueQuery;
pub use catalogue_query::{CatalogueQuery, ChapterDetail, CourseDetail, CourseListing};
#[cfg(test)]
pub use checkout_command::MockCheckoutCommand;
pub use checkout_command::{
    CheckoutCommand, CheckoutCompleted, CheckoutStarted, CompleteCheckout,
    MPESA_CANCELLED_RESULT_CODE, MpesaCallback, PaymentStatusView, StartCheckout,
};
#[cfg(test)]
pub use checkout_metrics::MockCheckoutMetrics;
pub use checkout_metrics::{
    CheckoutMetrics, CheckoutMetricsError, CheckoutOutcome, NoOpCheckoutMetrics,
};
#[cfg(test)]
pub use course_authoring_command::MockCourseAuthoringCommand;
pub use course_authoring_command::CourseAuthoringCommand;
#[cfg(test)]
pub use course_repository::MockCourseRepository;
pub use course_repository::{CourseRepository, CourseRepositoryError};
#[cfg(test)]
pub use dashboard_query::MockDashboardQuery;
pub use dashboard_query::{
    CourseSales, DashboardQuery, EnrolledCourse, RevenueTotal, StudentDashboard,
    TeacherAnalytics,
};
#[cfg(test)]
pub use enrollment_command::MockEnrollmentCommand;
pub use enrollment_command::EnrollmentCommand;
#[cfg(test)]
pub use mailer::MockMailer;
pub use mailer::{LogOnlyMailer, Mailer, MailerError};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use payment_gateway::MockPaymentGateway;
pub use payment_gateway::{
    CaptureResult, CreatedOrder, OrderRequest, OrderValidation, PaymentGateway,
    PaymentGatewayError, PaymentGateways, UnconfiguredGateway,
};
#[cfg(test)]
pub use payment_record_repository::MockPaymentRecordRepository;
pub use payment_record_repository::{PaymentRecordError, PaymentRecordRepository};
#[cfg(test)]
pub use progress_repository::MockProgressRepository;
pub use progress_repository::{ProgressRepository, ProgressRepositoryError};
#[cfg(test)]
pub use purchase_ledger::MockPurchaseLedger;
pub use purchase_ledger::{PurchaseLedger, PurchaseLedgerError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{StoredCredentials, UserPersistenceError, UserRepository};
