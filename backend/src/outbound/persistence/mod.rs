//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the repository ports backed by PostgreSQL via
//! `diesel-async` and a `bb8` pool.
//!
//! - Repositories only translate between Diesel rows and domain types.
//! - Row structs (`models.rs`) and table definitions (`schema.rs`) stay
//!   private to this module.
//! - Every Diesel and pool failure is mapped into the owning port's error.
//!
//! # Example
//!
//! ```no_run
//! use coursehub::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/coursehub")).await?;
//! let users = DieselUserRepository::new(pool);
//! # let _ = users;
//! # Ok(())
//! # }
//! ```

mod diesel_basic_error_mapping;
mod diesel_course_repository;
mod diesel_payment_record_repository;
mod diesel_progress_repository;
mod diesel_purchase_ledger;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_course_repository::DieselCourseRepository;
pub use diesel_payment_record_repository::DieselPaymentRecordRepository;
pub use diesel_progress_repository::DieselProgressRepository;
pub use diesel_purchase_ledger::DieselPurchaseLedger;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
