//! HTTP inbound adapter exposing REST endpoints.

pub mod admin;
pub mod cart;
pub mod catalogue;
pub mod checkout;
pub mod dto;
pub mod enrollment;
pub mod error;
pub mod health;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod teacher;
pub mod users;
pub mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register every `/api/v1` handler on `cfg`.
///
/// The caller supplies the scope and its session middleware; the probes
/// in [`health`] live outside the versioned scope.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(users::register)
        .service(users::login)
        .service(users::logout)
        .service(users::current_user)
        .service(users::update_current_user)
        .service(users::my_courses)
        .service(catalogue::list_categories)
        .service(catalogue::list_courses)
        .service(catalogue::get_course)
        .service(catalogue::get_chapter)
        .service(cart::get_cart)
        .service(cart::add_cart_item)
        .service(cart::remove_cart_item)
        .service(checkout::capture_paypal)
        .service(checkout::stripe_success)
        .service(checkout::mpesa_callback)
        .service(checkout::payment_status)
        .service(checkout::start_checkout)
        .service(enrollment::enroll)
        .service(enrollment::set_progress)
        .service(teacher::list_owned_courses)
        .service(teacher::create_course)
        .service(teacher::update_course)
        .service(teacher::publish_course)
        .service(teacher::unpublish_course)
        .service(teacher::create_chapter)
        .service(teacher::reorder_chapters)
        .service(teacher::update_chapter)
        .service(teacher::publish_chapter)
        .service(teacher::unpublish_chapter)
        .service(teacher::add_attachment)
        .service(teacher::analytics)
        .service(admin::list_users)
        .service(admin::set_role)
        .service(admin::send_email);
}
