//! Cookie-backed cart handlers.
//!
//! ```text
//! GET /api/v1/cart
//! POST /api/v1/cart/items {"courseId":"..."}
//! DELETE /api/v1/cart/items/{courseId}
//! ```

use actix_web::cookie::time::Duration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpRequest, HttpResponse, delete, get, post, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{
    ANONYMOUS_CART_COOKIE, Cart, CourseId, Error, UserId, cart_cookie_name, cart_ttl_days,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::CartResponse;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::{HttpSettings, HttpState};
use crate::inbound::http::validation::{FieldName, parse_id};

/// Read the viewer's cart cookie; a missing or garbled cookie is empty.
pub(crate) fn read_cart(req: &HttpRequest, viewer: Option<&UserId>) -> Cart {
    req.cookie(&cart_cookie_name(viewer))
        .map(|cookie| Cart::from_cookie_value(cookie.value()))
        .unwrap_or_default()
}

/// Cookie persisting `cart` for the viewer.
pub(crate) fn cart_cookie(
    settings: &HttpSettings,
    viewer: Option<&UserId>,
    cart: &Cart,
) -> Cookie<'static> {
    Cookie::build(cart_cookie_name(viewer), cart.to_cookie_value())
        .path("/")
        .http_only(true)
        .secure(settings.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(cart_ttl_days(viewer)))
        .finish()
}

/// Fold the anonymous cart into `user_id`'s cart.
///
/// Returns the cookies to set: the merged user cart and a removal of the
/// anonymous cookie. Nothing is returned when there was no anonymous cart.
pub(crate) fn merge_anonymous_cart(
    req: &HttpRequest,
    settings: &HttpSettings,
    user_id: &UserId,
) -> Vec<Cookie<'static>> {
    let anonymous = read_cart(req, None);
    if anonymous.is_empty() {
        return Vec::new();
    }
    let mut cart = read_cart(req, Some(user_id));
    cart.merge(&anonymous);
    let mut removal = Cookie::build(ANONYMOUS_CART_COOKIE, "").path("/").finish();
    removal.make_removal();
    vec![cart_cookie(settings, Some(user_id), &cart), removal]
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub course_id: String,
}

/// Priced view of the caller's cart.
///
/// Courses the caller already owns and unpublished courses are dropped.
#[utoipa::path(
    get,
    path = "/api/v1/cart",
    responses(
        (status = 200, description = "Cart summary", body = CartResponse),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["cart"],
    operation_id = "getCart",
    security([], ("SessionCookie" = []))
)]
#[get("/cart")]
pub async fn get_cart(
    state: web::Data<HttpState>,
    session: SessionContext,
    req: HttpRequest,
) -> ApiResult<web::Json<CartResponse>> {
    let viewer = session.user_id()?;
    let cart = read_cart(&req, viewer.as_ref());
    let summary = state.catalogue.cart_summary(viewer, cart).await?;
    Ok(web::Json(summary.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/cart/items",
    request_body = AddCartItemRequest,
    responses(
        (status = 204, description = "Course added", headers(("Set-Cookie" = String, description = "Cart cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Course not found", body = Error)
    ),
    tags = ["cart"],
    operation_id = "addCartItem",
    security([], ("SessionCookie" = []))
)]
#[post("/cart/items")]
pub async fn add_cart_item(
    state: web::Data<HttpState>,
    session: SessionContext,
    req: HttpRequest,
    payload: web::Json<AddCartItemRequest>,
) -> ApiResult<HttpResponse> {
    let course_id: CourseId = parse_id(&payload.course_id, FieldName::new("courseId"))?;
    let viewer = session.user_id()?;
    // Only published courses may enter the cart.
    state
        .catalogue
        .course_detail(viewer, course_id)
        .await?;
    let mut cart = read_cart(&req, viewer.as_ref());
    cart.add(course_id);
    Ok(HttpResponse::NoContent()
        .cookie(cart_cookie(&state.settings, viewer.as_ref(), &cart))
        .finish())
}

#[utoipa::path(
    delete,
    path = "/api/v1/cart/items/{course_id}",
    params(("course_id" = String, Path, description = "Course to remove")),
    responses(
        (status = 204, description = "Course removed", headers(("Set-Cookie" = String, description = "Cart cookie"))),
        (status = 400, description = "Invalid request", body = Error)
    ),
    tags = ["cart"],
    operation_id = "removeCartItem",
    security([], ("SessionCookie" = []))
)]
#[delete("/cart/items/{course_id}")]
pub async fn remove_cart_item(
    state: web::Data<HttpState>,
    session: SessionContext,
    req: HttpRequest,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let course_id: CourseId = parse_id(&path, FieldName::new("courseId"))?;
    let viewer = session.user_id()?;
    let mut cart = read_cart(&req, viewer.as_ref());
    cart.remove(&course_id);
    Ok(HttpResponse::NoContent()
        .cookie(cart_cookie(&state.settings, viewer.as_ref(), &cart))
        .finish())
}
