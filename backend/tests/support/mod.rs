//! Shared helpers for the HTTP integration suites.
//!
//! Each [`Browser`] keeps its own cookie jar over a shared in-process app,
//! so one test can drive a teacher, a student and an admin side by side.

use std::collections::HashMap;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{StatusCode, header};
use actix_web::test::{self as actix_test, TestRequest};
use coursehub::test_support::TEST_ADMIN_EMAIL;
use serde_json::{Value, json};

pub const PASSWORD: &str = "correct horse battery";

/// Response status, redirect target and JSON body (or `Null`).
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: Value,
}

impl Reply {
    #[track_caller]
    pub fn expect(self, status: StatusCode) -> Value {
        assert_eq!(self.status, status, "unexpected status; body: {}", self.body);
        self.body
    }
}

/// Cookie-carrying client for one user.
pub struct Browser<'a, S> {
    app: &'a S,
    jar: HashMap<String, String>,
}

impl<'a, S, B> Browser<'a, S>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    pub fn new(app: &'a S) -> Self {
        Self {
            app,
            jar: HashMap::new(),
        }
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.jar.contains_key(name)
    }

    pub async fn send(&mut self, request: TestRequest) -> Reply {
        let request = self
            .jar
            .iter()
            .fold(request, |request, (name, value)| {
                request.cookie(actix_web::cookie::Cookie::new(name.clone(), value.clone()))
            });
        let response = actix_test::call_service(self.app, request.to_request()).await;

        for cookie in response.response().cookies() {
            if cookie.value().is_empty() {
                self.jar.remove(cookie.name());
            } else {
                self.jar
                    .insert(cookie.name().to_owned(), cookie.value().to_owned());
            }
        }
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = actix_test::read_body(response).await;
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply {
            status,
            location,
            body,
        }
    }

    pub async fn get(&mut self, uri: &str) -> Reply {
        self.send(TestRequest::get().uri(uri)).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> Reply {
        self.send(TestRequest::post().uri(uri).set_json(body)).await
    }

    pub async fn put(&mut self, uri: &str, body: Value) -> Reply {
        self.send(TestRequest::put().uri(uri).set_json(body)).await
    }

    pub async fn patch(&mut self, uri: &str, body: Value) -> Reply {
        self.send(TestRequest::patch().uri(uri).set_json(body)).await
    }

    pub async fn delete(&mut self, uri: &str) -> Reply {
        self.send(TestRequest::delete().uri(uri)).await
    }

    /// Register and sign in; returns the created user's id.
    pub async fn register(&mut self, email: &str, display_name: &str) -> String {
        let user = self
            .post(
                "/api/v1/users",
                json!({ "email": email, "password": PASSWORD, "displayName": display_name }),
            )
            .await
            .expect(StatusCode::CREATED);
        string_field(&user, "id")
    }
}

#[track_caller]
pub fn string_field(value: &Value, field: &str) -> String {
    value[field]
        .as_str()
        .unwrap_or_else(|| panic!("missing string field {field} in {value}"))
        .to_owned()
}

/// Register an admin and a teacher, promoting the teacher via the admin API.
pub async fn admin_and_teacher<'a, S, B>(app: &'a S) -> (Browser<'a, S>, Browser<'a, S>)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let mut admin = Browser::new(app);
    admin.register(TEST_ADMIN_EMAIL, "Root").await;

    let mut teacher = Browser::new(app);
    let teacher_id = teacher.register("grace@example.com", "Grace").await;
    let promoted = admin
        .put(
            &format!("/api/v1/admin/users/{teacher_id}/role"),
            json!({ "role": "teacher" }),
        )
        .await
        .expect(StatusCode::OK);
    assert_eq!(promoted["role"], "teacher");
    (admin, teacher)
}

/// A published course and its published chapters, in order.
pub struct PublishedCourse {
    pub id: String,
    pub chapters: Vec<String>,
}

/// Author and publish a course priced `price` in `currency` with
/// `chapters` published chapters.
///
/// The first chapter is marked free so previews can be checked.
pub async fn publish_course<S, B>(
    teacher: &mut Browser<'_, S>,
    title: &str,
    price: &str,
    currency: &str,
    chapters: usize,
) -> PublishedCourse
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let categories = teacher
        .get("/api/v1/categories")
        .await
        .expect(StatusCode::OK);
    let category_id = string_field(&categories[0], "id");

    let course = teacher
        .post("/api/v1/teacher/courses", json!({ "title": title }))
        .await
        .expect(StatusCode::CREATED);
    let course_id = string_field(&course, "id");
    teacher
        .patch(
            &format!("/api/v1/teacher/courses/{course_id}"),
            json!({
                "description": format!("All about {title}"),
                "imageUrl": "https://img.example/cover.png",
                "price": price,
                "currency": currency,
                "categoryId": category_id,
            }),
        )
        .await
        .expect(StatusCode::OK);

    let mut chapter_ids = Vec::with_capacity(chapters);
    for index in 0..chapters {
        let chapter = teacher
            .post(
                &format!("/api/v1/teacher/courses/{course_id}/chapters"),
                json!({ "title": format!("Chapter {}", index + 1) }),
            )
            .await
            .expect(StatusCode::CREATED);
        let chapter_id = string_field(&chapter, "id");
        teacher
            .patch(
                &format!("/api/v1/teacher/courses/{course_id}/chapters/{chapter_id}"),
                json!({
                    "description": "Watch and follow along",
                    "videoUrl": format!("https://video.example/{chapter_id}.mp4"),
                    "isFree": index == 0,
                }),
            )
            .await
            .expect(StatusCode::OK);
        teacher
            .post(
                &format!("/api/v1/teacher/courses/{course_id}/chapters/{chapter_id}/publish"),
                json!({}),
            )
            .await
            .expect(StatusCode::OK);
        chapter_ids.push(chapter_id);
    }

    let published = teacher
        .post(
            &format!("/api/v1/teacher/courses/{course_id}/publish"),
            json!({}),
        )
        .await
        .expect(StatusCode::OK);
    assert_eq!(published["isPublished"], true);

    PublishedCourse {
        id: course_id,
        chapters: chapter_ids,
    }
}
