//! Transactional email messages.

use super::catalogue::Course;
use super::user::User;

/// Outbound email handed to the mailer port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Confirmation sent after a successful enrollment.
#[must_use]
pub fn enrollment_confirmation(user: &User, course: &Course, course_url: &str) -> EmailMessage {
    let name = escape_html(user.display_name().as_ref());
    let title = escape_html(&course.title);
    let link = escape_html(course_url);
    EmailMessage {
        to: user.email().to_string(),
        subject: format!("You're enrolled in {}", course.title),
        html: format!(
            "<p>Hi {name},</p>\
             <p>Your enrollment in <strong>{title}</strong> is confirmed.</p>\
             <p><a href=\"{link}\">Start learning</a></p>"
        ),
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
