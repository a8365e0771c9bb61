//! Tests for user value types.

use super::*;
use rstest::rstest;

#[rstest]
#[case("ada@example.com", "ada@example.com")]
#[case("  Grace.Hopper@Navy.MIL ", "grace.hopper@navy.mil")]
fn email_is_trimmed_and_lowercased(#[case] raw: &str, #[case] expected: &str) {
    let email = Email::new(raw).expect("valid email");
    assert_eq!(email.as_ref(), expected);
}

#[rstest]
#[case("", UserValidationError::EmptyEmail)]
#[case("   ", UserValidationError::EmptyEmail)]
#[case("no-at-sign", UserValidationError::InvalidEmail)]
#[case("two@@example.com", UserValidationError::InvalidEmail)]
#[case("user@localhost", UserValidationError::InvalidEmail)]
#[case("spaced name@example.com", UserValidationError::InvalidEmail)]
fn invalid_emails_are_rejected(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(Email::new(raw), Err(expected));
}

#[rstest]
fn display_name_enforces_length() {
    let long = "x".repeat(DISPLAY_NAME_MAX + 1);
    assert_eq!(
        DisplayName::new(long),
        Err(UserValidationError::DisplayNameTooLong {
            max: DISPLAY_NAME_MAX
        })
    );
    assert_eq!(
        DisplayName::new("  "),
        Err(UserValidationError::EmptyDisplayName)
    );
    let name = DisplayName::new("  Wanjiru Kamau ").expect("valid name");
    assert_eq!(name.as_ref(), "Wanjiru Kamau");
}

#[rstest]
#[case("student", Role::Student)]
#[case("TEACHER", Role::Teacher)]
#[case(" admin ", Role::Admin)]
fn roles_parse_case_insensitively(#[case] raw: &str, #[case] expected: Role) {
    assert_eq!(raw.parse::<Role>(), Ok(expected));
}

#[rstest]
fn unknown_role_is_rejected() {
    assert!(matches!(
        "owner".parse::<Role>(),
        Err(UserValidationError::UnknownRole { .. })
    ));
}

#[rstest]
#[case(Role::Student, false)]
#[case(Role::Teacher, true)]
#[case(Role::Admin, true)]
fn authoring_rights_follow_role(#[case] role: Role, #[case] expected: bool) {
    assert_eq!(role.can_author(), expected);
}

#[rstest]
#[case("https://cdn.example.com/a.png", true)]
#[case("http://cdn.example.com/a.png", true)]
#[case("ftp://cdn.example.com/a.png", false)]
#[case("not a url", false)]
fn image_urls_require_http(#[case] raw: &str, #[case] ok: bool) {
    assert_eq!(validate_image_url(raw).is_ok(), ok);
}
