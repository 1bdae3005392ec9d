use crate::gettext;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

pub const NAME_MAX_LENGTH: usize = 255;
pub const EMAIL_MAX_LENGTH: usize = 255;
pub const PASSWORD_MIN_LENGTH: usize = 8;

lazy_static! {
    #[doc(hidden)]
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$"
    )
    .unwrap();
}

/// Field-scoped validation messages, collected for every failing field
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<S: AsRef<str> + ?Sized>(&mut self, field: &str, msg: &S) {
        self.errors
            .entry(field.to_owned())
            .or_insert_with(Vec::new)
            .push(msg.as_ref().to_owned());
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn first_message(&self) -> Option<&str> {
        self.errors
            .values()
            .next()
            .and_then(|v| v.first())
            .map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.errors.iter()
    }

    pub fn to_json(&self) -> json::JsonValue {
        let mut obj = json::JsonValue::new_object();
        for (field, msgs) in self.errors.iter() {
            obj[field.as_str()] = msgs.clone().into();
        }
        obj
    }
}

/// Registration payload as received from the client
#[derive(Clone, Debug, Default)]
pub struct RegisterForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

fn is_blank(s: &Option<String>) -> bool {
    match s {
        Some(s) => s.trim().is_empty(),
        None => true,
    }
}

fn required(errors: &mut ValidationErrors, field: &str, value: &Option<String>) -> bool {
    if is_blank(value) {
        errors.add(
            field,
            &gettext("The <field> field is required.").replace("<field>", field),
        );
        return false;
    }
    true
}

fn max_length(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(
            field,
            &gettext("The <field> field must not be greater than <max> characters.")
                .replace("<field>", field)
                .replace("<max>", &max.to_string()),
        );
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

impl RegisterForm {
    /// Check every rule that does not need the database.
    ///
    /// The email uniqueness check is done by the authenticator.
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if required(&mut errors, "name", &self.name) {
            if let Some(name) = &self.name {
                max_length(&mut errors, "name", name, NAME_MAX_LENGTH);
            }
        }
        if required(&mut errors, "email", &self.email) {
            if let Some(email) = &self.email {
                if !is_valid_email(email) {
                    errors.add(
                        "email",
                        gettext("The email field must be a valid email address."),
                    );
                }
                max_length(&mut errors, "email", email, EMAIL_MAX_LENGTH);
            }
        }
        if required(&mut errors, "password", &self.password) {
            if let Some(password) = &self.password {
                if password.chars().count() < PASSWORD_MIN_LENGTH {
                    errors.add(
                        "password",
                        &gettext("The password field must be at least <min> characters.")
                            .replace("<min>", &PASSWORD_MIN_LENGTH.to_string()),
                    );
                }
            }
        }
        errors
    }
}

#[cfg(test)]
fn form(name: &str, email: &str, password: &str) -> RegisterForm {
    RegisterForm {
        name: Some(name.to_owned()),
        email: Some(email.to_owned()),
        password: Some(password.to_owned()),
    }
}

#[test]
fn test_register_form_valid() {
    let errors = form("Test User", "test@example.com", "password123").validate();
    assert!(errors.is_empty());
    assert_eq!(errors.first_message(), None);
}

#[test]
fn test_register_form_reports_every_field() {
    let errors = RegisterForm::default().validate();
    assert!(errors.contains("name"));
    assert!(errors.contains("email"));
    assert!(errors.contains("password"));
    let errors = form("   ", "invalid-email", "short").validate();
    assert!(errors.contains("name"));
    assert!(errors.contains("email"));
    assert!(errors.contains("password"));
}

#[test]
fn test_register_form_lengths() {
    let errors = form(&"a".repeat(256), "test@example.com", "password123").validate();
    assert!(errors.contains("name"));
    assert!(!errors.contains("email"));
    let errors = form(&"a".repeat(255), "test@example.com", "12345678").validate();
    assert!(errors.is_empty());
    let email = format!("{}@example.com", "a".repeat(250));
    let errors = form("Test", &email, "password123").validate();
    assert!(errors.contains("email"));
    let errors = form("Test", "test@example.com", "1234567").validate();
    assert_eq!(
        errors.to_json()["password"][0].as_str(),
        Some("The password field must be at least 8 characters.")
    );
}

#[test]
fn test_is_valid_email() {
    assert!(is_valid_email("john@example.com"));
    assert!(is_valid_email("a.b+c@sub.example.co"));
    assert!(!is_valid_email("invalid-email"));
    assert!(!is_valid_email("a@b@c"));
    assert!(!is_valid_email("a b@example.com"));
}
