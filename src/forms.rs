//! Form shapes accepted by the HTML endpoints and the rules that validate them.
//!
//! Each form is a plain struct deserialized from the urlencoded body plus a
//! static table mapping field name to an ordered list of [`Rule`]s.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::{ValidateEmail, ValidateLength};

use crate::db::Feedback;

#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// Field must be non-empty. Failing this skips the field's remaining rules.
    Required,
    /// Character count bounds, inclusive.
    Length { min: Option<u64>, max: Option<u64> },
    Email,
    /// Field must equal the named sibling field.
    EqualTo(&'static str, &'static str),
}

pub type FieldRules = (&'static str, &'static [Rule]);

pub const REGISTER_RULES: &[FieldRules] = &[
    ("username", &[Rule::Required, Rule::Length { min: Some(3), max: Some(20) }]),
    ("password", &[Rule::Required, Rule::EqualTo("confirm", "Passwords must match")]),
    ("confirm", &[]),
    ("email", &[Rule::Required, Rule::Email, Rule::Length { min: None, max: Some(50) }]),
    ("first_name", &[Rule::Required, Rule::Length { min: Some(1), max: Some(30) }]),
    ("last_name", &[Rule::Required, Rule::Length { min: Some(1), max: Some(30) }]),
];

pub const LOGIN_RULES: &[FieldRules] = &[
    ("username", &[Rule::Required, Rule::Length { min: Some(3), max: Some(20) }]),
    ("password", &[Rule::Required]),
];

pub const FEEDBACK_RULES: &[FieldRules] = &[
    ("title", &[Rule::Required, Rule::Length { min: None, max: Some(100) }]),
    ("content", &[Rule::Required]),
];

/// Per-field error messages. Every field of the form has an entry, possibly empty.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn for_rules(rules: &[FieldRules]) -> Self {
        FormErrors(
            rules
                .iter()
                .map(|(field, _)| (field.to_string(), Vec::new()))
                .collect(),
        )
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }
}

pub trait Form {
    const RULES: &'static [FieldRules];

    fn value(&self, field: &str) -> Option<&String>;

    /// Run every field's rules in table order.
    fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::for_rules(Self::RULES);
        let empty = String::new();

        for (field, rules) in Self::RULES {
            let value = self.value(field).unwrap_or(&empty);

            for rule in rules.iter() {
                if let Err(message) = check(rule, value, |other| self.value(other)) {
                    errors.add(field, message);
                    if matches!(rule, Rule::Required) {
                        break;
                    }
                }
            }
        }

        errors
    }
}

fn check<'a>(
    rule: &Rule,
    value: &String,
    sibling: impl Fn(&str) -> Option<&'a String>,
) -> Result<(), String> {
    match *rule {
        Rule::Required => {
            if value.is_empty() {
                return Err("This field is required.".to_string());
            }
        }
        Rule::Length { min, max } => {
            if !value.validate_length(min, max, None) {
                return Err(match (min, max) {
                    (Some(min), Some(max)) => {
                        format!("Field must be between {} and {} characters long.", min, max)
                    }
                    (None, Some(max)) => format!("Field cannot be longer than {} characters.", max),
                    (Some(min), None) => format!("Field must be at least {} characters long.", min),
                    (None, None) => "Invalid length.".to_string(),
                });
            }
        }
        Rule::Email => {
            if !value.validate_email() {
                return Err("Invalid email address.".to_string());
            }
        }
        Rule::EqualTo(other, message) => {
            if sibling(other).map(String::as_str).unwrap_or("") != value.as_str() {
                return Err(message.to_string());
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_serializing)]
    pub confirm: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl Form for RegisterForm {
    const RULES: &'static [FieldRules] = REGISTER_RULES;

    fn value(&self, field: &str) -> Option<&String> {
        match field {
            "username" => Some(&self.username),
            "password" => Some(&self.password),
            "confirm" => Some(&self.confirm),
            "email" => Some(&self.email),
            "first_name" => Some(&self.first_name),
            "last_name" => Some(&self.last_name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl Form for LoginForm {
    const RULES: &'static [FieldRules] = LOGIN_RULES;

    fn value(&self, field: &str) -> Option<&String> {
        match field {
            "username" => Some(&self.username),
            "password" => Some(&self.password),
            _ => None,
        }
    }
}

/// Used both to add a feedback and to update one.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedbackForm {
    pub title: String,
    pub content: String,
}

impl FeedbackForm {
    pub fn from_feedback(feedback: &Feedback) -> Self {
        FeedbackForm {
            title: feedback.title.clone(),
            content: feedback.content.clone(),
        }
    }
}

impl Form for FeedbackForm {
    const RULES: &'static [FieldRules] = FEEDBACK_RULES;

    fn value(&self, field: &str) -> Option<&String> {
        match field {
            "title" => Some(&self.title),
            "content" => Some(&self.content),
            _ => None,
        }
    }
}
