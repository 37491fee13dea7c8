//! Request DTOs for the expense tracker API
//!
//! Defines the structure of incoming HTTP request bodies and query strings,
//! and validates them before they reach the ledger.

use std::borrow::Cow;

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{AppError, Result};
use crate::models::{
    Importance, NewCategory, NewTransaction, Transaction, TransactionType,
    DEFAULT_CATEGORY_COLOR,
};

/// Largest amount accepted for a transaction.
pub const MAX_AMOUNT: f64 = 999_999_999.0;

// == Custom Validators ==
fn rejection(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn validate_password_strength(password: &str) -> std::result::Result<(), ValidationError> {
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if has_lower && has_upper && has_digit {
        Ok(())
    } else {
        Err(rejection(
            "password_strength",
            "Password must contain at least one uppercase letter, one lowercase letter, and one number",
        ))
    }
}

fn validate_nickname(nickname: &str) -> std::result::Result<(), ValidationError> {
    if nickname
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ' ')
    {
        Ok(())
    } else {
        Err(rejection(
            "nickname_chars",
            "Nickname can only contain letters, numbers, underscores, and spaces",
        ))
    }
}

fn validate_category_name(name: &str) -> std::result::Result<(), ValidationError> {
    if name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '&' | '-'))
    {
        Ok(())
    } else {
        Err(rejection(
            "category_name_chars",
            "Category name contains invalid characters",
        ))
    }
}

fn validate_hex_color(color: &str) -> std::result::Result<(), ValidationError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(rejection("color", "Color must be a hex value like #007AFF"))
    }
}

fn validate_uuid(value: &str) -> std::result::Result<(), ValidationError> {
    Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| rejection("uuid", "Invalid category ID"))
}

fn validate_iso_date(value: &str) -> std::result::Result<(), ValidationError> {
    value
        .parse::<NaiveDate>()
        .map(|_| ())
        .map_err(|_| rejection("date", "Invalid date format"))
}

// == Helpers ==
/// Trims and lowercases an email so it can be compared and used as a key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Runs `Validate` and turns the first failure into an `InvalidRequest`.
pub fn validate_request<T: Validate>(request: &T) -> Result<()> {
    request
        .validate()
        .map_err(|errors| AppError::InvalidRequest(first_message(&errors)))
}

fn first_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .first()
        .and_then(|(field, errs)| {
            errs.first().map(|err| match &err.message {
                Some(message) => message.to_string(),
                None => format!("Invalid {field}"),
            })
        })
        .unwrap_or_else(|| "Validation failed".to_string())
}

// == Auth ==
/// Request body for POST /auth/sign-up
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email too long")
    )]
    pub email: String,
    #[validate(
        length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"),
        custom(function = "validate_password_strength")
    )]
    pub password: String,
    #[validate(
        length(min = 1, max = 50, message = "Nickname must be between 1 and 50 characters"),
        custom(function = "validate_nickname")
    )]
    pub nickname: String,
}

impl SignUpRequest {
    /// Normalizes the email and trims the nickname.
    pub fn normalized(self) -> Self {
        Self {
            email: normalize_email(&self.email),
            nickname: self.nickname.trim().to_string(),
            password: self.password,
        }
    }
}

/// Request body for POST /auth/sign-in
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl SignInRequest {
    pub fn normalized(self) -> Self {
        Self {
            email: normalize_email(&self.email),
            password: self.password,
        }
    }
}

/// Request body for PATCH /users/:user_id/profile
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(
        length(min = 1, max = 50, message = "Nickname must be between 1 and 50 characters"),
        custom(function = "validate_nickname")
    )]
    pub nickname: String,
}

// == Categories ==
/// Request body for POST /users/:user_id/categories
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(
        length(min = 1, max = 50, message = "Category name must be between 1 and 50 characters"),
        custom(function = "validate_category_name")
    )]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[validate(length(min = 1, max = 50, message = "Icon name must be between 1 and 50 characters"))]
    #[serde(default)]
    pub icon: Option<String>,
    #[validate(custom(function = "validate_hex_color"))]
    #[serde(default)]
    pub color: Option<String>,
}

impl CreateCategoryRequest {
    /// Validates and converts the request into ledger fields.
    pub fn into_new_category(self) -> Result<NewCategory> {
        let request = Self {
            name: self.name.trim().to_string(),
            ..self
        };
        validate_request(&request)?;

        Ok(NewCategory {
            name: request.name,
            kind: request.kind,
            color: request
                .color
                .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
            icon: request.icon,
            is_default: false,
        })
    }
}

// == Transactions ==
/// Request body for POST /users/:user_id/transactions
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    #[validate(range(
        exclusive_min = 0.0,
        max = 999_999_999.0,
        message = "Amount must be positive and at most 999999999"
    ))]
    pub amount: f64,
    #[validate(length(min = 1, max = 255, message = "Description must be between 1 and 255 characters"))]
    pub description: String,
    #[validate(custom(function = "validate_uuid"))]
    pub category_id: String,
    #[validate(custom(function = "validate_iso_date"))]
    pub transaction_date: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub importance: Option<Importance>,
}

impl CreateTransactionRequest {
    /// Validates and converts the request into ledger fields.
    pub fn into_new_transaction(self) -> Result<NewTransaction> {
        let request = Self {
            description: self.description.trim().to_string(),
            ..self
        };
        validate_request(&request)?;

        let category_id = Uuid::parse_str(&request.category_id)
            .map_err(|_| AppError::InvalidRequest("Invalid category ID".to_string()))?;
        let transaction_date = request
            .transaction_date
            .parse::<NaiveDate>()
            .map_err(|_| AppError::InvalidRequest("Invalid date format".to_string()))?;

        Ok(NewTransaction {
            category_id,
            kind: request.kind,
            amount: request.amount,
            description: request.description,
            importance: request.importance,
            transaction_date,
        })
    }
}

/// Query string for GET /users/:user_id/transactions
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionFilter {
    #[serde(rename = "type", default)]
    pub kind: Option<TransactionType>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
}

impl TransactionFilter {
    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.kind.map_or(true, |kind| transaction.kind == kind)
            && self
                .start_date
                .map_or(true, |start| transaction.transaction_date >= start)
            && self
                .end_date
                .map_or(true, |end| transaction.transaction_date <= end)
            && self
                .category_id
                .map_or(true, |id| transaction.category_id == id)
    }
}

/// Query string for GET /users/:user_id/summary
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}
