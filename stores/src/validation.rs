//! Client-side form checks run before anything reaches the gateway.

use std::fmt;

use phillet_types::{RegisterRequest, SendTransactionRequest};

pub const INVALID_ADDRESS: &str = "Please enter a valid address";
pub const INVALID_AMOUNT: &str = "Please enter a valid amount";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters";
pub const PASSWORD_MISMATCH: &str = "Passwords do not match";

const ADDRESS_LEN: std::ops::RangeInclusive<usize> = 26..=42;
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// Every field that failed, in form order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: &'static str) {
        self.0.push(FieldError { field, message });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn for_field(&self, field: &str) -> Option<&'static str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.message)
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            f.write_str(error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Recipient must look like an address and the amount must be a positive number.
pub fn validate_send(request: &SendTransactionRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if !ADDRESS_LEN.contains(&request.to_address.trim().len()) {
        errors.push("to_address", INVALID_ADDRESS);
    }
    let amount_ok = request
        .amount
        .trim()
        .parse::<f64>()
        .is_ok_and(|amount| amount.is_finite() && amount > 0.0);
    if !amount_ok {
        errors.push("amount", INVALID_AMOUNT);
    }
    errors.into_result()
}

/// The registration form as typed, including the confirmation field.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn into_request(self) -> RegisterRequest {
        RegisterRequest {
            email: self.email,
            password: self.password,
            first_name: self.first_name,
            last_name: self.last_name,
        }
    }
}

impl fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

pub fn validate_registration(form: &RegistrationForm) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push("password", PASSWORD_TOO_SHORT);
    }
    if form.password != form.confirm_password {
        errors.push("confirm_password", PASSWORD_MISMATCH);
    }
    errors.into_result()
}
