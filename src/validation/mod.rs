use bigdecimal::{BigDecimal, Zero};
use serde_json::Value;
use std::fmt;

use crate::domain::PaymentMethod;

pub const AMOUNT_SCALE: i64 = 2;
pub const ADMIN_NOTE_MAX_LEN: usize = 500;
pub const DESCRIPTION_MAX_LEN: usize = 255;
pub const UPI_ID_MAX_LEN: usize = 64;
pub const ACCOUNT_HOLDER_MAX_LEN: usize = 100;
pub const ACCOUNT_NUMBER_MIN_LEN: usize = 6;
pub const ACCOUNT_NUMBER_MAX_LEN: usize = 20;
pub const IFSC_CODE_LEN: usize = 11;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

/// Whitespace runs (tabs and newlines included) collapse to one space; other
/// control characters are dropped.
pub fn sanitize_string(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| word.chars().filter(|ch| !ch.is_control()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.chars().count() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

/// Positive and representable in the ledger's two-decimal columns.
pub fn validate_amount(field: &'static str, amount: &BigDecimal) -> ValidationResult {
    if amount <= &BigDecimal::zero() {
        return Err(ValidationError::new(field, "must be greater than zero"));
    }

    if &amount.with_scale(AMOUNT_SCALE) != amount {
        return Err(ValidationError::new(
            field,
            format!("must have at most {} decimal places", AMOUNT_SCALE),
        ));
    }

    Ok(())
}

pub fn validate_admin_note(note: &str) -> ValidationResult {
    validate_required("note", note)?;
    validate_max_len("note", note, ADMIN_NOTE_MAX_LEN)
}

/// Checks the payout details for `method` and returns them normalized
/// (sanitized strings, no extra keys).
pub fn validate_payment_details(method: PaymentMethod, details: &Value) -> Result<Value, ValidationError> {
    let object = details
        .as_object()
        .ok_or_else(|| ValidationError::new("payment_details", "must be an object"))?;

    let field = |name: &'static str| -> Result<String, ValidationError> {
        let value = object
            .get(name)
            .and_then(Value::as_str)
            .map(sanitize_string)
            .unwrap_or_default();
        validate_required(name, &value)?;
        Ok(value)
    };

    match method {
        PaymentMethod::Upi => {
            let upi_id = field("upi_id")?;
            validate_max_len("upi_id", &upi_id, UPI_ID_MAX_LEN)?;
            validate_upi_id(&upi_id)?;
            Ok(serde_json::json!({ "upi_id": upi_id }))
        }
        PaymentMethod::Bank => {
            let holder = field("account_holder_name")?;
            validate_max_len("account_holder_name", &holder, ACCOUNT_HOLDER_MAX_LEN)?;

            let account_number = field("account_number")?;
            validate_account_number(&account_number)?;

            let ifsc_code = field("ifsc_code")?.to_ascii_uppercase();
            validate_ifsc_code(&ifsc_code)?;

            Ok(serde_json::json!({
                "account_holder_name": holder,
                "account_number": account_number,
                "ifsc_code": ifsc_code,
            }))
        }
    }
}

/// `name@handle`, both parts non-empty, no whitespace.
pub fn validate_upi_id(upi_id: &str) -> ValidationResult {
    let mut parts = upi_id.splitn(2, '@');
    let name = parts.next().unwrap_or_default();
    let handle = parts.next().unwrap_or_default();

    if name.is_empty() || handle.is_empty() || handle.contains('@') || upi_id.contains(' ') {
        return Err(ValidationError::new("upi_id", "must look like name@handle"));
    }

    Ok(())
}

pub fn validate_account_number(account_number: &str) -> ValidationResult {
    let len = account_number.len();
    if !account_number.chars().all(|ch| ch.is_ascii_digit())
        || !(ACCOUNT_NUMBER_MIN_LEN..=ACCOUNT_NUMBER_MAX_LEN).contains(&len)
    {
        return Err(ValidationError::new(
            "account_number",
            format!(
                "must be {} to {} digits",
                ACCOUNT_NUMBER_MIN_LEN, ACCOUNT_NUMBER_MAX_LEN
            ),
        ));
    }

    Ok(())
}

/// Four letters, a zero, six alphanumerics.
pub fn validate_ifsc_code(ifsc_code: &str) -> ValidationResult {
    let bytes = ifsc_code.as_bytes();
    let valid = bytes.len() == IFSC_CODE_LEN
        && bytes[..4].iter().all(u8::is_ascii_uppercase)
        && bytes[4] == b'0'
        && bytes[5..]
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());

    if !valid {
        return Err(ValidationError::new(
            "ifsc_code",
            format!("must be a {}-character IFSC code", IFSC_CODE_LEN),
        ));
    }

    Ok(())
}
