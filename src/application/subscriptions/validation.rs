//! Request validation
//!
//! Field rules live on the DTOs as `validator` attributes; the cross-field
//! rules below are attached with `#[validate(schema(...))]`. All checks run,
//! then [`classify`] turns the collected errors into a single [`DomainError`]
//! so callers can tell a bad date range or an empty patch from other problems.

use std::borrow::Cow;

use validator::{Validate, ValidationError, ValidationErrors};

use super::dto::{CreateSubscriptionRequest, TotalCostQuery, UpdateSubscriptionRequest};
use crate::domain::{ensure_valid_range, DomainError, DomainResult};

pub const INVALID_RANGE: &str = "invalid_range";
pub const EMPTY_PATCH: &str = "empty_patch";

fn schema_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

pub(crate) fn validate_create_range(req: &CreateSubscriptionRequest) -> Result<(), ValidationError> {
    ensure_valid_range(req.start_date, req.end_date)
        .map_err(|_| schema_error(INVALID_RANGE, "end date cannot be before start date"))
}

pub(crate) fn validate_patch_not_empty(req: &UpdateSubscriptionRequest) -> Result<(), ValidationError> {
    if req.service_name.is_none() && req.price.is_none() && req.end_date.is_none() {
        return Err(schema_error(EMPTY_PATCH, "at least one field must be provided"));
    }
    Ok(())
}

pub(crate) fn validate_filter_range(q: &TotalCostQuery) -> Result<(), ValidationError> {
    match q.start_date {
        Some(start) => ensure_valid_range(start, q.end_date)
            .map_err(|_| schema_error(INVALID_RANGE, "end date cannot be before start date")),
        None => Ok(()),
    }
}

/// Collapses collected validation errors into one domain error.
///
/// A bad date range wins over an empty patch, which wins over plain field
/// errors. Plain field errors are reported together.
pub fn classify(errors: &ValidationErrors) -> DomainError {
    let mut messages = Vec::new();
    let mut invalid_range = false;
    let mut empty_patch = false;

    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    for (field, errs) in fields {
        for e in errs.iter() {
            match e.code.as_ref() {
                INVALID_RANGE => invalid_range = true,
                EMPTY_PATCH => empty_patch = true,
                _ => {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    messages.push(format!("{}: {}", field, msg));
                }
            }
        }
    }

    if invalid_range {
        DomainError::InvalidDateRange
    } else if empty_patch {
        DomainError::EmptyPatch
    } else if messages.is_empty() {
        DomainError::Validation("validation failed".to_string())
    } else {
        DomainError::Validation(messages.join("; "))
    }
}

/// Runs every rule on `req`.
pub fn validate_request<T: Validate>(req: &T) -> DomainResult<()> {
    req.validate().map_err(|errors| classify(&errors))
}
