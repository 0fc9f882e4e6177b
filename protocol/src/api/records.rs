//! Finance record API DTOs
//!
//! Payloads for the generic CRUD endpoints under `/api/v1/<resource>/`.

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use crate::common::{Account, Expense, Loan, LoanKind, Revenue, Transfer};

/// Create account request
///
/// Used for POST /api/v1/accounts/
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

/// Create expense request
///
/// Used for POST /api/v1/expenses/
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateExpenseRequest {
    pub account: u64,
    pub value: f64,
    #[validate(length(min = 1, max = 200))]
    pub description: String,
    pub date: chrono::NaiveDate,
    #[serde(rename = "payed")]
    pub paid: bool,
}

/// Create revenue request
///
/// Used for POST /api/v1/revenues/
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateRevenueRequest {
    pub account: u64,
    pub value: f64,
    #[validate(length(min = 1, max = 200))]
    pub description: String,
    pub date: chrono::NaiveDate,
    pub received: bool,
}
