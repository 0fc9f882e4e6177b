//! Finance record structures
//!
//! Domain records as the server serializes them. Monetary values are plain
//! floats, matching the API's JSON representation. The server spells the
//! expense settlement flag `payed`; the rename keeps the Rust field readable.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Accounts
// ============================================================================

/// A cash account (bank account, wallet, card balance)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

// ============================================================================
// Cash-flow records
// ============================================================================

/// Money entering an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Revenue {
    pub id: u64,
    pub account: u64,
    pub value: f64,
    pub description: String,
    pub date: NaiveDate,
    pub received: bool,
}

/// Money leaving an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: u64,
    pub account: u64,
    pub value: f64,
    pub description: String,
    pub date: NaiveDate,
    #[serde(rename = "payed")]
    pub paid: bool,
}

/// Movement between two accounts
///
/// Only completed transfers move money; a pending transfer affects neither
/// side's balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub id: u64,
    pub origin_account: u64,
    pub destination_account: u64,
    pub value: f64,
    pub date: NaiveDate,
    pub completed: bool,
}

/// Direction of a loan relative to the account that recorded it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanKind {
    /// Money lent out of the account
    Given,
    /// Money borrowed into the account
    Received,
}

/// A loan tied to an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: u64,
    pub account: u64,
    pub value: f64,
    pub description: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: LoanKind,
    #[serde(rename = "payed")]
    pub paid: bool,
}
