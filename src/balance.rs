//! Derived account balance
//!
//! The balance of an account is a signed, order-independent sum over four
//! record streams: revenues add, expenses subtract, completed transfers
//! subtract on the origin side and add on the destination side, and loans
//! subtract when given and add when received.
//!
//! Two semantics exist in the product and both are exposed rather than
//! guessing which is intended: `gross_balance` sums revenues and expenses
//! regardless of settlement, while `settled_balance` counts only records
//! marked received/paid. Transfers require `completed` in both variants.
//!
//! A balance built from a failed fetch would be silently wrong, so the
//! service fails the whole calculation when any stream cannot be loaded;
//! callers treat that as "unknown", never as zero.

use moneta_protocol::{Expense, Loan, LoanKind, Revenue, Transfer};

use crate::client::ApiClient;
use crate::error::Result;
use crate::records::RecordService;

fn transfer_flow(account_id: u64, transfers: &[Transfer]) -> f64 {
    let outgoing: f64 = transfers
        .iter()
        .filter(|t| t.origin_account == account_id && t.completed)
        .map(|t| t.value)
        .sum();
    let incoming: f64 = transfers
        .iter()
        .filter(|t| t.destination_account == account_id && t.completed)
        .map(|t| t.value)
        .sum();
    incoming - outgoing
}

fn loan_flow(account_id: u64, loans: &[Loan], settled_only: bool) -> f64 {
    loans
        .iter()
        .filter(|l| l.account == account_id && (!settled_only || l.paid))
        .map(|l| match l.kind {
            LoanKind::Given => -l.value,
            LoanKind::Received => l.value,
        })
        .sum()
}

/// Point-in-time balance, ignoring settlement status on revenues and expenses
pub fn gross_balance(
    account_id: u64,
    revenues: &[Revenue],
    expenses: &[Expense],
    transfers: &[Transfer],
    loans: &[Loan],
) -> f64 {
    let revenue_total: f64 = revenues
        .iter()
        .filter(|r| r.account == account_id)
        .map(|r| r.value)
        .sum();
    let expense_total: f64 = expenses
        .iter()
        .filter(|e| e.account == account_id)
        .map(|e| e.value)
        .sum();

    revenue_total - expense_total
        + transfer_flow(account_id, transfers)
        + loan_flow(account_id, loans, false)
}

/// Point-in-time balance counting only settled records
pub fn settled_balance(
    account_id: u64,
    revenues: &[Revenue],
    expenses: &[Expense],
    transfers: &[Transfer],
    loans: &[Loan],
) -> f64 {
    let revenue_total: f64 = revenues
        .iter()
        .filter(|r| r.account == account_id && r.received)
        .map(|r| r.value)
        .sum();
    let expense_total: f64 = expenses
        .iter()
        .filter(|e| e.account == account_id && e.paid)
        .map(|e| e.value)
        .sum();

    revenue_total - expense_total
        + transfer_flow(account_id, transfers)
        + loan_flow(account_id, loans, true)
}

/// Balance computation backed by live API data
pub struct BalanceService {
    records: RecordService,
}

impl BalanceService {
    pub fn new() -> Self {
        Self {
            records: RecordService::new(),
        }
    }

    pub async fn gross(&self, client: &impl ApiClient, account_id: u64) -> Result<f64> {
        let (revenues, expenses, transfers, loans) = self.fetch_streams(client).await?;
        Ok(gross_balance(
            account_id, &revenues, &expenses, &transfers, &loans,
        ))
    }

    pub async fn settled(&self, client: &impl ApiClient, account_id: u64) -> Result<f64> {
        let (revenues, expenses, transfers, loans) = self.fetch_streams(client).await?;
        Ok(settled_balance(
            account_id, &revenues, &expenses, &transfers, &loans,
        ))
    }

    async fn fetch_streams(
        &self,
        client: &impl ApiClient,
    ) -> Result<(Vec<Revenue>, Vec<Expense>, Vec<Transfer>, Vec<Loan>)> {
        // Any failed stream fails the whole calculation
        let revenues = self.records.list_revenues(client).await?;
        let expenses = self.records.list_expenses(client).await?;
        let transfers = self.records.list_transfers(client).await?;
        let loans = self.records.list_loans(client).await?;
        Ok((revenues, expenses, transfers, loans))
    }
}

impl Default for BalanceService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 1).unwrap()
    }

    fn revenue(id: u64, account: u64, value: f64, received: bool) -> Revenue {
        Revenue {
            id,
            account,
            value,
            description: "revenue".to_string(),
            date: day(),
            received,
        }
    }

    fn expense(id: u64, account: u64, value: f64, paid: bool) -> Expense {
        Expense {
            id,
            account,
            value,
            description: "expense".to_string(),
            date: day(),
            paid,
        }
    }

    fn transfer(id: u64, origin: u64, destination: u64, value: f64, completed: bool) -> Transfer {
        Transfer {
            id,
            origin_account: origin,
            destination_account: destination,
            value,
            date: day(),
            completed,
        }
    }

    fn loan(id: u64, account: u64, value: f64, kind: LoanKind, paid: bool) -> Loan {
        Loan {
            id,
            account,
            value,
            description: "loan".to_string(),
            date: day(),
            kind,
            paid,
        }
    }

    #[test]
    fn test_revenue_minus_expense() {
        let balance = gross_balance(
            42,
            &[revenue(1, 42, 100.0, false)],
            &[expense(1, 42, 30.0, false)],
            &[],
            &[],
        );
        assert_eq!(balance, 70.0);
    }

    #[test]
    fn test_additivity_of_revenues() {
        let base = vec![revenue(1, 42, 100.0, true), revenue(2, 42, 55.5, false)];
        let before = gross_balance(42, &base, &[], &[], &[]);

        let mut extended = base.clone();
        extended.push(revenue(3, 42, 10.0, false));
        let after = gross_balance(42, &extended, &[], &[], &[]);

        assert!((after - (before + 10.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_additivity_of_expenses() {
        let base = vec![expense(1, 42, 40.0, true)];
        let before = gross_balance(42, &[], &base, &[], &[]);

        let mut extended = base.clone();
        extended.push(expense(2, 42, 15.0, false));
        let after = gross_balance(42, &[], &extended, &[], &[]);

        assert!((after - (before - 15.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_transfer_signs_per_direction() {
        let transfers = vec![
            transfer(1, 42, 7, 25.0, true),
            transfer(2, 7, 42, 10.0, true),
        ];
        assert_eq!(gross_balance(42, &[], &[], &transfers, &[]), -15.0);
        assert_eq!(gross_balance(7, &[], &[], &transfers, &[]), 15.0);
    }

    #[test]
    fn test_pending_transfer_moves_nothing() {
        let transfers = vec![transfer(1, 42, 7, 25.0, false)];
        assert_eq!(gross_balance(42, &[], &[], &transfers, &[]), 0.0);
        assert_eq!(gross_balance(7, &[], &[], &transfers, &[]), 0.0);
    }

    #[test]
    fn test_loan_signs_per_kind() {
        let loans = vec![
            loan(1, 42, 50.0, LoanKind::Given, false),
            loan(2, 42, 20.0, LoanKind::Received, false),
        ];
        assert_eq!(gross_balance(42, &[], &[], &[], &loans), -30.0);
    }

    #[test]
    fn test_account_isolation() {
        let revenues = vec![revenue(1, 42, 100.0, true), revenue(2, 99, 500.0, true)];
        let expenses = vec![expense(1, 99, 300.0, true)];
        let transfers = vec![transfer(1, 99, 98, 40.0, true)];
        let loans = vec![loan(1, 99, 75.0, LoanKind::Given, true)];

        assert_eq!(
            gross_balance(42, &revenues, &expenses, &transfers, &loans),
            100.0
        );
    }

    #[test]
    fn test_settled_counts_only_settled_records() {
        let revenues = vec![revenue(1, 42, 100.0, true), revenue(2, 42, 40.0, false)];
        let expenses = vec![expense(1, 42, 30.0, true), expense(2, 42, 25.0, false)];

        assert_eq!(gross_balance(42, &revenues, &expenses, &[], &[]), 85.0);
        assert_eq!(settled_balance(42, &revenues, &expenses, &[], &[]), 70.0);
    }

    #[test]
    fn test_order_independence() {
        let mut revenues = vec![
            revenue(1, 42, 10.0, true),
            revenue(2, 42, 20.0, true),
            revenue(3, 42, 30.0, true),
        ];
        let forward = gross_balance(42, &revenues, &[], &[], &[]);
        revenues.reverse();
        let backward = gross_balance(42, &revenues, &[], &[], &[]);
        assert_eq!(forward, backward);
    }
}
