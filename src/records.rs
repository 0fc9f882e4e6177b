//! Finance record access
//!
//! Thin typed wrappers over the generic CRUD endpoints. Every call goes
//! through the authenticated client, so the session precondition and refresh
//! checks apply uniformly.

use reqwest::Method;

use moneta_protocol::{
    Account, CreateAccountRequest, CreateExpenseRequest, CreateRevenueRequest, Expense, Loan,
    Revenue, Transfer,
};

use crate::client::ApiClient;
use crate::error::Result;
use crate::permissions::ResourceKind;

/// Typed access to the finance record collections
pub struct RecordService;

impl RecordService {
    pub fn new() -> Self {
        Self
    }

    pub async fn list_accounts(&self, client: &impl ApiClient) -> Result<Vec<Account>> {
        client.get_json(ResourceKind::Accounts.endpoint()).await
    }

    pub async fn list_revenues(&self, client: &impl ApiClient) -> Result<Vec<Revenue>> {
        client.get_json(ResourceKind::Revenues.endpoint()).await
    }

    pub async fn list_expenses(&self, client: &impl ApiClient) -> Result<Vec<Expense>> {
        client.get_json(ResourceKind::Expenses.endpoint()).await
    }

    pub async fn list_transfers(&self, client: &impl ApiClient) -> Result<Vec<Transfer>> {
        client.get_json(ResourceKind::Transfers.endpoint()).await
    }

    pub async fn list_loans(&self, client: &impl ApiClient) -> Result<Vec<Loan>> {
        client.get_json(ResourceKind::Loans.endpoint()).await
    }

    pub async fn create_account(
        &self,
        client: &impl ApiClient,
        request: &CreateAccountRequest,
    ) -> Result<Account> {
        self.create(client, ResourceKind::Accounts, request).await
    }

    pub async fn create_expense(
        &self,
        client: &impl ApiClient,
        request: &CreateExpenseRequest,
    ) -> Result<Expense> {
        self.create(client, ResourceKind::Expenses, request).await
    }

    pub async fn create_revenue(
        &self,
        client: &impl ApiClient,
        request: &CreateRevenueRequest,
    ) -> Result<Revenue> {
        self.create(client, ResourceKind::Revenues, request).await
    }

    pub async fn delete(
        &self,
        client: &impl ApiClient,
        kind: ResourceKind,
        id: u64,
    ) -> Result<()> {
        let endpoint = format!("{}{}/", kind.endpoint(), id);
        client
            .authenticated_request::<(), serde_json::Value>(Method::DELETE, &endpoint, None)
            .await?;
        Ok(())
    }

    async fn create<T, R>(
        &self,
        client: &impl ApiClient,
        kind: ResourceKind,
        request: &T,
    ) -> Result<R>
    where
        T: serde::Serialize + Send + Sync + 'static,
        R: serde::de::DeserializeOwned + Send + 'static,
    {
        client
            .authenticated_request(Method::POST, kind.endpoint(), Some(request))
            .await?
            .ok_or_else(|| {
                crate::error::MonetaError::invalid_response(
                    204,
                    format!("Empty response creating {kind}"),
                )
            })
    }
}

impl Default for RecordService {
    fn default() -> Self {
        Self::new()
    }
}
