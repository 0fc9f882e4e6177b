//! Shared test support and service-level tests


#[cfg(test)]
mod service_tests {
    use serde_json::json;

    use crate::balance::BalanceService;
    use crate::config::ClientConfig;
    use crate::error::ErrorCode;
    use crate::permissions::{fetch_capabilities, Capability, ResourceKind};
    use crate::records::RecordService;

    use super::mocks::MockApiClient;

    fn client() -> MockApiClient {
        MockApiClient::new(ClientConfig::default()).with_auth("alice")
    }

    #[tokio::test]
    async fn test_balance_from_fetched_streams() {
        let client = client();
        client.add_response(
            "/revenues/",
            json!([{"id": 1, "account": 42, "value": 100.0, "description": "salary",
                    "date": "2026-08-01", "received": false}]),
        );
        client.add_response(
            "/expenses/",
            json!([{"id": 1, "account": 42, "value": 30.0, "description": "groceries",
                    "date": "2026-08-02", "payed": false}]),
        );
        client.add_response("/transfers/", json!([]));
        client.add_response("/loans/", json!([]));

        let balance = BalanceService::new().gross(&client, 42).await.unwrap();
        assert_eq!(balance, 70.0);
    }

    #[tokio::test]
    async fn test_balance_fails_whole_when_a_stream_fails() {
        let client = client();
        client.add_response("/revenues/", json!([]));
        client.add_response("/expenses/", json!([]));
        client.fail_endpoint("/transfers/");
        client.add_response("/loans/", json!([]));

        let result = BalanceService::new().gross(&client, 42).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_balance_requires_authentication() {
        let client = MockApiClient::new(ClientConfig::default());
        let err = BalanceService::new().gross(&client, 42).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotAuthenticated);
    }

    #[tokio::test]
    async fn test_fetch_capabilities_resolves_typed_set() {
        let client = client();
        client.add_response(
            "/authentication/user-permissions/",
            json!({
                "is_superuser": false,
                "permissions": ["finance.view_account", "finance.add_expense"],
                "groups": ["members"]
            }),
        );

        let caps = fetch_capabilities(&client).await.unwrap();
        assert!(caps.allows(ResourceKind::Accounts, Capability::Read));
        assert!(caps.allows(ResourceKind::Expenses, Capability::Create));
        assert!(!caps.allows(ResourceKind::Expenses, Capability::Delete));
    }

    #[tokio::test]
    async fn test_list_accounts_deserializes() {
        let client = client();
        client.add_response(
            "/accounts/",
            json!([{"id": 1, "name": "Checking", "description": null}]),
        );

        let accounts = RecordService::new().list_accounts(&client).await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].name, "Checking");
    }
}
