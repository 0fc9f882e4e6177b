//! Typed user capabilities
//!
//! The server reports permissions as Django strings shaped
//! `<app>.<action>_<model>` (e.g. `finance.add_expense`). Those are resolved
//! once, at permission-fetch time, into a closed set of resource kinds and
//! CRUD capabilities; the rest of the client never touches the raw strings.

use std::collections::HashSet;
use std::fmt;

use moneta_protocol::UserPermissionsResponse;

use crate::client::ApiClient;
use crate::error::Result;

/// The resource kinds the API exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Accounts,
    Expenses,
    Revenues,
    CreditCards,
    Loans,
    Transfers,
    Members,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Accounts,
        ResourceKind::Expenses,
        ResourceKind::Revenues,
        ResourceKind::CreditCards,
        ResourceKind::Loans,
        ResourceKind::Transfers,
        ResourceKind::Members,
    ];

    /// Map a Django model name to a resource kind
    fn from_model(model: &str) -> Option<Self> {
        match model {
            "account" => Some(Self::Accounts),
            "expense" => Some(Self::Expenses),
            "revenue" => Some(Self::Revenues),
            "creditcard" => Some(Self::CreditCards),
            "loan" => Some(Self::Loans),
            "transfer" => Some(Self::Transfers),
            "member" => Some(Self::Members),
            _ => None,
        }
    }

    /// API collection path for this kind, e.g. `/expenses/`
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Accounts => "/accounts/",
            Self::Expenses => "/expenses/",
            Self::Revenues => "/revenues/",
            Self::CreditCards => "/credit-cards/",
            Self::Loans => "/loans/",
            Self::Transfers => "/transfers/",
            Self::Members => "/members/",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Accounts => "accounts",
            Self::Expenses => "expenses",
            Self::Revenues => "revenues",
            Self::CreditCards => "credit cards",
            Self::Loans => "loans",
            Self::Transfers => "transfers",
            Self::Members => "members",
        };
        f.write_str(name)
    }
}

/// CRUD capabilities over a resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Create,
    Read,
    Update,
    Delete,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::Create,
        Capability::Read,
        Capability::Update,
        Capability::Delete,
    ];

    /// Map a Django action prefix to a capability
    fn from_action(action: &str) -> Option<Self> {
        match action {
            "add" => Some(Self::Create),
            "view" => Some(Self::Read),
            "change" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// The resolved capability set for one user
#[derive(Debug, Clone, Default)]
pub struct CapabilitySet {
    superuser: bool,
    grants: HashSet<(ResourceKind, Capability)>,
}

impl CapabilitySet {
    /// Resolve the server's permission strings into typed grants
    ///
    /// Unrecognized apps, actions, or models are ignored rather than errors;
    /// the server may carry permissions for models this client does not know.
    pub fn resolve(response: &UserPermissionsResponse) -> Self {
        let mut grants = HashSet::new();

        for entry in &response.permissions {
            let codename = entry
                .split_once('.')
                .map(|(_, c)| c)
                .unwrap_or(entry.as_str());
            let Some((action, model)) = codename.split_once('_') else {
                continue;
            };
            if let (Some(capability), Some(kind)) =
                (Capability::from_action(action), ResourceKind::from_model(model))
            {
                grants.insert((kind, capability));
            }
        }

        Self {
            superuser: response.is_superuser,
            grants,
        }
    }

    pub fn is_superuser(&self) -> bool {
        self.superuser
    }

    /// Whether the user holds a capability; superusers hold everything
    pub fn allows(&self, kind: ResourceKind, capability: Capability) -> bool {
        self.superuser || self.grants.contains(&(kind, capability))
    }

    /// Capabilities held for one resource kind, in CRUD order
    pub fn capabilities_for(&self, kind: ResourceKind) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| self.allows(kind, *c))
            .collect()
    }
}

/// Fetch and resolve the current user's capabilities
pub async fn fetch_capabilities(client: &impl ApiClient) -> Result<CapabilitySet> {
    let response: UserPermissionsResponse =
        client.get_json("/authentication/user-permissions/").await?;
    Ok(CapabilitySet::resolve(&response))
}
