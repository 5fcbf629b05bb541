//! Capabilities the invoice client borrows from the wallet/session provider,
//! and the transaction result model it reads back.

mod error;
pub mod mock_chain;

pub use error::*;
pub use mock_chain::{MockChain, MockSigner};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::contract::{Coin, Fee};

/// Read-only access to contract state. Works without a connected wallet.
#[async_trait]
pub trait QueryCapability: Send + Sync {
    async fn query_contract_smart(&self, contract: &str, query: &Value)
        -> CapabilityResult<Value>;
}

/// Ability to submit state changing transactions on behalf of an address.
#[async_trait]
pub trait SigningCapability: QueryCapability {
    async fn execute(
        &self,
        sender: &str,
        contract: &str,
        msg: &Value,
        fee: &Fee,
        memo: &str,
        funds: &[Coin],
    ) -> CapabilityResult<TxResult>;
}

/// What the wallet provider hands over for the current session. Either half
/// may be missing while no wallet is connected.
#[derive(Clone, Default)]
pub struct Session {
    pub signer: Option<Arc<dyn SigningCapability>>,
    pub address: Option<String>,
}

impl Session {
    pub fn connected(signer: Arc<dyn SigningCapability>, address: impl Into<String>) -> Self {
        Self {
            signer: Some(signer),
            address: Some(address.into()),
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    /// The signer and sender address, if both are present.
    pub fn credentials(&self) -> Option<(&dyn SigningCapability, &str)> {
        match (&self.signer, &self.address) {
            (Some(signer), Some(address)) if !address.trim().is_empty() => {
                Some((signer.as_ref(), address.as_str()))
            }
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.credentials().is_some()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("signer", &self.signer.as_ref().map(|_| "<signer>"))
            .field("address", &self.address)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<Attribute>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxLog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<Event>>,
}

/// Result of a broadcast transaction. Every level is optional: nodes and
/// wallet SDKs disagree on which parts they fill in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResult {
    #[serde(
        default,
        alias = "transactionHash",
        skip_serializing_if = "Option::is_none"
    )]
    pub transaction_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,
    #[serde(default, alias = "gasUsed", skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<TxLog>>,
}

impl TxResult {
    /// Looks `key` up among the attributes of the first event of the first
    /// log. Absence at any level yields `None`.
    pub fn first_event_attribute(&self, key: &str) -> Option<&str> {
        self.logs
            .as_ref()?
            .first()?
            .events
            .as_ref()?
            .first()?
            .attributes
            .as_ref()?
            .iter()
            .find(|attr| attr.key == key)
            .map(|attr| attr.value.as_str())
    }
}
