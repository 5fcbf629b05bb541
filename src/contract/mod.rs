//! Wire types of the invoice contract.
//!
//! Message variants are externally tagged with the names the deployed
//! contract derives (`CreateInvoice`, `GetInvoice`, ...); fields are
//! snake_case. Integer amounts travel as decimal strings.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub mod builder;
pub use builder::*;

pub const DEFAULT_DENOM: &str = "uxion";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub u64);

impl fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for InvoiceId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(InvoiceId)
    }
}

/// Integer amount in the chain's base denomination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Amount(pub u128);

impl Amount {
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u128>().map(Amount)
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Amount(value)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount(u128::from(value))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<Amount>()
            .map_err(|e| serde::de::Error::custom(format!("invalid amount {:?}: {}", raw, e)))
    }
}

/// Due date as stored on chain: milliseconds since the unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DueDate(pub u64);

impl DueDate {
    pub fn from_datetime(at: DateTime<Utc>) -> Option<Self> {
        u64::try_from(at.timestamp_millis()).ok().map(DueDate)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.0)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
    }
}

impl fmt::Display for DueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(at) => write!(f, "{}", at.to_rfc3339_opts(SecondsFormat::Secs, true)),
            None => write!(f, "{}ms", self.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: Amount,
}

impl Coin {
    pub fn new(amount: impl Into<Amount>, denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Client side projection of an on-chain invoice. `recipient` is the
/// address expected to pay it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    #[serde(default)]
    pub issuer: String,
    pub recipient: String,
    pub amount: Amount,
    pub description: String,
    pub due_date: DueDate,
    pub is_paid: bool,
}

impl Invoice {
    pub fn status(&self) -> &'static str {
        if self.is_paid {
            "Paid"
        } else {
            "Unpaid"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecuteMsg {
    CreateInvoice {
        recipient: String,
        amount: Amount,
        description: String,
        due_date: DueDate,
    },
    PayInvoice {
        invoice_id: InvoiceId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryMsg {
    GetInvoice { invoice_id: InvoiceId },
    GetInvoicesByUser { user: String },
}

/// Explicit fee for a transaction. With a `granter` the fee is drawn from
/// that account's allowance instead of the sender's balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdFee {
    pub amount: Vec<Coin>,
    pub gas: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fee {
    /// Let the signer simulate and estimate.
    Auto,
    Explicit(StdFee),
}

impl Serialize for Fee {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Fee::Auto => serializer.serialize_str("auto"),
            Fee::Explicit(fee) => fee.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Fee {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawFee {
            Tag(String),
            Explicit(StdFee),
        }

        match RawFee::deserialize(deserializer)? {
            RawFee::Tag(tag) if tag == "auto" => Ok(Fee::Auto),
            RawFee::Tag(tag) => Err(serde::de::Error::custom(format!(
                "unknown fee mode {:?}",
                tag
            ))),
            RawFee::Explicit(fee) => Ok(Fee::Explicit(fee)),
        }
    }
}

/// Deployment policy for the execution parameters pinned on invoice
/// creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionParams {
    #[serde(default = "ExecutionParams::default_gas")]
    pub gas: u64,
    #[serde(default = "ExecutionParams::default_amount")]
    pub amount: u64,
    #[serde(default = "ExecutionParams::default_denom")]
    pub denom: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granter: Option<String>,
}

impl ExecutionParams {
    fn default_gas() -> u64 {
        500_000
    }

    fn default_amount() -> u64 {
        100
    }

    fn default_denom() -> String {
        DEFAULT_DENOM.to_string()
    }

    pub fn as_fee(&self) -> Fee {
        Fee::Explicit(StdFee {
            amount: vec![Coin::new(self.amount, self.denom.clone())],
            gas: self.gas.to_string(),
            granter: self.granter.clone(),
        })
    }
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            gas: Self::default_gas(),
            amount: Self::default_amount(),
            denom: Self::default_denom(),
            granter: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_execute_msg_shape() {
        let msg = ExecuteMsg::CreateInvoice {
            recipient: "xion1payer".into(),
            amount: Amount(30),
            description: "Consulting".into(),
            due_date: DueDate(1_700_000_000_000),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "CreateInvoice": {
                    "recipient": "xion1payer",
                    "amount": "30",
                    "description": "Consulting",
                    "due_date": 1_700_000_000_000_u64
                }
            })
        );

        let pay = ExecuteMsg::PayInvoice {
            invoice_id: InvoiceId(7),
        };
        assert_eq!(
            serde_json::to_value(&pay).unwrap(),
            json!({"PayInvoice": {"invoice_id": 7}})
        );
    }

    #[test]
    fn test_query_msg_shape() {
        let query = QueryMsg::GetInvoice {
            invoice_id: InvoiceId(42),
        };
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({"GetInvoice": {"invoice_id": 42}})
        );
    }

    #[test]
    fn test_invoice_from_query_response() {
        let raw = json!({
            "id": 3,
            "issuer": "xion1issuer",
            "recipient": "xion1payer",
            "amount": "250",
            "description": "Hosting",
            "due_date": 1_700_000_000_000_u64,
            "is_paid": false
        });
        let invoice: Invoice = serde_json::from_value(raw).unwrap();
        assert_eq!(invoice.id, InvoiceId(3));
        assert_eq!(invoice.amount, Amount(250));
        assert_eq!(invoice.status(), "Unpaid");
        assert_eq!(invoice.due_date.to_string(), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_amount_rejects_numbers_and_garbage() {
        assert!(serde_json::from_value::<Amount>(json!(12)).is_err());
        assert!(serde_json::from_value::<Amount>(json!("12.5")).is_err());
        assert_eq!(
            serde_json::from_value::<Amount>(json!("12")).unwrap(),
            Amount(12)
        );
    }

    #[test]
    fn test_fee_serialization() {
        assert_eq!(serde_json::to_value(&Fee::Auto).unwrap(), json!("auto"));

        let params = ExecutionParams {
            granter: Some("xion1treasury".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&params.as_fee()).unwrap(),
            json!({
                "amount": [{"denom": "uxion", "amount": "100"}],
                "gas": "500000",
                "granter": "xion1treasury"
            })
        );

        let fee: Fee = serde_json::from_value(json!("auto")).unwrap();
        assert_eq!(fee, Fee::Auto);
        assert!(serde_json::from_value::<Fee>(json!("manual")).is_err());
    }
}
