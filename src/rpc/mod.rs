//! HTTP adapters for the chain: an LCD client for smart queries and a client
//! for a signing-session daemon that holds the user's wallet.

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::chain::{CapabilityError, CapabilityResult, QueryCapability, SigningCapability, TxResult};
use crate::contract::{Coin, Fee};

#[derive(Error, Debug)]
pub enum RpcError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Request failed with status {status}")]
    Status { status: u16, body: String },
}

pub type RpcResult<T> = std::result::Result<T, RpcError>;

/// Error body shared by the LCD (`{code, message, details}`) and the signing
/// daemon (`{message, response}`).
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    response: Option<Value>,
    #[serde(default)]
    details: Option<Value>,
}

impl From<RpcError> for CapabilityError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Status { status, body } => match serde_json::from_str::<ErrorBody>(&body) {
                Ok(parsed) => {
                    let detail = parsed
                        .response
                        .or(parsed.details)
                        .filter(|v| !v.is_null() && v.as_array().map_or(true, |a| !a.is_empty()))
                        .map(|v| match v {
                            Value::String(s) => s,
                            other => other.to_string(),
                        });
                    CapabilityError {
                        message: parsed.message,
                        response: detail,
                    }
                }
                Err(_) => CapabilityError::new(format!("Request failed with status {}", status))
                    .with_response(body),
            },
            other => CapabilityError::new(other.to_string()),
        }
    }
}

fn http_client(timeout: Duration) -> RpcResult<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

async fn read_json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> RpcResult<T> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(RpcError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

#[derive(Debug, Deserialize)]
struct SmartQueryResponse {
    data: Value,
}

/// Query-only client against a Cosmos LCD endpoint.
#[derive(Clone, Debug)]
pub struct LcdClient {
    client: reqwest::Client,
    url: String,
}

impl LcdClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> RpcResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            url: url.into(),
        })
    }

    pub fn smart_query_url(&self, contract: &str, query: &Value) -> RpcResult<String> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(serde_json::to_vec(query)?);
        Ok(join_url(
            &self.url,
            &format!("cosmwasm/wasm/v1/contract/{}/smart/{}", contract, encoded),
        ))
    }

    pub async fn smart_query(&self, contract: &str, query: &Value) -> RpcResult<Value> {
        let url = self.smart_query_url(contract, query)?;
        debug!(%url, "smart query");
        let response = self.client.get(url).send().await?;
        let parsed: SmartQueryResponse = read_json(response).await?;
        Ok(parsed.data)
    }
}

#[async_trait]
impl QueryCapability for LcdClient {
    async fn query_contract_smart(
        &self,
        contract: &str,
        query: &Value,
    ) -> CapabilityResult<Value> {
        self.smart_query(contract, query).await.map_err(Into::into)
    }
}

#[derive(Debug, Serialize)]
struct ExecuteBody<'a> {
    sender: &'a str,
    contract: &'a str,
    msg: &'a Value,
    fee: &'a Fee,
    memo: &'a str,
    funds: &'a [Coin],
}

#[derive(Debug, Serialize)]
struct QueryBody<'a> {
    contract: &'a str,
    query: &'a Value,
}

/// Client for a local signing-session daemon. The daemon owns keys and
/// session state; this side only forwards execute and query requests.
#[derive(Clone, Debug)]
pub struct RemoteSigner {
    client: reqwest::Client,
    url: String,
}

impl RemoteSigner {
    pub fn new(url: impl Into<String>, timeout: Duration) -> RpcResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            url: url.into(),
        })
    }

    async fn post<T: for<'de> Deserialize<'de>, P: Serialize>(
        &self,
        path: &str,
        payload: &P,
    ) -> RpcResult<T> {
        let url = join_url(&self.url, path);
        debug!(%url, "signer request");
        let response = self.client.post(url).json(payload).send().await?;
        read_json(response).await
    }
}

#[async_trait]
impl QueryCapability for RemoteSigner {
    async fn query_contract_smart(
        &self,
        contract: &str,
        query: &Value,
    ) -> CapabilityResult<Value> {
        self.post("query", &QueryBody { contract, query })
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl SigningCapability for RemoteSigner {
    async fn execute(
        &self,
        sender: &str,
        contract: &str,
        msg: &Value,
        fee: &Fee,
        memo: &str,
        funds: &[Coin],
    ) -> CapabilityResult<TxResult> {
        let body = ExecuteBody {
            sender,
            contract,
            msg,
            fee,
            memo,
            funds,
        };
        self.post("execute", &body).await.map_err(Into::into)
    }
}
