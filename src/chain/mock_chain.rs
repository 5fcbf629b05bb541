//! In-process stand-in for the chain and the deployed invoice contract.
//!
//! Applies the same rules as the contract (sequence ids from 1, no self
//! invoicing, exact single-coin payment by the recipient, pay once) and
//! records every call so tests can assert what reached the network.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::{
    Attribute, CapabilityError, CapabilityResult, Event, QueryCapability, SigningCapability,
    TxLog, TxResult,
};
use crate::contract::{Amount, Coin, DueDate, ExecuteMsg, Fee, Invoice, InvoiceId, QueryMsg};

pub const MOCK_CONTRACT: &str = "xion1invoicecontract";

const EXECUTE_FAILED: &str = "execute wasm contract failed";
const QUERY_FAILED: &str = "query wasm contract failed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedExecute {
    pub sender: String,
    pub contract: String,
    pub msg: Value,
    pub fee: Fee,
    pub memo: String,
    pub funds: Vec<Coin>,
}

#[derive(Debug, Default)]
struct MockChainState {
    next_id: u64,
    height: u64,
    invoices: BTreeMap<u64, Invoice>,
    by_user: HashMap<String, Vec<u64>>,
    executed: Vec<RecordedExecute>,
    queries: Vec<Value>,
    execute_failures: VecDeque<CapabilityError>,
    query_failures: VecDeque<CapabilityError>,
    strip_logs: bool,
    latency: Option<Duration>,
}

/// Cheap to clone; clones share the same chain state.
#[derive(Debug, Clone)]
pub struct MockChain {
    contract: String,
    state: Arc<Mutex<MockChainState>>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new(MOCK_CONTRACT)
    }
}

impl MockChain {
    pub fn new(contract: impl Into<String>) -> Self {
        let state = MockChainState {
            next_id: 1,
            ..Default::default()
        };
        Self {
            contract: contract.into(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn contract(&self) -> &str {
        &self.contract
    }

    /// A signing capability bound to `address`.
    pub fn signer(&self, address: impl Into<String>) -> MockSigner {
        MockSigner {
            chain: self.clone(),
            address: address.into(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockChainState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn executions(&self) -> Vec<RecordedExecute> {
        self.lock().executed.clone()
    }

    pub fn execute_count(&self) -> usize {
        self.lock().executed.len()
    }

    pub fn queries(&self) -> Vec<Value> {
        self.lock().queries.clone()
    }

    pub fn query_count(&self) -> usize {
        self.lock().queries.len()
    }

    pub fn invoice(&self, id: InvoiceId) -> Option<Invoice> {
        self.lock().invoices.get(&id.0).cloned()
    }

    /// Seeds an invoice directly into contract storage.
    pub fn insert_invoice(&self, invoice: Invoice) {
        let mut state = self.lock();
        state.next_id = state.next_id.max(invoice.id.0 + 1);
        state
            .by_user
            .entry(invoice.issuer.clone())
            .or_default()
            .push(invoice.id.0);
        state.invoices.insert(invoice.id.0, invoice);
    }

    /// Makes the next execute fail with `err` after it has been recorded.
    pub fn fail_next_execute(&self, err: CapabilityError) {
        self.lock().execute_failures.push_back(err);
    }

    pub fn fail_next_query(&self, err: CapabilityError) {
        self.lock().query_failures.push_back(err);
    }

    /// Successful transactions come back without any logs.
    pub fn strip_logs(&self, strip: bool) {
        self.lock().strip_logs = strip;
    }

    /// Delay applied before every call is served.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.lock().latency = latency;
    }

    async fn simulate_latency(&self) {
        let latency = self.lock().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn run_query(&self, contract: &str, query: &Value) -> CapabilityResult<Value> {
        let mut state = self.lock();
        state.queries.push(query.clone());
        if let Some(err) = state.query_failures.pop_front() {
            return Err(err);
        }
        if contract != self.contract {
            return Err(CapabilityError::new(QUERY_FAILED)
                .with_response(format!("no such contract: {}", contract)));
        }
        let msg: QueryMsg = serde_json::from_value(query.clone()).map_err(|e| {
            CapabilityError::new(QUERY_FAILED)
                .with_response(format!("Error parsing into type QueryMsg: {}", e))
        })?;
        let encoded = match msg {
            QueryMsg::GetInvoice { invoice_id } => {
                let invoice = state
                    .invoices
                    .get(&invoice_id.0)
                    .ok_or_else(|| not_found(QUERY_FAILED, invoice_id))?;
                serde_json::to_value(invoice)
            }
            QueryMsg::GetInvoicesByUser { user } => {
                let invoices = state
                    .by_user
                    .get(&user)
                    .map(|ids| {
                        ids.iter()
                            .filter_map(|id| state.invoices.get(id).cloned())
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                serde_json::to_value(invoices)
            }
        };
        encoded.map_err(|e| CapabilityError::new(QUERY_FAILED).with_response(e.to_string()))
    }

    fn run_execute(
        &self,
        sender: &str,
        contract: &str,
        msg: &Value,
        fee: &Fee,
        memo: &str,
        funds: &[Coin],
    ) -> CapabilityResult<TxResult> {
        let mut state = self.lock();
        state.executed.push(RecordedExecute {
            sender: sender.to_string(),
            contract: contract.to_string(),
            msg: msg.clone(),
            fee: fee.clone(),
            memo: memo.to_string(),
            funds: funds.to_vec(),
        });
        if let Some(err) = state.execute_failures.pop_front() {
            return Err(err);
        }
        if contract != self.contract {
            return Err(CapabilityError::new(EXECUTE_FAILED)
                .with_response(format!("no such contract: {}", contract)));
        }
        let msg: ExecuteMsg = serde_json::from_value(msg.clone()).map_err(|e| {
            CapabilityError::new(EXECUTE_FAILED)
                .with_response(format!("Error parsing into type ExecuteMsg: {}", e))
        })?;

        let attributes = match msg {
            ExecuteMsg::CreateInvoice {
                recipient,
                amount,
                description,
                due_date,
            } => create_invoice(&mut state, sender, recipient, amount, description, due_date)?,
            ExecuteMsg::PayInvoice { invoice_id } => {
                pay_invoice(&mut state, sender, invoice_id, funds)?
            }
        };

        state.height += 1;
        let height = state.height;
        let logs = if state.strip_logs {
            vec![]
        } else {
            let mut all = vec![Attribute {
                key: "_contract_address".into(),
                value: self.contract.clone(),
            }];
            all.extend(attributes);
            vec![TxLog {
                events: Some(vec![Event {
                    kind: Some("wasm".into()),
                    attributes: Some(all),
                }]),
            }]
        };
        Ok(TxResult {
            transaction_hash: Some(format!("{:064X}", height)),
            height: Some(height),
            gas_used: Some(150_000),
            logs: Some(logs),
        })
    }
}

fn contract_error(reason: &str) -> CapabilityError {
    CapabilityError::new(EXECUTE_FAILED).with_response(format!("Generic error: {}", reason))
}

fn not_found(message: &str, id: InvoiceId) -> CapabilityError {
    CapabilityError::new(message).with_response(format!(
        "type: xion_invoice::Invoice; key: {} not found",
        id
    ))
}

fn attr(key: &str, value: impl Into<String>) -> Attribute {
    Attribute {
        key: key.to_string(),
        value: value.into(),
    }
}

fn create_invoice(
    state: &mut MockChainState,
    sender: &str,
    recipient: String,
    amount: Amount,
    description: String,
    due_date: DueDate,
) -> CapabilityResult<Vec<Attribute>> {
    if recipient.is_empty() || recipient != recipient.to_lowercase() {
        return Err(contract_error("Invalid input: address not normalized"));
    }
    if recipient == sender {
        return Err(contract_error("Cannot create invoice for yourself"));
    }
    if amount.is_zero() {
        return Err(contract_error("Amount must be greater than 0"));
    }

    let id = state.next_id;
    state.invoices.insert(
        id,
        Invoice {
            id: InvoiceId(id),
            issuer: sender.to_string(),
            recipient: recipient.clone(),
            amount,
            description,
            due_date,
            is_paid: false,
        },
    );
    state.by_user.entry(sender.to_string()).or_default().push(id);
    state.next_id += 1;

    Ok(vec![
        attr("method", "create_invoice"),
        attr("invoice_id", id.to_string()),
        attr("recipient", recipient),
    ])
}

fn pay_invoice(
    state: &mut MockChainState,
    sender: &str,
    invoice_id: InvoiceId,
    funds: &[Coin],
) -> CapabilityResult<Vec<Attribute>> {
    let invoice = state
        .invoices
        .get_mut(&invoice_id.0)
        .ok_or_else(|| not_found(EXECUTE_FAILED, invoice_id))?;
    if invoice.is_paid {
        return Err(contract_error("Invoice is already paid"));
    }
    if invoice.recipient != sender {
        return Err(contract_error("Only the recipient can pay this invoice"));
    }
    if funds.len() != 1 || funds[0].amount != invoice.amount {
        return Err(contract_error("Incorrect payment amount"));
    }
    invoice.is_paid = true;

    Ok(vec![
        attr("method", "pay_invoice"),
        attr("invoice_id", invoice_id.to_string()),
    ])
}

/// Signing capability of a single address on a [`MockChain`].
#[derive(Debug, Clone)]
pub struct MockSigner {
    chain: MockChain,
    address: String,
}

impl MockSigner {
    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl QueryCapability for MockChain {
    async fn query_contract_smart(
        &self,
        contract: &str,
        query: &Value,
    ) -> CapabilityResult<Value> {
        self.simulate_latency().await;
        self.run_query(contract, query)
    }
}

#[async_trait]
impl QueryCapability for MockSigner {
    async fn query_contract_smart(
        &self,
        contract: &str,
        query: &Value,
    ) -> CapabilityResult<Value> {
        self.chain.query_contract_smart(contract, query).await
    }
}

#[async_trait]
impl SigningCapability for MockSigner {
    async fn execute(
        &self,
        sender: &str,
        contract: &str,
        msg: &Value,
        fee: &Fee,
        memo: &str,
        funds: &[Coin],
    ) -> CapabilityResult<TxResult> {
        if sender != self.address {
            return Err(CapabilityError::new(format!(
                "signer for {} cannot sign for {}",
                self.address, sender
            )));
        }
        self.chain.simulate_latency().await;
        self.chain
            .run_execute(sender, contract, msg, fee, memo, funds)
    }
}
