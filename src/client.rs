//! The invoice lifecycle client: validates, builds, submits and interprets.
//!
//! Each `create` and `pay` runs under a flight key. A key moves
//! `Idle -> Pending -> Succeeded | Failed`, and a second call for a key that
//! is still `Pending` is refused with [`ClientError::Busy`] before anything
//! is sent.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::amount::{Draft, ValidationError};
use crate::chain::{CapabilityError, QueryCapability, Session, SigningCapability, TxResult};
use crate::config::InvoicerConfig;
use crate::contract::{
    parse_due_date, parse_invoice_id, BuildError, ExecuteRequest, Invoice, InvoiceId,
    QueryRequest, RequestBuilder,
};

pub const INVOICE_ID_ATTRIBUTE: &str = "invoice_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Fetch,
    Pay,
    List,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Fetch => "fetch",
            Operation::Pay => "pay",
            Operation::List => "list",
        };
        write!(f, "{}", name)
    }
}

/// Identifies one in-flight state changing operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlightKey {
    Create { sender: String },
    Pay { invoice_id: InvoiceId },
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlightKey::Create { sender } => write!(f, "create by {}", sender),
            FlightKey::Pay { invoice_id } => write!(f, "payment of invoice {}", invoice_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpStatus {
    Idle,
    Pending,
    Succeeded,
    Failed,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Wallet not connected or client unavailable.")]
    NotConnected,
    #[error("Invoice ID is required.")]
    MissingId,
    #[error("Invoice ID must be a whole number, got {0:?}.")]
    NonNumericId(String),
    #[error("No invoice details available.")]
    NoSnapshot,
    #[error("Invoice {0} is already paid.")]
    AlreadyPaid(InvoiceId),
    #[error("Fetched invoice {snapshot} does not match requested invoice {requested}.")]
    StaleSnapshot {
        requested: InvoiceId,
        snapshot: InvoiceId,
    },
    #[error("{0}")]
    Build(BuildError),
    #[error("A {0} is already in progress.")]
    Busy(FlightKey),
    #[error("Request timed out after {0:?}.")]
    Timeout(Duration),
    #[error(transparent)]
    Network(#[from] CapabilityError),
    #[error("Unexpected response shape: {0}")]
    UnexpectedResponseShape(String),
}

impl From<BuildError> for ClientError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::MissingId => ClientError::MissingId,
            BuildError::NonNumericId(raw) => ClientError::NonNumericId(raw),
            other => ClientError::Build(other),
        }
    }
}

impl ClientError {
    /// True when the failure was decided locally and nothing was sent.
    pub fn is_local(&self) -> bool {
        !matches!(
            self,
            ClientError::Network(_) | ClientError::Timeout(_) | ClientError::UnexpectedResponseShape(_)
        )
    }

    /// Short text for the end user. Remote failures are summarized; their
    /// detail only goes to the log.
    pub fn user_message(&self, operation: Operation) -> String {
        if self.is_local() {
            return self.to_string();
        }
        match operation {
            Operation::Create => match self {
                ClientError::Network(err) => format!("Error creating invoice: {}", err.detailed()),
                other => format!("Error creating invoice: {}", other),
            },
            Operation::Fetch => {
                "Failed to fetch the invoice. Please ensure the ID is correct and try again."
                    .to_string()
            }
            Operation::Pay => "Payment failed. Please try again.".to_string(),
            Operation::List => "Failed to list invoices. Please try again.".to_string(),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

type FlightMap = Arc<Mutex<HashMap<FlightKey, OpStatus>>>;

fn lock_flights(flights: &FlightMap) -> MutexGuard<'_, HashMap<FlightKey, OpStatus>> {
    flights.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Holds a key in `Pending` until finished. Dropping it unfinished (the
/// future was cancelled) marks the key `Failed`.
struct Flight {
    flights: FlightMap,
    key: FlightKey,
    finished: bool,
}

impl Flight {
    fn begin(flights: &FlightMap, key: FlightKey) -> ClientResult<Self> {
        let mut map = lock_flights(flights);
        if map.get(&key) == Some(&OpStatus::Pending) {
            return Err(ClientError::Busy(key));
        }
        map.insert(key.clone(), OpStatus::Pending);
        Ok(Self {
            flights: flights.clone(),
            key,
            finished: false,
        })
    }

    fn finish<T>(mut self, result: ClientResult<T>) -> ClientResult<T> {
        let status = if result.is_ok() {
            OpStatus::Succeeded
        } else {
            OpStatus::Failed
        };
        lock_flights(&self.flights).insert(self.key.clone(), status);
        self.finished = true;
        result
    }
}

impl Drop for Flight {
    fn drop(&mut self) {
        if !self.finished {
            lock_flights(&self.flights).insert(self.key.clone(), OpStatus::Failed);
        }
    }
}

pub struct InvoiceClient {
    builder: RequestBuilder,
    query: Arc<dyn QueryCapability>,
    timeout: Duration,
    flights: FlightMap,
}

impl InvoiceClient {
    /// `query` serves reads and must work without a connected wallet.
    pub fn new(builder: RequestBuilder, query: Arc<dyn QueryCapability>, timeout: Duration) -> Self {
        Self {
            builder,
            query,
            timeout,
            flights: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn from_config(config: &InvoicerConfig, query: Arc<dyn QueryCapability>) -> Self {
        Self::new(config.request_builder(), query, config.request_timeout())
    }

    pub fn builder(&self) -> &RequestBuilder {
        &self.builder
    }

    pub fn status(&self, key: &FlightKey) -> OpStatus {
        lock_flights(&self.flights)
            .get(key)
            .copied()
            .unwrap_or(OpStatus::Idle)
    }

    async fn bounded<T, F>(&self, call: F) -> ClientResult<T>
    where
        F: Future<Output = Result<T, CapabilityError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(ClientError::from),
            Err(_) => Err(ClientError::Timeout(self.timeout)),
        }
    }

    /// Records a failure decided before anything was sent. A key that is
    /// still `Pending` belongs to another call and is left alone.
    fn mark_failed(&self, key: &FlightKey) {
        let mut map = lock_flights(&self.flights);
        if map.get(key) != Some(&OpStatus::Pending) {
            map.insert(key.clone(), OpStatus::Failed);
        }
    }

    fn prepare_create(&self, draft: &Draft) -> ClientResult<(Decimal, ExecuteRequest, Value)> {
        // Computed once; this is the amount that goes on chain.
        let total = draft.validate()?;
        let due_date = parse_due_date(&draft.due_date)?;
        let request = self
            .builder
            .create(&draft.payer, total, &draft.description, due_date)?;
        let msg = encode(&request.msg)?;
        Ok((total, request, msg))
    }

    pub async fn create(&self, session: &Session, draft: &Draft) -> ClientResult<InvoiceId> {
        let (signer, sender) = session.credentials().ok_or(ClientError::NotConnected)?;
        let key = FlightKey::Create {
            sender: sender.to_string(),
        };

        let (total, request, msg) = match self.prepare_create(draft) {
            Ok(prepared) => prepared,
            Err(err) => {
                warn!(sender, error = %err, "invoice draft rejected");
                self.mark_failed(&key);
                return Err(err);
            }
        };

        let flight = Flight::begin(&self.flights, key)?;
        info!(sender, amount = %total, "creating invoice");
        let result = self
            .submit(signer, sender, &request, &msg)
            .await
            .and_then(|tx| extract_invoice_id(&tx));
        match &result {
            Ok(id) => info!(%id, "invoice created"),
            Err(err) => error!(error = ?err, "error creating invoice"),
        }
        flight.finish(result)
    }

    pub async fn fetch(&self, invoice_id: &str) -> ClientResult<Invoice> {
        let request = self.builder.get(invoice_id)?;
        let invoice = self.run_query::<Invoice>(&request).await;
        match &invoice {
            Ok(invoice) => debug!(id = %invoice.id, paid = invoice.is_paid, "invoice fetched"),
            Err(err) => error!(invoice_id, error = ?err, "error fetching invoice"),
        }
        invoice
    }

    pub async fn list(&self, user: &str) -> ClientResult<Vec<Invoice>> {
        let request = self.builder.list(user)?;
        let invoices = self.run_query::<Vec<Invoice>>(&request).await;
        if let Err(err) = &invoices {
            error!(user, error = ?err, "error listing invoices");
        }
        invoices
    }

    /// Pays `invoice_id` with exactly the amount recorded in `snapshot`,
    /// which must come from a prior [`fetch`](Self::fetch).
    pub async fn pay(
        &self,
        session: &Session,
        invoice_id: &str,
        snapshot: Option<&Invoice>,
    ) -> ClientResult<TxResult> {
        let key = parse_invoice_id(invoice_id)
            .ok()
            .map(|invoice_id| FlightKey::Pay { invoice_id });

        let checked = check_payment(session, invoice_id, snapshot).and_then(|checked| {
            let request = self.builder.pay(checked.requested, checked.snapshot.amount);
            let msg = encode(&request.msg)?;
            Ok((checked, request, msg))
        });
        let (checked, request, msg) = match checked {
            Ok(checked) => checked,
            Err(err) => {
                if let Some(key) = &key {
                    self.mark_failed(key);
                }
                return Err(err);
            }
        };
        let PaymentCheck {
            signer,
            sender,
            snapshot,
            requested,
        } = checked;

        let flight = Flight::begin(
            &self.flights,
            FlightKey::Pay {
                invoice_id: requested,
            },
        )?;
        info!(id = %requested, amount = %snapshot.amount, sender, "paying invoice");
        let result = self.submit(signer, sender, &request, &msg).await;
        match &result {
            Ok(tx) => info!(
                id = %requested,
                tx = tx.transaction_hash.as_deref().unwrap_or("-"),
                "invoice paid"
            ),
            Err(err) => error!(id = %requested, error = ?err, "error during payment"),
        }
        flight.finish(result)
    }

    async fn submit(
        &self,
        signer: &dyn SigningCapability,
        sender: &str,
        request: &ExecuteRequest,
        msg: &Value,
    ) -> ClientResult<TxResult> {
        debug!(contract = %request.contract, %msg, "sending transaction");
        let tx = self
            .bounded(signer.execute(
                sender,
                &request.contract,
                msg,
                &request.fee,
                &request.memo,
                &request.funds,
            ))
            .await?;
        debug!(?tx, "transaction response");
        Ok(tx)
    }

    async fn run_query<T: DeserializeOwned>(&self, request: &QueryRequest) -> ClientResult<T> {
        let query = encode(&request.msg)?;
        let raw = self
            .bounded(self.query.query_contract_smart(&request.contract, &query))
            .await?;
        serde_json::from_value(raw)
            .map_err(|e| ClientError::UnexpectedResponseShape(format!("query result: {}", e)))
    }
}

struct PaymentCheck<'a> {
    signer: &'a dyn SigningCapability,
    sender: &'a str,
    snapshot: &'a Invoice,
    requested: InvoiceId,
}

/// Local payment guards, in order: snapshot, connection, paid flag, id,
/// then id agreement with the snapshot.
fn check_payment<'a>(
    session: &'a Session,
    invoice_id: &str,
    snapshot: Option<&'a Invoice>,
) -> ClientResult<PaymentCheck<'a>> {
    let snapshot = snapshot.ok_or(ClientError::NoSnapshot)?;
    let (signer, sender) = session.credentials().ok_or(ClientError::NotConnected)?;
    if snapshot.is_paid {
        warn!(id = %snapshot.id, "refusing to pay an invoice that is already paid");
        return Err(ClientError::AlreadyPaid(snapshot.id));
    }
    let requested = parse_invoice_id(invoice_id)?;
    if requested != snapshot.id {
        return Err(ClientError::StaleSnapshot {
            requested,
            snapshot: snapshot.id,
        });
    }
    Ok(PaymentCheck {
        signer,
        sender,
        snapshot,
        requested,
    })
}

fn encode<T: serde::Serialize>(msg: &T) -> ClientResult<Value> {
    serde_json::to_value(msg)
        .map_err(|e| ClientError::UnexpectedResponseShape(format!("message encoding: {}", e)))
}

/// Reads the contract-assigned id back from the transaction's events.
pub fn extract_invoice_id(tx: &TxResult) -> ClientResult<InvoiceId> {
    let raw = tx.first_event_attribute(INVOICE_ID_ATTRIBUTE).ok_or_else(|| {
        ClientError::UnexpectedResponseShape(format!(
            "transaction succeeded but carried no {} attribute",
            INVOICE_ID_ATTRIBUTE
        ))
    })?;
    raw.parse::<InvoiceId>().map_err(|_| {
        ClientError::UnexpectedResponseShape(format!("{} {:?} is not a number", INVOICE_ID_ATTRIBUTE, raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{Attribute, Event, MockChain, TxLog};
    use crate::contract::{Amount, DueDate, ExecutionParams};

    fn tx_with(attributes: Vec<Attribute>) -> TxResult {
        TxResult {
            logs: Some(vec![TxLog {
                events: Some(vec![Event {
                    kind: Some("wasm".into()),
                    attributes: Some(attributes),
                }]),
            }]),
            ..Default::default()
        }
    }

    fn client(chain: &MockChain) -> InvoiceClient {
        InvoiceClient::new(
            RequestBuilder::new(chain.contract(), "uxion", ExecutionParams::default()),
            Arc::new(chain.clone()),
            Duration::from_secs(5),
        )
    }

    fn unpaid(id: u64) -> Invoice {
        Invoice {
            id: InvoiceId(id),
            issuer: "xion1issuer".into(),
            recipient: "xion1payer".into(),
            amount: Amount(30),
            description: "Consulting".into(),
            due_date: DueDate(1_700_000_000_000),
            is_paid: false,
        }
    }

    #[test]
    fn test_extract_invoice_id() {
        let tx = tx_with(vec![Attribute {
            key: "invoice_id".into(),
            value: "42".into(),
        }]);
        assert_eq!(extract_invoice_id(&tx).unwrap(), InvoiceId(42));
    }

    #[test]
    fn test_extract_invoice_id_from_empty_logs() {
        let tx = TxResult {
            logs: Some(vec![]),
            ..Default::default()
        };
        assert!(matches!(
            extract_invoice_id(&tx),
            Err(ClientError::UnexpectedResponseShape(_))
        ));
    }

    #[test]
    fn test_extract_non_numeric_invoice_id() {
        let tx = tx_with(vec![Attribute {
            key: "invoice_id".into(),
            value: "forty-two".into(),
        }]);
        assert!(matches!(
            extract_invoice_id(&tx),
            Err(ClientError::UnexpectedResponseShape(_))
        ));
    }

    #[test]
    fn test_build_errors_map_onto_id_variants() {
        assert!(matches!(
            ClientError::from(BuildError::MissingId),
            ClientError::MissingId
        ));
        assert!(matches!(
            ClientError::from(BuildError::NonNumericId("x".into())),
            ClientError::NonNumericId(_)
        ));
        assert!(matches!(
            ClientError::from(BuildError::MissingUser),
            ClientError::Build(BuildError::MissingUser)
        ));
    }

    #[test]
    fn test_user_messages() {
        let remote = ClientError::Network(
            CapabilityError::new("execute wasm contract failed").with_response("out of gas"),
        );
        assert_eq!(
            remote.user_message(Operation::Create),
            "Error creating invoice: execute wasm contract failed (out of gas)"
        );
        assert_eq!(
            remote.user_message(Operation::Fetch),
            "Failed to fetch the invoice. Please ensure the ID is correct and try again."
        );
        assert_eq!(
            remote.user_message(Operation::Pay),
            "Payment failed. Please try again."
        );
        assert_eq!(
            ClientError::NoSnapshot.user_message(Operation::Pay),
            "No invoice details available."
        );
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_ids_locally() {
        let chain = MockChain::default();
        let client = client(&chain);

        assert!(matches!(client.fetch("").await, Err(ClientError::MissingId)));
        assert!(matches!(
            client.fetch("abc").await,
            Err(ClientError::NonNumericId(_))
        ));
        assert_eq!(chain.query_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_works_without_wallet() {
        let chain = MockChain::default();
        chain.insert_invoice(unpaid(4));
        let client = client(&chain);

        let invoice = client.fetch("4").await.unwrap();
        assert_eq!(invoice, unpaid(4));
    }

    #[tokio::test]
    async fn test_create_requires_connection() {
        let chain = MockChain::default();
        let client = client(&chain);
        let draft = Draft::new("xion1payer", "Consulting", "2030-01-01");

        let err = client
            .create(&Session::disconnected(), &draft)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotConnected));
        assert_eq!(chain.execute_count(), 0);
    }

    #[tokio::test]
    async fn test_create_validation_never_reaches_chain() {
        let chain = MockChain::default();
        let client = client(&chain);
        let session = Session::connected(Arc::new(chain.signer("xion1issuer")), "xion1issuer");

        let mut draft = Draft::new("xion1payer", "Consulting", "2030-01-01");
        draft.set_price(0, "");
        let err = client.create(&session, &draft).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Validation(ValidationError::NonPositiveAmount)
        ));

        draft.set_price(0, "10.5");
        let err = client.create(&session, &draft).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Build(BuildError::NonIntegralAmount(_))
        ));

        draft.set_price(0, "10");
        draft.due_date = "someday".into();
        let err = client.create(&session, &draft).await.unwrap_err();
        assert!(matches!(err, ClientError::Build(BuildError::InvalidDueDate(_))));

        assert_eq!(chain.execute_count(), 0);
        assert_eq!(
            client.status(&FlightKey::Create {
                sender: "xion1issuer".into()
            }),
            OpStatus::Failed
        );
    }

    #[tokio::test]
    async fn test_rejected_draft_after_success_marks_key_failed() {
        let chain = MockChain::default();
        let client = client(&chain);
        let session = Session::connected(Arc::new(chain.signer("xion1issuer")), "xion1issuer");
        let key = FlightKey::Create {
            sender: "xion1issuer".into(),
        };

        let mut draft = Draft::new("xion1payer", "Consulting", "2030-01-01");
        draft.set_price(0, "30");
        client.create(&session, &draft).await.unwrap();
        assert_eq!(client.status(&key), OpStatus::Succeeded);

        draft.payer = String::new();
        let err = client.create(&session, &draft).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(ValidationError::MissingField(_))));
        assert_eq!(client.status(&key), OpStatus::Failed);
        assert_eq!(chain.execute_count(), 1);
    }

    #[tokio::test]
    async fn test_overflowing_total_is_rejected_locally() {
        let chain = MockChain::default();
        let client = client(&chain);
        let session = Session::connected(Arc::new(chain.signer("xion1issuer")), "xion1issuer");

        let max = Decimal::MAX.to_string();
        let draft = Draft::new("xion1payer", "Consulting", "2030-01-01")
            .with_items(vec![
                crate::amount::LineItem::new("a", max.as_str()),
                crate::amount::LineItem::new("b", max.as_str()),
            ])
            .unwrap();
        let err = client.create(&session, &draft).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Validation(ValidationError::TotalOverflow)
        ));
        assert_eq!(chain.execute_count(), 0);
    }

    #[tokio::test]
    async fn test_disconnected_create_has_no_key_to_mark() {
        let chain = MockChain::default();
        let client = client(&chain);
        let draft = Draft::new("", "", "");

        let err = client
            .create(&Session::disconnected(), &draft)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotConnected));
        assert_eq!(
            client.status(&FlightKey::Create {
                sender: "xion1issuer".into()
            }),
            OpStatus::Idle
        );
    }

    #[tokio::test]
    async fn test_pay_guards_run_in_order() {
        let chain = MockChain::default();
        let client = client(&chain);
        let session = Session::connected(Arc::new(chain.signer("xion1payer")), "xion1payer");

        let err = client.pay(&Session::disconnected(), "1", None).await.unwrap_err();
        assert!(matches!(err, ClientError::NoSnapshot));

        let invoice = unpaid(1);
        let err = client
            .pay(&Session::disconnected(), "1", Some(&invoice))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotConnected));

        let paid = Invoice {
            is_paid: true,
            ..unpaid(1)
        };
        let err = client.pay(&session, "1", Some(&paid)).await.unwrap_err();
        assert!(matches!(err, ClientError::AlreadyPaid(InvoiceId(1))));

        let err = client.pay(&session, "2", Some(&invoice)).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::StaleSnapshot {
                requested: InvoiceId(2),
                snapshot: InvoiceId(1)
            }
        ));

        assert_eq!(chain.execute_count(), 0);
        for id in [1, 2] {
            assert_eq!(
                client.status(&FlightKey::Pay {
                    invoice_id: InvoiceId(id)
                }),
                OpStatus::Failed
            );
        }
    }

    #[tokio::test]
    async fn test_local_pay_guard_does_not_clobber_pending_key() {
        let chain = MockChain::default();
        chain.insert_invoice(unpaid(1));
        chain.set_latency(Some(Duration::from_millis(200)));
        let client = client(&chain);
        let session = Session::connected(Arc::new(chain.signer("xion1payer")), "xion1payer");
        let key = FlightKey::Pay {
            invoice_id: InvoiceId(1),
        };
        let paid = Invoice {
            is_paid: true,
            ..unpaid(1)
        };

        let snapshot = unpaid(1);
        let (first, second) = tokio::join!(
            client.pay(&session, "1", Some(&snapshot)),
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let err = client.pay(&session, "1", Some(&paid)).await.unwrap_err();
                (err, client.status(&key))
            }
        );
        let (err, status_while_pending) = second;
        assert!(matches!(err, ClientError::AlreadyPaid(_)));
        assert_eq!(status_while_pending, OpStatus::Pending);
        first.unwrap();
        assert_eq!(client.status(&key), OpStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_pay_uses_snapshot_amount() {
        let chain = MockChain::default();
        chain.insert_invoice(unpaid(1));
        let client = client(&chain);
        let session = Session::connected(Arc::new(chain.signer("xion1payer")), "xion1payer");

        let snapshot = client.fetch("1").await.unwrap();
        client.pay(&session, "1", Some(&snapshot)).await.unwrap();

        let executions = chain.executions();
        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].funds, vec![crate::contract::Coin::new(30u128, "uxion")]);
        assert_eq!(
            client.status(&FlightKey::Pay {
                invoice_id: InvoiceId(1)
            }),
            OpStatus::Succeeded
        );
    }

    #[tokio::test]
    async fn test_failed_payment_marks_flight_failed() {
        let chain = MockChain::default();
        chain.insert_invoice(unpaid(1));
        chain.fail_next_execute(CapabilityError::new("insufficient funds"));
        let client = client(&chain);
        let session = Session::connected(Arc::new(chain.signer("xion1payer")), "xion1payer");

        let err = client.pay(&session, "1", Some(&unpaid(1))).await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
        assert_eq!(
            client.status(&FlightKey::Pay {
                invoice_id: InvoiceId(1)
            }),
            OpStatus::Failed
        );
        assert!(!chain.invoice(InvoiceId(1)).unwrap().is_paid);
    }
}
