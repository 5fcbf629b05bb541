//! Flow-level state: what the user sees while an operation runs and after
//! it resolves.

use std::collections::HashMap;

use crate::client::{ClientError, Operation};
use crate::contract::{Invoice, InvoiceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Created(InvoiceId),
    Fetched(Invoice),
    Paid(InvoiceId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    SubmitStarted { message: String },
    SubmitSucceeded(Payload),
    SubmitFailed { message: String },
}

impl Event {
    pub fn started(message: impl Into<String>) -> Self {
        Event::SubmitStarted {
            message: message.into(),
        }
    }

    /// Maps a client outcome onto the event the flow should see.
    pub fn from_result<T>(
        operation: Operation,
        result: &Result<T, ClientError>,
        payload: impl FnOnce(&T) -> Payload,
    ) -> Self {
        match result {
            Ok(value) => Event::SubmitSucceeded(payload(value)),
            Err(err) => Event::SubmitFailed {
                message: err.user_message(operation),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleState {
    pub phase: Phase,
    pub message: String,
    pub snapshot: Option<Invoice>,
}

impl LifecycleState {
    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn apply(self, event: Event) -> Self {
        reduce(self, event)
    }
}

pub fn reduce(state: LifecycleState, event: Event) -> LifecycleState {
    match event {
        // One operation per flow at a time.
        Event::SubmitStarted { .. } if state.is_loading() => state,
        Event::SubmitStarted { message } => LifecycleState {
            phase: Phase::Loading,
            message,
            ..state
        },
        Event::SubmitSucceeded(Payload::Fetched(invoice)) => LifecycleState {
            phase: Phase::Success,
            message: "Invoice fetched successfully.".to_string(),
            snapshot: Some(invoice),
        },
        Event::SubmitSucceeded(Payload::Created(id)) => LifecycleState {
            phase: Phase::Success,
            message: format!("Invoice created successfully! Invoice ID: {}", id),
            ..state
        },
        Event::SubmitSucceeded(Payload::Paid(_)) => LifecycleState {
            phase: Phase::Success,
            message: "Payment successful!".to_string(),
            ..state
        },
        Event::SubmitFailed { message } => LifecycleState {
            phase: Phase::Error,
            message,
            ..state
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    Create,
    View,
    Pay,
}

/// Last known state of every flow, recreated per session.
#[derive(Debug, Default)]
pub struct LifecycleTracker {
    flows: HashMap<Flow, LifecycleState>,
}

impl LifecycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&mut self, flow: Flow, event: Event) -> &LifecycleState {
        let state = self.flows.remove(&flow).unwrap_or_default();
        self.flows.entry(flow).or_insert(reduce(state, event))
    }

    pub fn state(&self, flow: Flow) -> LifecycleState {
        self.flows.get(&flow).cloned().unwrap_or_default()
    }

    pub fn snapshot(&self, flow: Flow) -> Option<&Invoice> {
        self.flows.get(&flow).and_then(|state| state.snapshot.as_ref())
    }
}
