use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

use super::{Amount, Coin, DueDate, ExecuteMsg, ExecutionParams, Fee, InvoiceId, QueryMsg};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Invoice ID is required.")]
    MissingId,
    #[error("Invoice ID must be a whole number, got {0:?}.")]
    NonNumericId(String),
    #[error("User address is required.")]
    MissingUser,
    #[error("Total amount {0} is not a whole number of base units.")]
    NonIntegralAmount(Decimal),
    #[error("Total amount {0} is out of range.")]
    AmountOutOfRange(Decimal),
    #[error("Due date {0:?} is not a valid date (expected YYYY-MM-DD or RFC 3339).")]
    InvalidDueDate(String),
}

/// A state changing call, ready for a signing capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteRequest {
    pub contract: String,
    pub msg: ExecuteMsg,
    pub fee: Fee,
    pub memo: String,
    pub funds: Vec<Coin>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub contract: String,
    pub msg: QueryMsg,
}

/// Turns create/fetch/pay intents into the exact messages the contract
/// expects, with the deployment's execution parameters attached.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    contract: String,
    denom: String,
    create_params: ExecutionParams,
}

impl RequestBuilder {
    pub fn new(
        contract: impl Into<String>,
        denom: impl Into<String>,
        create_params: ExecutionParams,
    ) -> Self {
        Self {
            contract: contract.into(),
            denom: denom.into(),
            create_params,
        }
    }

    pub fn contract(&self) -> &str {
        &self.contract
    }

    pub fn denom(&self) -> &str {
        &self.denom
    }

    pub fn create(
        &self,
        payer: &str,
        total: Decimal,
        description: &str,
        due_date: DueDate,
    ) -> Result<ExecuteRequest, BuildError> {
        let amount = to_base_units(total)?;
        Ok(ExecuteRequest {
            contract: self.contract.clone(),
            msg: ExecuteMsg::CreateInvoice {
                recipient: payer.trim().to_lowercase(),
                amount,
                description: description.to_string(),
                due_date,
            },
            fee: self.create_params.as_fee(),
            memo: String::new(),
            funds: vec![],
        })
    }

    pub fn get(&self, invoice_id: &str) -> Result<QueryRequest, BuildError> {
        let invoice_id = parse_invoice_id(invoice_id)?;
        Ok(QueryRequest {
            contract: self.contract.clone(),
            msg: QueryMsg::GetInvoice { invoice_id },
        })
    }

    pub fn list(&self, user: &str) -> Result<QueryRequest, BuildError> {
        let user = user.trim();
        if user.is_empty() {
            return Err(BuildError::MissingUser);
        }
        Ok(QueryRequest {
            contract: self.contract.clone(),
            msg: QueryMsg::GetInvoicesByUser {
                user: user.to_lowercase(),
            },
        })
    }

    /// `amount` must come from the fetched invoice, never from user input.
    pub fn pay(&self, invoice_id: InvoiceId, amount: Amount) -> ExecuteRequest {
        ExecuteRequest {
            contract: self.contract.clone(),
            msg: ExecuteMsg::PayInvoice { invoice_id },
            fee: Fee::Auto,
            memo: String::new(),
            funds: vec![Coin::new(amount, self.denom.clone())],
        }
    }
}

pub fn parse_invoice_id(raw: &str) -> Result<InvoiceId, BuildError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(BuildError::MissingId);
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BuildError::NonNumericId(raw.to_string()));
    }
    trimmed
        .parse::<InvoiceId>()
        .map_err(|_| BuildError::NonNumericId(raw.to_string()))
}

/// Accepts a calendar date (taken as UTC midnight) or a full RFC 3339
/// timestamp.
pub fn parse_due_date(raw: &str) -> Result<DueDate, BuildError> {
    let trimmed = raw.trim();
    let at = if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        date.and_hms_opt(0, 0, 0).map(|at| at.and_utc())
    } else {
        DateTime::parse_from_rfc3339(trimmed)
            .ok()
            .map(|at| at.with_timezone(&Utc))
    };
    at.and_then(DueDate::from_datetime)
        .ok_or_else(|| BuildError::InvalidDueDate(raw.to_string()))
}

pub fn to_base_units(total: Decimal) -> Result<Amount, BuildError> {
    if !total.fract().is_zero() {
        return Err(BuildError::NonIntegralAmount(total));
    }
    total
        .to_u128()
        .map(Amount)
        .ok_or(BuildError::AmountOutOfRange(total))
}
