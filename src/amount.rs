//! Line item totals and pre-flight validation of invoice drafts.
//!
//! Nothing in here touches the network. Totals are lenient so that a half
//! filled form always shows a running total; validation is strict and runs
//! before every submit.

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

pub const MAX_LINE_ITEMS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Payer,
    Description,
    DueDate,
}

impl std::fmt::Display for DraftField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DraftField::Payer => "payer",
            DraftField::Description => "description",
            DraftField::DueDate => "due date",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("All fields are required (missing {0}).")]
    MissingField(DraftField),
    #[error("Total amount must be greater than 0.")]
    NonPositiveAmount,
    #[error("Total amount is too large.")]
    TotalOverflow,
    #[error("An invoice holds at most {max} line items, got {count}.")]
    TooManyItems { count: usize, max: usize },
}

/// A single priced row of a draft. The price is kept as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineItem {
    pub name: String,
    pub price: String,
}

impl LineItem {
    pub fn new(name: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
        }
    }

    /// Parsed price, or zero when the field is blank, garbage or negative.
    pub fn parsed_price(&self) -> Decimal {
        parse_price(&self.price)
    }
}

impl FromStr for LineItem {
    type Err = String;

    /// Parses `name=price`. A bare value is taken as an unnamed price.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('=') {
            Some((name, price)) => Ok(LineItem::new(name.trim(), price.trim())),
            None if !s.trim().is_empty() => Ok(LineItem::new("", s.trim())),
            None => Err("line item must look like NAME=PRICE".to_string()),
        }
    }
}

fn parse_price(raw: &str) -> Decimal {
    match Decimal::from_str(raw.trim()) {
        Ok(price) if price.is_sign_negative() => Decimal::ZERO,
        Ok(price) => price,
        Err(_) => Decimal::ZERO,
    }
}

/// Running total for display. Saturates at `Decimal::MAX` instead of
/// overflowing; use [`checked_total`] for the amount that gets submitted.
pub fn compute_total(items: &[LineItem]) -> Decimal {
    checked_total(items).unwrap_or(Decimal::MAX)
}

/// Exact sum of the item prices, or `None` when it does not fit a `Decimal`.
pub fn checked_total(items: &[LineItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.parsed_price()))
}

pub fn validate_draft(
    payer: &str,
    description: &str,
    due_date: &str,
    amount: Decimal,
) -> Result<(), ValidationError> {
    if payer.trim().is_empty() {
        return Err(ValidationError::MissingField(DraftField::Payer));
    }
    if description.trim().is_empty() {
        return Err(ValidationError::MissingField(DraftField::Description));
    }
    if due_date.trim().is_empty() {
        return Err(ValidationError::MissingField(DraftField::DueDate));
    }
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount);
    }
    Ok(())
}

/// An invoice being composed by its issuer. Always holds between one and
/// [`MAX_LINE_ITEMS`] items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub payer: String,
    pub description: String,
    pub due_date: String,
    items: Vec<LineItem>,
}

impl Default for Draft {
    fn default() -> Self {
        Self {
            payer: String::new(),
            description: String::new(),
            due_date: String::new(),
            items: vec![LineItem::default()],
        }
    }
}

impl Draft {
    pub fn new(
        payer: impl Into<String>,
        description: impl Into<String>,
        due_date: impl Into<String>,
    ) -> Self {
        Self {
            payer: payer.into(),
            description: description.into(),
            due_date: due_date.into(),
            ..Default::default()
        }
    }

    /// Replaces all items. More than [`MAX_LINE_ITEMS`] is refused; an
    /// empty list leaves a single blank row behind.
    pub fn with_items(
        mut self,
        items: impl IntoIterator<Item = LineItem>,
    ) -> Result<Self, ValidationError> {
        let items: Vec<LineItem> = items.into_iter().collect();
        if items.len() > MAX_LINE_ITEMS {
            return Err(ValidationError::TooManyItems {
                count: items.len(),
                max: MAX_LINE_ITEMS,
            });
        }
        self.items = items;
        if self.items.is_empty() {
            self.items.push(LineItem::default());
        }
        Ok(self)
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Appends a blank row. Returns false when the draft is already full.
    pub fn add_item(&mut self) -> bool {
        if self.items.len() >= MAX_LINE_ITEMS {
            return false;
        }
        self.items.push(LineItem::default());
        true
    }

    /// Removes a row, refusing to drop the last one.
    pub fn remove_item(&mut self, index: usize) -> Option<LineItem> {
        if self.items.len() <= 1 || index >= self.items.len() {
            return None;
        }
        Some(self.items.remove(index))
    }

    pub fn set_name(&mut self, index: usize, name: impl Into<String>) -> bool {
        match self.items.get_mut(index) {
            Some(item) => {
                item.name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn set_price(&mut self, index: usize, price: impl Into<String>) -> bool {
        match self.items.get_mut(index) {
            Some(item) => {
                item.price = price.into();
                true
            }
            None => false,
        }
    }

    pub fn total(&self) -> Decimal {
        compute_total(&self.items)
    }

    /// Validates the draft and returns the total to submit, computed once.
    pub fn validate(&self) -> Result<Decimal, ValidationError> {
        let total = checked_total(&self.items);
        validate_draft(
            &self.payer,
            &self.description,
            &self.due_date,
            total.unwrap_or(Decimal::MAX),
        )?;
        total.ok_or(ValidationError::TotalOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(prices: &[&str]) -> Vec<LineItem> {
        prices.iter().map(|p| LineItem::new("", *p)).collect()
    }

    #[test]
    fn test_total_treats_unparsable_price_as_zero() {
        let total = compute_total(&items(&["10", "", "5.5"]));
        assert_eq!(total, Decimal::from_str("15.5").unwrap());

        let total = compute_total(&items(&["abc", "1e", "7"]));
        assert_eq!(total, Decimal::from(7));
    }

    #[test]
    fn test_total_ignores_negative_prices() {
        let total = compute_total(&items(&["-4", "12"]));
        assert_eq!(total, Decimal::from(12));
    }

    #[test]
    fn test_total_of_empty_list_is_zero() {
        assert_eq!(compute_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_total_is_exact_for_decimal_fractions() {
        let total = compute_total(&items(&["0.1", "0.2"]));
        assert_eq!(total, Decimal::from_str("0.3").unwrap());
    }

    #[test]
    fn test_validate_missing_fields() {
        let amount = Decimal::from(30);
        assert_eq!(
            validate_draft("", "work", "2030-01-01", amount),
            Err(ValidationError::MissingField(DraftField::Payer))
        );
        assert_eq!(
            validate_draft("xion1payer", "  ", "2030-01-01", amount),
            Err(ValidationError::MissingField(DraftField::Description))
        );
        assert_eq!(
            validate_draft("xion1payer", "work", "", amount),
            Err(ValidationError::MissingField(DraftField::DueDate))
        );
    }

    #[test]
    fn test_validate_amount() {
        assert_eq!(
            validate_draft("xion1payer", "work", "2030-01-01", Decimal::ZERO),
            Err(ValidationError::NonPositiveAmount)
        );
        assert_eq!(
            validate_draft("xion1payer", "work", "2030-01-01", Decimal::from(-1)),
            Err(ValidationError::NonPositiveAmount)
        );
        assert!(validate_draft("xion1payer", "work", "2030-01-01", Decimal::from(1)).is_ok());
    }

    #[test]
    fn test_missing_field_reported_before_amount() {
        assert_eq!(
            validate_draft("", "work", "2030-01-01", Decimal::ZERO),
            Err(ValidationError::MissingField(DraftField::Payer))
        );
    }

    #[test]
    fn test_draft_item_limits() {
        let mut draft = Draft::default();
        assert_eq!(draft.items().len(), 1);
        assert!(draft.remove_item(0).is_none());

        for _ in 1..MAX_LINE_ITEMS {
            assert!(draft.add_item());
        }
        assert!(!draft.add_item());
        assert_eq!(draft.items().len(), MAX_LINE_ITEMS);

        assert!(draft.remove_item(2).is_some());
        assert_eq!(draft.items().len(), MAX_LINE_ITEMS - 1);
    }

    #[test]
    fn test_draft_running_total_tracks_edits() {
        let mut draft = Draft::new("xion1payer", "Consulting", "2030-01-01");
        assert!(draft.set_price(0, "10"));
        draft.add_item();
        assert!(draft.set_name(1, "Hosting"));
        assert!(draft.set_price(1, "20"));
        assert_eq!(draft.total(), Decimal::from(30));

        draft.remove_item(0);
        assert_eq!(draft.total(), Decimal::from(20));
        assert_eq!(draft.validate(), Ok(Decimal::from(20)));
        assert!(!draft.set_price(4, "1"));
    }

    #[test]
    fn test_with_items_rejects_extra_rows() {
        let err = Draft::default()
            .with_items(items(&["10", "10", "10", "10", "10", "10"]))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooManyItems {
                count: 6,
                max: MAX_LINE_ITEMS
            }
        );

        let draft = Draft::default()
            .with_items(items(&["10", "10", "10", "10", "10"]))
            .unwrap();
        assert_eq!(draft.items().len(), MAX_LINE_ITEMS);
        assert_eq!(draft.total(), Decimal::from(50));

        let draft = Draft::default().with_items(vec![]).unwrap();
        assert_eq!(draft.items().len(), 1);
    }

    #[test]
    fn test_total_saturates_instead_of_overflowing() {
        let max = Decimal::MAX.to_string();
        let huge = items(&[max.as_str(), max.as_str()]);
        assert_eq!(checked_total(&huge), None);
        assert_eq!(compute_total(&huge), Decimal::MAX);
        assert_eq!(checked_total(&items(&["1", "2"])), Some(Decimal::from(3)));

        let draft = Draft::new("xion1payer", "work", "2030-01-01")
            .with_items(huge)
            .unwrap();
        assert_eq!(draft.validate(), Err(ValidationError::TotalOverflow));

        let draft = Draft::new("", "work", "2030-01-01")
            .with_items(items(&[max.as_str(), max.as_str()]))
            .unwrap();
        assert_eq!(
            draft.validate(),
            Err(ValidationError::MissingField(DraftField::Payer))
        );
    }

    #[test]
    fn test_parse_line_item() {
        let item: LineItem = "Design=12.50".parse().unwrap();
        assert_eq!(item, LineItem::new("Design", "12.50"));

        let item: LineItem = "7".parse().unwrap();
        assert_eq!(item, LineItem::new("", "7"));

        assert!("".parse::<LineItem>().is_err());
    }
}
