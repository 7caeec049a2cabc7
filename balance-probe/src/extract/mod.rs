//! Balance extraction from the portal's payment page.
//!
//! The page is third-party markup, so the lookup is split into steps that
//! each fail with their own [`ParseError`]:
//! marker label -> enclosing container -> value holder -> decimal number.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};

/// Label text the portal renders right before the balance.
pub const BALANCE_MARKER: &str = "剩余金额:";

const VALUE_HOLDER_TAG: &str = "label";

// ASCII digits only; `\d` would also accept other Unicode digit classes.
static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+(?:\.[0-9]*)?").expect("decimal pattern is valid"));

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("marker not found")]
    MarkerNotFound,
    #[error("container not found")]
    ContainerNotFound,
    #[error("value holder not found")]
    ValueHolderNotFound,
    #[error("unparseable value: {0}")]
    UnparseableValue(String),
}

impl ParseError {
    /// Short name of the lookup step that failed.
    pub fn step(&self) -> &'static str {
        match self {
            ParseError::MarkerNotFound => "marker",
            ParseError::ContainerNotFound => "container",
            ParseError::ValueHolderNotFound => "value_holder",
            ParseError::UnparseableValue(_) => "value",
        }
    }
}

/// Extract the remaining balance from a payment page.
pub fn extract_balance(markup: &str) -> Result<f64, ParseError> {
    let document = Html::parse_document(markup);

    let res = find_marker(&document).and_then(|marker| {
        let container = enclosing_container(marker)?;
        let holder = value_holder(container, marker)?;
        parse_decimal(&element_text(holder))
    });

    match res {
        Ok(balance) => {
            tracing::debug!(balance, "balance extracted");
            Ok(balance)
        }
        Err(e) => {
            metrics::counter!("extract_failures_total", "step" => e.step()).increment(1);
            Err(e)
        }
    }
}

/// Innermost element whose whole text is the marker.
///
/// Ancestors that wrap nothing but the marker have the same text, so a match
/// only counts when none of its child elements match too.
pub fn find_marker(document: &Html) -> Result<ElementRef<'_>, ParseError> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| {
            is_marker(el) && !el.children().filter_map(ElementRef::wrap).any(|c| is_marker(&c))
        })
        .ok_or(ParseError::MarkerNotFound)
}

/// The marker's parent element. Exactly one level up.
pub fn enclosing_container(marker: ElementRef<'_>) -> Result<ElementRef<'_>, ParseError> {
    marker
        .parent()
        .and_then(ElementRef::wrap)
        .ok_or(ParseError::ContainerNotFound)
}

/// First `<label>` below the container that is not the marker or inside it.
///
/// Document order decides, so a `<label>` placed before the marker in the
/// same container is taken as the value holder.
pub fn value_holder<'a>(
    container: ElementRef<'a>,
    marker: ElementRef<'a>,
) -> Result<ElementRef<'a>, ParseError> {
    container
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| {
            el.value().name() == VALUE_HOLDER_TAG
                && el.id() != marker.id()
                && !el.ancestors().any(|a| a.id() == marker.id())
        })
        .ok_or(ParseError::ValueHolderNotFound)
}

/// First decimal run in `text`, e.g. `12.50` out of `¥12.50元`.
pub fn parse_decimal(text: &str) -> Result<f64, ParseError> {
    let unparseable = || ParseError::UnparseableValue(text.to_string());

    let m = DECIMAL.find(text).ok_or_else(unparseable)?;
    let value: f64 = m.as_str().parse().map_err(|_| unparseable())?;
    if !value.is_finite() {
        return Err(unparseable());
    }

    Ok(value)
}

fn is_marker(el: &ElementRef<'_>) -> bool {
    element_text(*el) == BALANCE_MARKER
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
