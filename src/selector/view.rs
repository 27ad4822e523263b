//! View model for the country selector.
//!
//! Pure derivation from `SelectorState`; no I/O and no state of its own.

use super::{Phase, SelectorState};
use crate::query::CountryRow;

pub const NO_DATA_TEXT: &str = "No data";
pub const CLEAR_OPTION_LABEL: &str = "All countries";

/// What the rendering layer should draw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectorView {
    Loading,
    Error {
        message: String,
    },
    Empty {
        text: &'static str,
    },
    Options {
        /// Label of the leading "no selection" entry.
        clear_label: &'static str,
        /// One entry per row, in backend order.
        options: Vec<OptionView>,
        selected: Option<String>,
        /// Echo line shown only while something is selected.
        confirmation: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionView {
    pub value: String,
    pub label: String,
}

#[must_use]
pub fn render(state: &SelectorState) -> SelectorView {
    match &state.phase {
        Phase::Idle | Phase::Loading => SelectorView::Loading,
        Phase::Failed { message } => SelectorView::Error { message: message.clone() },
        Phase::Populated { rows } if rows.is_empty() => SelectorView::Empty { text: NO_DATA_TEXT },
        Phase::Populated { rows } => SelectorView::Options {
            clear_label: CLEAR_OPTION_LABEL,
            options: rows
                .iter()
                .map(|row| OptionView { value: row.country.clone(), label: option_label(row) })
                .collect(),
            selected: state.selection.clone(),
            confirmation: state.selection.as_deref().map(confirmation_line),
        },
    }
}

/// Country name and customer count, with a singular noun for one.
#[must_use]
pub fn option_label(row: &CountryRow) -> String {
    let noun = if row.customer_count == 1 { "customer" } else { "customers" };
    format!("{} \u{2014} {} {noun}", row.country, row.customer_count)
}

#[must_use]
pub fn confirmation_line(country: &str) -> String {
    format!("Selected country: {country}")
}

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;
