//! Unified, display-ready search results.

use serde::{Deserialize, Serialize};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

pub const TYPE_REPORT: &str = "Rapport";
pub const TYPE_DOCUMENT: &str = "Document";
pub const TYPE_AGENT: &str = "Agent";
pub const TYPE_CATEGORY: &str = "Catégorie";
pub const TYPE_HISTORY: &str = "Historique";

/// Icon tag attached to a result; fixed per source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemIcon {
    Report,
    Document,
    Agent,
    Category,
    History,
}

/// A normalized search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchableItem {
    /// Unique per search execution, namespaced by source (`rapport-`, `doc-`, ...).
    pub id: String,
    pub title: String,
    /// Coarse category such as `Rapport` or `Agent`.
    pub type_label: String,
    pub category: String,
    /// Navigation target handed to the router.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<ItemIcon>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_history: Option<bool>,
}

/// Characters left as-is in a URI component, as browsers encode query values.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Path of the results page for a literal term.
pub fn results_path(term: &str) -> String {
    format!("/search/results?q={}", utf8_percent_encode(term, URI_COMPONENT))
}
