//! Vehicle record types
//!
//! Records are serialized with their fields in declaration order, which is
//! the key order of the written JSON objects.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single `{name, value}` row of a listing's specification table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecEntry {
    pub name: String,
    pub value: String,
}

impl SpecEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A new-vehicle offer from the "new vehicles" section of a results page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVehicle {
    pub image: String,
    pub detail_link: String,
    pub name: String,
    pub model: String,
    /// Manufacturer-assigned identifier
    pub id: String,
    pub manufacturer: String,
    pub title: String,
    pub model_year: String,
    pub price: String,
    pub specs: Vec<SpecEntry>,
}

/// A used-vehicle ad from the search results section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedVehicle {
    /// Reserved for seller enrichment; always empty for now
    #[serde(rename = "whatsApp_user_id")]
    pub whatsapp_user_id: String,
    pub image: String,
    pub detail_link: String,
    pub name: String,
    pub model: String,
    pub id: String,
    pub manufacturer: String,
    pub title: String,
    pub ad_year: String,
    pub ad_price: String,
    pub specs: Vec<SpecEntry>,
}

/// Common view over both kinds of listing
pub trait Listing {
    /// The listing's identifier, possibly empty
    fn id(&self) -> &str;
}

impl Listing for NewVehicle {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Listing for UsedVehicle {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Drops every listing whose non-empty id was already seen, keeping the
/// first occurrence. Listings with an empty id are always kept.
pub fn dedupe_by_id<T: Listing>(records: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| record.id().is_empty() || seen.insert(record.id().to_string()))
        .collect()
}

/// Counts listings whose non-empty id already appeared earlier in the slice
pub fn count_duplicate_ids<T: Listing>(records: &[T]) -> usize {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|record| !record.id().is_empty() && !seen.insert(record.id()))
        .count()
}
