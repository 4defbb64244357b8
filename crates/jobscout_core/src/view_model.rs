use std::collections::BTreeMap;

use crate::{ConnectionState, Listing};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionViewModel {
    pub connection: ConnectionState,
    pub session_id: Option<String>,
    pub keywords: Option<String>,
    /// Newest first.
    pub listings: Vec<ListingView>,
    pub listing_count: usize,
    pub per_source: BTreeMap<String, usize>,
    pub progress_percent: u8,
    pub total_time_ms: Option<u64>,
    pub warning: Option<String>,
}

impl SessionViewModel {
    pub fn can_submit(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    pub fn compute_time_label(&self) -> Option<String> {
        self.total_time_ms.map(|ms| format!("{ms} ms"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingView {
    pub title: String,
    pub company: String,
    pub source: String,
    pub url: Option<String>,
}

impl From<&Listing> for ListingView {
    fn from(listing: &Listing) -> Self {
        Self {
            title: listing.title.clone(),
            company: listing
                .company
                .clone()
                .filter(|company| !company.is_empty())
                .unwrap_or_else(|| "Company Name".to_string()),
            source: if listing.source.is_empty() {
                "Source".to_string()
            } else {
                listing.source.clone()
            },
            url: listing.url.clone().filter(|url| !url.is_empty()),
        }
    }
}
