use std::collections::BTreeMap;

/// One entry of a source batch as received from the service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultItem {
    pub title: Option<String>,
    pub company: Option<String>,
    pub url: Option<String>,
}

impl ResultItem {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

/// Partial results from a single job-board source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceResultBatch {
    pub source: String,
    pub items: Vec<ResultItem>,
}

/// A result item that passed filtering, tagged with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub source: String,
    pub title: String,
    pub company: Option<String>,
    pub url: Option<String>,
}

/// Append-only accumulation of accepted listings for the current job.
///
/// Batches from the same source are appended as they arrive; nothing is
/// deduplicated or reordered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultAggregator {
    listings: Vec<Listing>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters untitled items out of `batch`, appends the rest and returns them.
    pub fn accept(&mut self, batch: SourceResultBatch) -> Vec<Listing> {
        let SourceResultBatch { source, items } = batch;
        let accepted: Vec<Listing> = items
            .into_iter()
            .filter_map(|item| {
                let title = item.title.filter(|title| !title.trim().is_empty())?;
                Some(Listing {
                    source: source.clone(),
                    title,
                    company: item.company,
                    url: item.url,
                })
            })
            .collect();
        self.listings.extend(accepted.iter().cloned());
        accepted
    }

    pub fn reset(&mut self) {
        self.listings.clear();
    }

    /// All accepted listings in arrival order.
    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    /// Listings with the most recently accepted first.
    pub fn newest_first(&self) -> impl Iterator<Item = &Listing> {
        self.listings.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn count_by_source(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for listing in &self.listings {
            *counts.entry(listing.source.clone()).or_insert(0) += 1;
        }
        counts
    }
}
