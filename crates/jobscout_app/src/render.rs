//! Plain-text rendering of listings and session summaries.

use std::io::Write;

use jobscout_core::{CompletionSummary, Listing, ListingView, SessionViewModel};

use crate::observer::SessionObserver;

pub fn listing_card(listing: &ListingView) -> String {
    let mut card = format!("{} | {} [{}]", listing.title, listing.company, listing.source);
    if let Some(url) = &listing.url {
        card.push_str("\n    ");
        card.push_str(url);
    }
    card
}

pub fn progress_line(percentage: f64) -> String {
    format!("Progress: {}%", percentage.round() as u8)
}

pub fn summary(view: &SessionViewModel) -> String {
    let mut lines = vec![format!("{} listings", view.listing_count)];
    for (source, count) in &view.per_source {
        lines.push(format!("  {source}: {count}"));
    }
    if let Some(label) = view.compute_time_label() {
        lines.push(format!("Total compute time: {label}"));
    }
    lines.join("\n")
}

/// Where a search stands, as seen by the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Running,
    Completed,
    /// The submit call failed; nothing was searched.
    Failed,
    /// The channel dropped before completion.
    Aborted,
}

/// Writes notifications as they arrive.
pub struct TerminalObserver<W: Write> {
    out: W,
    show_progress: bool,
    last_percent: Option<u8>,
    finished: bool,
    failed: bool,
    aborted: bool,
}

impl<W: Write> TerminalObserver<W> {
    pub fn new(out: W, show_progress: bool) -> Self {
        Self {
            out,
            show_progress,
            last_percent: None,
            finished: false,
            failed: false,
            aborted: false,
        }
    }

    pub fn outcome(&self) -> SearchOutcome {
        if self.failed {
            SearchOutcome::Failed
        } else if self.finished {
            SearchOutcome::Completed
        } else if self.aborted {
            SearchOutcome::Aborted
        } else {
            SearchOutcome::Running
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        // Output failures (closed pipe) must not disturb the session.
        let _ = writeln!(self.out, "{text}");
    }
}

impl<W: Write> SessionObserver for TerminalObserver<W> {
    fn on_ready(&mut self, session_id: &str) {
        self.line(&format!("Status: connected ({session_id})"));
    }

    fn on_result_appended(&mut self, listing: &Listing) {
        self.line(&listing_card(&ListingView::from(listing)));
    }

    fn on_progress(&mut self, percentage: f64) {
        let rounded = percentage.round() as u8;
        if self.show_progress && self.last_percent != Some(rounded) {
            self.last_percent = Some(rounded);
            self.line(&progress_line(percentage));
        }
    }

    fn on_warning(&mut self, message: &str) {
        self.line(&format!("Warning: {message}"));
    }

    fn on_completed(&mut self, summary: &CompletionSummary) {
        self.finished = true;
        self.line(&format!("Done in {} ms", summary.total_time_ms));
    }

    fn on_submission_failed(&mut self, message: &str) {
        self.failed = true;
        self.line(&format!("Error: {message}"));
    }

    fn on_disconnected(&mut self, job_aborted: bool) {
        self.aborted |= job_aborted;
        if job_aborted {
            self.line("Status: disconnected before the job completed");
        } else {
            self.line("Status: disconnected");
        }
    }
}
