//! Create-vs-replace decision logic.
//!
//! Expressed as a pure decision table over (local record, caller-supplied
//! prior id, remote lookup outcome) so it can be tested without any remote
//! I/O. The local record always wins over the caller's hint because it
//! reflects this engine's own last confirmed action.

use crate::models::{InvoiceRecord, RecordStatus};

/// Outcome of looking up a caller-supplied prior invoice id in QuickBooks.
/// `NotAttempted` means no lookup was needed (no hint, or the local record
/// already settled the question).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteLookup {
    NotAttempted,
    NotFound,
    Found,
}

/// What to do for one submission attempt. `delete_target` is the remote
/// invoice to best-effort delete before re-creating; submission itself is
/// never skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionDecision {
    pub delete_target: Option<String>,
    pub status: RecordStatus,
}

pub fn decide(
    prior_record: Option<&InvoiceRecord>,
    caller_prior_id: Option<&str>,
    remote_lookup: RemoteLookup,
) -> SubmissionDecision {
    // A record with a confirmed remote invoice id settles the question:
    // replace our own last invoice, regardless of what the caller sent.
    if let Some(invoice_id) = prior_record.and_then(|r| r.qbo_invoice_id.as_deref()) {
        return SubmissionDecision {
            delete_target: Some(invoice_id.to_string()),
            status: RecordStatus::Updated,
        };
    }

    match (caller_prior_id, remote_lookup) {
        // Caller claims a prior invoice we never recorded and QuickBooks
        // cannot find it either: note the stale reference, create anyway.
        (Some(_), RemoteLookup::NotFound) => SubmissionDecision {
            delete_target: None,
            status: RecordStatus::OldInvoiceNotFound,
        },
        // The invoice exists remotely but nothing local confirms it is ours;
        // leave it for manual cleanup and create the new one.
        (Some(_), RemoteLookup::Found) => SubmissionDecision {
            delete_target: None,
            status: RecordStatus::DuplicateOldInvoicesFound,
        },
        _ => SubmissionDecision {
            delete_target: None,
            status: RecordStatus::Created,
        },
    }
}
