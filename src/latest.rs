use std::sync::atomic::{AtomicU64, Ordering};

/// Issued by [`LatestRequest::begin`]; identifies one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// Discards results of asynchronous work that a newer request superseded.
///
/// Call [`begin`](Self::begin) when dispatching work and pass the ticket back
/// with the result; only the most recent ticket is accepted, however late or
/// out of order completions arrive.
#[derive(Debug, Default)]
pub struct LatestRequest {
    issued: AtomicU64,
}

impl LatestRequest {
    pub fn begin(&self) -> RequestTicket {
        RequestTicket(self.issued.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.issued.load(Ordering::Acquire) == ticket.0
    }

    /// `Some(value)` if `ticket` is still the latest request.
    pub fn accept<T>(&self, ticket: RequestTicket, value: T) -> Option<T> {
        self.is_current(ticket).then_some(value)
    }
}
