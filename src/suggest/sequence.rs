//! Request sequencing for out-of-order responses
//!
//! Requests are never aborted once issued. Each one takes a ticket; when the
//! answer comes back it is applied only if no newer ticket was issued (or the
//! controller invalidated the outstanding ones) in the meantime.
//!
//! A debounced query records `mark()` when it is scheduled and fires through
//! `issue_since`, so a clear or selection that lands between the timer firing
//! and the query task starting still wins.

#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: u64,
    /// Bumped only by `invalidate`
    epoch: u64,
}

impl RequestSequence {
    /// Ticket for a request about to be issued
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    /// Position to hand to `issue_since` later
    pub fn mark(&self) -> u64 {
        self.epoch
    }

    /// Issue a ticket unless the controller invalidated since `mark`.
    /// Tickets issued in between do not count: a newer query still goes out.
    pub fn issue_since(&mut self, mark: u64) -> Option<u64> {
        (self.epoch == mark).then(|| self.issue())
    }

    /// Make every outstanding ticket stale
    pub fn invalidate(&mut self) {
        self.latest += 1;
        self.epoch += 1;
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        ticket == self.latest
    }
}
