//! Refresh gate for a single trace view.
//!
//! At most one fetch per view is ever in flight. Requests made while a
//! fetch is outstanding collapse into a single follow-up that starts when
//! the current one completes. Once the view is closed every result is
//! discarded.

/// Handle for one fetch; hand it back to [`RefreshGate::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshDecision {
    /// Issue a fetch now.
    Start(RefreshTicket),
    /// A fetch is already running; a follow-up has been queued.
    Coalesced,
    /// The view is gone.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Apply the result. If `follow_up` is set, start that fetch next.
    Apply { follow_up: Option<RefreshTicket> },
    /// Stale or closed; drop the result.
    Discard,
}

#[derive(Debug, Clone, Default)]
pub struct RefreshGate {
    next_ticket: u64,
    in_flight: Option<RefreshTicket>,
    pending: bool,
    closed: bool,
}

impl RefreshGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self) -> RefreshDecision {
        if self.closed {
            return RefreshDecision::Closed;
        }
        if self.in_flight.is_some() {
            self.pending = true;
            return RefreshDecision::Coalesced;
        }
        RefreshDecision::Start(self.issue())
    }

    pub fn complete(&mut self, ticket: RefreshTicket) -> Completion {
        if self.closed || self.in_flight != Some(ticket) {
            return Completion::Discard;
        }
        self.in_flight = None;
        let follow_up = if std::mem::take(&mut self.pending) {
            Some(self.issue())
        } else {
            None
        };
        Completion::Apply { follow_up }
    }

    /// Tear down: the in-flight result and any queued follow-up are dropped.
    pub fn close(&mut self) {
        self.closed = true;
        self.pending = false;
        self.in_flight = None;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn has_pending(&self) -> bool {
        self.pending
    }

    fn issue(&mut self) -> RefreshTicket {
        self.next_ticket += 1;
        let ticket = RefreshTicket(self.next_ticket);
        self.in_flight = Some(ticket);
        ticket
    }
}
