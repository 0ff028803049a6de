/// Ticket handed to a request when it is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Tracks which outstanding request is allowed to deliver its result.
///
/// Every `issue` supersedes all earlier tickets, so a slow reply that lands
/// after a newer request was sent is refused instead of overwriting it.
#[derive(Debug, Default)]
pub struct RequestGate {
    latest: u64,
}

impl RequestGate {
    pub fn issue(&mut self) -> Ticket {
        self.latest += 1;
        Ticket(self.latest)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }
}
