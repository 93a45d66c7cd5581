/// Identifies one lookup attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LookupTicket(u64);

/// Generation counter for one kind of lookup.
///
/// Starting a lookup supersedes every earlier one; when an older lookup
/// completes afterwards its ticket is no longer current and the result is
/// dropped instead of overwriting newer state.
#[derive(Debug, Default, Clone)]
pub struct LookupTracker {
    generation: u64,
    in_flight: bool,
}

impl LookupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) -> LookupTicket {
        self.generation += 1;
        self.in_flight = true;
        LookupTicket(self.generation)
    }

    pub fn is_current(&self, ticket: LookupTicket) -> bool {
        ticket.0 == self.generation
    }

    /// Accept a completed lookup. Returns `false` for stale tickets.
    pub fn finish(&mut self, ticket: LookupTicket) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(ticket = ticket.0, current = self.generation, "discarding stale lookup");
            return false;
        }
        self.in_flight = false;
        true
    }

    /// Supersede whatever is in flight without starting anything new
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.in_flight = false;
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }
}
