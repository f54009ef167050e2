//! Position tracking for the interleaved transform cursor pair.

/// Which of the two concurrent operations a piece of state belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Client,
    Server,
}

impl Side {
    pub(crate) fn opposite(self) -> Side {
        match self {
            Side::Client => Side::Server,
            Side::Server => Side::Client,
        }
    }

    /// Index into per-side state arrays.
    pub(crate) fn index(self) -> usize {
        match self {
            Side::Client => 0,
            Side::Server => 1,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Side::Client => "client",
            Side::Server => "server",
        }
    }
}

/// A single shared relative offset exposed as two complementary views.
///
/// The offset is stored client-relative; the server view negates it, so
/// `get(Client) == -get(Server)` holds by construction. All positional
/// accounting is in terms of cursor positions in the base document both
/// original operations apply to.
#[derive(Debug, Default)]
pub(crate) struct PositionTracker {
    offset: i64,
}

impl PositionTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, side: Side) -> i64 {
        match side {
            Side::Client => self.offset,
            Side::Server => -self.offset,
        }
    }

    pub(crate) fn increase(&mut self, side: Side, amount: i64) {
        match side {
            Side::Client => self.offset += amount,
            Side::Server => self.offset -= amount,
        }
    }
}
