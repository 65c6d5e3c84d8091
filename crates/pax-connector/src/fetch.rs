//! Fetch tokens
//!
//! Every connector fetch is tagged with a monotonically increasing token.
//! Only the response carrying the most recently issued token may touch the
//! catalog; anything older was superseded while in flight.

use std::fmt::{self, Display, Formatter};

/// Tag of one issued fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchToken(u64);

impl FetchToken {
    #[inline]
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl Display for FetchToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues tokens and recognises stale ones
#[derive(Debug, Default)]
pub struct FetchTracker {
    issued: u64,
    settled: bool,
}

impl FetchTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token, superseding any fetch still in flight
    pub fn issue(&mut self) -> FetchToken {
        self.issued += 1;
        self.settled = false;
        FetchToken(self.issued)
    }

    /// Token of the latest issued fetch
    #[inline]
    #[must_use]
    pub fn latest(&self) -> Option<FetchToken> {
        (self.issued > 0).then_some(FetchToken(self.issued))
    }

    /// Whether `token` is the latest issued
    #[inline]
    #[must_use]
    pub fn is_current(&self, token: FetchToken) -> bool {
        token.0 == self.issued
    }

    /// Whether the latest fetch is still outstanding
    #[inline]
    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.issued > 0 && !self.settled
    }

    /// Accept a completion
    ///
    /// Returns `false`, leaving state untouched, when `token` is stale or the
    /// latest fetch already settled.
    pub fn settle(&mut self, token: FetchToken) -> bool {
        if !self.is_current(token) || self.settled {
            return false;
        }
        self.settled = true;
        true
    }
}
