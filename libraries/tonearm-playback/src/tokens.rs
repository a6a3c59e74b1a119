//! Request tokens for stale-result suppression
//!
//! Each class of asynchronous operation (track loads, queue restoration) has
//! its own `RequestTokens`. A result is applied only if it carries the latest
//! token issued for its class.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag carried by an asynchronous request and its response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestToken(u64);

impl RequestToken {
    /// Raw counter value
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic token generator for one operation class
#[derive(Debug, Clone, Default)]
pub struct RequestTokens {
    latest: u64,
    // Set when the latest token was invalidated without a replacement
    cancelled: bool,
}

impl RequestTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new token, superseding every earlier one
    pub fn issue(&mut self) -> RequestToken {
        self.latest += 1;
        self.cancelled = false;
        RequestToken(self.latest)
    }

    /// Supersede the outstanding token without issuing a new request
    pub fn invalidate(&mut self) {
        self.cancelled = true;
    }

    /// Whether a response tagged `token` may still be applied
    pub fn is_current(&self, token: RequestToken) -> bool {
        !self.cancelled && token.0 == self.latest
    }

    /// Latest live token, if any
    pub fn current(&self) -> Option<RequestToken> {
        (!self.cancelled && self.latest > 0).then_some(RequestToken(self.latest))
    }
}
