//! CAS 1.0 `/validate` response parsing.
//!
//! The body is `yes\n<identity>\n` on success and `no\n` otherwise.

/// What the CAS server said about a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Ticket accepted for this identity.
    Accepted(String),
    /// Ticket refused, or a "yes" without an identity.
    Rejected,
}

impl Verdict {
    pub fn parse(body: &str) -> Self {
        let mut lines = body.lines().map(|l| l.trim_end_matches('\r'));

        if lines.next() != Some("yes") {
            return Verdict::Rejected;
        }

        match lines.next() {
            Some(identity) if !identity.is_empty() => Verdict::Accepted(identity.to_string()),
            _ => Verdict::Rejected,
        }
    }
}
