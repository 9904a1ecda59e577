//! Quorum rules for bid decisions.
//!
//! The store counts decisions under its write lock and asks this module
//! what, if anything, the bid should become.

use crate::bid::Decision;

/// Upper bound on the number of approvals a bid ever needs.
pub const MAX_QUORUM: u32 = 3;

/// Approvals required for a tender organisation with `organization_size`
/// employees: `min(3, size)`, but never less than one.
pub fn threshold(organization_size: u32) -> u32 {
  organization_size.clamp(1, MAX_QUORUM)
}

/// Decision counts for one bid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
  pub approved: u32,
  pub rejected: u32,
}

impl Tally {
  pub fn record(&mut self, decision: Decision) {
    match decision {
      Decision::Approved => self.approved += 1,
      Decision::Rejected => self.rejected += 1,
    }
  }

  /// The terminal state the bid moves to, if the tally is decisive.
  ///
  /// Reaching the approval threshold wins; otherwise any rejection is
  /// decisive; otherwise the bid stays published.
  pub fn outcome(&self, threshold: u32) -> Option<Decision> {
    if self.approved >= threshold {
      Some(Decision::Approved)
    } else if self.rejected >= 1 {
      Some(Decision::Rejected)
    } else {
      None
    }
  }
}

impl FromIterator<Decision> for Tally {
  fn from_iter<I: IntoIterator<Item = Decision>>(iter: I) -> Self {
    let mut tally = Tally::default();
    for d in iter {
      tally.record(d);
    }
    tally
  }
}
