//! Access policy: pure predicates over an employee and an entity.
//!
//! The orchestration layer consults these before calling the store. The
//! store repeats the same conditions in its WHERE clauses.

use uuid::Uuid;

use crate::{
  bid::{Bid, BidStatus},
  employee::Employee,
  tender::{Tender, TenderStatus},
};

/// An entity with an owning organisation and a creator.
pub trait Owned {
  fn organization_id(&self) -> Uuid;
  fn creator_id(&self) -> Uuid;
}

impl Owned for Tender {
  fn organization_id(&self) -> Uuid { self.organization_id }

  fn creator_id(&self) -> Uuid { self.creator_id }
}

impl Owned for Bid {
  fn organization_id(&self) -> Uuid { self.organization_id }

  fn creator_id(&self) -> Uuid { self.creator_id }
}

/// Members of the owning organisation always; everyone once published.
pub fn can_view_tender(tender: &Tender, caller: &Employee) -> bool {
  caller.belongs_to(tender.organization_id)
    || tender.status == TenderStatus::Published
}

/// Members of the bidding organisation always; members of the tender's
/// organisation once the bid has left `Created`.
pub fn can_view_bid(bid: &Bid, tender_organization_id: Uuid, caller: &Employee) -> bool {
  caller.belongs_to(bid.organization_id)
    || (bid.status != BidStatus::Created && caller.belongs_to(tender_organization_id))
}

/// Only the creator may update or roll back.
pub fn can_mutate<E: Owned>(entity: &E, caller: &Employee) -> bool {
  entity.creator_id() == caller.id
}

/// Version logs include pre-publication drafts, so only members of the
/// owning organisation may read them.
pub fn can_view_history<E: Owned>(entity: &E, caller: &Employee) -> bool {
  caller.belongs_to(entity.organization_id())
}

/// Creating a tender or bid on behalf of an organisation requires
/// membership.
pub fn can_create_for(organization_id: Uuid, caller: &Employee) -> bool {
  caller.belongs_to(organization_id)
}

/// Decisions are accepted on a published bid of a published tender, from a
/// member of the tender's organisation.
pub fn can_decide(bid: &Bid, tender: &Tender, caller: &Employee) -> bool {
  bid.tender_id == tender.id
    && bid.status == BidStatus::Published
    && tender.status == TenderStatus::Published
    && caller.belongs_to(tender.organization_id)
}
