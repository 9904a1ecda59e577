//! Integration tests for `SqliteStore` against in-memory and on-disk
//! databases.

use std::time::Duration;

use procura_core::{
  Error as CoreError,
  bid::{BidFilter, BidPatch, BidStatus, CreatorType, Decision, NewBid},
  employee::{Employee, EmployeeDirectory},
  store::{Page, ProcurementStore},
  tender::{NewTender, ServiceType, Tender, TenderFilter, TenderPatch, TenderStatus},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn core(err: Error) -> CoreError {
  match err {
    Error::Core(e) => e,
    other => panic!("expected a domain error, got {other:?}"),
  }
}

fn new_tender(author: &Employee, org: Uuid, name: &str) -> NewTender {
  NewTender {
    name:            name.into(),
    description:     format!("{name} description"),
    service_type:    ServiceType::Construction,
    organization_id: org,
    creator_id:      author.id,
  }
}

fn new_bid(author: &Employee, org: Uuid, tender_id: Uuid) -> NewBid {
  NewBid {
    name:            "Offer".into(),
    description:     "We can do it".into(),
    tender_id,
    creator_type:    CreatorType::User,
    creator_id:      author.id,
    organization_id: org,
  }
}

/// A published tender owned by an organisation with `reviewers` employees,
/// and a published bid on it from a second organisation.
struct Fixture {
  tender_org: Uuid,
  author:     Employee,
  reviewers:  Vec<Employee>,
  bidder:     Employee,
  tender:     Tender,
  bid:        procura_core::bid::Bid,
}

async fn fixture(s: &SqliteStore, reviewers: usize) -> Fixture {
  let tender_org = Uuid::new_v4();
  let bidder_org = Uuid::new_v4();

  let mut staff = Vec::new();
  for i in 0..reviewers {
    staff.push(s.add_employee(&format!("reviewer{i}"), &[tender_org]).await.unwrap());
  }
  let author = staff[0].clone();
  let bidder = s.add_employee("bidder", &[bidder_org]).await.unwrap();

  let tender = s.create_tender(new_tender(&author, tender_org, "Bridge")).await.unwrap();
  let tender = s
    .update_tender(tender.id, author.id, TenderPatch::status(TenderStatus::Published))
    .await
    .unwrap();

  let bid = s.create_bid(new_bid(&bidder, bidder_org, tender.id)).await.unwrap();
  let bid = s
    .update_bid(bid.id, bidder.id, BidPatch::status(BidStatus::Published))
    .await
    .unwrap();

  Fixture { tender_org, author, reviewers: staff, bidder, tender, bid }
}

async fn tender_by_id(s: &SqliteStore, id: Uuid, viewer: &Employee) -> Tender {
  s.list_tenders(&TenderFilter::visible_to(viewer).with_id(id))
    .await
    .unwrap()
    .pop()
    .expect("tender visible")
}

async fn bid_by_id(s: &SqliteStore, id: Uuid, viewer: &Employee) -> procura_core::bid::Bid {
  s.list_bids(&BidFilter::visible_to(viewer).with_id(id))
    .await
    .unwrap()
    .pop()
    .expect("bid visible")
}

// ─── Directory ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn employee_lookup_includes_memberships() {
  let s = store().await;
  let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
  let added = s.add_employee("alice", &[a, b]).await.unwrap();

  let found = s.employee_by_username("alice").await.unwrap();
  assert_eq!(found.id, added.id);
  assert_eq!(found.organization_ids.len(), 2);
  assert!(found.belongs_to(a) && found.belongs_to(b));
}

#[tokio::test]
async fn unknown_username_is_user_not_found() {
  let s = store().await;
  let err = s.employee_by_username("nobody").await.unwrap_err();
  assert!(matches!(core(err), CoreError::UserNotFound(u) if u == "nobody"));
}

// ─── Tender versioning ───────────────────────────────────────────────────────

#[tokio::test]
async fn create_tender_starts_at_version_one() {
  let s = store().await;
  let org = Uuid::new_v4();
  let author = s.add_employee("author", &[org]).await.unwrap();

  let tender = s.create_tender(new_tender(&author, org, "Road")).await.unwrap();
  assert_eq!(tender.version_id, 1);
  assert_eq!(tender.status, TenderStatus::Created);
  assert_eq!(tender.creator_id, author.id);

  let log = s.tender_versions(tender.id).await.unwrap();
  assert_eq!(log.len(), 1);
  assert_eq!(log[0].version_id, 1);
  assert_eq!(log[0].name, "Road");
}

#[tokio::test]
async fn sparse_patch_touches_only_present_fields() {
  let s = store().await;
  let org = Uuid::new_v4();
  let author = s.add_employee("author", &[org]).await.unwrap();
  let tender = s.create_tender(new_tender(&author, org, "Road")).await.unwrap();

  let patch = TenderPatch {
    description: Some(String::new()),
    service_type: Some(ServiceType::Delivery),
    ..Default::default()
  };
  let updated = s.update_tender(tender.id, author.id, patch).await.unwrap();

  assert_eq!(updated.name, "Road");
  assert_eq!(updated.description, "");
  assert_eq!(updated.service_type, ServiceType::Delivery);
  assert_eq!(updated.status, TenderStatus::Created);
  assert_eq!(updated.version_id, 2);

  let log = s.tender_versions(tender.id).await.unwrap();
  assert_eq!(log[1].description, "");
  assert_eq!(log[1].service_type, ServiceType::Delivery);
}

#[tokio::test]
async fn versions_are_gap_free() {
  let s = store().await;
  let org = Uuid::new_v4();
  let author = s.add_employee("author", &[org]).await.unwrap();
  let tender = s.create_tender(new_tender(&author, org, "Road")).await.unwrap();

  for i in 0..6 {
    let patch = TenderPatch { name: Some(format!("Road {i}")), ..Default::default() };
    s.update_tender(tender.id, author.id, patch).await.unwrap();
  }
  s.rollback_tender(tender.id, 2, author.id).await.unwrap();

  let current = tender_by_id(&s, tender.id, &author).await;
  assert_eq!(current.version_id, 8);

  let log = s.tender_versions(tender.id).await.unwrap();
  let ids: Vec<u32> = log.iter().map(|v| v.version_id).collect();
  assert_eq!(ids, (1..=8).collect::<Vec<_>>());
}

#[tokio::test]
async fn rollback_restores_snapshot_as_new_version() {
  let s = store().await;
  let org = Uuid::new_v4();
  let author = s.add_employee("author", &[org]).await.unwrap();
  let tender = s.create_tender(new_tender(&author, org, "Road")).await.unwrap();

  let k = 3;
  for i in 0..k {
    let patch = TenderPatch {
      name: Some(format!("Road v{}", i + 2)),
      status: Some(TenderStatus::Published),
      ..Default::default()
    };
    s.update_tender(tender.id, author.id, patch).await.unwrap();
  }

  let target = s.tender_versions(tender.id).await.unwrap()[1].clone();
  let rolled = s.rollback_tender(tender.id, 2, author.id).await.unwrap();

  assert_eq!(rolled.version_id, k + 2);
  assert_eq!(rolled.name, target.name);
  assert_eq!(rolled.description, target.description);
  assert_eq!(rolled.status, target.status);
  assert_eq!(rolled.service_type, target.service_type);

  let log = s.tender_versions(tender.id).await.unwrap();
  assert_eq!(log.len(), (k + 2) as usize);
  assert_eq!(log.last().unwrap().name, "Road v2");
  // Earlier rows are untouched.
  assert_eq!(log[3].name, "Road v4");
}

#[tokio::test]
async fn create_update_rollback_scenario() {
  let s = store().await;
  let org = Uuid::new_v4();
  let author = s.add_employee("author", &[org]).await.unwrap();

  let a = s.create_tender(new_tender(&author, org, "A")).await.unwrap();
  assert_eq!((a.version_id, a.status), (1, TenderStatus::Created));

  let patch = TenderPatch { description: Some("changed".into()), ..Default::default() };
  let a2 = s.update_tender(a.id, author.id, patch).await.unwrap();
  assert_eq!(a2.version_id, 2);
  assert_eq!(a2.description, "changed");

  let a3 = s.rollback_tender(a.id, 1, author.id).await.unwrap();
  assert_eq!(a3.version_id, 3);
  assert_eq!(a3.description, a.description);
  assert_eq!(a3.status, TenderStatus::Created);
}

#[tokio::test]
async fn rollback_to_unknown_version_is_not_found() {
  let s = store().await;
  let org = Uuid::new_v4();
  let author = s.add_employee("author", &[org]).await.unwrap();
  let tender = s.create_tender(new_tender(&author, org, "Road")).await.unwrap();

  let err = s.rollback_tender(tender.id, 7, author.id).await.unwrap_err();
  assert!(matches!(core(err), CoreError::VersionNotFound { version: 7, .. }));

  assert_eq!(tender_by_id(&s, tender.id, &author).await.version_id, 1);
  assert_eq!(s.tender_versions(tender.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn foreign_creator_cannot_mutate() {
  let s = store().await;
  let org = Uuid::new_v4();
  let author = s.add_employee("author", &[org]).await.unwrap();
  let colleague = s.add_employee("colleague", &[org]).await.unwrap();
  let tender = s.create_tender(new_tender(&author, org, "Road")).await.unwrap();

  let patch = TenderPatch { name: Some("Hijacked".into()), ..Default::default() };
  let err = s.update_tender(tender.id, colleague.id, patch).await.unwrap_err();
  assert!(matches!(core(err), CoreError::TenderNotFound(id) if id == tender.id));

  let err = s.rollback_tender(tender.id, 1, colleague.id).await.unwrap_err();
  assert!(core(err).is_not_found());

  let current = tender_by_id(&s, tender.id, &author).await;
  assert_eq!(current, tender);
  assert_eq!(s.tender_versions(tender.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_of_missing_tender_is_not_found() {
  let s = store().await;
  let err = s
    .update_tender(Uuid::new_v4(), Uuid::new_v4(), TenderPatch::default())
    .await
    .unwrap_err();
  assert!(matches!(core(err), CoreError::TenderNotFound(_)));
}

// ─── Tender listing ──────────────────────────────────────────────────────────

#[tokio::test]
async fn tender_visibility_follows_org_and_status() {
  let s = store().await;
  let (org, other) = (Uuid::new_v4(), Uuid::new_v4());
  let author = s.add_employee("author", &[org]).await.unwrap();
  let outsider = s.add_employee("outsider", &[other]).await.unwrap();

  let draft = s.create_tender(new_tender(&author, org, "Draft")).await.unwrap();
  let public = s.create_tender(new_tender(&author, org, "Public")).await.unwrap();
  s.update_tender(public.id, author.id, TenderPatch::status(TenderStatus::Published))
    .await
    .unwrap();

  let mine = s.list_tenders(&TenderFilter::visible_to(&author)).await.unwrap();
  assert_eq!(mine.len(), 2);

  let theirs = s.list_tenders(&TenderFilter::visible_to(&outsider)).await.unwrap();
  assert_eq!(theirs.len(), 1);
  assert_eq!(theirs[0].id, public.id);

  let hidden = s
    .list_tenders(&TenderFilter::visible_to(&outsider).with_id(draft.id))
    .await
    .unwrap();
  assert!(hidden.is_empty());
}

#[tokio::test]
async fn tender_listing_filters_and_paginates() {
  let s = store().await;
  let org = Uuid::new_v4();
  let author = s.add_employee("author", &[org]).await.unwrap();
  let colleague = s.add_employee("colleague", &[org]).await.unwrap();

  for i in 0..7 {
    s.create_tender(new_tender(&author, org, &format!("T{i}"))).await.unwrap();
  }
  let mut delivery = new_tender(&colleague, org, "Delivery");
  delivery.service_type = ServiceType::Delivery;
  s.create_tender(delivery).await.unwrap();

  let first = s.list_tenders(&TenderFilter::visible_to(&author)).await.unwrap();
  assert_eq!(first.len(), procura_core::DEFAULT_LIMIT as usize);

  let rest = s
    .list_tenders(&TenderFilter {
      page: Page::new(Some(5), Some(10)),
      ..TenderFilter::visible_to(&author)
    })
    .await
    .unwrap();
  assert_eq!(rest.len(), 3);

  let by_type = s
    .list_tenders(&TenderFilter {
      service_type: Some(ServiceType::Delivery),
      ..TenderFilter::visible_to(&author)
    })
    .await
    .unwrap();
  assert_eq!(by_type.len(), 1);
  assert_eq!(by_type[0].creator_id, colleague.id);

  let own = s
    .list_tenders(&TenderFilter {
      creator_id: Some(author.id),
      page: Page::new(None, Some(100)),
      ..TenderFilter::visible_to(&author)
    })
    .await
    .unwrap();
  assert_eq!(own.len(), 7);

  let published = s
    .list_tenders(&TenderFilter {
      statuses: vec![TenderStatus::Published],
      ..TenderFilter::visible_to(&author)
    })
    .await
    .unwrap();
  assert!(published.is_empty());
}

// ─── Bids ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn bid_requires_existing_tender() {
  let s = store().await;
  let org = Uuid::new_v4();
  let bidder = s.add_employee("bidder", &[org]).await.unwrap();

  let missing = Uuid::new_v4();
  let err = s.create_bid(new_bid(&bidder, org, missing)).await.unwrap_err();
  assert!(matches!(core(err), CoreError::TenderNotFound(id) if id == missing));
}

#[tokio::test]
async fn bid_visibility_for_tender_org_starts_after_creation() {
  let s = store().await;
  let tender_org = Uuid::new_v4();
  let bidder_org = Uuid::new_v4();
  let reviewer = s.add_employee("reviewer", &[tender_org]).await.unwrap();
  let bidder = s.add_employee("bidder", &[bidder_org]).await.unwrap();
  let stranger = s.add_employee("stranger", &[Uuid::new_v4()]).await.unwrap();

  let tender = s.create_tender(new_tender(&reviewer, tender_org, "Road")).await.unwrap();
  let bid = s.create_bid(new_bid(&bidder, bidder_org, tender.id)).await.unwrap();
  assert_eq!((bid.version_id, bid.status), (1, BidStatus::Created));

  let for_tender = |who: &Employee| BidFilter {
    tender_id: Some(tender.id),
    ..BidFilter::visible_to(who)
  };

  assert_eq!(s.list_bids(&for_tender(&bidder)).await.unwrap().len(), 1);
  assert!(s.list_bids(&for_tender(&reviewer)).await.unwrap().is_empty());

  s.update_bid(bid.id, bidder.id, BidPatch::status(BidStatus::Published))
    .await
    .unwrap();

  assert_eq!(s.list_bids(&for_tender(&reviewer)).await.unwrap().len(), 1);
  assert!(s.list_bids(&for_tender(&stranger)).await.unwrap().is_empty());
}

#[tokio::test]
async fn bid_patch_cannot_decide() {
  let s = store().await;
  let f = fixture(&s, 1).await;

  let err = s
    .update_bid(f.bid.id, f.bidder.id, BidPatch::status(BidStatus::Approved))
    .await
    .unwrap_err();
  assert!(matches!(core(err), CoreError::InvalidStatusChange(BidStatus::Approved)));
  assert_eq!(s.bid_versions(f.bid.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn bid_rollback_restores_and_appends() {
  let s = store().await;
  let f = fixture(&s, 1).await;

  let patch = BidPatch { name: Some("Better offer".into()), ..Default::default() };
  let v3 = s.update_bid(f.bid.id, f.bidder.id, patch).await.unwrap();
  assert_eq!(v3.version_id, 3);

  let v4 = s.rollback_bid(f.bid.id, 1, f.bidder.id).await.unwrap();
  assert_eq!(v4.version_id, 4);
  assert_eq!(v4.name, "Offer");
  assert_eq!(v4.status, BidStatus::Created);

  let err = s.rollback_bid(f.bid.id, 1, f.reviewers[0].id).await.unwrap_err();
  assert!(matches!(core(err), CoreError::BidNotFound(_)));

  let log = s.bid_versions(f.bid.id).await.unwrap();
  assert_eq!(log.iter().map(|v| v.version_id).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn approved_bid_is_frozen() {
  let s = store().await;
  let f = fixture(&s, 1).await;

  let decided = s
    .submit_decision(f.bid.id, f.author.id, &[f.tender_org], Decision::Approved)
    .await
    .unwrap();
  assert_eq!(decided.status, BidStatus::Approved);

  let err = s
    .update_bid(f.bid.id, f.bidder.id, BidPatch::status(BidStatus::Published))
    .await
    .unwrap_err();
  assert!(matches!(core(err), CoreError::InvalidStatusChange(BidStatus::Approved)));

  let err = s.rollback_bid(f.bid.id, 1, f.bidder.id).await.unwrap_err();
  assert!(matches!(core(err), CoreError::InvalidStatusChange(BidStatus::Approved)));

  let bid = bid_by_id(&s, f.bid.id, &f.bidder).await;
  assert_eq!(bid, decided);
  assert_eq!(s.bid_versions(f.bid.id).await.unwrap().len(), 3);
  assert_eq!(tender_by_id(&s, f.tender.id, &f.author).await.status, TenderStatus::Closed);
}

#[tokio::test]
async fn rejected_bid_cannot_be_reopened() {
  let s = store().await;
  let f = fixture(&s, 3).await;
  let r = &f.reviewers;

  s.submit_decision(f.bid.id, r[0].id, &[f.tender_org], Decision::Rejected)
    .await
    .unwrap();

  let err = s
    .update_bid(f.bid.id, f.bidder.id, BidPatch::status(BidStatus::Published))
    .await
    .unwrap_err();
  assert!(matches!(core(err), CoreError::InvalidStatusChange(BidStatus::Rejected)));

  let patch = BidPatch { description: Some("Revised".into()), ..Default::default() };
  let err = s.update_bid(f.bid.id, f.bidder.id, patch).await.unwrap_err();
  assert!(matches!(core(err), CoreError::InvalidStatusChange(BidStatus::Rejected)));

  let err = s.rollback_bid(f.bid.id, 2, f.bidder.id).await.unwrap_err();
  assert!(matches!(core(err), CoreError::InvalidStatusChange(BidStatus::Rejected)));

  // Further votes find no open bid.
  let err = s
    .submit_decision(f.bid.id, r[1].id, &[f.tender_org], Decision::Approved)
    .await
    .unwrap_err();
  assert!(matches!(core(err), CoreError::BidNotFound(_)));

  assert_eq!(bid_by_id(&s, f.bid.id, &f.bidder).await.status, BidStatus::Rejected);
  assert_eq!(s.decisions(f.bid.id).await.unwrap().len(), 1);
}

// ─── Quorum ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn three_approvals_approve_bid_and_close_tender() {
  let s = store().await;
  let f = fixture(&s, 4).await;
  let tender_version = f.tender.version_id;
  let bid_version = f.bid.version_id;

  for reviewer in &f.reviewers[..2] {
    let bid = s
      .submit_decision(f.bid.id, reviewer.id, &reviewer.organization_ids, Decision::Approved)
      .await
      .unwrap();
    assert_eq!(bid.status, BidStatus::Published);
    assert_eq!(bid.version_id, bid_version);
  }
  assert_eq!(tender_by_id(&s, f.tender.id, &f.author).await.status, TenderStatus::Published);

  let third = &f.reviewers[2];
  let bid = s
    .submit_decision(f.bid.id, third.id, &third.organization_ids, Decision::Approved)
    .await
    .unwrap();
  assert_eq!(bid.status, BidStatus::Approved);
  assert_eq!(bid.version_id, bid_version + 1);

  let tender = tender_by_id(&s, f.tender.id, &f.author).await;
  assert_eq!(tender.status, TenderStatus::Closed);
  assert_eq!(tender.version_id, tender_version + 1);

  let tender_log = s.tender_versions(f.tender.id).await.unwrap();
  assert_eq!(tender_log.last().unwrap().status, TenderStatus::Closed);
  let bid_log = s.bid_versions(f.bid.id).await.unwrap();
  assert_eq!(bid_log.last().unwrap().status, BidStatus::Approved);
  assert_eq!(s.decisions(f.bid.id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn single_member_org_approves_immediately() {
  let s = store().await;
  let f = fixture(&s, 1).await;

  let bid = s
    .submit_decision(f.bid.id, f.author.id, &[f.tender_org], Decision::Approved)
    .await
    .unwrap();
  assert_eq!(bid.status, BidStatus::Approved);
  assert_eq!(tender_by_id(&s, f.tender.id, &f.author).await.status, TenderStatus::Closed);
}

#[tokio::test]
async fn two_member_org_needs_both() {
  let s = store().await;
  let f = fixture(&s, 2).await;

  let first = &f.reviewers[0];
  let bid = s
    .submit_decision(f.bid.id, first.id, &[f.tender_org], Decision::Approved)
    .await
    .unwrap();
  assert_eq!(bid.status, BidStatus::Published);

  let second = &f.reviewers[1];
  let bid = s
    .submit_decision(f.bid.id, second.id, &[f.tender_org], Decision::Approved)
    .await
    .unwrap();
  assert_eq!(bid.status, BidStatus::Approved);
}

#[tokio::test]
async fn rejection_dominates() {
  let s = store().await;
  let f = fixture(&s, 3).await;
  let r = &f.reviewers;

  s.submit_decision(f.bid.id, r[0].id, &[f.tender_org], Decision::Approved).await.unwrap();
  s.submit_decision(f.bid.id, r[1].id, &[f.tender_org], Decision::Approved).await.unwrap();
  let bid = s
    .submit_decision(f.bid.id, r[2].id, &[f.tender_org], Decision::Rejected)
    .await
    .unwrap();

  assert_eq!(bid.status, BidStatus::Rejected);
  assert_eq!(bid.version_id, f.bid.version_id + 1);
  let tender = tender_by_id(&s, f.tender.id, &f.author).await;
  assert_eq!(tender.status, TenderStatus::Published);
  assert_eq!(tender.version_id, f.tender.version_id);
}

#[tokio::test]
async fn repeat_votes_count_once() {
  let s = store().await;
  let f = fixture(&s, 3).await;
  let voter = &f.reviewers[0];

  for _ in 0..3 {
    let bid = s
      .submit_decision(f.bid.id, voter.id, &[f.tender_org], Decision::Approved)
      .await
      .unwrap();
    assert_eq!(bid.status, BidStatus::Published);
  }

  let decisions = s.decisions(f.bid.id).await.unwrap();
  assert_eq!(decisions.len(), 1);
  assert_eq!(decisions[0].employee_id, voter.id);
  assert_eq!(decisions[0].decision, Decision::Approved);
}

#[tokio::test]
async fn outsider_decision_is_forbidden_and_not_recorded() {
  let s = store().await;
  let f = fixture(&s, 3).await;

  let err = s
    .submit_decision(f.bid.id, f.bidder.id, &f.bidder.organization_ids, Decision::Rejected)
    .await
    .unwrap_err();
  assert!(matches!(core(err), CoreError::Forbidden));

  let err = s
    .submit_decision(f.bid.id, f.bidder.id, &[], Decision::Rejected)
    .await
    .unwrap_err();
  assert!(matches!(core(err), CoreError::Forbidden));

  assert!(s.decisions(f.bid.id).await.unwrap().is_empty());
  assert_eq!(bid_by_id(&s, f.bid.id, &f.bidder).await.status, BidStatus::Published);
}

#[tokio::test]
async fn decisions_on_closed_or_missing_bids_are_not_found() {
  let s = store().await;
  let f = fixture(&s, 1).await;

  let err = s
    .submit_decision(Uuid::new_v4(), f.author.id, &[f.tender_org], Decision::Approved)
    .await
    .unwrap_err();
  assert!(matches!(core(err), CoreError::BidNotFound(_)));

  s.submit_decision(f.bid.id, f.author.id, &[f.tender_org], Decision::Approved)
    .await
    .unwrap();
  let err = s
    .submit_decision(f.bid.id, f.author.id, &[f.tender_org], Decision::Rejected)
    .await
    .unwrap_err();
  assert!(matches!(core(err), CoreError::BidNotFound(_)));
  assert_eq!(bid_by_id(&s, f.bid.id, &f.bidder).await.status, BidStatus::Approved);
}

#[tokio::test]
async fn unpublished_bid_rejects_decisions() {
  let s = store().await;
  let f = fixture(&s, 1).await;
  s.update_bid(f.bid.id, f.bidder.id, BidPatch::status(BidStatus::Closed))
    .await
    .unwrap();

  let err = s
    .submit_decision(f.bid.id, f.author.id, &[f.tender_org], Decision::Approved)
    .await
    .unwrap_err();
  assert!(matches!(core(err), CoreError::BidNotFound(_)));
}

// ─── Concurrency and deadlines ───────────────────────────────────────────────

#[tokio::test]
async fn concurrent_updates_on_one_handle_serialize() {
  let s = store().await;
  let org = Uuid::new_v4();
  let author = s.add_employee("author", &[org]).await.unwrap();
  let tender = s.create_tender(new_tender(&author, org, "Road")).await.unwrap();

  let one = TenderPatch { name: Some("one".into()), ..Default::default() };
  let two = TenderPatch { name: Some("two".into()), ..Default::default() };
  let (a, b) = tokio::join!(
    s.update_tender(tender.id, author.id, one),
    s.update_tender(tender.id, author.id, two),
  );

  let mut versions = vec![a.unwrap().version_id, b.unwrap().version_id];
  versions.sort();
  assert_eq!(versions, vec![2, 3]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_across_connections_serialize() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("procura.db");
  let a = SqliteStore::open(&path).await.unwrap();
  let b = SqliteStore::open(&path).await.unwrap();

  let org = Uuid::new_v4();
  let author = a.add_employee("author", &[org]).await.unwrap();
  let tender = a.create_tender(new_tender(&author, org, "Road")).await.unwrap();

  let mut tasks = Vec::new();
  for i in 0..10 {
    let handle = if i % 2 == 0 { a.clone() } else { b.clone() };
    let (id, creator) = (tender.id, author.id);
    tasks.push(tokio::spawn(async move {
      let patch = TenderPatch { name: Some(format!("edit {i}")), ..Default::default() };
      handle.update_tender(id, creator, patch).await.unwrap().version_id
    }));
  }

  let mut versions = Vec::new();
  for t in tasks {
    versions.push(t.await.unwrap());
  }
  versions.sort();
  assert_eq!(versions, (2..=11).collect::<Vec<_>>());

  let log = b.tender_versions(tender.id).await.unwrap();
  assert_eq!(log.len(), 11);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_decisions_reach_quorum_once() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("procura.db");
  let a = SqliteStore::open(&path).await.unwrap();
  let b = SqliteStore::open(&path).await.unwrap();

  let f = fixture(&a, 3).await;

  let mut tasks = Vec::new();
  for (i, reviewer) in f.reviewers.iter().enumerate() {
    let handle = if i % 2 == 0 { a.clone() } else { b.clone() };
    let (bid_id, reviewer) = (f.bid.id, reviewer.clone());
    tasks.push(tokio::spawn(async move {
      handle
        .submit_decision(bid_id, reviewer.id, &reviewer.organization_ids, Decision::Approved)
        .await
        .unwrap()
        .status
    }));
  }

  let mut statuses = Vec::new();
  for t in tasks {
    statuses.push(t.await.unwrap());
  }
  let approved = statuses.iter().filter(|s| **s == BidStatus::Approved).count();
  let pending = statuses.iter().filter(|s| **s == BidStatus::Published).count();
  assert_eq!((approved, pending), (1, 2), "{statuses:?}");

  let tender = tender_by_id(&b, f.tender.id, &f.author).await;
  assert_eq!(tender.status, TenderStatus::Closed);
  assert_eq!(tender.version_id, f.tender.version_id + 1);

  let log = b.bid_versions(f.bid.id).await.unwrap();
  assert_eq!(log.len(), f.bid.version_id as usize + 1);
  assert_eq!(log.iter().filter(|v| v.status == BidStatus::Approved).count(), 1);
  assert_eq!(b.decisions(f.bid.id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn missed_deadline_rolls_back() {
  let s = store().await;
  let org = Uuid::new_v4();
  let author = s.add_employee("author", &[org]).await.unwrap();
  let tender = s.create_tender(new_tender(&author, org, "Road")).await.unwrap();

  let hurried = s.clone().with_write_timeout(Duration::ZERO);

  let err = hurried.create_tender(new_tender(&author, org, "Late")).await.unwrap_err();
  assert!(matches!(core(err), CoreError::DeadlineExceeded));

  let patch = TenderPatch { name: Some("Late".into()), ..Default::default() };
  let err = hurried.update_tender(tender.id, author.id, patch).await.unwrap_err();
  assert!(matches!(core(err), CoreError::DeadlineExceeded));

  let all = s.list_tenders(&TenderFilter::visible_to(&author)).await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].version_id, 1);
  assert_eq!(s.tender_versions(tender.id).await.unwrap().len(), 1);

  // The lock was released: the patient handle can still write.
  let relaxed = s.clone().with_write_timeout(Duration::from_secs(5));
  let patch = TenderPatch { name: Some("On time".into()), ..Default::default() };
  assert_eq!(relaxed.update_tender(tender.id, author.id, patch).await.unwrap().version_id, 2);
}
