mod common;

use common::*;
use roost_core::{LikeOutcome, LikeTarget, MatchResolver};
use uuid::Uuid;

#[tokio::test]
async fn reciprocal_likes_form_exactly_one_match() {
    let db = memory_db();
    let resolver = MatchResolver::new(db.clone());
    let tenant = seed_tenant(&db);
    let landlord = seed_landlord(&db);
    let listing = seed_listing(&db, landlord);

    let first = resolver.record_like(tenant, LikeTarget::Listing(listing)).await;
    assert!(matches!(first, LikeOutcome::Recorded));

    let second = resolver
        .record_like(
            landlord,
            LikeTarget::Tenant { tenant_id: tenant, listing_id: listing },
        )
        .await;
    let LikeOutcome::Matched { record, newly_formed } = second else {
        panic!("expected a match, got {:?}", second);
    };
    assert!(newly_formed);
    assert_eq!(record.tenant_id, tenant);
    assert_eq!(record.landlord_id, landlord);
    assert_eq!(record.listing_id, listing);

    let count: i64 = db
        .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM matches", [], |r| r.get(0))?))
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn match_forms_in_either_arrival_order() {
    let db = memory_db();
    let resolver = MatchResolver::new(db.clone());
    let tenant = seed_tenant(&db);
    let landlord = seed_landlord(&db);
    let listing = seed_listing(&db, landlord);

    let first = resolver
        .record_like(
            landlord,
            LikeTarget::Tenant { tenant_id: tenant, listing_id: listing },
        )
        .await;
    assert!(matches!(first, LikeOutcome::Recorded));

    let second = resolver.record_like(tenant, LikeTarget::Listing(listing)).await;
    assert!(matches!(second, LikeOutcome::Matched { newly_formed: true, .. }));
}

#[tokio::test]
async fn repeat_swipes_are_idempotent_and_restate_the_match() {
    let db = memory_db();
    let resolver = MatchResolver::new(db.clone());
    let tenant = seed_tenant(&db);
    let landlord = seed_landlord(&db);
    let listing = seed_listing(&db, landlord);

    resolver.record_like(tenant, LikeTarget::Listing(listing)).await;
    let repeat = resolver.record_like(tenant, LikeTarget::Listing(listing)).await;
    assert!(matches!(repeat, LikeOutcome::Recorded));

    let formed = resolver
        .record_like(
            landlord,
            LikeTarget::Tenant { tenant_id: tenant, listing_id: listing },
        )
        .await;
    let LikeOutcome::Matched { record: original, newly_formed: true } = formed else {
        panic!("expected a fresh match");
    };

    // A double-tap after the match still answers Matched, same row, but
    // is no longer reported as newly formed.
    let restated = resolver.record_like(tenant, LikeTarget::Listing(listing)).await;
    let LikeOutcome::Matched { record: again, newly_formed: false } = restated else {
        panic!("expected the standing match to be restated");
    };
    assert_eq!(again.id, original.id);

    let likes: i64 = db
        .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM likes", [], |r| r.get(0))?))
        .unwrap();
    assert_eq!(likes, 2, "one like row per side, repeats deduped");
}

#[tokio::test]
async fn ownership_and_role_violations_are_rejected() {
    let db = memory_db();
    let resolver = MatchResolver::new(db.clone());
    let tenant = seed_tenant(&db);
    let landlord = seed_landlord(&db);
    let interloper = seed_landlord(&db);
    let listing = seed_listing(&db, landlord);

    // A landlord cannot vouch for a listing somebody else owns.
    let outcome = resolver
        .record_like(
            interloper,
            LikeTarget::Tenant { tenant_id: tenant, listing_id: listing },
        )
        .await;
    assert!(matches!(outcome, LikeOutcome::Rejected));

    // Role shapes must line up with the target shape.
    let outcome = resolver.record_like(landlord, LikeTarget::Listing(listing)).await;
    assert!(matches!(outcome, LikeOutcome::Rejected));
    let outcome = resolver
        .record_like(
            tenant,
            LikeTarget::Tenant { tenant_id: tenant, listing_id: listing },
        )
        .await;
    assert!(matches!(outcome, LikeOutcome::Rejected));

    // Unknown actor, unknown listing, unknown target tenant.
    let outcome = resolver.record_like(Uuid::new_v4(), LikeTarget::Listing(listing)).await;
    assert!(matches!(outcome, LikeOutcome::Rejected));
    let outcome = resolver.record_like(tenant, LikeTarget::Listing(Uuid::new_v4())).await;
    assert!(matches!(outcome, LikeOutcome::Rejected));
    let outcome = resolver
        .record_like(
            landlord,
            LikeTarget::Tenant { tenant_id: Uuid::new_v4(), listing_id: listing },
        )
        .await;
    assert!(matches!(outcome, LikeOutcome::Rejected));

    let likes: i64 = db
        .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM likes", [], |r| r.get(0))?))
        .unwrap();
    assert_eq!(likes, 0, "rejected swipes record nothing");
}

#[tokio::test]
async fn match_lists_are_stable_and_fully_resolved() {
    let db = memory_db();
    let resolver = MatchResolver::new(db.clone());
    let tenant = seed_tenant(&db);
    let landlord1 = seed_landlord(&db);
    let landlord2 = seed_landlord(&db);
    let listing1 = seed_listing(&db, landlord1);
    let listing2 = seed_listing(&db, landlord2);

    resolver.record_like(tenant, LikeTarget::Listing(listing1)).await;
    let LikeOutcome::Matched { record: match1, .. } = resolver
        .record_like(
            landlord1,
            LikeTarget::Tenant { tenant_id: tenant, listing_id: listing1 },
        )
        .await
    else {
        panic!("first match failed to form");
    };
    resolver.record_like(tenant, LikeTarget::Listing(listing2)).await;
    let LikeOutcome::Matched { record: match2, .. } = resolver
        .record_like(
            landlord2,
            LikeTarget::Tenant { tenant_id: tenant, listing_id: listing2 },
        )
        .await
    else {
        panic!("second match failed to form");
    };

    let views = resolver.list_matches(tenant).await;
    assert_eq!(views.len(), 2);
    assert_eq!(views[0].id, match1.id, "insertion order, no ranking");
    assert_eq!(views[1].id, match2.id);
    assert_eq!(views[0].listing.id, listing1);
    assert_eq!(views[0].tenant.id, tenant);
    assert_eq!(views[0].landlord.id, landlord1);

    // Each side sees the match; an uninvolved user sees nothing.
    assert_eq!(resolver.list_matches(landlord2).await.len(), 1);
    assert!(resolver.list_matches(Uuid::new_v4()).await.is_empty());

    let details = resolver.match_details(match1.id).await.expect("details");
    assert_eq!(details.listing.id, listing1);

    // The second listing vanishes: its match drops from lists and reads
    // as missing on detail lookups, never as a view with holes.
    db.with_conn(|conn| {
        conn.execute("DELETE FROM listings WHERE id = ?1", [listing2.to_string()])?;
        Ok(())
    })
    .unwrap();
    let views = resolver.list_matches(tenant).await;
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].id, match1.id);
    assert!(resolver.match_details(match2.id).await.is_none());
    assert!(resolver.match_details(Uuid::new_v4()).await.is_none());
}

#[tokio::test]
async fn storage_failures_read_as_unavailable_or_empty() {
    let db = memory_db();
    let resolver = MatchResolver::new(db.clone());
    let tenant = seed_tenant(&db);
    let landlord = seed_landlord(&db);
    let listing = seed_listing(&db, landlord);

    drop_table(&db, "likes");
    let outcome = resolver.record_like(tenant, LikeTarget::Listing(listing)).await;
    assert!(matches!(outcome, LikeOutcome::Unavailable));

    drop_table(&db, "matches");
    assert!(resolver.list_matches(tenant).await.is_empty());
    assert!(resolver.match_details(Uuid::new_v4()).await.is_none());
}
