use std::sync::Arc;

use roost_db::Database;
use roost_db::models::MatchRow;
use roost_types::models::{MatchRecord, MatchView, Role};
use tracing::{info, warn};
use uuid::Uuid;

use crate::run_store;

/// What a swipe points at. Tenants like listings; landlords like tenants
/// in the context of one of their own listings.
#[derive(Debug, Clone, Copy)]
pub enum LikeTarget {
    Listing(Uuid),
    Tenant { tenant_id: Uuid, listing_id: Uuid },
}

/// Result of recording a swipe.
#[derive(Debug, Clone)]
pub enum LikeOutcome {
    /// Reciprocal interest is on file. `newly_formed` is true only for
    /// the call that created the match row, so the notification path
    /// fires once per match even when swipes repeat.
    Matched {
        record: MatchRecord,
        newly_formed: bool,
    },
    /// Interest noted, no reciprocal like yet.
    Recorded,
    /// The actor, target, or ownership did not check out. Nothing was
    /// written.
    Rejected,
    /// The store did not answer.
    Unavailable,
}

/// Derives matches from reciprocal likes. A match exists exactly when
/// both sides of a (tenant, listing) pair have swiped right, and there
/// is at most one match row per pair.
#[derive(Clone)]
pub struct MatchResolver {
    db: Arc<Database>,
}

impl MatchResolver {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Records one swipe and reports whether it completed a match.
    /// Repeating a swipe is idempotent and re-reports the standing
    /// outcome, so a double-tap after a match still answers `Matched`.
    pub async fn record_like(&self, actor_id: Uuid, target: LikeTarget) -> LikeOutcome {
        let db = self.db.clone();
        run_store("record like", move || {
            let actor = db
                .get_user(&actor_id.to_string())?
                .and_then(|user| user.normalize());
            let Some(actor) = actor else {
                warn!("Like from unknown user {} rejected", actor_id);
                return Ok(LikeOutcome::Rejected);
            };

            match target {
                LikeTarget::Listing(listing_id) => {
                    if actor.role() != Role::Tenant {
                        warn!("User {} liked a listing but is not a tenant", actor_id);
                        return Ok(LikeOutcome::Rejected);
                    }
                    let listing = db
                        .get_listing(&listing_id.to_string())?
                        .and_then(|l| l.to_listing());
                    let Some(listing) = listing else {
                        warn!("Like on unknown listing {} rejected", listing_id);
                        return Ok(LikeOutcome::Rejected);
                    };

                    let tenant = actor_id.to_string();
                    let listing_key = listing_id.to_string();
                    db.insert_like_if_absent(
                        &Uuid::new_v4().to_string(),
                        Role::Tenant.as_str(),
                        &tenant,
                        &listing_key,
                    )?;
                    if db.has_like(Role::Landlord.as_str(), &tenant, &listing_key)? {
                        return derive_match(&db, &tenant, &listing.owner_id.to_string(), &listing_key);
                    }
                    Ok(LikeOutcome::Recorded)
                }
                LikeTarget::Tenant { tenant_id, listing_id } => {
                    if actor.role() != Role::Landlord {
                        warn!("User {} liked a tenant but is not a landlord", actor_id);
                        return Ok(LikeOutcome::Rejected);
                    }
                    let listing = db
                        .get_listing(&listing_id.to_string())?
                        .and_then(|l| l.to_listing());
                    let Some(listing) = listing else {
                        warn!("Like for unknown listing {} rejected", listing_id);
                        return Ok(LikeOutcome::Rejected);
                    };
                    if listing.owner_id != actor_id {
                        warn!(
                            "Landlord {} liked tenant {} for listing {} they do not own",
                            actor_id, tenant_id, listing_id
                        );
                        return Ok(LikeOutcome::Rejected);
                    }
                    let tenant = db
                        .get_user(&tenant_id.to_string())?
                        .and_then(|user| user.normalize());
                    if tenant.map(|t| t.role()) != Some(Role::Tenant) {
                        warn!("Like on {} rejected: not a resolvable tenant", tenant_id);
                        return Ok(LikeOutcome::Rejected);
                    }

                    let tenant_key = tenant_id.to_string();
                    let listing_key = listing_id.to_string();
                    db.insert_like_if_absent(
                        &Uuid::new_v4().to_string(),
                        Role::Landlord.as_str(),
                        &tenant_key,
                        &listing_key,
                    )?;
                    if db.has_like(Role::Tenant.as_str(), &tenant_key, &listing_key)? {
                        return derive_match(&db, &tenant_key, &actor_id.to_string(), &listing_key);
                    }
                    Ok(LikeOutcome::Recorded)
                }
            }
        })
        .await
        .unwrap_or(LikeOutcome::Unavailable)
    }

    /// Every match the user participates in, fully resolved for display,
    /// in stable insertion order. No scoring, no ranking. Matches whose
    /// tenant, landlord, or listing cannot be loaded are excluded.
    pub async fn list_matches(&self, user_id: Uuid) -> Vec<MatchView> {
        let db = self.db.clone();
        run_store("match list", move || {
            let rows = db.list_matches_for_user(&user_id.to_string())?;
            let mut views = Vec::with_capacity(rows.len());
            for row in rows {
                if let Some(view) = resolve_view(&db, &row)? {
                    views.push(view);
                }
            }
            Ok(views)
        })
        .await
        .unwrap_or_default()
    }

    /// One match, fully resolved, or `None` when the row is missing or
    /// any of its references fail to load.
    pub async fn match_details(&self, match_id: Uuid) -> Option<MatchView> {
        let db = self.db.clone();
        run_store("match lookup", move || {
            match db.get_match(&match_id.to_string())? {
                Some(row) => resolve_view(&db, &row),
                None => Ok(None),
            }
        })
        .await
        .ok()
        .flatten()
    }
}

/// Idempotent half of match derivation: the UNIQUE(tenant, listing)
/// constraint decides which insert wins a race, and the re-read returns
/// the winning row either way.
fn derive_match(
    db: &Database,
    tenant_id: &str,
    landlord_id: &str,
    listing_id: &str,
) -> anyhow::Result<LikeOutcome> {
    let newly_formed =
        db.insert_match_if_absent(&Uuid::new_v4().to_string(), tenant_id, landlord_id, listing_id)?;
    let row = db
        .find_match_by_pair(tenant_id, listing_id)?
        .ok_or_else(|| anyhow::anyhow!("match row missing after insert"))?;
    let record = row
        .to_record()
        .ok_or_else(|| anyhow::anyhow!("match {} does not normalize", row.id))?;
    if newly_formed {
        info!(
            "Match {} formed: tenant {} and landlord {} on listing {}",
            record.id, tenant_id, landlord_id, listing_id
        );
    }
    Ok(LikeOutcome::Matched { record, newly_formed })
}

/// Loads the display bundle for one match row. `Ok(None)` means the view
/// is incomplete and must be dropped, not rendered with holes.
fn resolve_view(db: &Database, row: &MatchRow) -> anyhow::Result<Option<MatchView>> {
    let Some(record) = row.to_record() else {
        return Ok(None);
    };
    let tenant = db
        .get_user(&row.tenant_id)?
        .and_then(|user| user.normalize());
    let Some(tenant) = tenant else {
        warn!("Dropping match {}: tenant {} does not resolve", row.id, row.tenant_id);
        return Ok(None);
    };
    let landlord = db
        .get_user(&row.landlord_id)?
        .and_then(|user| user.normalize());
    let Some(landlord) = landlord else {
        warn!("Dropping match {}: landlord {} does not resolve", row.id, row.landlord_id);
        return Ok(None);
    };
    let listing = db.get_listing(&row.listing_id)?.and_then(|l| l.to_listing());
    let Some(listing) = listing else {
        warn!("Dropping match {}: listing {} does not resolve", row.id, row.listing_id);
        return Ok(None);
    };
    Ok(Some(MatchView {
        id: record.id,
        tenant,
        landlord,
        listing,
        matched_at: record.created_at,
    }))
}
