#![allow(dead_code)]

use std::sync::Arc;

use roost_db::Database;
use roost_db::models::{ListingRow, UserRow};
use uuid::Uuid;

pub fn memory_db() -> Arc<Database> {
    Arc::new(Database::open_in_memory().expect("in-memory database"))
}

pub fn seed_user(db: &Database, role: &str) -> Uuid {
    let id = Uuid::new_v4();
    db.create_user(&UserRow {
        id: id.to_string(),
        role: role.to_string(),
        display_name: format!("{role} {}", &id.to_string()[..8]),
        photo_url: None,
        verified: true,
        bio: if role == "tenant" { Some("Looking for a place".to_string()) } else { None },
        budget_cents: if role == "tenant" { Some(120_000) } else { None },
        company: if role == "landlord" { Some("Roost Homes BV".to_string()) } else { None },
        created_at: String::new(),
    })
    .expect("seed user");
    id
}

pub fn seed_tenant(db: &Database) -> Uuid {
    seed_user(db, "tenant")
}

pub fn seed_landlord(db: &Database) -> Uuid {
    seed_user(db, "landlord")
}

pub fn seed_listing(db: &Database, owner_id: Uuid) -> Uuid {
    let id = Uuid::new_v4();
    db.create_listing(&ListingRow {
        id: id.to_string(),
        owner_id: owner_id.to_string(),
        title: "Bright canal-side studio".to_string(),
        price_cents: 110_000,
        city: "Utrecht".to_string(),
        bedrooms: 1,
        photo_url: None,
        active: true,
        created_at: String::new(),
    })
    .expect("seed listing");
    id
}

/// Simulates an unprovisioned or broken backend for fail-soft tests.
pub fn drop_table(db: &Database, table: &str) {
    db.with_conn(|conn| {
        conn.execute_batch(&format!("DROP TABLE {table}"))?;
        Ok(())
    })
    .expect("drop table");
}
