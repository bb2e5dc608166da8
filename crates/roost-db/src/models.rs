//! Database row types. These map directly onto SQLite rows, ids and
//! timestamps still TEXT. The normalize/convert helpers below are the one
//! place raw rows become `roost-types` values; a row that fails to parse
//! is dropped with a warning, never passed along half-filled.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use roost_types::models::{
    Conversation, Listing, MatchRecord, Message, Role, RoleProfile, UserProfile,
};

pub struct UserRow {
    pub id: String,
    pub role: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub verified: bool,
    pub bio: Option<String>,
    pub budget_cents: Option<i64>,
    pub company: Option<String>,
    pub created_at: String,
}

pub struct ListingRow {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub price_cents: i64,
    pub city: String,
    pub bedrooms: i64,
    pub photo_url: Option<String>,
    pub active: bool,
    pub created_at: String,
}

pub struct ConversationRow {
    pub id: String,
    pub participant1: String,
    pub participant2: String,
    pub last_message_id: Option<String>,
    pub last_message_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: String,
    pub updated_at: String,
}

pub struct MatchRow {
    pub id: String,
    pub tenant_id: String,
    pub landlord_id: String,
    pub listing_id: String,
    pub created_at: String,
}

/// SQLite's `datetime('now')` stores "YYYY-MM-DD HH:MM:SS" without a
/// timezone; rows written elsewhere may carry RFC 3339. Try the strict
/// form first, then the naive form as UTC.
fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    value
        .parse::<DateTime<Utc>>()
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|ndt| ndt.and_utc())
        })
}

fn parse_id(value: &str, what: &str) -> Option<Uuid> {
    match value.parse::<Uuid>() {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("Corrupt {} id '{}': {}", what, value, e);
            None
        }
    }
}

fn parse_ts(value: &str, what: &str) -> Option<DateTime<Utc>> {
    let parsed = parse_datetime(value);
    if parsed.is_none() {
        warn!("Corrupt {} timestamp '{}'", what, value);
    }
    parsed
}

impl UserRow {
    /// Identity-store boundary: raw row in, role-tagged profile out.
    pub fn normalize(&self) -> Option<UserProfile> {
        let id = parse_id(&self.id, "user")?;
        let role = match Role::parse(&self.role) {
            Some(role) => role,
            None => {
                warn!("User {} has unrecognized role '{}'", self.id, self.role);
                return None;
            }
        };
        let profile = match role {
            Role::Tenant => RoleProfile::Tenant {
                bio: self.bio.clone(),
                budget_cents: self.budget_cents,
            },
            Role::Landlord => RoleProfile::Landlord {
                company: self.company.clone(),
            },
        };
        Some(UserProfile {
            id,
            display_name: self.display_name.clone(),
            photo_url: self.photo_url.clone(),
            verified: self.verified,
            profile,
        })
    }
}

impl ListingRow {
    pub fn to_listing(&self) -> Option<Listing> {
        Some(Listing {
            id: parse_id(&self.id, "listing")?,
            owner_id: parse_id(&self.owner_id, "listing owner")?,
            title: self.title.clone(),
            price_cents: self.price_cents,
            city: self.city.clone(),
            bedrooms: self.bedrooms,
            photo_url: self.photo_url.clone(),
            active: self.active,
            created_at: parse_ts(&self.created_at, "listing")?,
        })
    }
}

impl ConversationRow {
    pub fn to_conversation(&self) -> Option<Conversation> {
        let last_message_id = match &self.last_message_id {
            Some(raw) => Some(parse_id(raw, "last message")?),
            None => None,
        };
        let last_message_at = match &self.last_message_at {
            Some(raw) => Some(parse_ts(raw, "last message")?),
            None => None,
        };
        Some(Conversation {
            id: parse_id(&self.id, "conversation")?,
            participant1: parse_id(&self.participant1, "participant")?,
            participant2: parse_id(&self.participant2, "participant")?,
            last_message_id,
            last_message_at,
            created_at: parse_ts(&self.created_at, "conversation")?,
            updated_at: parse_ts(&self.updated_at, "conversation")?,
        })
    }
}

impl MessageRow {
    pub fn to_message(&self) -> Option<Message> {
        Some(Message {
            id: parse_id(&self.id, "message")?,
            conversation_id: parse_id(&self.conversation_id, "conversation")?,
            sender_id: parse_id(&self.sender_id, "sender")?,
            receiver_id: parse_id(&self.receiver_id, "receiver")?,
            content: self.content.clone(),
            read: self.is_read,
            created_at: parse_ts(&self.created_at, "message")?,
            updated_at: parse_ts(&self.updated_at, "message")?,
        })
    }
}

impl MatchRow {
    pub fn to_record(&self) -> Option<MatchRecord> {
        Some(MatchRecord {
            id: parse_id(&self.id, "match")?,
            tenant_id: parse_id(&self.tenant_id, "tenant")?,
            landlord_id: parse_id(&self.landlord_id, "landlord")?,
            listing_id: parse_id(&self.listing_id, "listing")?,
            created_at: parse_ts(&self.created_at, "match")?,
        })
    }
}
