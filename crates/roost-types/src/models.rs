use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which side of the marketplace a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Tenant,
    Landlord,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Tenant => "tenant",
            Role::Landlord => "landlord",
        }
    }

    /// Parses the stored role tag. Unknown tags yield `None`; a profile
    /// with an unrecognized role never normalizes.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "tenant" => Some(Role::Tenant),
            "landlord" => Some(Role::Landlord),
            _ => None,
        }
    }

    /// The opposite side of the marketplace.
    pub fn other(&self) -> Role {
        match self {
            Role::Tenant => Role::Landlord,
            Role::Landlord => Role::Tenant,
        }
    }
}

/// Role-specific profile fields. The identity store rows are normalized
/// into this shape exactly once, at the storage boundary; nothing past
/// that boundary branches on raw optional columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum RoleProfile {
    Tenant {
        bio: Option<String>,
        budget_cents: Option<i64>,
    },
    Landlord {
        company: Option<String>,
    },
}

impl RoleProfile {
    pub fn role(&self) -> Role {
        match self {
            RoleProfile::Tenant { .. } => Role::Tenant,
            RoleProfile::Landlord { .. } => Role::Landlord,
        }
    }
}

/// A user record as the core consumes it: read-only, owned by the
/// identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub verified: bool,
    #[serde(flatten)]
    pub profile: RoleProfile,
}

impl UserProfile {
    pub fn role(&self) -> Role {
        self.profile.role()
    }
}

/// A property listing: read-only, owned by the listing service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub price_cents: i64,
    pub city: String,
    pub bedrooms: i64,
    pub photo_url: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// The unique thread between two users.
///
/// `participant1` always holds the smaller id of the pair when the two
/// canonical UUID strings are compared lexicographically (equivalently,
/// smaller by `Uuid`'s byte order). That ordering is what guarantees at
/// most one conversation row per unordered pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub participant1: Uuid,
    pub participant2: Uuid,
    pub last_message_id: Option<Uuid>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// The other participant, or `None` if `user_id` is not part of the
    /// pair.
    pub fn peer_of(&self, user_id: Uuid) -> Option<Uuid> {
        if user_id == self.participant1 {
            Some(self.participant2)
        } else if user_id == self.participant2 {
            Some(self.participant1)
        } else {
            None
        }
    }

    pub fn has_pair(&self, a: Uuid, b: Uuid) -> bool {
        (self.participant1 == a && self.participant2 == b)
            || (self.participant1 == b && self.participant2 == a)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored mutual match: a tenant and a landlord around one listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub landlord_id: Uuid,
    pub listing_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// The display bundle for a match. Only ever constructed fully resolved:
/// a match whose tenant, landlord, or listing cannot be loaded is dropped
/// from lists and reported not-found on detail lookups, never returned
/// with holes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchView {
    pub id: Uuid,
    pub tenant: UserProfile,
    pub landlord: UserProfile,
    pub listing: Listing,
    pub matched_at: DateTime<Utc>,
}

/// One row of a user's conversation list screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation: Conversation,
    pub peer: UserProfile,
    pub last_message: Option<Message>,
    pub unread_count: i64,
}
