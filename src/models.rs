use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Row ids are issued by the store; user ids by the identity provider.
pub type Id = i64;
pub type UserId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Citizen,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Citizen => "citizen",
        }
    }
}

/// The signed-in person as handed over by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Triage label of a complaint. Any label may follow any other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ComplaintStatus {
    #[default]
    Pending,
    #[serde(rename = "In-Progress")]
    InProgress,
    Resolved,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown complaint status '{0}'")]
pub struct ParseStatusError(pub String);

impl ComplaintStatus {
    pub const ALL: [ComplaintStatus; 3] = [
        ComplaintStatus::Pending,
        ComplaintStatus::InProgress,
        ComplaintStatus::Resolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "Pending",
            ComplaintStatus::InProgress => "In-Progress",
            ComplaintStatus::Resolved => "Resolved",
        }
    }

    /// Badge colour used by dashboards.
    pub fn tone(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "warning",
            ComplaintStatus::InProgress => "info",
            ComplaintStatus::Resolved => "success",
        }
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComplaintStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComplaintStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

impl TryFrom<String> for ComplaintStatus {
    type Error = ParseStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Facility category. Request bodies must use one of the five labels; unrecognised
/// labels read back from the store fold into `Other` through `From<String>`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AmenityType {
    #[default]
    Park,
    School,
    Hospital,
    Library,
    Other,
}

impl AmenityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmenityType::Park => "park",
            AmenityType::School => "school",
            AmenityType::Hospital => "hospital",
            AmenityType::Library => "library",
            AmenityType::Other => "other",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            AmenityType::Park => "🌳",
            AmenityType::School => "🏫",
            AmenityType::Hospital => "🏥",
            AmenityType::Library => "📚",
            AmenityType::Other => "📍",
        }
    }
}

impl From<String> for AmenityType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "park" => AmenityType::Park,
            "school" => AmenityType::School,
            "hospital" => AmenityType::Hospital,
            "library" => AmenityType::Library,
            _ => AmenityType::Other,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema, sqlx::FromRow)]
pub struct Complaint {
    pub id: Id,
    pub user_id: UserId,
    pub name: String,
    pub issue: String,
    pub location: String,
    #[sqlx(try_from = "String")]
    #[schema(value_type = String, example = "Pending")]
    pub status: ComplaintStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row inserted on submission; status is always `Pending` at creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct NewComplaint {
    pub user_id: UserId,
    pub name: String,
    pub issue: String,
    pub location: String,
}

/// Body of `POST /complaints`; owner and name come from the caller's token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitComplaint {
    pub issue: String,
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusUpdate {
    #[schema(value_type = String, example = "In-Progress")]
    pub status: ComplaintStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema, sqlx::FromRow)]
pub struct Amenity {
    pub id: Id,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type", try_from = "String")]
    #[schema(value_type = String, example = "park")]
    pub kind: AmenityType,
    pub location: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, ToSchema)]
pub struct NewAmenity {
    pub name: String,
    #[serde(rename = "type", default)]
    #[schema(value_type = String, example = "park")]
    pub kind: AmenityType,
    pub location: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema, sqlx::FromRow)]
pub struct Announcement {
    pub id: Id,
    pub title: String,
    pub content: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct NewAnnouncement {
    pub title: String,
    pub content: String,
    pub created_by: UserId,
}

/// Body of `POST /announcements`; author comes from the caller's token.
#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema)]
pub struct PublishAnnouncement {
    pub title: String,
    pub content: String,
}

/// Per-status complaint counts shown on the admin overview.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
pub struct ComplaintStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub resolved: usize,
}

impl ComplaintStats {
    pub fn tally(complaints: &[Complaint]) -> Self {
        complaints.iter().fold(
            ComplaintStats { total: complaints.len(), ..Default::default() },
            |mut acc, c| {
                match c.status {
                    ComplaintStatus::Pending => acc.pending += 1,
                    ComplaintStatus::InProgress => acc.in_progress += 1,
                    ComplaintStatus::Resolved => acc.resolved += 1,
                }
                acc
            },
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Overview {
    #[serde(flatten)]
    pub stats: ComplaintStats,
    pub recent: Vec<Complaint>,
}

/// A required text field was left blank.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0} is required")]
pub struct MissingField(pub &'static str);

/// Whitespace-only input counts as missing.
pub fn require_text(field: &'static str, value: &str) -> Result<(), MissingField> {
    if value.trim().is_empty() { Err(MissingField(field)) } else { Ok(()) }
}

impl SubmitComplaint {
    pub fn validate(&self) -> Result<(), MissingField> {
        require_text("issue", &self.issue)?;
        require_text("location", &self.location)
    }
}

impl NewAmenity {
    pub fn validate(&self) -> Result<(), MissingField> {
        require_text("name", &self.name)?;
        require_text("location", &self.location)
    }
}

impl PublishAnnouncement {
    pub fn validate(&self) -> Result<(), MissingField> {
        require_text("title", &self.title)?;
        require_text("content", &self.content)
    }
}

/// How many complaints the admin overview lists.
pub const RECENT_COMPLAINTS: usize = 5;

/// Newest first; ties resolved by the higher id.
pub fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, Id)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_match_store_values() {
        assert_eq!("In-Progress".parse::<ComplaintStatus>().unwrap(), ComplaintStatus::InProgress);
        assert!("in progress".parse::<ComplaintStatus>().is_err());
        let json = serde_json::to_string(&ComplaintStatus::InProgress).unwrap();
        assert_eq!(json, "\"In-Progress\"");
    }

    #[test]
    fn unknown_amenity_type_falls_back_to_pin() {
        assert!(serde_json::from_str::<AmenityType>("\"fountain\"").is_err());
        let kind = AmenityType::from("fountain".to_string());
        assert_eq!(kind, AmenityType::Other);
        assert_eq!(kind.icon(), "📍");
        assert_eq!(AmenityType::from("library".to_string()).icon(), "📚");
    }

    #[test]
    fn tally_counts_each_status() {
        let now = Utc::now();
        let mk = |id, status| Complaint {
            id,
            user_id: "u".into(),
            name: "n".into(),
            issue: "i".into(),
            location: "l".into(),
            status,
            created_at: now,
            updated_at: now,
        };
        let list = vec![
            mk(1, ComplaintStatus::Pending),
            mk(2, ComplaintStatus::Pending),
            mk(3, ComplaintStatus::Resolved),
        ];
        let stats = ComplaintStats::tally(&list);
        assert_eq!(stats, ComplaintStats { total: 3, pending: 2, in_progress: 0, resolved: 1 });
    }
}
