use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode every element of a JSON array on its own, dropping the ones that
/// do not fit `T`. Returns `None` when `value` is not an array.
#[must_use]
pub fn decode_list<T: DeserializeOwned>(value: &Value) -> Option<Vec<T>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
    )
}

/// A channel a user follows or belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A row of the `users` table as read by the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserRecord {
    pub fid: String,
    pub user_name: String,
    pub description: Option<String>,
    pub follower_count: i64,
    pub following_count: i64,
    pub channels_following: Vec<ChannelRef>,
    pub channels_member: Vec<ChannelRef>,
    pub summary: Option<String>,
    pub has_embedding: bool,
}

impl UserRecord {
    /// Both derived fields are already populated.
    #[must_use]
    pub fn is_enriched(&self) -> bool {
        self.has_embedding && self.summary.as_deref().is_some_and(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CastAuthor {
    #[serde(default, deserialize_with = "null_as_default")]
    pub fid: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub pfp_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub follower_count: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub following_count: i64,
    #[serde(default)]
    pub verified_addresses: Option<Value>,
    /// Fields not modelled above, kept so stored documents round-trip.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Cast {
    #[serde(default, deserialize_with = "null_as_default")]
    pub hash: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    /// `None` for a root cast.
    #[serde(default)]
    pub parent_hash: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub author: Option<CastAuthor>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `casts` row for one user. `casts` is `None` when the stored
/// document carries no `data` array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CastBundle {
    pub fid: String,
    pub casts: Option<Vec<Cast>>,
}

impl CastBundle {
    /// Decode the stored `{ "data": [...] }` document. Elements that are
    /// not cast objects are dropped; the rest are kept.
    #[must_use]
    pub fn from_document(fid: String, document: Option<&Value>) -> Self {
        let casts = document
            .and_then(|doc| doc.get("data"))
            .and_then(decode_list);
        Self { fid, casts }
    }

    /// Encode as the stored `{ "data": [...] }` document.
    pub fn to_document(&self) -> serde_json::Result<Value> {
        let data = serde_json::to_value(self.casts.as_deref().unwrap_or_default())?;
        let mut document = Map::new();
        document.insert("data".to_string(), data);
        Ok(Value::Object(document))
    }
}

/// Everything the enricher needs to describe one user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub fid: String,
    pub user_name: String,
    pub bio: Option<String>,
    pub follower_count: i64,
    pub following_count: i64,
    pub channels: Vec<ChannelRef>,
    pub casts: Vec<Cast>,
}

impl UserProfile {
    /// Join a user row with its cast record. Returns `None` when the joined
    /// record is missing or has no cast data.
    #[must_use]
    pub fn assemble(user: &UserRecord, bundle: Option<&CastBundle>) -> Option<Self> {
        let casts = bundle?.casts.as_ref()?;

        let channels = user
            .channels_following
            .iter()
            .chain(&user.channels_member)
            .cloned()
            .collect();

        Some(Self {
            fid: user.fid.clone(),
            user_name: user.user_name.clone(),
            bio: user.description.clone(),
            follower_count: user.follower_count,
            following_count: user.following_count,
            channels,
            casts: casts.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No joined cast record, or a record without cast data.
    MissingCasts,
    /// Embedding and summary are already present.
    AlreadyEnriched,
}

/// One unit of enrichment work derived from a source row.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    pub key: String,
    pub payload: Result<UserProfile, SkipReason>,
}

impl WorkItem {
    /// Build the work items for one page, preserving row order.
    #[must_use]
    pub fn build_page(
        users: &[UserRecord],
        bundles: Vec<CastBundle>,
        reprocess_enriched: bool,
    ) -> Vec<Self> {
        let by_fid: HashMap<String, CastBundle> =
            bundles.into_iter().map(|b| (b.fid.clone(), b)).collect();

        users
            .iter()
            .map(|user| {
                let payload = if user.is_enriched() && !reprocess_enriched {
                    Err(SkipReason::AlreadyEnriched)
                } else {
                    UserProfile::assemble(user, by_fid.get(&user.fid))
                        .ok_or(SkipReason::MissingCasts)
                };
                Self {
                    key: user.fid.clone(),
                    payload,
                }
            })
            .collect()
    }

    #[must_use]
    pub const fn is_eligible(&self) -> bool {
        self.payload.is_ok()
    }
}

/// Fields produced by enrichment for one user.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedFields {
    pub summary: String,
    pub embedding: Vec<f32>,
}

/// A keyed write of enrichment results.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentUpdate {
    pub fid: String,
    pub fields: EnrichedFields,
}

/// A user row derived from cast authorship, upserted by fid.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSeed {
    pub fid: String,
    pub user_name: String,
    pub follower_count: i64,
    pub following_count: i64,
    pub pfp_url: Option<String>,
    pub verified_addresses: Option<Value>,
}

impl UserSeed {
    /// Derive one seed per fid from the first cast's author, keeping the
    /// first occurrence of each fid. Bundles without casts produce nothing.
    #[must_use]
    pub fn from_bundles(bundles: &[CastBundle]) -> Vec<Self> {
        let mut seen = std::collections::HashSet::new();
        bundles
            .iter()
            .filter_map(|bundle| {
                let author = bundle.casts.as_ref()?.first()?.author.as_ref()?;
                seen.insert(bundle.fid.clone()).then(|| Self {
                    fid: bundle.fid.clone(),
                    user_name: author.username.clone(),
                    follower_count: author.follower_count,
                    following_count: author.following_count,
                    pfp_url: author.pfp_url.clone(),
                    verified_addresses: author.verified_addresses.clone(),
                })
            })
            .collect()
    }
}
