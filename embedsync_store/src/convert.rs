use embedsync_core::{CastBundle, ChannelRef, UserRecord, decode_list};
use embedsync_entities::{casts, users};
use sea_orm::JsonValue;

pub fn embedding_to_json(emb: &[f32]) -> JsonValue {
    JsonValue::Array(emb.iter().map(|f| JsonValue::from(f64::from(*f))).collect())
}

/// A value that is not a list reads as no channels; entries that are not
/// channel objects are dropped one by one.
fn channels_from_json(val: Option<&JsonValue>) -> Vec<ChannelRef> {
    val.and_then(decode_list).unwrap_or_default()
}

fn has_embedding(val: Option<&JsonValue>) -> bool {
    val.and_then(JsonValue::as_array)
        .is_some_and(|arr| !arr.is_empty())
}

pub fn user_from_model(m: users::Model) -> UserRecord {
    let has_embedding = has_embedding(m.embeddings.as_ref());
    UserRecord {
        fid: m.fid,
        user_name: m.user_name,
        description: m.description,
        follower_count: m.follower_count,
        following_count: m.following_count,
        channels_following: channels_from_json(m.channels_following.as_ref()),
        channels_member: channels_from_json(m.channels_member.as_ref()),
        summary: m.summary,
        has_embedding,
    }
}

pub fn bundle_from_model(m: casts::Model) -> CastBundle {
    CastBundle::from_document(m.fid, m.casts.as_ref())
}
