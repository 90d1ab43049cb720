//! Profile enrichment: a keyword summary from a chat model, then an
//! embedding of that summary.

use async_trait::async_trait;
use embedsync_core::{ChatMessage, ChatParams, EnrichedFields, LLMProvider, ProfileEnricher, UserProfile};
use tracing::debug;

/// Casts beyond this many are left out of the prompt.
pub const MAX_PROMPT_CASTS: usize = 10;

const SYSTEM_PROMPT: &str = "You analyze social profiles and return structured behavioral \
summaries. Reply with the comma-separated keyword pairs only.";

const INSTRUCTIONS: &str = "Build a behavioral fingerprint of this user on a decentralized \
social network. Weigh what they build, what they discuss or support, which communities they \
belong to, and whether their follower and following counts suggest influence or exploration. \
Return 12-15 keyword pairs in lowercase-hyphenated form, comma separated, for example: \
solana-builder, dao-member, open-source-champion.";

/// Render the user message sent to the chat model.
#[must_use]
pub fn profile_prompt(profile: &UserProfile) -> String {
    let mut out = String::from(INSTRUCTIONS);
    out.push_str("\n\n");

    let bio = profile
        .bio
        .as_deref()
        .filter(|b| !b.trim().is_empty())
        .unwrap_or("No bio provided");
    let channels = if profile.channels.is_empty() {
        "None".to_string()
    } else {
        profile
            .channels
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    out.push_str(&format!(
        "Username: {}\nBio: {bio}\nFollower count: {}\nFollowing count: {}\nChannels: {channels}\n",
        profile.user_name, profile.follower_count, profile.following_count
    ));
    out.push_str("\nRecent posts:\n");

    if profile.casts.is_empty() {
        out.push_str("No posts available\n");
    }
    for cast in profile.casts.iter().take(MAX_PROMPT_CASTS) {
        out.push_str(&format!("- {}\n", cast.text));
    }
    out
}

/// [`ProfileEnricher`] backed by any [`LLMProvider`].
pub struct ProfileEmbedder<P> {
    provider: P,
    chat: ChatParams,
    embedding_model: String,
}

impl<P> ProfileEmbedder<P>
where
    P: LLMProvider,
{
    pub fn new(provider: P, chat: ChatParams, embedding_model: impl Into<String>) -> Self {
        Self {
            provider,
            chat,
            embedding_model: embedding_model.into(),
        }
    }
}

#[async_trait]
impl<P> ProfileEnricher for ProfileEmbedder<P>
where
    P: LLMProvider,
{
    async fn enrich(&self, profile: &UserProfile) -> anyhow::Result<EnrichedFields> {
        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(profile_prompt(profile)),
        ];

        let summary = self.provider.chat(&messages, &self.chat).await?.content;
        if summary.is_empty() {
            anyhow::bail!("No summary generated for fid {}", profile.fid);
        }

        let embedding = self.provider.embed(&summary, &self.embedding_model).await?;
        if embedding.is_empty() {
            anyhow::bail!("Empty embedding returned for fid {}", profile.fid);
        }

        debug!("Generated summary and embedding for fid {}", profile.fid);
        Ok(EnrichedFields { summary, embedding })
    }
}
