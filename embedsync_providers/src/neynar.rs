use async_trait::async_trait;
use embedsync_core::{Cast, ChannelRef, SocialSource, decode_list};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

/// Largest page the channel and feed endpoints return.
const PAGE_LIMIT: u32 = 100;

/// Client for the Neynar Farcaster API.
pub struct NeynarClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl NeynarClient {
    pub fn new(api_key: String) -> Self {
        info!("Creating NeynarClient");
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://api.neynar.com/v2/farcaster".to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn get(&self, path_and_query: &str) -> anyhow::Result<Value> {
        let response = self
            .client
            .get(format!("{}/{path_and_query}", self.base_url))
            .header("x-api-key", &self.api_key)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(response)
    }
}

fn fid_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

#[async_trait]
impl SocialSource for NeynarClient {
    async fn user_channels(&self, fid: &str) -> anyhow::Result<Vec<ChannelRef>> {
        let response = self
            .get(&format!("user/channels?limit={PAGE_LIMIT}&fid={fid}"))
            .await?;

        let channels: Vec<ChannelRef> = decode_list(&response["channels"])
            .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing channels"))?;
        debug!("Fetched {} channels for fid {fid}", channels.len());
        Ok(channels)
    }

    async fn power_user_fids(&self) -> anyhow::Result<Vec<String>> {
        let response = self.get("user/power_lite").await?;

        let fids = response["result"]["fids"]
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing result.fids"))?
            .iter()
            .filter_map(fid_text)
            .collect();
        Ok(fids)
    }

    async fn user_casts(&self, fid: &str) -> anyhow::Result<Vec<Cast>> {
        let response = self
            .get(&format!("feed/user/casts?fid={fid}&limit={PAGE_LIMIT}"))
            .await?;

        // A feed without a casts array is an empty feed.
        Ok(decode_list(&response["casts"]).unwrap_or_default())
    }
}
