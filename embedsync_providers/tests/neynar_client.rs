//! HTTP-level tests for the Neynar client.

use embedsync_core::SocialSource;
use embedsync_providers::NeynarClient;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> NeynarClient {
    NeynarClient::new("nk-test".to_string()).with_base_url(server.uri())
}

#[tokio::test]
async fn test_user_channels_keeps_good_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/channels"))
        .and(query_param("fid", "3"))
        .and(query_param("limit", "100"))
        .and(header("x-api-key", "nk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "channels": [
                {
                    "id": "rust",
                    "name": "Rust",
                    "description": "crabs",
                    "url": "chain://rust",
                    "image_url": "https://img/rust.png",
                    "follower_count": 1200
                },
                { "id": "quiet", "name": "Quiet", "description": null },
                "not a channel"
            ],
            "next": { "cursor": null }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let channels = client(&server).user_channels("3").await.unwrap();

    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0].name, "Rust");
    assert_eq!(channels[0].image_url.as_deref(), Some("https://img/rust.png"));
    assert!(channels[1].description.is_empty());
}

#[tokio::test]
async fn test_power_user_fids_are_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/power_lite"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": { "fids": [3, 194, 6131] } })),
        )
        .mount(&server)
        .await;

    let fids = client(&server).power_user_fids().await.unwrap();
    assert_eq!(fids, vec!["3", "194", "6131"]);
}

#[tokio::test]
async fn test_user_casts_without_array_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed/user/casts"))
        .and(query_param("fid", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "next": null })))
        .mount(&server)
        .await;

    assert!(client(&server).user_casts("3").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_user_casts_decode_parent_hash() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed/user/casts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "casts": [
                { "hash": "0x1", "text": "reply", "parent_hash": "0xp" },
                { "hash": "0x2", "text": "root", "parent_hash": null }
            ]
        })))
        .mount(&server)
        .await;

    let casts = client(&server).user_casts("3").await.unwrap();
    assert_eq!(casts[0].parent_hash.as_deref(), Some("0xp"));
    assert!(casts[1].parent_hash.is_none());
}

#[tokio::test]
async fn test_rate_limit_surfaces_as_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/channels"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    assert!(client(&server).user_channels("3").await.is_err());
}
