//! Simulated Xbox Live backend client.
//!
//! One fixed endpoint, JSON bodies discriminated by an `action` field. The
//! backend answers with canned success payloads; this client treats it like
//! any other HTTP service.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum XboxRequest {
    GetAuthUrl {
        redirect_uri: String,
    },
    ConnectFriend {
        friend_id: String,
        friend_name: String,
        xbox_token: String,
    },
    SendFriendRequest {
        gamertag: String,
        player_xuid: String,
    },
    JoinGame {
        gamertag: String,
        session_id: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthUrlResponse {
    pub auth_url: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectResponse {
    pub success: bool,
    pub gamertag: String,
    pub xuid: String,
    #[serde(default)]
    pub profile_url: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub can_join_game: bool,
    #[serde(default)]
    pub friendship_status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FriendRequestResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub friend_request_id: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinGameResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub game_session: String,
    #[serde(default)]
    pub join_status: String,
    #[serde(default)]
    pub eta_seconds: u32,
}

/// Seam between the engine and the friend-network backend, so tests can
/// substitute a scripted implementation.
#[async_trait]
pub trait FriendNetwork: Send + Sync {
    async fn get_auth_url(&self, redirect_uri: &str) -> Result<AuthUrlResponse>;
    async fn connect_friend(&self, friend_id: &str, friend_name: &str) -> Result<ConnectResponse>;
    async fn send_friend_request(
        &self,
        gamertag: &str,
        player_xuid: &str,
    ) -> Result<FriendRequestResponse>;
    async fn join_game(&self, gamertag: &str, session_id: &str) -> Result<JoinGameResponse>;
}

/// HTTP client for the simulated backend. No retries, no timeout handling
/// beyond the caller's own artificial delays.
#[derive(Clone)]
pub struct XboxLiveClient {
    api_url: String,
    token: String,
    client: reqwest::Client,
}

impl XboxLiveClient {
    pub fn new(api_url: String, token: String) -> Self {
        Self {
            api_url,
            token,
            client: reqwest::Client::new(),
        }
    }

    async fn post<T: DeserializeOwned>(&self, request: &XboxRequest) -> Result<T> {
        let response = self
            .client
            .post(&self.api_url)
            .json(request)
            .send()
            .await
            .context("Failed to send Xbox Live request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            anyhow::bail!("Xbox Live backend returned error {}: {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse Xbox Live response")
    }
}

#[async_trait]
impl FriendNetwork for XboxLiveClient {
    async fn get_auth_url(&self, redirect_uri: &str) -> Result<AuthUrlResponse> {
        self.post(&XboxRequest::GetAuthUrl {
            redirect_uri: redirect_uri.to_string(),
        })
        .await
    }

    async fn connect_friend(&self, friend_id: &str, friend_name: &str) -> Result<ConnectResponse> {
        self.post(&XboxRequest::ConnectFriend {
            friend_id: friend_id.to_string(),
            friend_name: friend_name.to_string(),
            xbox_token: self.token.clone(),
        })
        .await
    }

    async fn send_friend_request(
        &self,
        gamertag: &str,
        player_xuid: &str,
    ) -> Result<FriendRequestResponse> {
        self.post(&XboxRequest::SendFriendRequest {
            gamertag: gamertag.to_string(),
            player_xuid: player_xuid.to_string(),
        })
        .await
    }

    async fn join_game(&self, gamertag: &str, session_id: &str) -> Result<JoinGameResponse> {
        self.post(&XboxRequest::JoinGame {
            gamertag: gamertag.to_string(),
            session_id: session_id.to_string(),
        })
        .await
    }
}
