//! Video hosting via Mux direct uploads.
//! API docs: https://docs.mux.com/api-reference

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::prelude::*;

pub const API_URL: &str = "https://api.mux.com/video/v1/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Upload {
  pub id: String,
  pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
  pub status: String,
  pub playback_id: Option<String>,
}

#[async_trait]
pub trait VideoHost: Send + Sync {
  /// Direct-upload url; `passthrough` comes back on the created asset.
  async fn create_upload(&self, passthrough: &str) -> Result<Upload>;

  /// Asset created from an upload, once the file has arrived.
  async fn upload_asset(&self, upload_id: &str) -> Result<Option<String>>;

  async fn asset(&self, asset_id: &str) -> Result<Asset>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
  data: T,
}

#[derive(Debug, Deserialize)]
struct UploadData {
  id: String,
  #[serde(default)]
  url: String,
  asset_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssetData {
  status: String,
  #[serde(default)]
  playback_ids: Vec<PlaybackId>,
}

#[derive(Debug, Deserialize)]
struct PlaybackId {
  id: String,
}

#[derive(Clone)]
pub struct Mux {
  client: Client,
  base_url: String,
  token_id: String,
  token_secret: String,
}

impl Mux {
  pub fn new(token_id: String, token_secret: String) -> Self {
    Self {
      client: Client::new(),
      base_url: API_URL.to_string(),
      token_id,
      token_secret,
    }
  }

  async fn send<T: DeserializeOwned>(
    &self,
    request: reqwest::RequestBuilder,
  ) -> Result<T> {
    let response = request
      .basic_auth(&self.token_id, Some(&self.token_secret))
      .send()
      .await
      .map_err(|e| Error::External(format!("Request failed: {}", e)))?;

    if !response.status().is_success() {
      return Err(Error::External(format!(
        "Video host answered {}",
        response.status()
      )));
    }

    let api_response: ApiResponse<T> = response.json().await.map_err(|e| {
      Error::External(format!("Failed to parse response: {}", e))
    })?;

    Ok(api_response.data)
  }
}

#[async_trait]
impl VideoHost for Mux {
  async fn create_upload(&self, passthrough: &str) -> Result<Upload> {
    let body = json::json!({
      "cors_origin": "*",
      "new_asset_settings": {
        "playback_policy": ["public"],
        "passthrough": passthrough,
      },
    });

    let data: UploadData = self
      .send(self.client.post(format!("{}uploads", self.base_url)).json(&body))
      .await?;

    Ok(Upload { id: data.id, url: data.url })
  }

  async fn upload_asset(&self, upload_id: &str) -> Result<Option<String>> {
    let url = format!("{}uploads/{}", self.base_url, upload_id);
    let data: UploadData = self.send(self.client.get(url)).await?;
    Ok(data.asset_id)
  }

  async fn asset(&self, asset_id: &str) -> Result<Asset> {
    let url = format!("{}assets/{}", self.base_url, asset_id);
    let data: AssetData = self.send(self.client.get(url)).await?;

    Ok(Asset {
      status: data.status,
      playback_id: data.playback_ids.into_iter().next().map(|p| p.id),
    })
  }
}

pub fn stream_url(playback_id: &str) -> String {
  format!("https://stream.mux.com/{}.m3u8", playback_id)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_asset_payload() {
    let response: ApiResponse<AssetData> = json::from_str(
      r#"{"data":{"status":"ready","playback_ids":[{"id":"pb1","policy":"public"}]}}"#,
    )
    .unwrap();

    assert_eq!(response.data.status, "ready");
    assert_eq!(response.data.playback_ids[0].id, "pb1");
  }

  #[test]
  fn test_upload_without_asset_yet() {
    let response: ApiResponse<UploadData> = json::from_str(
      r#"{"data":{"id":"up1","url":"https://storage/up1","status":"waiting"}}"#,
    )
    .unwrap();

    assert_eq!(response.data.id, "up1");
    assert_eq!(response.data.asset_id, None);
  }
}
