//! Object storage for audio clips.

use crate::error::{ClientError, Result};
use crate::response::{ensure_success, json};
use crate::types::{RemoveRequest, UploadResponse};
use reqwest::Client;
use tracing::{debug, info};

/// Public URL of an object in a public bucket.
pub fn public_object_url(base_url: &str, bucket: &str, path: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{}/{}",
        base_url,
        bucket,
        path.trim_start_matches('/')
    )
}

/// Storage client bound to one bucket.
pub struct StorageClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    anon_key: &'a str,
    bucket: &'a str,
    access_token: Option<&'a str>,
}

impl<'a> StorageClient<'a> {
    pub(crate) fn new(
        http: &'a Client,
        base_url: &'a str,
        anon_key: &'a str,
        bucket: &'a str,
        access_token: Option<&'a str>,
    ) -> Self {
        Self {
            http,
            base_url,
            anon_key,
            bucket,
            access_token,
        }
    }

    /// Store `bytes` under `path`. Existing objects are never overwritten.
    ///
    /// Returns the stored path (relative to the bucket).
    pub async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path);
        let size = bytes.len();
        debug!(url = %url, size, content_type, "Uploading object");

        let response = self
            .http
            .post(&url)
            .header("apikey", self.anon_key)
            .bearer_auth(self.access_token.unwrap_or(self.anon_key))
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(ClientError::from_send)?;

        let uploaded: UploadResponse = json(response, "upload response").await?;
        let prefix = format!("{}/", self.bucket);
        let stored = uploaded
            .key
            .as_deref()
            .map(|key| key.strip_prefix(&prefix).unwrap_or(key).to_string())
            .unwrap_or_else(|| path.to_string());

        info!(path = %stored, size, "Object uploaded");
        Ok(stored)
    }

    /// Public URL of a stored path.
    pub fn public_url(&self, path: &str) -> String {
        public_object_url(self.base_url, self.bucket, path)
    }

    /// Delete stored paths.
    pub async fn remove(&self, paths: &[String]) -> Result<()> {
        let url = format!("{}/storage/v1/object/{}", self.base_url, self.bucket);
        debug!(url = %url, count = paths.len(), "Removing objects");

        let response = self
            .http
            .delete(&url)
            .header("apikey", self.anon_key)
            .bearer_auth(self.access_token.unwrap_or(self.anon_key))
            .json(&RemoveRequest { prefixes: paths })
            .send()
            .await
            .map_err(ClientError::from_send)?;

        ensure_success(response).await?;
        info!(count = paths.len(), "Objects removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_public_urls() {
        assert_eq!(
            public_object_url("https://x.test", "audio-clips", "u1/1_recording.m4a"),
            "https://x.test/storage/v1/object/public/audio-clips/u1/1_recording.m4a"
        );
        assert_eq!(
            public_object_url("https://x.test", "audio-clips", "/u1/a.mp3"),
            "https://x.test/storage/v1/object/public/audio-clips/u1/a.mp3"
        );
    }
}
