//! Media API client — image generation and image transforms.
//!
//! The provider accepts multipart requests and returns the processed image as
//! raw PNG bytes. Calls are not retried; a provider failure fails the action
//! before anything is recorded.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// Client for the hosted image generation / transform API.
#[derive(Clone)]
pub struct MediaClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl MediaClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
            api_key,
        }
    }

    /// Generates an image from a text prompt.
    pub async fn text_to_image(&self, prompt: &str) -> Result<Bytes, MediaError> {
        let form = Form::new().text("prompt", prompt.to_string());
        self.send("v1/text-to-image", form).await
    }

    /// Removes the background from an uploaded image.
    pub async fn remove_background(
        &self,
        image: Bytes,
        filename: &str,
    ) -> Result<Bytes, MediaError> {
        let form = Form::new().part("image_file", image_part(image, filename));
        self.send("v1/remove-background", form).await
    }

    /// Erases the named object from an uploaded image.
    pub async fn remove_object(
        &self,
        image: Bytes,
        filename: &str,
        object: &str,
    ) -> Result<Bytes, MediaError> {
        let form = Form::new()
            .part("image_file", image_part(image, filename))
            .text("object", object.to_string());
        self.send("v1/remove-object", form).await
    }

    async fn send(&self, path: &str, form: Form) -> Result<Bytes, MediaError> {
        let response = self
            .client
            .post(format!("{}/{path}", self.base_url.trim_end_matches('/')))
            .header("x-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MediaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        debug!("Media API {path} returned {} bytes", bytes.len());
        Ok(bytes)
    }
}

fn image_part(image: Bytes, filename: &str) -> Part {
    Part::bytes(image.to_vec()).file_name(filename.to_string())
}
