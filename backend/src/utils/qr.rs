//! QR-code artifact generation and CDN storage.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use qrcode::{render::svg, QrCode};
use uuid::Uuid;

use crate::config::Config;

/// Collaborator that turns attendee data into a hosted QR image and removes
/// it again when the attendee goes away.
#[async_trait]
pub trait ImageUploader: Send + Sync {
    /// Renders a QR code for `data` and uploads it, returning the public URL.
    async fn generate_qr_image(&self, data: &str) -> Result<String>;
    /// Removes a previously uploaded artifact by its public URL.
    async fn delete_qr_image(&self, url: &str) -> Result<()>;
}

/// Uploads rendered QR codes to an HTTP object store / image CDN.
pub struct QrCdnUploader {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl QrCdnUploader {
    pub fn from_config(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.image_cdn_url.trim_end_matches('/').to_string(),
            token: config.image_cdn_token.clone(),
        }
    }

    fn render_svg(data: &str) -> Result<String> {
        let code = QrCode::new(data.as_bytes()).context("failed to encode QR code")?;
        let image = code
            .render::<svg::Color>()
            .min_dimensions(256, 256)
            .build();
        Ok(image)
    }
}

#[async_trait]
impl ImageUploader for QrCdnUploader {
    async fn generate_qr_image(&self, data: &str) -> Result<String> {
        let image = Self::render_svg(data)?;
        let url = format!("{}/qr-codes/{}.svg", self.base_url, Uuid::new_v4());

        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, "image/svg+xml")
            .body(image)
            .send()
            .await
            .context("failed to upload QR image")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "image upload rejected with status {}",
                response.status()
            ));
        }

        Ok(url)
    }

    async fn delete_qr_image(&self, url: &str) -> Result<()> {
        let response = self
            .http
            .delete(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .context("failed to delete QR image")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "image deletion rejected with status {}",
                response.status()
            ));
        }

        Ok(())
    }
}
