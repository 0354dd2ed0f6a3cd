//! Image service endpoints: avatar upload and retrieval.

use crate::error::ClientError;
use crate::http::{FilePart, HttpClient, RequestSpec};
use serde_json::{json, Value};

/// An uploaded image and the URLs it can be viewed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub image_id: String,
    pub image_url: String,
    pub thumbnail_url: String,
}

impl HttpClient {
    /// Upload a profile image. The service returns a view id; the view and
    /// thumbnail URLs are derived from it.
    pub async fn upload_profile_image(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime: &str,
    ) -> Result<UploadedImage, ClientError> {
        let url = format!("{}/api/images/upload/profile", self.services().image);
        let spec = RequestSpec::new(reqwest::Method::POST, url).multipart_file(FilePart {
            field_name: "image".to_string(),
            bytes,
            file_name: file_name.to_string(),
            mime: mime.to_string(),
        });
        let value = self.execute_value(spec).await?;

        // data is usually the view id itself; older responses nest it.
        let view_id = match value.get("data") {
            Some(Value::String(id)) => Some(id.clone()),
            Some(data) => data
                .get("viewId")
                .and_then(Value::as_str)
                .map(str::to_string),
            None => value
                .get("viewId")
                .and_then(Value::as_str)
                .map(str::to_string),
        };
        let view_id = view_id.ok_or_else(|| {
            ClientError::ServerError {
                status: 200,
                message: "upload succeeded but no view id returned".to_string(),
            }
        })?;

        Ok(UploadedImage {
            image_url: self.image_url(&view_id, false),
            thumbnail_url: self.image_url(&view_id, true),
            image_id: view_id,
        })
    }

    /// View URL for an image id.
    pub fn image_url(&self, image_id: &str, thumbnail: bool) -> String {
        let base = format!("{}/api/images/view/{image_id}", self.services().image);
        if thumbnail {
            format!("{base}?thumbnail=true")
        } else {
            base
        }
    }

    /// Fetch an image's bytes with the bearer header attached.
    pub async fn image_bytes(
        &self,
        image_id: &str,
        thumbnail: bool,
    ) -> Result<Vec<u8>, ClientError> {
        let url = self.image_url(image_id, thumbnail);
        let response = self.execute(RequestSpec::get(url)).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::from_status(
                status,
                format!("failed to fetch image: {status}"),
            ));
        }
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn delete_images(&self, image_urls: &[String]) -> Result<(), ClientError> {
        let url = format!(
            "{}/api/images/view/command/delete/in",
            self.services().image
        );
        self.execute_value(RequestSpec::post_json(url, json!({"imageUrls": image_urls})))
            .await?;
        Ok(())
    }
}
