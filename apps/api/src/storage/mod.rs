//! Media storage — uploads generated images to S3/MinIO and returns the
//! public URL that is persisted as Creation content.

use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

/// Uploads PNG bytes under `creations/<uuid>.png` and returns the public URL.
pub async fn upload_image(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    endpoint: &str,
    image: Bytes,
) -> Result<String, AppError> {
    let key = format!("creations/{}.png", Uuid::new_v4());

    s3.put_object()
        .bucket(bucket)
        .key(&key)
        .body(ByteStream::from(image.to_vec()))
        .content_type("image/png")
        .send()
        .await
        .map_err(|e| AppError::S3(format!("S3 upload failed: {e}")))?;

    info!("Uploaded image to s3://{bucket}/{key}");
    Ok(public_url(endpoint, bucket, &key))
}

/// Path-style public URL, valid for both MinIO (local) and AWS endpoints.
pub fn public_url(endpoint: &str, bucket: &str, key: &str) -> String {
    format!("{}/{bucket}/{key}", endpoint.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_joins_endpoint_bucket_key() {
        assert_eq!(
            public_url("http://localhost:9000", "lexiq", "creations/a.png"),
            "http://localhost:9000/lexiq/creations/a.png"
        );
    }

    #[test]
    fn test_public_url_trims_trailing_slash() {
        assert_eq!(
            public_url("http://localhost:9000/", "lexiq", "creations/a.png"),
            "http://localhost:9000/lexiq/creations/a.png"
        );
    }
}
