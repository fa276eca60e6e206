// src/services/storage.rs
//! Object storage for listing photos and avatars
//!
//! Two backends sit behind the same `upload` call: the local filesystem
//! (default, served back through `/api/storage/:bucket/:filename`) and S3,
//! picked per call from the `storage_type` setting.

use crate::common::id_generator::generate_file_id;
use crate::services::settings::{SettingsError, SettingsService};
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::fs as tokio_fs;
use tracing::{debug, error, info, warn};

pub const PRODUCT_IMAGES_BUCKET: &str = "product-images";
pub const AVATARS_BUCKET: &str = "avatars";
pub const BUCKETS: &[&str] = &[PRODUCT_IMAGES_BUCKET, AVATARS_BUCKET];

/// Per-file limit for uploads, inline or multipart
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const LOCAL_URL_PREFIX: &str = "/api/storage/";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Malformed data URL")]
    InvalidDataUrl,

    #[error("Unsupported file type: {0}. Only JPEG, PNG, GIF and WebP images are accepted")]
    UnsupportedType(String),

    #[error("File exceeds the {} MB limit ({0} bytes)", MAX_UPLOAD_BYTES / (1024 * 1024))]
    TooLarge(usize),

    #[error("File not found")]
    NotFound,

    #[error("Unknown bucket: {0}")]
    UnknownBucket(String),

    #[error("S3 storage is not configured: {0}")]
    NotConfigured(String),

    #[error("S3 operation failed: {0}")]
    S3Error(String),

    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

#[derive(Debug, Clone)]
struct S3Config {
    access_key_id: String,
    secret_access_key: String,
    region: String,
    bucket_name: String,
    public_base_url: Option<String>,
}

#[derive(Debug, Clone)]
enum Backend {
    Local,
    S3(S3Config),
}

/// Returns `(mime, base64 payload)` without decoding
pub fn split_data_url(value: &str) -> Option<(&str, &str)> {
    let rest = value.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    if !header.ends_with(";base64") {
        return None;
    }
    let mime = header.split(';').next().filter(|m| !m.is_empty())?;
    Some((mime, payload))
}

pub fn is_data_url(value: &str) -> bool {
    value.starts_with("data:")
}

/// Decode `data:<mime>;base64,<payload>` into bytes and the declared mime type
pub fn decode_data_url(value: &str) -> Result<(Vec<u8>, String), StorageError> {
    let (mime, payload) = split_data_url(value.trim()).ok_or(StorageError::InvalidDataUrl)?;
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(cleaned.as_bytes())
        .map_err(|_| StorageError::InvalidDataUrl)?;
    if bytes.is_empty() {
        return Err(StorageError::InvalidDataUrl);
    }
    Ok((bytes, mime.to_string()))
}

/// Sniff the real image type; the declared content type is not trusted
pub fn detect_image_type(data: &[u8]) -> Result<&'static str, StorageError> {
    match infer::get(data).map(|kind| kind.mime_type()) {
        Some("image/jpeg") => Ok("image/jpeg"),
        Some("image/png") => Ok("image/png"),
        Some("image/gif") => Ok("image/gif"),
        Some("image/webp") => Ok("image/webp"),
        Some(other) => Err(StorageError::UnsupportedType(other.to_string())),
        None => Err(StorageError::UnsupportedType("unknown".to_string())),
    }
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

pub fn content_type_for_filename(filename: &str) -> &'static str {
    match filename.rsplit('.').next() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

/// Strip anything that could escape the bucket directory
pub fn sanitize_filename(filename: &str) -> String {
    let sanitized: String = filename
        .replace("..", "")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-' || *c == '_')
        .take(255)
        .collect();

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        "sanitized_file".to_string()
    } else {
        sanitized
    }
}

fn ensure_bucket(bucket: &str) -> Result<(), StorageError> {
    if BUCKETS.contains(&bucket) {
        Ok(())
    } else {
        Err(StorageError::UnknownBucket(bucket.to_string()))
    }
}

#[derive(Debug)]
pub struct StorageService {
    settings_service: Arc<SettingsService>,
    uploads_dir: PathBuf,
    public_base_url: String,
}

impl StorageService {
    pub fn new(
        settings_service: Arc<SettingsService>,
        uploads_dir: PathBuf,
        public_base_url: String,
    ) -> Self {
        Self {
            settings_service,
            uploads_dir,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create the per-bucket directories of the local backend
    pub async fn init_local_dirs(&self) -> Result<(), StorageError> {
        for bucket in BUCKETS {
            tokio_fs::create_dir_all(self.uploads_dir.join(bucket)).await?;
        }
        Ok(())
    }

    async fn backend(&self) -> Result<Backend, StorageError> {
        let storage_type = self
            .settings_service
            .get_setting("storage_type")
            .await?
            .unwrap_or_else(|| "local".to_string());

        if !storage_type.trim().eq_ignore_ascii_case("s3") {
            return Ok(Backend::Local);
        }

        let required = |value: Option<String>, name: &str| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| StorageError::NotConfigured(format!("{} is missing", name)))
        };

        let settings = &self.settings_service;
        Ok(Backend::S3(S3Config {
            access_key_id: required(settings.get_setting("aws_access_key_id").await?, "aws_access_key_id")?,
            secret_access_key: required(
                settings.get_setting("aws_secret_access_key").await?,
                "aws_secret_access_key",
            )?,
            region: settings
                .get_setting("aws_region")
                .await?
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| "us-east-1".to_string()),
            bucket_name: required(settings.get_setting("aws_s3_bucket_name").await?, "aws_s3_bucket_name")?,
            public_base_url: settings
                .get_setting("aws_public_base_url")
                .await?
                .map(|u| u.trim().trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
        }))
    }

    /// Store an image and return its public URL
    ///
    /// The stored type is the sniffed one; `content_type` is only logged when it disagrees.
    pub async fn upload(
        &self,
        bucket: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        ensure_bucket(bucket)?;
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(StorageError::TooLarge(data.len()));
        }
        let detected = detect_image_type(&data)?;
        if !content_type.is_empty() && content_type != detected {
            debug!(declared = %content_type, detected = %detected, "Declared content type differs");
        }

        let filename = format!(
            "{}-{}.{}",
            Utc::now().format("%Y%m%d"),
            generate_file_id().to_lowercase(),
            extension_for(detected)
        );

        match self.backend().await? {
            Backend::Local => self.write_local(bucket, &filename, &data).await,
            Backend::S3(config) => self.put_s3(&config, bucket, &filename, data, detected).await,
        }
    }

    /// Decode an inline `data:` URL and store it
    pub async fn upload_data_url(&self, bucket: &str, data_url: &str) -> Result<String, StorageError> {
        let (data, mime) = decode_data_url(data_url)?;
        self.upload(bucket, data, &mime).await
    }

    async fn write_local(
        &self,
        bucket: &str,
        filename: &str,
        data: &[u8],
    ) -> Result<String, StorageError> {
        let dir = self.uploads_dir.join(bucket);
        tokio_fs::create_dir_all(&dir).await?;
        let path = dir.join(filename);
        tokio_fs::write(&path, data).await.map_err(|e| {
            error!(error = %e, path = %path.display(), "Failed to write upload");
            StorageError::Io(e)
        })?;

        info!(bucket = %bucket, filename = %filename, size = data.len(), "File stored locally");
        Ok(format!(
            "{}{}{}/{}",
            self.public_base_url, LOCAL_URL_PREFIX, bucket, filename
        ))
    }

    async fn put_s3(
        &self,
        config: &S3Config,
        bucket: &str,
        filename: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "site_settings",
        );
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;
        let client = S3Client::new(&aws_config);

        let key = format!("{}/{}", bucket, filename);
        client
            .put_object()
            .bucket(&config.bucket_name)
            .key(&key)
            .body(ByteStream::from(Bytes::from(data)))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, key = %key, "Failed to upload file to S3");
                StorageError::S3Error(format!("Upload failed: {}", e))
            })?;

        info!(key = %key, bucket = %config.bucket_name, "File uploaded to S3");
        Ok(match &config.public_base_url {
            Some(base) => format!("{}/{}", base, key),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                config.bucket_name, config.region, key
            ),
        })
    }

    /// Bytes and content type of a locally stored file
    pub async fn read_local(
        &self,
        bucket: &str,
        filename: &str,
    ) -> Result<(Vec<u8>, &'static str), StorageError> {
        ensure_bucket(bucket).map_err(|_| StorageError::NotFound)?;
        let safe_name = sanitize_filename(filename);
        let path = self.uploads_dir.join(bucket).join(&safe_name);

        match tokio_fs::read(&path).await {
            Ok(data) => Ok((data, content_type_for_filename(&safe_name))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Best-effort removal of a file this service stored locally
    pub async fn delete_local_by_url(&self, url: &str) {
        let Some(idx) = url.find(LOCAL_URL_PREFIX) else {
            debug!(url = %url, "Not a local storage URL, leaving it");
            return;
        };
        let Some((bucket, filename)) = url[idx + LOCAL_URL_PREFIX.len()..].split_once('/') else {
            return;
        };
        if ensure_bucket(bucket).is_err() {
            return;
        }

        let path = self.uploads_dir.join(bucket).join(sanitize_filename(filename));
        if let Err(e) = tokio_fs::remove_file(&path).await {
            warn!(error = %e, path = %path.display(), "Failed to remove stored file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_support::{memory_pool, PNG_BYTES};

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("storage-test-{}", generate_file_id()))
    }

    async fn local_service(dir: PathBuf) -> StorageService {
        let settings = Arc::new(SettingsService::with_encryption(memory_pool().await, None));
        settings.set_setting("storage_type", "local", false, None).await.unwrap();
        StorageService::new(settings, dir, "http://localhost:8080/".to_string())
    }

    #[test]
    fn test_decode_data_url() {
        let url = format!("data:image/png;base64,{}", BASE64.encode(PNG_BYTES));
        let (bytes, mime) = decode_data_url(&url).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, PNG_BYTES);

        assert!(matches!(decode_data_url("https://x/y.png"), Err(StorageError::InvalidDataUrl)));
        assert!(matches!(decode_data_url("data:image/png,plain"), Err(StorageError::InvalidDataUrl)));
        assert!(matches!(decode_data_url("data:image/png;base64,!!!"), Err(StorageError::InvalidDataUrl)));
    }

    #[test]
    fn test_split_data_url_keeps_payload_encoded() {
        assert_eq!(
            split_data_url("data:audio/webm;codecs=opus;base64,AAAA"),
            Some(("audio/webm", "AAAA"))
        );
        assert_eq!(split_data_url("data:;base64,AAAA"), None);
    }

    #[test]
    fn test_detect_rejects_non_images() {
        assert_eq!(detect_image_type(PNG_BYTES).unwrap(), "image/png");
        assert!(matches!(
            detect_image_type(b"%PDF-1.4 hello"),
            Err(StorageError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_filename("a b.png"), "ab.png");
        assert_eq!(sanitize_filename(".."), "sanitized_file");
    }

    #[tokio::test]
    async fn test_local_upload_and_read_back() {
        let dir = temp_dir();
        let service = local_service(dir.clone()).await;

        let url = service
            .upload(PRODUCT_IMAGES_BUCKET, PNG_BYTES.to_vec(), "image/png")
            .await
            .unwrap();
        assert!(url.starts_with("http://localhost:8080/api/storage/product-images/"));
        assert!(url.ends_with(".png"));

        let filename = url.rsplit('/').next().unwrap();
        let (data, content_type) = service.read_local(PRODUCT_IMAGES_BUCKET, filename).await.unwrap();
        assert_eq!(data, PNG_BYTES);
        assert_eq!(content_type, "image/png");

        service.delete_local_by_url(&url).await;
        assert!(matches!(
            service.read_local(PRODUCT_IMAGES_BUCKET, filename).await,
            Err(StorageError::NotFound)
        ));

        let _ = tokio_fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn test_upload_limits() {
        let service = local_service(temp_dir()).await;

        let err = service.upload("secrets", PNG_BYTES.to_vec(), "image/png").await.unwrap_err();
        assert!(matches!(err, StorageError::UnknownBucket(_)));

        let mut big = PNG_BYTES.to_vec();
        big.resize(MAX_UPLOAD_BYTES + 1, 0);
        let err = service.upload(AVATARS_BUCKET, big, "image/png").await.unwrap_err();
        assert!(matches!(err, StorageError::TooLarge(_)));
    }

    #[tokio::test]
    async fn test_s3_without_credentials_is_not_configured() {
        let settings = Arc::new(SettingsService::with_encryption(memory_pool().await, None));
        settings.set_setting("storage_type", "s3", false, None).await.unwrap();
        settings.set_setting("aws_access_key_id", "", false, None).await.unwrap();
        let service = StorageService::new(settings, temp_dir(), String::new());

        let err = service.upload(AVATARS_BUCKET, PNG_BYTES.to_vec(), "image/png").await.unwrap_err();
        assert!(matches!(err, StorageError::NotConfigured(_)));
    }
}
