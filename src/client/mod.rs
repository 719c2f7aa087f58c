//! HTTP transport for the DataInsight extraction service.
//!
//! A submission is a single multipart upload. The transport returns the raw
//! response body and leaves validation to the archive decoder. It never
//! retries: the endpoint is rate limited and a single call can run for
//! minutes, so retry policy belongs to the caller.

pub mod rate_limit;

pub use rate_limit::{
    Clock, ManualClock, RateLimitPolicy, RateLimitedTransport, RateLimiter, SystemClock,
};

use crate::error::{Error, Result};
use log::{debug, info};
use reqwest::blocking::{multipart, Client};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::{Duration, Instant};

/// Default extraction endpoint.
pub const DEFAULT_ENDPOINT: &str =
    "https://datainsight-api.polarisoffice.com/api/v1/datainsight/doc-extract";

/// Request header carrying the API key.
pub const API_KEY_HEADER: &str = "x-po-di-apikey";

/// Environment variable the API key is read from.
pub const API_KEY_ENV: &str = "DATAINSIGHT_API_KEY";

/// Multipart field name of the uploaded file.
pub const FILE_FIELD: &str = "file";

/// Largest file the service accepts (25 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 25 * 1024 * 1024;

/// Default request deadline; remote processing may take up to ten minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Default connect deadline.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// An API key. Its `Debug` output is redacted so it never reaches logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key. Surrounding whitespace is removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingApiKey`] if the key is blank.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            return Err(Error::MissingApiKey);
        }
        Ok(Self(key))
    }

    /// Read the key from `DATAINSIGHT_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let key = std::env::var(API_KEY_ENV).map_err(|_| Error::MissingApiKey)?;
        Self::new(key)
    }

    /// The key itself, for building the request header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Options for talking to the extraction service.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// API key sent with every request
    pub api_key: ApiKey,

    /// Extraction endpoint URL
    pub endpoint: String,

    /// Deadline for the whole request, including remote processing
    pub timeout: Duration,

    /// Deadline for establishing the connection
    pub connect_timeout: Duration,

    /// Local upload ceiling in bytes
    pub max_file_size: u64,

    /// Client-side request rate limit
    pub rate_limit: RateLimitPolicy,
}

impl ClientOptions {
    /// Create options with the given key and defaults for everything else.
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            rate_limit: RateLimitPolicy::default(),
        }
    }

    /// Create options with the key taken from `DATAINSIGHT_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ApiKey::from_env()?))
    }

    /// Set the endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect deadline.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the upload ceiling in bytes.
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Set the client-side rate limit.
    pub fn with_rate_limit(mut self, policy: RateLimitPolicy) -> Self {
        self.rate_limit = policy;
        self
    }
}

/// A file ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// File name sent in the multipart part
    pub file_name: String,

    /// File content
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Read a file for upload, refusing files larger than `max_size`.
    ///
    /// The size is checked from the file metadata before anything is read.
    pub fn from_path<P: AsRef<Path>>(path: P, max_size: u64) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let file = File::open(path)?;
        let size = file.metadata()?.len();
        check_size(&file_name, size, max_size)?;

        // The file may have grown since the metadata was read.
        let bytes = read_limited(file, &file_name, size, max_size)?;
        Ok(Self { file_name, bytes })
    }

    /// Wrap in-memory content for upload, refusing content larger than `max_size`.
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>, max_size: u64) -> Result<Self> {
        let file_name = file_name.into();
        check_size(&file_name, bytes.len() as u64, max_size)?;
        Ok(Self { file_name, bytes })
    }

    /// Size of the content in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the content is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Read at most one byte past `max`, so oversized input fails without being
/// read in full.
fn read_limited<R: Read>(reader: R, name: &str, size_hint: u64, max: u64) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(size_hint.min(max) as usize);
    reader.take(max.saturating_add(1)).read_to_end(&mut bytes)?;
    check_size(name, bytes.len() as u64, max)?;
    Ok(bytes)
}

fn check_size(name: &str, size: u64, max: u64) -> Result<()> {
    if size > max {
        return Err(Error::FileTooLarge {
            name: name.to_string(),
            size,
            max,
        });
    }
    Ok(())
}

/// Something that can submit a document and return the raw response body.
///
/// Implement this trait to put middleware (rate limiting, recording,
/// fixtures) in front of the service.
pub trait Transport: Send + Sync {
    /// Submit one document.
    fn submit(&self, upload: Upload) -> Result<Vec<u8>>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn submit(&self, upload: Upload) -> Result<Vec<u8>> {
        (**self).submit(upload)
    }
}

/// Transport backed by a blocking reqwest client.
pub struct HttpTransport {
    client: Client,
    api_key: ApiKey,
    endpoint: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a transport from client options.
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .user_agent(concat!("datainsight/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Connection(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: options.api_key.clone(),
            endpoint: options.endpoint.clone(),
            timeout: options.timeout,
        })
    }

    /// Endpoint requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout: self.timeout,
            }
        } else {
            Error::Connection(err.to_string())
        }
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Transport for HttpTransport {
    fn submit(&self, upload: Upload) -> Result<Vec<u8>> {
        let Upload { file_name, bytes } = upload;
        info!(
            "submitting '{}' ({} bytes) to {}",
            file_name,
            bytes.len(),
            self.endpoint
        );
        let started = Instant::now();

        let part = multipart::Part::bytes(bytes).file_name(file_name);
        let form = multipart::Form::new().part(FILE_FIELD, part);

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, self.api_key.expose())
            .multipart(form)
            .send()
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        debug!(
            "response {} (content-type: {:?}) after {:?}",
            status,
            response.headers().get(reqwest::header::CONTENT_TYPE),
            started.elapsed()
        );

        if !status.is_success() {
            let body = response.text().unwrap_or_else(|e| {
                debug!("failed to read error body for status {}: {}", status, e);
                String::new()
            });
            return Err(Error::from_status(status.as_u16(), &body));
        }

        let body = response.bytes().map_err(|e| self.map_error(e))?;
        info!(
            "received {} bytes in {:.1}s",
            body.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_api_key_rejects_blank() {
        assert!(matches!(ApiKey::new("  "), Err(Error::MissingApiKey)));
        assert_eq!(ApiKey::new(" abc ").unwrap().expose(), "abc");
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("super-secret").unwrap();
        let options = ClientOptions::new(key);
        let debug = format!("{:?}", options);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("ApiKey(***)"));
    }

    #[test]
    fn test_client_options_defaults() {
        let options = ClientOptions::new(ApiKey::new("k").unwrap());
        assert_eq!(options.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(options.timeout, Duration::from_secs(600));
        assert_eq!(options.max_file_size, 25 * 1024 * 1024);
        assert_eq!(options.rate_limit, RateLimitPolicy::default());
    }

    #[test]
    fn test_client_options_builder() {
        let options = ClientOptions::new(ApiKey::new("k").unwrap())
            .with_endpoint("http://localhost:8080/extract")
            .with_timeout(Duration::from_secs(5))
            .with_max_file_size(1024)
            .with_rate_limit(RateLimitPolicy::new(2, Duration::from_secs(1)));

        assert_eq!(options.endpoint, "http://localhost:8080/extract");
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.max_file_size, 1024);
        assert_eq!(options.rate_limit.max_requests, 2);
    }

    #[test]
    fn test_upload_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.7 body").unwrap();

        let upload = Upload::from_path(file.path(), 1024).unwrap();
        assert_eq!(upload.bytes, b"%PDF-1.7 body");
        assert_eq!(upload.len(), 13);
        assert!(!upload.file_name.is_empty());
    }

    #[test]
    fn test_upload_from_path_too_large() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 100]).unwrap();

        match Upload::from_path(file.path(), 99).unwrap_err() {
            Error::FileTooLarge { size, max, .. } => {
                assert_eq!(size, 100);
                assert_eq!(max, 99);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_read_limited_stops_past_ceiling() {
        // An endless source stands in for a file that keeps growing
        let err = read_limited(std::io::repeat(7), "grows.pdf", 0, 64).unwrap_err();
        match err {
            Error::FileTooLarge { size, max, .. } => {
                assert_eq!(size, 65);
                assert_eq!(max, 64);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let bytes = read_limited(&b"abc"[..], "small.pdf", 3, 64).unwrap();
        assert_eq!(bytes, b"abc");
    }

    #[test]
    fn test_upload_from_bytes_limit() {
        assert!(Upload::from_bytes("a.pdf", vec![0; 10], 10).is_ok());
        assert!(matches!(
            Upload::from_bytes("a.pdf", vec![0; 11], 10),
            Err(Error::FileTooLarge { .. })
        ));
    }

    #[test]
    fn test_upload_missing_file() {
        let err = Upload::from_path("/nonexistent/file.pdf", DEFAULT_MAX_FILE_SIZE).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
