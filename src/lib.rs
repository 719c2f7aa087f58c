//! # datainsight
//!
//! Client library for the Polaris AI DataInsight document extraction API.
//!
//! The service does the heavy lifting (layout analysis, OCR, table and chart
//! recognition) and answers with a ZIP archive holding a JSON description of
//! the document. This crate uploads the document, unpacks the archive,
//! normalizes the JSON into a typed [`Document`], and derives reading-order
//! text, table CSVs, and retrieval chunks from it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use datainsight::{ClientOptions, DataInsight};
//!
//! fn main() -> datainsight::Result<()> {
//!     // Reads the key from DATAINSIGHT_API_KEY
//!     let client = DataInsight::new(ClientOptions::from_env()?)?;
//!     let extraction = client.extract("report.pdf")?;
//!
//!     for text in extraction.texts() {
//!         println!("{}", text);
//!     }
//!     for chunk in extraction.chunks() {
//!         println!("p{} [{}] {}", chunk.page_number, chunk.element_type, chunk.text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - [`client`]: authenticated multipart upload, client-side rate limiting
//! - [`archive`]: response ZIP validation and payload selection
//! - [`normalize`](normalize()): lenient JSON → [`Document`] conversion
//! - [`extract`]: text, table, chart, and chunk views
//! - [`render`]: Markdown, plain text, and JSON output

pub mod archive;
pub mod client;
pub mod error;
pub mod extract;
pub mod model;
pub mod normalize;
pub mod render;

// Re-export commonly used types
pub use archive::ResponseArchive;
pub use client::{
    ApiKey, ClientOptions, HttpTransport, RateLimitPolicy, RateLimitedTransport, RateLimiter,
    Transport, Upload,
};
pub use error::{Error, Result};
pub use extract::{build_chunks, collect_charts, collect_tables, collect_text, Chunk};
pub use model::{
    BoundingBox, ChartContent, Document, Element, ElementContent, ElementKind, ImageContent,
    Page, TableCell, TableContent, TextContent,
};
pub use normalize::normalize;
pub use render::{JsonFormat, PageSelection, RenderOptions, TableFallback};

use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Decode a response body into a normalized document.
///
/// # Example
///
/// ```no_run
/// let body = std::fs::read("response.zip").unwrap();
/// let doc = datainsight::decode_response(&body).unwrap();
/// println!("{} pages", doc.page_count());
/// ```
pub fn decode_response(bytes: &[u8]) -> Result<Document> {
    Ok(Extraction::from_response(bytes.to_vec())?.document)
}

/// Load a response archive saved earlier (see [`Extraction::save_response`]).
///
/// # Example
///
/// ```no_run
/// use datainsight::load_response_file;
///
/// let extraction = load_response_file("report.zip").unwrap();
/// println!("{}", extraction.texts().join("\n"));
/// ```
pub fn load_response_file<P: AsRef<Path>>(path: P) -> Result<Extraction> {
    let bytes = fs::read(path)?;
    Extraction::from_response(bytes)
}

/// Submit a file with default options and return the normalized document.
///
/// # Example
///
/// ```no_run
/// use datainsight::extract_file;
///
/// let doc = extract_file("report.pdf", "my-api-key").unwrap();
/// println!("{}", datainsight::collect_text(&doc).join("\n"));
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P, api_key: &str) -> Result<Document> {
    let client = DataInsight::new(ClientOptions::new(ApiKey::new(api_key)?))?;
    Ok(client.extract(path)?.document)
}

/// Client for the extraction service.
///
/// Every request goes through the transport's rate limiter, so one client
/// should be shared for all submissions of a process.
///
/// # Example
///
/// ```no_run
/// use datainsight::{ApiKey, ClientOptions, DataInsight, RenderOptions};
/// use std::time::Duration;
///
/// let options = ClientOptions::new(ApiKey::new("my-api-key")?)
///     .with_timeout(Duration::from_secs(900));
/// let markdown = DataInsight::new(options)?
///     .extract("slides.pptx")?
///     .to_markdown(&RenderOptions::default())?;
/// # Ok::<(), datainsight::Error>(())
/// ```
pub struct DataInsight<T: Transport = RateLimitedTransport<HttpTransport>> {
    transport: T,
    max_file_size: u64,
}

impl DataInsight {
    /// Create a client with an HTTP transport behind the configured rate limit.
    pub fn new(options: ClientOptions) -> Result<Self> {
        let http = HttpTransport::new(&options)?;
        Ok(Self {
            transport: RateLimitedTransport::new(http, options.rate_limit),
            max_file_size: options.max_file_size,
        })
    }

    /// Create a client with the API key taken from `DATAINSIGHT_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientOptions::from_env()?)
    }
}

impl<T: Transport> DataInsight<T> {
    /// Create a client over any transport.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            max_file_size: client::DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Set the local upload ceiling in bytes.
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Submit a file and decode the response.
    pub fn extract<P: AsRef<Path>>(&self, path: P) -> Result<Extraction> {
        let upload = Upload::from_path(path, self.max_file_size)?;
        self.submit(upload)
    }

    /// Submit in-memory content and decode the response.
    pub fn extract_bytes(&self, file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Extraction> {
        let upload = Upload::from_bytes(file_name, bytes, self.max_file_size)?;
        self.submit(upload)
    }

    /// Submit several files one after another.
    ///
    /// Requests are sequential and share the transport's rate limiter. A
    /// failed file does not stop the batch; each path gets its own result.
    pub fn extract_batch<I, P>(&self, paths: I) -> Vec<(PathBuf, Result<Extraction>)>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        paths
            .into_iter()
            .map(|path| {
                let path = path.as_ref().to_path_buf();
                let result = self.extract(&path);
                if let Err(ref e) = result {
                    warn!("{}: {}", path.display(), e);
                }
                (path, result)
            })
            .collect()
    }

    fn submit(&self, upload: Upload) -> Result<Extraction> {
        let name = upload.file_name.clone();
        let body = self.transport.submit(upload)?;
        let extraction = Extraction::from_response(body)?;
        info!(
            "'{}': {} pages, {} elements",
            name,
            extraction.document.page_count(),
            extraction.document.element_count()
        );
        Ok(extraction)
    }
}

/// A decoded response: the normalized document plus the archive it came from.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// The normalized document
    pub document: Document,
    archive: ResponseArchive,
}

impl Extraction {
    /// Decode a raw response body.
    ///
    /// Fails as a whole; no partial document is returned.
    pub fn from_response(bytes: Vec<u8>) -> Result<Self> {
        let archive = ResponseArchive::from_bytes(bytes)?;
        let tree = archive.payload()?;
        let document = normalize(&tree)?;
        Ok(Self { document, archive })
    }

    /// Get the document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Get the response archive.
    pub fn archive(&self) -> &ResponseArchive {
        &self.archive
    }

    /// Text of all text elements in reading order.
    pub fn texts(&self) -> Vec<String> {
        collect_text(&self.document)
    }

    /// CSV of all tables in reading order.
    pub fn tables(&self) -> Vec<String> {
        collect_tables(&self.document)
    }

    /// Retrieval chunks, one per content-bearing element.
    pub fn chunks(&self) -> Vec<Chunk> {
        build_chunks(&self.document)
    }

    /// Convert to Markdown.
    pub fn to_markdown(&self, options: &RenderOptions) -> Result<String> {
        render::to_markdown(&self.document, options)
    }

    /// Convert to plain text.
    pub fn to_text(&self, options: &RenderOptions) -> Result<String> {
        render::to_text(&self.document, options)
    }

    /// Convert to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.document, format)
    }

    /// Names of the non-payload archive members (images).
    pub fn assets(&self) -> Vec<&str> {
        self.archive.assets().collect()
    }

    /// Read one archive member.
    pub fn read_asset(&self, name: &str) -> Result<Vec<u8>> {
        self.archive.read_member(name)
    }

    /// Write the raw response archive to disk for later offline use.
    pub fn save_response<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.archive.as_bytes())?;
        Ok(())
    }
}
