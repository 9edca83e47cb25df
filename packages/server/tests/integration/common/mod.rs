use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::HeaderMap;
use common::storage::filesystem::FilesystemContentStore;
use common::storage::{BoxReader, ContentStore, GzipCompressor, Locator, Representation};
use reqwest::Client;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tempfile::TempDir;

use server::config::{
    AppConfig, CorsConfig, DatabaseConfig, MaintenanceConfig, OnError, ServerConfig, StorageConfig,
};
use server::files::ContentDelivery;
use server::state::AppState;

/// Upload limit used by every test server.
pub const MAX_UPLOAD_SIZE: u64 = 64 * 1024;

pub mod routes {
    pub const FILES: &str = "/api/v1/files";
    pub const HEALTH: &str = "/health";
    pub const OPENAPI: &str = "/api-docs/openapi.json";

    pub fn file(name: &str) -> String {
        format!("/api/v1/files/{name}")
    }

    pub fn content(name: &str) -> String {
        format!("/static/{name}")
    }
}

/// Database and content store backing a test, without a server.
pub struct TestBackend {
    pub db: DatabaseConnection,
    pub store: Arc<FilesystemContentStore>,
    pub content: ContentDelivery,
    pub config: AppConfig,
    /// Holds the SQLite file and the content root.
    _dir: TempDir,
}

impl TestBackend {
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}/test.db?mode=rwc", dir.path().display());
        let content_root = dir.path().join("content");

        let db = server::database::init_db(&db_url, 5)
            .await
            .expect("Failed to initialize test database");

        let store = Arc::new(
            FilesystemContentStore::new(
                content_root.clone(),
                MAX_UPLOAD_SIZE,
                Arc::new(GzipCompressor::default()),
            )
            .await
            .expect("Failed to open content store"),
        );
        let content = ContentDelivery::new(store.clone() as Arc<dyn ContentStore>);

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: db_url,
                max_connections: 5,
            },
            storage: StorageConfig {
                root: content_root,
                max_upload_size: MAX_UPLOAD_SIZE,
                compression_level: 6,
            },
            maintenance: MaintenanceConfig {
                recompress_on_startup: false,
                on_error: OnError::Abort,
            },
        };

        Self {
            db,
            store,
            content,
            config,
            _dir: dir,
        }
    }

    /// Write content straight to the store, bypassing the API.
    pub async fn seed_content(&self, locator: &Locator, bytes: &[u8]) {
        let reader: BoxReader = Box::new(std::io::Cursor::new(bytes.to_vec()));
        self.store
            .store(locator, reader)
            .await
            .expect("Failed to seed content");
    }

    pub fn content_path(&self, locator: &Locator, representation: Representation) -> PathBuf {
        match representation {
            Representation::Plain => self.store.base_path().join(locator.as_str()),
            Representation::Compressed => self.store.base_path().join(locator.mirror_name()),
        }
    }

    /// Stored content files, ignoring the staging directory.
    pub fn stored_file_count(&self) -> usize {
        std::fs::read_dir(self.store.base_path())
            .expect("Failed to read content root")
            .filter_map(Result::ok)
            .filter(|e| e.file_name() != ".tmp")
            .count()
    }
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub backend: TestBackend,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

/// Response whose body is kept as raw bytes.
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        let backend = TestBackend::new().await;

        let state = AppState {
            db: backend.db.clone(),
            content: backend.content.clone(),
            config: backend.config.clone(),
        };

        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            backend,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn with_identity(
        builder: reqwest::RequestBuilder,
        identity: Option<&str>,
    ) -> reqwest::RequestBuilder {
        match identity {
            // Raw bytes so identities outside ASCII reach the server untouched.
            Some(id) => builder.header(
                "id",
                reqwest::header::HeaderValue::from_bytes(id.as_bytes())
                    .expect("identity should be a valid header value"),
            ),
            None => builder,
        }
    }

    pub async fn get(&self, path: &str, identity: Option<&str>) -> TestResponse {
        let res = Self::with_identity(self.client.get(self.url(path)), identity)
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn put(&self, path: &str, body: &Value, identity: Option<&str>) -> TestResponse {
        let res = Self::with_identity(self.client.put(self.url(path)), identity)
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete(&self, path: &str, identity: Option<&str>) -> TestResponse {
        let res = Self::with_identity(self.client.delete(self.url(path)), identity)
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// `GET /static/{name}`, keeping the body as bytes.
    pub async fn fetch_content(
        &self,
        name: &str,
        identity: Option<&str>,
        accept_encoding: Option<&str>,
    ) -> RawResponse {
        let mut builder =
            Self::with_identity(self.client.get(self.url(&routes::content(name))), identity);
        if let Some(encoding) = accept_encoding {
            builder = builder.header("Accept-Encoding", encoding);
        }
        let res = builder.send().await.expect("Failed to send GET request");

        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let bytes = res.bytes().await.unwrap_or_default().to_vec();
        RawResponse {
            status,
            headers,
            bytes,
        }
    }

    /// Multipart upload to `POST /files`. `None` fields are left out of the form.
    pub async fn upload(
        &self,
        identity: Option<&str>,
        file_name: &str,
        file_bytes: Vec<u8>,
        access_level: Option<&str>,
        name: Option<&str>,
    ) -> TestResponse {
        let part = reqwest::multipart::Part::bytes(file_bytes).file_name(file_name.to_string());
        let mut form = reqwest::multipart::Form::new().part("file", part);
        if let Some(level) = access_level {
            form = form.text("accessLevel", level.to_string());
        }
        if let Some(name) = name {
            form = form.text("name", name.to_string());
        }

        let res = Self::with_identity(self.client.post(self.url(routes::FILES)), identity)
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    /// Upload `bytes` as `name` and assert it was created.
    pub async fn create_file(&self, owner: &str, name: &str, bytes: &[u8], level: &str) -> Value {
        let res = self
            .upload(Some(owner), name, bytes.to_vec(), Some(level), None)
            .await;
        assert_eq!(res.status, 201, "create_file failed: {}", res.text);
        res.body
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }
}

/// Smallest valid PNG: signature plus IHDR.
pub fn png_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R']);
    bytes.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 1, 8, 6, 0, 0, 0]);
    bytes.extend_from_slice(&[0x1F, 0x15, 0xC4, 0x89]);
    bytes
}

/// Minimal PDF header, enough for content sniffing.
pub fn pdf_bytes() -> Vec<u8> {
    b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n1 0 obj\n<< /Type /Catalog >>\nendobj\n".to_vec()
}
