//! Test doubles for the cloud services

use crate::cloud::{CloudClient, CloudError, DataObject, DataSource, FileMetaData, FileObject};
use crate::models::FileFormat;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

/// A file object as the metadata endpoint would return it
pub fn file_object(reference: &str, report_type: i32, sources: &[&str]) -> FileObject {
    FileObject {
        file_name: format!("{}.xml", reference),
        file_reference: reference.to_string(),
        created: "2020-02-25T06:12:44Z".to_string(),
        meta_data: FileMetaData {
            period_start: "2020-02-24".to_string(),
            period_end: "2020-02-24".to_string(),
            ..Default::default()
        },
        report_type,
        sources: sources
            .iter()
            .map(|name| DataSource {
                kind: Some("wellbore".to_string()),
                name: name.to_string(),
                naming_system: None,
            })
            .collect(),
    }
}

/// In-memory `CloudClient` recording every call
#[derive(Default)]
pub struct FakeCloudClient {
    auth_failure: Option<String>,
    query_results: Mutex<VecDeque<Result<DataObject, CloudError>>>,
    files: HashMap<String, Vec<u8>>,
    calls: Mutex<Vec<String>>,
}

impl FakeCloudClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_auth(mut self, description: &str) -> Self {
        self.auth_failure = Some(description.to_string());
        self
    }

    /// Queue the result of the next `run_query` call; unqueued calls return no files
    pub fn with_query_result(self, result: Result<DataObject, CloudError>) -> Self {
        self.query_results.lock().unwrap().push_back(result);
        self
    }

    pub fn with_files(self, files: Vec<FileObject>) -> Self {
        self.with_query_result(Ok(DataObject {
            files,
            errors: Vec::new(),
        }))
    }

    pub fn with_file(mut self, reference: &str, content: &[u8]) -> Self {
        self.files.insert(reference.to_string(), content.to_vec());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn download_count(&self) -> usize {
        self.count("download:")
    }

    pub fn downloaded_references(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|c| c.strip_prefix("download:"))
            .map(|rest| rest.split(':').next().unwrap_or_default().to_string())
            .collect()
    }

    /// Documents passed to `run_query`, in call order
    pub fn queries(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|c| c.strip_prefix("query:"))
            .map(str::to_string)
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CloudClient for FakeCloudClient {
    async fn authenticate(&self) -> Result<String, CloudError> {
        self.record("authenticate".to_string());
        match &self.auth_failure {
            Some(description) => Err(CloudError::Authentication {
                description: description.clone(),
            }),
            None => Ok("fake-token".to_string()),
        }
    }

    async fn run_query(
        &self,
        _token: &str,
        _endpoint: &str,
        _subscription_key: &str,
        query: &str,
    ) -> Result<DataObject, CloudError> {
        self.record(format!("query:{}", query));
        self.query_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(DataObject::default()))
    }

    async fn download_file(
        &self,
        file_reference: &str,
        base_url: &str,
        _token: &str,
        _subscription_key: &str,
        format: FileFormat,
    ) -> Result<Vec<u8>, CloudError> {
        self.record(format!("download:{}:{}", file_reference, format));
        if base_url.is_empty() {
            return Err(CloudError::config("Missing file download url"));
        }
        self.files
            .get(file_reference)
            .cloned()
            .ok_or_else(|| CloudError::Service {
                status_code: 404,
                status: "404 Not Found".to_string(),
                body: format!("unknown reference {}", file_reference),
            })
    }
}

/// A response served by `serve_once`
pub struct CannedResponse {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
}

impl CannedResponse {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn bytes(status: u16, body: &[u8]) -> Self {
        Self {
            status,
            content_type: "application/octet-stream",
            body: body.to_vec(),
        }
    }
}

/// Local HTTP endpoint answering exactly one request
pub struct MockServer {
    addr: SocketAddr,
    request: oneshot::Receiver<String>,
}

impl MockServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// The raw request (head and body) the server received
    pub async fn request(self) -> String {
        self.request.await.expect("request captured")
    }
}

pub async fn serve_once(response: CannedResponse) -> MockServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept connection");
        let request = read_request(&mut stream).await;

        let head = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            response.status,
            reason_phrase(response.status),
            response.content_type,
            response.body.len()
        );
        let _ = stream.write_all(head.as_bytes()).await;
        let _ = stream.write_all(&response.body).await;
        let _ = stream.shutdown().await;
        let _ = tx.send(request);
    });

    MockServer { addr, request: rx }
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let read = stream.read(&mut chunk).await.unwrap_or(0);
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);

        if let Some(head_end) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buffer[..head_end]).to_lowercase();
            let content_length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buffer.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buffer).into_owned()
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
