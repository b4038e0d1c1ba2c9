//! HTTP/1.1 Fetcher
//!
//! Minimal `Connection: close` GET client on smol's TCP stream. Relative
//! URLs resolve against the site origin the fetcher was built with.
//! Plain `http` only; TLS termination is left to a fronting proxy.

use smol::io::{AsyncReadExt, AsyncWriteExt};
use smol::net::TcpStream;
use url::{Position, Url};

use crate::loader::{FetchFuture, Request, ResourceFetcher};
use crate::{NetError, Response};

/// Fetches site resources over HTTP/1.1
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    base: Url,
    user_agent: String,
}

impl HttpFetcher {
    /// Create a fetcher for the site at `origin`
    pub fn new(origin: &str) -> Result<Self, NetError> {
        let base = Url::parse(origin).map_err(|e| NetError::InvalidUrl(format!("{origin}: {e}")))?;
        Ok(Self {
            base,
            user_agent: "navkit/0.1".into(),
        })
    }

    pub fn user_agent(mut self, ua: &str) -> Self {
        self.user_agent = ua.to_string();
        self
    }

    /// Resolve a (possibly relative) URL against the origin
    pub fn resolve(&self, url: &str) -> Result<Url, NetError> {
        self.base
            .join(url)
            .map_err(|e| NetError::InvalidUrl(format!("{url}: {e}")))
    }

    fn serialize(&self, url: &Url, request: &Request) -> Result<Vec<u8>, NetError> {
        let host = url
            .host_str()
            .ok_or_else(|| NetError::InvalidUrl(url.to_string()))?;
        let target = &url[Position::BeforePath..Position::AfterQuery];

        let mut buf = format!("GET {target} HTTP/1.1\r\nHost: {host}");
        if let Some(port) = url.port() {
            buf.push_str(&format!(":{port}"));
        }
        buf.push_str("\r\n");
        buf.push_str(&format!("User-Agent: {}\r\n", self.user_agent));
        buf.push_str("Connection: close\r\n");
        for (name, value) in &request.headers {
            buf.push_str(&format!("{name}: {value}\r\n"));
        }
        buf.push_str("\r\n");
        Ok(buf.into_bytes())
    }
}

impl ResourceFetcher for HttpFetcher {
    fn fetch(&self, request: Request) -> FetchFuture<'_> {
        Box::pin(async move {
            let url = self.resolve(&request.url)?;
            if url.scheme() != "http" {
                return Err(NetError::InvalidUrl(format!(
                    "unsupported scheme {}",
                    url.scheme()
                )));
            }
            let host = url
                .host_str()
                .ok_or_else(|| NetError::InvalidUrl(url.to_string()))?
                .to_string();
            let port = url.port_or_known_default().unwrap_or(80);

            tracing::info!("HTTP GET {}", url);
            let payload = self.serialize(&url, &request)?;
            let mut stream = TcpStream::connect((host.as_str(), port)).await?;
            stream.write_all(&payload).await?;
            stream.flush().await?;

            let mut raw = Vec::new();
            stream.read_to_end(&mut raw).await?;
            let response = parse_response(&raw)?;
            tracing::debug!("HTTP {} {} ({} bytes)", response.status, url, response.body.len());
            Ok(response)
        })
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Parse a complete HTTP/1.x response read until connection close
pub fn parse_response(raw: &[u8]) -> Result<Response, NetError> {
    let malformed = |what: &str| NetError::Network(format!("malformed response: {what}"));

    let head_end = find_subsequence(raw, b"\r\n\r\n").ok_or_else(|| malformed("no header terminator"))?;
    let head = std::str::from_utf8(&raw[..head_end]).map_err(|_| malformed("non-utf8 headers"))?;
    let mut lines = head.split("\r\n");

    let status_line = lines.next().ok_or_else(|| malformed("empty"))?;
    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().unwrap_or("");
    if !version.starts_with("HTTP/1.") {
        return Err(malformed("status line"));
    }
    let status: u16 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| malformed("status code"))?;

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(n, v)| (n.trim().to_string(), v.trim().to_string()))
        .collect();

    let mut response = Response {
        status,
        headers,
        body: Vec::new(),
    };

    let body = &raw[head_end + 4..];
    response.body = if response
        .header("transfer-encoding")
        .is_some_and(|v| v.eq_ignore_ascii_case("chunked"))
    {
        decode_chunked(body)?
    } else if let Some(len) = response.header("content-length").and_then(|v| v.parse::<usize>().ok()) {
        body[..len.min(body.len())].to_vec()
    } else {
        body.to_vec()
    };

    Ok(response)
}

/// Decode a chunked transfer-encoded body
fn decode_chunked(mut body: &[u8]) -> Result<Vec<u8>, NetError> {
    let bad = || NetError::Network("malformed chunked body".into());
    let mut out = Vec::new();

    loop {
        let line_end = find_subsequence(body, b"\r\n").ok_or_else(bad)?;
        let size_field = std::str::from_utf8(&body[..line_end]).map_err(|_| bad())?;
        let size_hex = size_field.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_hex, 16).map_err(|_| bad())?;
        body = &body[line_end + 2..];

        if size == 0 {
            return Ok(out);
        }
        if body.len() < size {
            return Err(bad());
        }
        out.extend_from_slice(&body[..size]);
        body = body.get(size + 2..).unwrap_or(&[]);
    }
}
