//! HTTP seam.
//!
//! The pipeline only talks to a [`Transport`]; the reqwest-backed
//! [`HttpTransport`] is the production implementation and tests swap in an
//! in-memory one.

use std::future::Future;
use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{redirect, StatusCode};
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::ScrapeError;

const UA: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct Request {
    pub url: Url,
    pub follow_redirects: bool,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    /// Charset to decode with when the server names none.
    pub charset: Option<String>,
}

impl Request {
    /// A GET that does not follow redirects.
    pub fn get(url: Url) -> Self {
        Request {
            url,
            follow_redirects: false,
            headers: HeaderMap::new(),
            query: Vec::new(),
            charset: None,
        }
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn charset(mut self, charset: &str) -> Self {
        self.charset = Some(charset.to_string());
        self
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub body: String,
    pub final_url: Url,
}

/// Something that can perform a GET.
///
/// Implementations must be safe to share between tasks if the caller scrapes
/// concurrently; the pipeline itself keeps no state between calls.
pub trait Transport: Send + Sync {
    fn get(&self, request: Request) -> impl Future<Output = Result<Response, ScrapeError>> + Send;
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(UA));
    headers.insert(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-TW,zh;q=0.9,en-US;q=0.8,en;q=0.7"));
    headers
}

fn client(config: &Config, jar: &Arc<Jar>, policy: redirect::Policy) -> Result<reqwest::Client, ScrapeError> {
    let mut builder = reqwest::Client::builder()
        .default_headers(default_headers())
        .redirect(policy)
        .timeout(config.timeout)
        .cookie_provider(Arc::clone(jar));
    if let Some(proxy) = &config.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
    }
    Ok(builder.build()?)
}

/// reqwest-backed transport. Redirect policy is fixed per client, so one
/// client of each kind is kept; both share a cookie jar so cookies set by the
/// listing page reach the follow-up request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    direct: reqwest::Client,
    following: reqwest::Client,
}

impl HttpTransport {
    /// `host` scopes the cookies from `AV_COOKIE`.
    pub fn new(config: &Config, host: &Url) -> Result<Self, ScrapeError> {
        let jar = Arc::new(Jar::default());
        if let Some(cookies) = &config.cookie {
            for pair in cookies.split(';').map(str::trim).filter(|p| !p.is_empty()) {
                jar.add_cookie_str(pair, host);
            }
        }
        Ok(HttpTransport {
            direct: client(config, &jar, redirect::Policy::none())?,
            following: client(config, &jar, redirect::Policy::limited(10))?,
        })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, request: Request) -> Result<Response, ScrapeError> {
        let client = if request.follow_redirects { &self.following } else { &self.direct };
        debug!(url = %request.url, follow = request.follow_redirects, "GET");
        let resp = client
            .get(request.url)
            .headers(request.headers)
            .query(&request.query)
            .send()
            .await?;
        let status = resp.status();
        let final_url = resp.url().clone();
        let body = match request.charset.as_deref() {
            Some(charset) => resp.text_with_charset(charset).await?,
            None => resp.text().await?,
        };
        Ok(Response { status, body, final_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Spider;
    use crate::sources::javbus;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    fn http(status: &str, headers: &[&str], body: &str) -> String {
        let mut out = format!("HTTP/1.1 {status}\r\n");
        for h in headers {
            out.push_str(h);
            out.push_str("\r\n");
        }
        out.push_str(&format!("Content-Length: {}\r\nConnection: close\r\n\r\n{body}", body.len()));
        out
    }

    /// Answers one connection per canned response, then stops accepting.
    /// Returns the lowercased request heads it saw.
    fn serve(responses: Vec<String>) -> (Url, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = std::thread::spawn(move || {
            let mut heads = Vec::new();
            for response in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut head = String::new();
                loop {
                    let mut line = String::new();
                    if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                        break;
                    }
                    head.push_str(&line);
                }
                stream.write_all(response.as_bytes()).unwrap();
                heads.push(head.to_lowercase());
            }
            heads
        });
        (Url::parse(&format!("http://{addr}/")).unwrap(), handle)
    }

    fn cookie_line(head: &str) -> Option<&str> {
        head.lines().find(|l| l.starts_with("cookie:"))
    }

    #[tokio::test]
    async fn redirect_is_returned_not_followed() {
        let (base, server) = serve(vec![http("302 Found", &["Location: /elsewhere"], "")]);
        let transport = HttpTransport::new(&Config::default(), &base).unwrap();
        let url = base.join("ABP-123").unwrap();

        let resp = transport.get(Request::get(url.clone())).await.unwrap();
        assert_eq!(resp.status, StatusCode::FOUND);
        assert_eq!(resp.final_url, url);

        let heads = server.join().unwrap();
        assert_eq!(heads.len(), 1);
        assert!(heads[0].starts_with("get /abp-123 "));
    }

    #[tokio::test]
    async fn listing_cookies_reach_the_release_request() {
        let listing = "<script>var gid = 42;\nvar uc = 0;\nvar img = '/pics/a.jpg';</script>";
        let fragment = r#"<tr><td><a href="magnet:?xt=1">无码 Sample</a><a>高清</a></td><td><a>1.2GB</a></td><td><a>2024-01-01</a></td></tr>"#;
        let (base, server) = serve(vec![
            http("200 OK", &["Content-Type: text/html", "Set-Cookie: sid=abc123; Path=/"], listing),
            http("200 OK", &["Content-Type: text/html"], fragment),
        ]);
        let config = Config {
            base_url: Some(base.to_string()),
            cookie: Some("existmag=all".into()),
            ..Config::default()
        };
        let adapter = javbus::adapter(&config).unwrap();
        let transport = HttpTransport::new(&config, &adapter.host).unwrap();
        let spider = Spider::new(transport, adapter);

        let rows = spider.fetch_releases(base.join("ABP-123").unwrap().as_str()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_uncensored && rows[0].is_hd);
        assert_eq!(rows[0].size, "1.2GB");

        let heads = server.join().unwrap();
        assert_eq!(heads.len(), 2);
        assert!(cookie_line(&heads[0]).unwrap().contains("existmag=all"));

        let ajax = &heads[1];
        assert!(ajax.starts_with("get /ajax/uncledatoolsbyajax.php?"));
        assert!(ajax.contains("gid=42"));
        assert!(ajax.contains("uc=0"));
        assert!(ajax.contains("lang=zh"));
        assert!(ajax.contains("floor="));
        assert!(ajax.contains(&format!("referer: {}", base.as_str().to_lowercase())));
        let cookie = cookie_line(ajax).unwrap();
        assert!(cookie.contains("sid=abc123"));
        assert!(cookie.contains("existmag=all"));
    }
}
