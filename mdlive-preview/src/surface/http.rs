//! Preview served over a local HTTP server with live reload
//!
//! The server thread answers two routes: `/` returns the latest document with
//! a small polling script injected, and `/__mdlive/revision` returns a counter
//! that changes every time a new document is shown. The page reloads itself
//! when the counter moves.

use anyhow::{anyhow, Result};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tiny_http::{Header, Response, Server, StatusCode};

use super::PreviewSurface;

pub const REVISION_PATH: &str = "/__mdlive/revision";

/// How often the served page asks for the current revision
const POLL_INTERVAL_MS: u64 = 300;

#[derive(Default)]
struct LivePage {
    html: String,
    revision: u64,
}

pub struct HttpSurface {
    addr: SocketAddr,
    page: Arc<Mutex<LivePage>>,
    shutdown_flag: Arc<AtomicBool>,
    server_thread: Option<JoinHandle<()>>,
}

impl HttpSurface {
    /// Bind a server on `bind:port` (port 0 picks a free port)
    pub fn bind(bind: &str, port: u16) -> Result<Self> {
        let requested = format!("{}:{}", bind, port);
        let server = Server::http(&requested)
            .map_err(|e| anyhow!("Failed to start preview server on {}: {}", requested, e))?;
        let addr = server
            .server_addr()
            .to_ip()
            .ok_or_else(|| anyhow!("Preview server on {} has no IP address", requested))?;

        let page = Arc::new(Mutex::new(LivePage::default()));
        let shutdown_flag = Arc::new(AtomicBool::new(false));

        let thread_page = Arc::clone(&page);
        let thread_flag = Arc::clone(&shutdown_flag);
        let server_thread = thread::spawn(move || serve(server, thread_page, thread_flag));

        log::info!("Preview server listening on http://{}/", addr);

        Ok(Self {
            addr,
            page,
            shutdown_flag,
            server_thread: Some(server_thread),
        })
    }

    /// Like [`HttpSurface::bind`], but a taken `port` falls back to a free one.
    ///
    /// Several previews can share one configured port this way: the first
    /// gets it, the rest get ephemeral ports.
    pub fn bind_preferred(bind: &str, port: u16) -> Result<Self> {
        match Self::bind(bind, port) {
            Ok(surface) => Ok(surface),
            Err(e) if port != 0 => {
                log::warn!("{:#}; using a free port instead", e);
                Self::bind(bind, 0)
            }
            Err(e) => Err(e),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Revision of the document currently served (0 before the first `show`)
    pub fn revision(&self) -> u64 {
        self.page.lock().map(|p| p.revision).unwrap_or(0)
    }
}

impl PreviewSurface for HttpSurface {
    fn show(&mut self, html: &str) -> Result<()> {
        let mut page = self
            .page
            .lock()
            .map_err(|_| anyhow!("Preview page lock poisoned"))?;
        page.html = html.to_string();
        page.revision += 1;
        log::debug!("Serving revision {} ({} bytes)", page.revision, html.len());
        Ok(())
    }

    fn location(&self) -> String {
        format!("http://{}/", self.addr)
    }
}

impl Drop for HttpSurface {
    fn drop(&mut self) {
        self.shutdown_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.server_thread.take() {
            let _ = handle.join();
        }
        log::debug!("Preview server on {} stopped", self.addr);
    }
}

fn serve(server: Server, page: Arc<Mutex<LivePage>>, shutdown_flag: Arc<AtomicBool>) {
    loop {
        if shutdown_flag.load(Ordering::Relaxed) {
            break;
        }

        match server.recv_timeout(Duration::from_millis(100)) {
            Ok(Some(request)) => {
                let snapshot = page
                    .lock()
                    .map(|p| (p.html.clone(), p.revision))
                    .ok();
                let route = request.url().split(['?', '#']).next().unwrap_or("/");
                let response = match (route, snapshot) {
                    (_, None) => Response::from_string("preview unavailable")
                        .with_status_code(StatusCode(500)),
                    (REVISION_PATH, Some((_, revision))) => {
                        with_content_type(Response::from_string(revision.to_string()), "text/plain")
                    }
                    ("/" | "/index.html", Some((html, revision))) => with_content_type(
                        Response::from_string(inject_live_reload(&html, revision)),
                        "text/html; charset=utf-8",
                    ),
                    _ => Response::from_string("not found").with_status_code(StatusCode(404)),
                };
                let _ = request.respond(response);
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("Preview server stopped: {}", e);
                break;
            }
        }
    }
}

fn with_content_type<R: std::io::Read>(response: Response<R>, value: &str) -> Response<R> {
    match Header::from_bytes(&b"Content-Type"[..], value.as_bytes()) {
        Ok(header) => response.with_header(header),
        Err(_) => response,
    }
}

/// Insert the polling script before the last `</body>`, or append it
fn inject_live_reload(html: &str, revision: u64) -> String {
    let script = format!(
        r#"<script>
(function () {{
  var revision = "{revision}";
  setInterval(function () {{
    fetch("{path}", {{ cache: "no-store" }})
      .then(function (r) {{ return r.text(); }})
      .then(function (r) {{ if (r !== revision) {{ location.reload(); }} }})
      .catch(function () {{}});
  }}, {interval});
}})();
</script>
"#,
        revision = revision,
        path = REVISION_PATH,
        interval = POLL_INTERVAL_MS,
    );

    match html.rfind("</body>") {
        Some(pos) => {
            let mut out = String::with_capacity(html.len() + script.len());
            out.push_str(&html[..pos]);
            out.push_str(&script);
            out.push_str(&html[pos..]);
            out
        }
        None => format!("{}{}", html, script),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpStream;

    fn get(addr: SocketAddr, path: &str) -> Result<(u16, String)> {
        let mut stream = TcpStream::connect(addr)?;
        stream.set_read_timeout(Some(Duration::from_secs(5)))?;
        write!(
            stream,
            "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
            path, addr
        )?;
        let mut raw = String::new();
        stream.read_to_string(&mut raw)?;

        let status = raw
            .split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let body = raw
            .split_once("\r\n\r\n")
            .map(|(_, b)| b.to_string())
            .unwrap_or_default();
        Ok((status, body))
    }

    #[test]
    fn test_inject_before_body_close() {
        let out = inject_live_reload("<html><body><p>x</p></body></html>", 3);
        let script_at = out.find("<script>").unwrap();
        assert!(script_at > out.find("<p>x</p>").unwrap());
        assert!(script_at < out.find("</body>").unwrap());
        assert!(out.contains(r#"var revision = "3";"#));
        assert!(out.contains(REVISION_PATH));
    }

    #[test]
    fn test_inject_uses_last_body_close() {
        let html = "<body><pre class=\"mermaid\"></body></pre></body>";
        let out = inject_live_reload(html, 1);
        assert!(out.ends_with("</script>\n</body>"));
    }

    #[test]
    fn test_inject_without_body_appends() {
        let out = inject_live_reload("<p>fragment</p>", 1);
        assert!(out.starts_with("<p>fragment</p><script>"));
    }

    #[test]
    fn test_serves_latest_document() -> Result<()> {
        let mut surface = HttpSurface::bind("127.0.0.1", 0)?;
        assert_ne!(surface.addr().port(), 0);
        assert_eq!(surface.location(), format!("http://{}/", surface.addr()));
        assert_eq!(surface.revision(), 0);

        surface.show("<html><body><h1>One</h1></body></html>")?;
        surface.show("<html><body><h1>Two</h1></body></html>")?;
        assert_eq!(surface.revision(), 2);

        let (status, body) = get(surface.addr(), "/")?;
        assert_eq!(status, 200);
        assert!(body.contains("<h1>Two</h1>"));
        assert!(!body.contains("<h1>One</h1>"));
        assert!(body.contains(r#"var revision = "2";"#));

        let (status, body) = get(surface.addr(), REVISION_PATH)?;
        assert_eq!(status, 200);
        assert_eq!(body, "2");

        let (status, _) = get(surface.addr(), "/missing")?;
        assert_eq!(status, 404);
        Ok(())
    }

    #[test]
    fn test_query_string_is_ignored_by_routes() -> Result<()> {
        let mut surface = HttpSurface::bind("127.0.0.1", 0)?;
        surface.show("<html><body><p>cached?</p></body></html>")?;

        let (status, body) = get(surface.addr(), "/?x=1")?;
        assert_eq!(status, 200);
        assert!(body.contains("<p>cached?</p>"));

        let (status, body) = get(surface.addr(), &format!("{}?t=123", REVISION_PATH))?;
        assert_eq!(status, 200);
        assert_eq!(body, "1");
        Ok(())
    }

    #[test]
    fn test_bind_preferred_falls_back_when_port_taken() -> Result<()> {
        let first = HttpSurface::bind("127.0.0.1", 0)?;
        let taken = first.addr().port();

        assert!(HttpSurface::bind("127.0.0.1", taken).is_err());
        let second = HttpSurface::bind_preferred("127.0.0.1", taken)?;
        assert_ne!(second.addr().port(), taken);
        assert_ne!(second.addr().port(), 0);
        Ok(())
    }

    #[test]
    fn test_drop_joins_server_thread() -> Result<()> {
        let mut surface = HttpSurface::bind("127.0.0.1", 0)?;
        surface.show("<p>x</p>")?;

        let started = std::time::Instant::now();
        drop(surface);
        assert!(started.elapsed() < Duration::from_secs(2));
        Ok(())
    }
}
