//! HTTP client for the grocery backend.

use crate::domain::{BackendError, BackendOutcome, BackendResult, PurchasedItem, User};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Remote operations the client relies on.
///
/// Calls block; presenters run them on a background thread.
pub trait Backend: Send + Sync {
    fn sign_up_user(&self, user: &User) -> BackendOutcome<BackendResult>;

    fn submit_order(&self, items: &[PurchasedItem]) -> BackendOutcome<BackendResult>;

    fn order_history(&self, user_id: &str) -> BackendOutcome<Vec<PurchasedItem>>;
}

/// [`Backend`] speaking JSON over HTTP to `base_url`.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> BackendOutcome<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn read<T: DeserializeOwned>(response: Response) -> BackendOutcome<T> {
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), url = %response.url(), "backend request failed");
            return Err(BackendError::Status(status.as_u16()));
        }
        let body = response.bytes()?;
        serde_json::from_slice(&body).map_err(|e| {
            warn!(error = %e, "backend answered with unreadable body");
            BackendError::Unreadable(e.to_string())
        })
    }
}

impl Backend for HttpBackend {
    fn sign_up_user(&self, user: &User) -> BackendOutcome<BackendResult> {
        debug!(email = %user.email, "signing up user");
        let response = self.client.post(self.url("users")).json(user).send()?;
        Self::read(response)
    }

    fn submit_order(&self, items: &[PurchasedItem]) -> BackendOutcome<BackendResult> {
        debug!(lines = items.len(), "submitting order");
        let response = self.client.post(self.url("orders")).json(items).send()?;
        Self::read(response)
    }

    fn order_history(&self, user_id: &str) -> BackendOutcome<Vec<PurchasedItem>> {
        let response = self
            .client
            .get(self.url("orders"))
            .query(&[("user", user_id)])
            .send()?;
        Self::read(response)
    }
}

/// Single-shot HTTP server on a loopback port, for driving `HttpBackend`.
#[cfg(test)]
pub(crate) mod testing {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Answers the first request with `status_line` and `body`, returning the
    /// base URL to point a client at.
    pub(crate) fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut request_body = vec![0; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let mut stream = reader.into_inner();
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        });
        format!("http://{addr}")
    }
}
