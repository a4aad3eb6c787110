use crate::config::DispatchConfig;
use crate::error::DispatchError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use log::{debug, info, warn};
use reqwest::Url;
use reqwest::header::{AUTHORIZATION, CONNECTION, USER_AGENT};

/// Basic-auth credential pair. A lone username or password is rejected
/// rather than silently sending no auth.
#[derive(Debug, Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn from_parts(
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<Option<Self>, DispatchError> {
        match (username, password) {
            (Some(username), Some(password)) => Ok(Some(Self::new(username, password))),
            (None, None) => Ok(None),
            _ => Err(DispatchError::PartialCredentials),
        }
    }

    fn basic_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

/// Sends CWMP Connection Requests, one bounded HTTP GET per call.
pub struct Dispatcher {
    client: reqwest::Client,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(config: DispatchConfig) -> reqwest::Result<Self> {
        // fresh connection per attempt
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .build()?;
        Ok(Self { client, config })
    }

    fn parse_target(raw: &str) -> Result<Url, DispatchError> {
        let url = Url::parse(raw).map_err(|_| DispatchError::InvalidUrl(raw.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(DispatchError::InvalidUrl(raw.to_string()));
        }
        Ok(url)
    }

    /// Exactly one attempt; retrying is the host's decision.
    pub async fn dispatch(
        &self,
        device_id: &str,
        url: &str,
        credentials: Option<&Credentials>,
    ) -> Result<(), DispatchError> {
        let target = Self::parse_target(url)?;

        info!(
            "sending connection request to {} for device {}",
            target, device_id
        );

        let mut request = self
            .client
            .get(target)
            .timeout(self.config.timeout)
            .header(USER_AGENT, self.config.user_agent.as_str())
            .header(CONNECTION, "close");

        if let Some(credentials) = credentials {
            request = request.header(AUTHORIZATION, credentials.basic_header());
        }

        let response = request.send().await.map_err(|err| {
            let err = DispatchError::from(err);
            warn!("connection request failed for device {}: {}", device_id, err);
            err
        })?;

        let status = response.status();
        debug!(
            "connection request response {} for device {}",
            status, device_id
        );

        if status.is_success() {
            Ok(())
        } else {
            Err(DispatchError::BadStatus(status.as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn dispatcher(timeout_ms: u64) -> Dispatcher {
        Dispatcher::new(DispatchConfig {
            timeout: Duration::from_millis(timeout_ms),
            ..DispatchConfig::default()
        })
        .unwrap()
    }

    // One-shot HTTP server; resolves to the raw request bytes it saw.
    async fn serve_once(status_line: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();

            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                if request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                status_line
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();

            String::from_utf8_lossy(&request).to_string()
        });

        (format!("http://{}/", addr), handle)
    }

    #[tokio::test]
    async fn success_on_2xx() {
        let (url, server) = serve_once("200 OK").await;
        dispatcher(5000).dispatch("device-1", &url, None).await.unwrap();
        let request = server.await.unwrap();
        assert!(request.to_lowercase().contains("connection: close"));
    }

    #[tokio::test]
    async fn bad_status_carries_code() {
        let (url, server) = serve_once("404 Not Found").await;
        let err = dispatcher(5000)
            .dispatch("device-1", &url, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::BadStatus(404)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn basic_credentials_on_the_wire() {
        let (url, server) = serve_once("200 OK").await;
        let credentials = Credentials::new("user", "pass");
        dispatcher(5000)
            .dispatch("device-1", &url, Some(&credentials))
            .await
            .unwrap();

        let request = server.await.unwrap();
        assert!(request.to_lowercase().contains("authorization: basic"));
        assert!(request.contains("dXNlcjpwYXNz"));
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let silent = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(stream);
        });

        let err = dispatcher(200)
            .dispatch("device-1", &format!("http://{}/", addr), None)
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        silent.abort();
    }

    #[tokio::test]
    async fn repeated_timeouts_release_connections() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let silent = tokio::spawn(async move {
            let mut held = Vec::new();
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                held.push(stream);
            }
        });

        let dispatcher = dispatcher(100);
        let url = format!("http://{}/", addr);
        for _ in 0..3 {
            let err = dispatcher.dispatch("device-1", &url, None).await.unwrap_err();
            assert!(err.is_timeout());
        }
        silent.abort();
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = dispatcher(5000)
            .dispatch("device-1", &format!("http://{}/", addr), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Transport(_)));
    }

    #[tokio::test]
    async fn bad_url_fails_before_any_io() {
        let err = dispatcher(5000)
            .dispatch("device-1", "not a url", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidUrl(_)));

        let err = dispatcher(5000)
            .dispatch("device-1", "ftp://198.51.100.9/", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidUrl(_)));
    }

    #[test]
    fn credentials_must_come_paired() {
        assert!(Credentials::from_parts(None, None).unwrap().is_none());
        assert!(
            Credentials::from_parts(Some("user"), Some("pass"))
                .unwrap()
                .is_some()
        );
        assert!(matches!(
            Credentials::from_parts(Some("user"), None),
            Err(DispatchError::PartialCredentials)
        ));
        assert!(matches!(
            Credentials::from_parts(None, Some("pass")),
            Err(DispatchError::PartialCredentials)
        ));
    }
}
