//! Fetch-with-timeout utility shared by every external call.
//!
//! The deadline is enforced here with [`tokio::time::timeout`] rather than
//! trusted to the transport. When it fires, the in-flight transport future is
//! dropped, which aborts the underlying request.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::EngineError;
use crate::http_client::{HttpClient, HttpErrorKind, HttpRequest};

/// Fetches `url` and returns the raw body, failing with `Timeout` when the
/// deadline passes first and `TransportFailure` on any non-success status.
pub async fn fetch_text(
    client: &dyn HttpClient,
    url: &str,
    timeout_ms: u64,
) -> Result<String, EngineError> {
    send(client, HttpRequest::get(url).with_timeout_ms(timeout_ms)).await
}

async fn send(client: &dyn HttpClient, request: HttpRequest) -> Result<String, EngineError> {
    let url = request.url.clone();
    let timeout_ms = request.timeout_ms;
    let deadline = Duration::from_millis(timeout_ms);

    let outcome = tokio::time::timeout(deadline, client.execute(request)).await;
    let response = match outcome {
        Err(_elapsed) => {
            debug!(%url, timeout_ms, "fetch deadline exceeded");
            return Err(EngineError::Timeout { url, timeout_ms });
        }
        Ok(Err(error)) => {
            return Err(match error.kind() {
                HttpErrorKind::Timeout => EngineError::Timeout { url, timeout_ms },
                HttpErrorKind::Transport => EngineError::transport(error.message()),
            })
        }
        Ok(Ok(response)) => response,
    };

    if !response.is_success() {
        return Err(EngineError::transport(format!(
            "'{url}' returned status {}",
            response.status
        )));
    }

    Ok(response.body)
}

/// Fetches `url` and decodes the body into `T`; malformed content is a
/// `TransportFailure`.
pub async fn fetch_json<T: DeserializeOwned>(
    client: &dyn HttpClient,
    url: &str,
    timeout_ms: u64,
) -> Result<T, EngineError> {
    let request = HttpRequest::get(url)
        .with_timeout_ms(timeout_ms)
        .with_header("Accept", "application/json");
    let body = send(client, request).await?;
    serde_json::from_str(&body)
        .map_err(|e| EngineError::transport(format!("malformed JSON from '{url}': {e}")))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::http_client::{HttpError, HttpResponse, StaticHttpClient};

    #[derive(Debug, Deserialize)]
    struct Ping {
        ok: bool,
    }

    #[tokio::test]
    async fn decodes_json_body() {
        let client = StaticHttpClient::new().with_json("/ping", r#"{"ok":true}"#);
        let ping: Ping = fetch_json(&client, "https://x.test/ping", 1_000)
            .await
            .expect("valid json");
        assert!(ping.ok);
    }

    #[tokio::test]
    async fn json_requests_ask_for_json() {
        let client = StaticHttpClient::new().with_json("/ping", r#"{"ok":true}"#);
        let _: Ping = fetch_json(&client, "https://x.test/ping", 1_000)
            .await
            .expect("valid json");
        fetch_text(&client, "https://x.test/ping", 1_000)
            .await
            .expect("plain fetch");

        let requests = client.requests();
        assert_eq!(
            requests[0].headers.get("accept").map(String::as_str),
            Some("application/json")
        );
        assert!(requests[1].headers.is_empty());
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let client = StaticHttpClient::new()
            .with_json("/slow", "{}")
            .with_delay(Duration::from_millis(200));

        let error = fetch_text(&client, "https://x.test/slow", 20)
            .await
            .expect_err("deadline should fire");
        assert!(error.is_timeout());
    }

    #[tokio::test]
    async fn non_success_status_is_transport_failure() {
        let client = StaticHttpClient::new()
            .with_route("/down", HttpResponse::with_status(503, "unavailable"));

        let error = fetch_text(&client, "https://x.test/down", 1_000)
            .await
            .expect_err("503 must fail");
        assert!(matches!(error, EngineError::TransportFailure(ref m) if m.contains("503")));
    }

    #[tokio::test]
    async fn transport_timeout_kind_maps_to_timeout() {
        let client =
            StaticHttpClient::new().with_failure("/t", HttpError::timeout("reqwest timeout"));

        let error = fetch_text(&client, "https://x.test/t", 1_000)
            .await
            .expect_err("must fail");
        assert!(error.is_timeout());
    }

    #[tokio::test]
    async fn malformed_json_is_transport_failure() {
        let client = StaticHttpClient::new().with_json("/bad", "<html>");
        let error = fetch_json::<Ping>(&client, "https://x.test/bad", 1_000)
            .await
            .expect_err("must fail");
        assert!(matches!(error, EngineError::TransportFailure(_)));
    }
}
