//! Episode audio download.

use crate::error::{ErrorKind, Result};
use bytes::Bytes;
use exn::ResultExt;
use tracing::instrument;

/// Fetch the audio payload at `url` into memory.
///
/// Episode downloads sit behind tracking redirects, so the client must be
/// configured to follow them (reqwest does so out of the box). Any non-2xx
/// answer or transport failure is surfaced; retrying is the caller's call.
#[instrument(skip(client))]
pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<Bytes> {
    let response = client.get(url).send().await.or_raise(|| ErrorKind::Fetch)?;
    let status = response.status();
    if !status.is_success() {
        exn::bail!(ErrorKind::FetchStatus(status.as_u16()));
    }
    response.bytes().await.or_raise(|| ErrorKind::Fetch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_returns_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zs01.mp3"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"payload".to_vec()))
            .mount(&server)
            .await;
        let client = reqwest::Client::new();
        let bytes = fetch(&client, &format!("{}/zs01.mp3", server.uri())).await.unwrap();
        assert_eq!(bytes.as_ref(), b"payload");
    }

    #[tokio::test]
    async fn test_fetch_follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/redirect"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", format!("{}/final.mp3", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/final.mp3"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"redirected".to_vec()))
            .mount(&server)
            .await;
        let client = reqwest::Client::new();
        let bytes = fetch(&client, &format!("{}/redirect", server.uri())).await.unwrap();
        assert_eq!(bytes.as_ref(), b"redirected");
    }

    #[tokio::test]
    async fn test_fetch_surfaces_missing_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.mp3"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let client = reqwest::Client::new();
        let err = fetch(&client, &format!("{}/missing.mp3", server.uri())).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::FetchStatus(404)));
        assert!(err.is_retryable());
    }
}
