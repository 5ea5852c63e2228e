//! HTTP layer: outbound request assembly and status mapping.
//!
//! This is the ONLY place for status code handling. The loader never
//! interprets status codes.

use reqwest::header::{HeaderName, HeaderValue, IF_NONE_MATCH};
use tracing::debug;

use crate::error::{CacheError, CacheResult};
use crate::types::{Request, ResponseInfo};

/// Outcome of one conditional GET.
#[derive(Debug)]
pub(crate) enum FetchOutcome {
    /// 304: the local copy is current.
    NotModified(ResponseInfo),
    /// Any other status in `[200, 400)`, with the full body.
    Fetched { response: ResponseInfo, body: Vec<u8> },
}

/// Issue a GET for `request`, conditional on `etag` when given.
pub(crate) async fn fetch(
    client: &reqwest::Client,
    request: &Request,
    etag: Option<&str>,
) -> CacheResult<FetchOutcome> {
    let mut builder = client.get(request.url());

    for (name, value) in request.headers() {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| CacheError::Config {
                message: format!("invalid header name {}: {}", name, e),
            })?;
        let header_value =
            HeaderValue::from_str(&value.to_lowercase()).map_err(|e| CacheError::Config {
                message: format!("invalid value for header {}: {}", name, e),
            })?;
        builder = builder.header(header_name, header_value);
    }

    // ETag only; If-Modified-Since is never sent.
    if let Some(etag) = etag {
        builder = builder.header(IF_NONE_MATCH, etag);
    }

    debug!(url = request.url(), etag = ?etag, "sending request");
    let response = builder.send().await?;
    let info = ResponseInfo::from_response(&response);
    debug!(url = request.url(), status = info.status, "received response");

    match info.status {
        status if !(200..400).contains(&status) => Err(CacheError::UnexpectedStatus {
            status,
            url: request.url().to_string(),
        }),
        304 => Ok(FetchOutcome::NotModified(info)),
        _ => {
            let body = response.bytes().await.map_err(|e| CacheError::Network {
                message: format!("failed to read response body: {}", e),
            })?;
            Ok(FetchOutcome::Fetched {
                response: info,
                body: body.to_vec(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request_for(server: &MockServer, route: &str) -> Request {
        Request::builder(format!("{}{}", server.uri(), route), "k")
            .header("X-Client", "Stash")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn fetched_with_lowercased_header_values() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a"))
            .and(header("x-client", "stash"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("hello")
                    .insert_header("ETag", "\"v1\""),
            )
            .expect(1)
            .mount(&server)
            .await;

        let outcome = fetch(&reqwest::Client::new(), &request_for(&server, "/a"), None)
            .await
            .unwrap();
        match outcome {
            FetchOutcome::Fetched { response, body } => {
                assert_eq!(response.status, 200);
                assert_eq!(response.etag(), Some("\"v1\""));
                assert_eq!(body, b"hello");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn not_modified_on_matching_etag() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a"))
            .and(header("if-none-match", "\"v1\""))
            .respond_with(ResponseTemplate::new(304).insert_header("etag", "\"v1\""))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = fetch(
            &reqwest::Client::new(),
            &request_for(&server, "/a"),
            Some("\"v1\""),
        )
        .await
        .unwrap();
        assert!(matches!(outcome, FetchOutcome::NotModified(ref r) if r.status == 304));
    }

    #[tokio::test]
    async fn error_statuses_are_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        for (route, code) in [("/missing", 404), ("/broken", 503)] {
            let err = fetch(&client, &request_for(&server, route), None)
                .await
                .unwrap_err();
            assert!(
                matches!(err, CacheError::UnexpectedStatus { status, .. } if status == code),
                "{route}: {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn invalid_header_name_is_config_error() {
        let server = MockServer::start().await;
        let request = Request::builder(format!("{}/a", server.uri()), "k")
            .header("bad header", "x")
            .build()
            .unwrap();
        let err = fetch(&reqwest::Client::new(), &request, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::Config { .. }));
    }
}
