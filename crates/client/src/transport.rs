//! Blocking HTTP transport built from [`TransportConfig`].

use std::sync::Arc;

use {
    hgpost_config::TransportConfig,
    reqwest::{
        blocking::{Client, RequestBuilder, Response},
        cookie::Jar,
        redirect::Policy,
    },
    tracing::warn,
};

use crate::error::{Error, Result};

const USER_AGENT: &str = concat!("hgpost/", env!("CARGO_PKG_VERSION"));

/// Build a client that stores cookies in `jar` and never follows redirects
/// (the login endpoint signals success with a 302).
pub(crate) fn build_http_client(config: &TransportConfig, jar: Arc<Jar>) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .cookie_provider(jar)
        .redirect(Policy::none())
        .connect_timeout(config.connect_timeout())
        .timeout(config.request_timeout())
        .pool_idle_timeout(config.pool_idle_timeout())
        .pool_max_idle_per_host(config.connection_pool_size)
        .build()
        .map_err(|e| Error::http("failed to build HTTP client", e))
}

/// Send the request built by `request`, rebuilding and resending it up to
/// `retries` extra times when the connection could not be established.
///
/// Responses are returned whatever their status; timeouts and other
/// transport failures are not retried.
pub(crate) fn send_with_retries(
    retries: u32,
    what: &str,
    mut request: impl FnMut() -> Result<RequestBuilder>,
) -> Result<Response> {
    let mut failures = 0;
    loop {
        match request()?.send() {
            Ok(response) => return Ok(response),
            Err(e) if e.is_connect() && failures < retries => {
                failures += 1;
                warn!(request = what, attempt = failures, error = %e, "connection failed, retrying");
            },
            Err(e) => return Err(Error::http(format!("{what} request failed"), e)),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, std::net::TcpListener};

    fn closed_port_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{port}/")
    }

    fn fast_transport() -> TransportConfig {
        TransportConfig {
            connect_timeout: 1.0,
            read_timeout: 1.0,
            write_timeout: 1.0,
            ..TransportConfig::default()
        }
    }

    #[test]
    fn connection_failures_are_retried() {
        let client = build_http_client(&fast_transport(), Arc::new(Jar::default())).unwrap();
        let url = closed_port_url();
        let mut calls = 0;

        let result = send_with_retries(2, "probe", || {
            calls += 1;
            Ok(client.get(&url))
        });

        assert!(matches!(result, Err(Error::Http { .. })));
        assert_eq!(calls, 3);
    }

    #[test]
    fn zero_retries_means_one_attempt() {
        let client = build_http_client(&fast_transport(), Arc::new(Jar::default())).unwrap();
        let url = closed_port_url();
        let mut calls = 0;

        let _ = send_with_retries(0, "probe", || {
            calls += 1;
            Ok(client.get(&url))
        });

        assert_eq!(calls, 1);
    }

    #[test]
    fn error_statuses_are_not_retried() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/")
            .with_status(503)
            .expect(1)
            .create();

        let client = build_http_client(&fast_transport(), Arc::new(Jar::default())).unwrap();
        let url = server.url();
        let response = send_with_retries(5, "probe", || Ok(client.get(&url))).unwrap();

        assert_eq!(response.status().as_u16(), 503);
        mock.assert();
    }

    #[test]
    fn redirects_are_not_followed() {
        let mut server = mockito::Server::new();
        let _redirect = server
            .mock("GET", "/")
            .with_status(302)
            .with_header("location", "/elsewhere")
            .create();
        let target = server.mock("GET", "/elsewhere").expect(0).create();

        let client = build_http_client(&fast_transport(), Arc::new(Jar::default())).unwrap();
        let response = client.get(server.url()).send().unwrap();

        assert_eq!(response.status().as_u16(), 302);
        target.assert();
    }
}
