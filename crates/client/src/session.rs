//! Authenticated HTTP context: cookie jar plus the current anti-forgery token.

use std::sync::Arc;

use {
    hgpost_config::TransportConfig,
    reqwest::{
        StatusCode, Url,
        blocking::{Client, Response, multipart::Form},
        cookie::{CookieStore, Jar},
    },
    secrecy::{ExposeSecret, Secret},
    serde::Serialize,
    tracing::{debug, info},
};

use crate::{
    error::{Error, Result},
    token::{MarkerExtractor, TokenExtractor},
    transport::{build_http_client, send_with_retries},
};

const LOGIN_PATH: &str = "/login";
const CSRF_PAGE_PATH: &str = "/new";
const CSRF_HEADER: &str = "x-csrf-token";

pub struct Session {
    http: Client,
    jar: Arc<Jar>,
    base: Url,
    transport: TransportConfig,
    login_extractor: Box<dyn TokenExtractor>,
    csrf_extractor: Box<dyn TokenExtractor>,
    csrf_token: Option<String>,
    authenticated: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base", &self.base.as_str())
            .field("authenticated", &self.authenticated)
            .field("csrf_token", &self.csrf_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Session {
    /// Create an unauthenticated session against `base_url`.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| Error::invalid_config(format!("base_url {base_url:?}: {e}")))?;
        if base.path() != "/" {
            return Err(Error::invalid_config(format!(
                "base_url {base_url:?} must not have a path; service paths are rooted at the host"
            )));
        }
        let jar = Arc::new(Jar::default());
        let http = build_http_client(transport, Arc::clone(&jar))?;
        Ok(Self {
            http,
            jar,
            base,
            transport: transport.clone(),
            login_extractor: Box::new(MarkerExtractor::login_form()),
            csrf_extractor: Box::new(MarkerExtractor::inline_script()),
            csrf_token: None,
            authenticated: false,
        })
    }

    /// Replace the token scraping strategies (login form, authenticated page).
    #[must_use]
    pub fn with_extractors(
        mut self,
        login: impl TokenExtractor + 'static,
        csrf: impl TokenExtractor + 'static,
    ) -> Self {
        self.login_extractor = Box::new(login);
        self.csrf_extractor = Box::new(csrf);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Token from the last [`Session::refresh`], if any.
    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    /// `Cookie` header value the session would send to the service.
    pub fn cookie_header(&self) -> Option<String> {
        self.jar
            .cookies(&self.base)
            .and_then(|v| v.to_str().ok().map(str::to_owned))
    }

    /// Log in with the site's form flow.
    ///
    /// Starts from an empty cookie jar, scrapes the `_token` field from the
    /// login page and posts the credentials. Only a 302 counts as success.
    pub fn login(&mut self, email: &str, password: &Secret<String>) -> Result<()> {
        self.jar = Arc::new(Jar::default());
        self.http = build_http_client(&self.transport, Arc::clone(&self.jar))?;
        self.authenticated = false;
        self.csrf_token = None;

        let login_url = self.url(LOGIN_PATH)?;
        let page = self.fetch_page(&login_url, "login page")?;
        let form_token = self
            .login_extractor
            .extract(&page)
            .ok_or_else(|| Error::token_not_found("login page"))?;

        let form = [
            ("email", email),
            ("password", password.expose_secret().as_str()),
            ("_token", form_token.as_str()),
        ];
        let response = send_with_retries(self.transport.retries, "login", || {
            Ok(self.http.post(login_url.clone()).form(&form))
        })?;

        let status = response.status();
        if status != StatusCode::FOUND {
            return Err(Error::Authentication {
                status: status.as_u16(),
            });
        }

        self.authenticated = true;
        debug!(email, "login accepted");
        info!(base = %self.base, "logged in");
        Ok(())
    }

    /// Scrape a fresh anti-forgery token from an authenticated page.
    pub fn fetch_csrf_token(&self) -> Result<String> {
        let url = self.url(CSRF_PAGE_PATH)?;
        let page = self.fetch_page(&url, "csrf page")?;
        self.csrf_extractor
            .extract(&page)
            .ok_or_else(|| Error::token_not_found(CSRF_PAGE_PATH))
    }

    /// Fetch a new token and keep it as the current one.
    ///
    /// Tokens are short-lived; call this before every state-changing request.
    pub fn refresh(&mut self) -> Result<&str> {
        let token = self.fetch_csrf_token()?;
        debug!("refreshed csrf token");
        Ok(self.csrf_token.insert(token).as_str())
    }

    /// GET an absolute URL (image sources live outside the service).
    pub fn get(&self, url: &str) -> Result<Response> {
        send_with_retries(self.transport.retries, "download", || Ok(self.http.get(url)))
    }

    /// POST a JSON body to a service path with the given csrf token.
    pub fn post_json<T: Serialize>(&self, path: &str, token: &str, body: &T) -> Result<Response> {
        let url = self.url(path)?;
        send_with_retries(self.transport.retries, path, || {
            Ok(self
                .http
                .post(url.clone())
                .header(CSRF_HEADER, token)
                .json(body))
        })
    }

    /// POST a multipart form to a service path with the given csrf token.
    ///
    /// `form` is called once per attempt since a form is consumed on send.
    pub fn post_multipart(
        &self,
        path: &str,
        token: &str,
        form: impl Fn() -> std::io::Result<Form>,
    ) -> Result<Response> {
        let url = self.url(path)?;
        send_with_retries(self.transport.retries, path, || {
            let form = form().map_err(|e| Error::external("failed to build multipart form", e))?;
            Ok(self
                .http
                .post(url.clone())
                .header(CSRF_HEADER, token)
                .multipart(form))
        })
    }

    fn fetch_page(&self, url: &Url, what: &str) -> Result<String> {
        let response =
            send_with_retries(self.transport.retries, what, || Ok(self.http.get(url.clone())))?;
        debug!(url = %url, status = response.status().as_u16(), "fetched {what}");
        response
            .text()
            .map_err(|e| Error::http(format!("failed to read {what}"), e))
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::invalid_config(format!("cannot join {path} onto {}: {e}", self.base)))
    }
}
