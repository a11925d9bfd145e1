//! Mock service fixtures shared by the HTTP tests.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use {
    hgpost_config::PosterConfig,
    mockito::{Mock, Server},
    secrecy::Secret,
};

pub(crate) const LOGIN_PAGE: &str = r#"<form method="POST" action="/login">
<input type="hidden" name="_token" value="f0rmT0ken">
<input type="email" name="email"><input type="password" name="password">
</form>"#;

pub(crate) fn password() -> Secret<String> {
    Secret::new("pw".into())
}

pub(crate) fn mock_login_page(server: &mut Server) -> Mock {
    server
        .mock("GET", "/login")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_header("set-cookie", "XSRF-TOKEN=pre; Path=/")
        .with_body(LOGIN_PAGE)
        .create()
}

/// Login page plus a successful (302) credential post.
pub(crate) fn mock_login(server: &mut Server) -> (Mock, Mock) {
    let page = mock_login_page(server);
    let submit = server
        .mock("POST", "/login")
        .with_status(302)
        .with_header("location", "/")
        .with_header("set-cookie", "laravel_session=abc123; Path=/; HttpOnly")
        .create();
    (page, submit)
}

pub(crate) fn mock_csrf_page(server: &mut Server, token: &str) -> Mock {
    server
        .mock("GET", "/new")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(format!(
            "<script>window.Laravel = {{csrfToken: '{token}'}};</script>"
        ))
        .create()
}

/// Config pointing at `server` with `main` (active, id 42) and `tech`
/// (inactive).
pub(crate) fn config(server: &Server) -> PosterConfig {
    let raw = serde_json::json!({
        "base_url": server.url(),
        "hg_login": "bot@example.com",
        "hg_password": "pw",
        "retries": 0,
        "issues": [
            {"name": "main", "channel_id": -1001, "discussion_id": -1002, "bot_token": "t", "hg_channel_id": 42},
            {"name": "tech", "channel_id": -1003, "discussion_id": -1004, "bot_token": "t"}
        ]
    });
    serde_json::from_value(raw).unwrap()
}
