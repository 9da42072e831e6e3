//! End-to-end tests of the CAS login flow and the gated proxy.

use reqwest::header::{COOKIE, LOCATION, SET_COOKIE};
use reqwest::StatusCode;

mod common;

fn location(res: &reqwest::Response) -> String {
    res.headers().get(LOCATION).unwrap().to_str().unwrap().to_string()
}

fn set_cookies(res: &reqwest::Response) -> Vec<String> {
    res.headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// `name=value` pairs of the Set-Cookie headers, ready for a Cookie header.
fn cookie_header(set_cookies: &[String]) -> String {
    set_cookies
        .iter()
        .filter_map(|c| c.split(';').next())
        .collect::<Vec<_>>()
        .join("; ")
}

#[tokio::test]
async fn test_protected_without_cookie_redirects_to_login() {
    let (upstream, seen) = common::start_echo_upstream().await;
    let (proxy, shutdown) = common::start_proxy(common::config_for(upstream)).await;

    let res = common::client()
        .get(format!("http://{}/protected", proxy))
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/login");
    assert_eq!(seen.count(), 0, "Unauthenticated request must not reach upstream");

    shutdown.trigger();
}

#[tokio::test]
async fn test_login_redirects_to_cas() {
    let (upstream, _) = common::start_echo_upstream().await;
    let (proxy, shutdown) = common::start_proxy(common::config_for(upstream)).await;

    let res = common::client()
        .get(format!("http://{}/login", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "https://cas.example.com/login?service=%2Flogin");
    assert!(set_cookies(&res).is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_ticket_accepted_issues_session() {
    let (upstream, _) = common::start_echo_upstream().await;
    let (cas, cas_seen) = common::start_mock_cas("yes\nalice\n").await;
    let mut config = common::config_for(upstream);
    config.cas.base_url = format!("http://{}", cas);
    let (proxy, shutdown) = common::start_proxy(config).await;

    let res = common::client()
        .get(format!("http://{}/login?ticket=T123", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/");

    let cookies = set_cookies(&res);
    let session = cookies
        .iter()
        .find(|c| c.starts_with("session="))
        .expect("session cookie set");
    assert!(session.starts_with("session=YWxpY2U=;"), "got {}", session);
    assert!(session.contains("Expires="));

    assert_eq!(cas_seen.count(), 1);
    let validate = cas_seen.last().unwrap();
    assert!(
        validate.starts_with("GET /validate?service=%2Flogin&ticket=T123 "),
        "got {}",
        validate
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_ticket_rejected_redirects_to_logout() {
    let (upstream, _) = common::start_echo_upstream().await;
    let (cas, _) = common::start_mock_cas("no\n").await;
    let mut config = common::config_for(upstream);
    config.cas.base_url = format!("http://{}", cas);
    let (proxy, shutdown) = common::start_proxy(config).await;

    let res = common::client()
        .get(format!("http://{}/login?ticket=T123", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/logout");
    assert!(set_cookies(&res).is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_cas_unreachable_shows_error() {
    let (upstream, _) = common::start_echo_upstream().await;
    let mut config = common::config_for(upstream);
    config.cas.base_url = format!("http://{}", common::dead_addr().await);
    let (proxy, shutdown) = common::start_proxy(config).await;

    let res = common::client()
        .get(format!("http://{}/login?ticket=T123", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert!(res.headers().get(LOCATION).is_none());
    assert!(set_cookies(&res).is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_logout_clears_session() {
    let (upstream, _) = common::start_echo_upstream().await;
    let (proxy, shutdown) = common::start_proxy(common::config_for(upstream)).await;

    let res = common::client()
        .get(format!("http://{}/logout", proxy))
        .header(COOKIE, "session=YWxpY2U=")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "https://cas.example.com/logout");

    let cookies = set_cookies(&res);
    let session = cookies.iter().find(|c| c.starts_with("session=;")).unwrap();
    assert!(session.contains("Max-Age=0"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_valid_session_is_forwarded_verbatim() {
    let (upstream, seen) = common::start_echo_upstream().await;
    let (proxy, shutdown) = common::start_proxy(common::config_for(upstream)).await;

    let res = common::client()
        .post(format!("http://{}/anything?q=1", proxy))
        .header(COOKIE, "session=YWxpY2U=")
        .header("x-custom", "42")
        .body("payload")
        .send()
        .await
        .unwrap();

    // Upstream status, headers and body come back untouched
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers().get("x-upstream").unwrap(), "echo");
    let echoed = res.text().await.unwrap();

    assert_eq!(seen.count(), 1);
    assert!(echoed.starts_with("POST /anything?q=1 HTTP/1.1\r\n"), "got {}", echoed);
    let lower = echoed.to_ascii_lowercase();
    assert!(lower.contains("\r\nx-custom: 42\r\n"));
    assert!(lower.contains("\r\ncookie: session=ywxpy2u=\r\n"));
    assert!(lower.contains(&format!("\r\nhost: {}\r\n", proxy)));
    assert!(lower.contains("\r\nx-forwarded-for: 127.0.0.1\r\n"));
    assert!(lower.contains("\r\nx-request-id: "));
    assert!(echoed.ends_with("\r\n\r\npayload"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_full_login_then_browse() {
    let (upstream, seen) = common::start_echo_upstream().await;
    let (cas, _) = common::start_mock_cas("yes\nbob\n").await;
    let mut config = common::config_for(upstream);
    config.cas.base_url = format!("http://{}", cas);
    config.session.identity_header = Some("X-Remote-User".to_string());
    let (proxy, shutdown) = common::start_proxy(config).await;
    let client = common::client();

    let login = client
        .get(format!("http://{}/login?ticket=ST-9", proxy))
        .send()
        .await
        .unwrap();
    let cookies = cookie_header(&set_cookies(&login));

    let res = client
        .get(format!("http://{}/reports", proxy))
        .header(COOKIE, cookies)
        .header("X-Remote-User", "mallory")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    let echoed = res.text().await.unwrap().to_ascii_lowercase();
    assert!(echoed.contains("\r\nx-remote-user: bob\r\n"));
    assert!(!echoed.contains("mallory"));
    assert_eq!(seen.count(), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_expired_session_redirects() {
    let (upstream, seen) = common::start_echo_upstream().await;
    let (proxy, shutdown) = common::start_proxy(common::config_for(upstream)).await;

    let res = common::client()
        .get(format!("http://{}/anything", proxy))
        .header(COOKIE, "session=YWxpY2U=; session_expires=1000")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/login");
    assert_eq!(seen.count(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_malformed_cookie_redirects() {
    let (upstream, seen) = common::start_echo_upstream().await;
    let (proxy, shutdown) = common::start_proxy(common::config_for(upstream)).await;

    let res = common::client()
        .get(format!("http://{}/anything", proxy))
        .header(COOKIE, "session=not*base64")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/login");
    assert_eq!(seen.count(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_down_is_bad_gateway() {
    let upstream = common::dead_addr().await;
    let (proxy, shutdown) = common::start_proxy(common::config_for(upstream)).await;

    let res = common::client()
        .get(format!("http://{}/anything", proxy))
        .header(COOKIE, "session=YWxpY2U=")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    shutdown.trigger();
}

#[tokio::test]
async fn test_slow_upstream_is_gateway_timeout() {
    let upstream = common::start_stalled_upstream().await;
    let mut config = common::config_for(upstream);
    config.timeouts.request_secs = 1;
    let (proxy, shutdown) = common::start_proxy(config).await;

    let res = common::client()
        .get(format!("http://{}/slow", proxy))
        .header(COOKIE, "session=YWxpY2U=")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);

    shutdown.trigger();
}

#[tokio::test]
async fn test_legacy_mode_forwards_unauthenticated() {
    let (upstream, seen) = common::start_echo_upstream().await;
    let mut config = common::config_for(upstream);
    config.session.forward_unauthenticated = true;
    let (proxy, shutdown) = common::start_proxy(config).await;

    let res = common::client()
        .get(format!("http://{}/public", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(seen.count(), 1);

    shutdown.trigger();
}
