//! Route handlers.
//!
//! - `GET /`         HTML landing page with server time and hostname
//! - `GET /health`   liveness JSON
//! - `GET /api/info` application identity JSON

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct AppInfo {
    pub application: String,
    pub version: String,
    pub hostname: String,
    pub timestamp: String,
    pub environment: String,
}

pub async fn home(State(state): State<AppState>) -> Html<String> {
    let server_time = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    Html(render_home(&state.info.name, &server_time, &hostname()))
}

pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthStatus {
            status: "healthy",
            timestamp: rfc3339_now(),
        }),
    )
}

pub async fn info(State(state): State<AppState>) -> Json<AppInfo> {
    Json(AppInfo {
        application: state.info.name.clone(),
        version: state.info.version.clone(),
        hostname: hostname(),
        timestamp: rfc3339_now(),
        environment: state.info.environment.clone(),
    })
}

/// Render the landing page. Every value is HTML-escaped.
fn render_home(app_name: &str, server_time: &str, hostname: &str) -> String {
    let app_name = escape_html(app_name);
    let server_time = escape_html(server_time);
    let hostname = escape_html(hostname);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>{app_name}</title>
    <style>
        body {{ font-family: Arial, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; }}
        .container {{ text-align: center; }}
        .info {{ background: #f0f0f0; padding: 20px; margin: 20px 0; border-radius: 5px; }}
        .endpoints {{ text-align: left; margin: 20px 0; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>{app_name}</h1>

        <div class="info">
            <h3>Application Info</h3>
            <p><strong>Server Time:</strong> {server_time}</p>
            <p><strong>Hostname:</strong> {hostname}</p>
        </div>

        <div class="endpoints">
            <h3>Available Endpoints:</h3>
            <ul>
                <li><a href="/">GET / - This page</a></li>
                <li><a href="/health">GET /health - Health check</a></li>
                <li><a href="/api/info">GET /api/info - JSON application info</a></li>
            </ul>
        </div>
    </div>
</body>
</html>
"#
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn rfc3339_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Host name from `HOSTNAME`, then the kernel, else "unknown".
pub fn hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty())
        .or_else(|| {
            std::fs::read_to_string("/proc/sys/kernel/hostname")
                .ok()
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppInfoConfig;
    use std::sync::Arc;

    fn state() -> AppState {
        AppState {
            info: Arc::new(AppInfoConfig {
                name: "demo-app".into(),
                version: "1.2.3".into(),
                environment: "test".into(),
            }),
        }
    }

    #[tokio::test]
    async fn info_reports_identity() {
        let Json(body) = info(State(state())).await;
        assert_eq!(body.application, "demo-app");
        assert_eq!(body.version, "1.2.3");
        assert_eq!(body.environment, "test");
        assert!(chrono::DateTime::parse_from_rfc3339(&body.timestamp).is_ok());
    }

    #[tokio::test]
    async fn home_fills_template() {
        let Html(page) = home(State(state())).await;
        assert!(page.contains("<h1>demo-app</h1>"));
        assert!(page.contains("Server Time:</strong> 20"));
        assert!(!page.contains("{hostname}"));
    }

    #[test]
    fn home_escapes_values() {
        let page = render_home("<b>{hostname}</b> & co", "now", "host\"1");
        assert!(page.contains("<h1>&lt;b&gt;{hostname}&lt;/b&gt; &amp; co</h1>"));
        assert!(page.contains("Hostname:</strong> host&quot;1"));
        assert!(!page.contains("<b>"));
    }

    #[test]
    fn hostname_never_empty() {
        assert!(!hostname().is_empty());
    }
}
