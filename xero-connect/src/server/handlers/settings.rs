use axum::{
    extract::{OriginalUri, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use url::{Position, Url};

use crate::common::ConnectionStatus;
use crate::flow::{
    strip_callback_params, strip_params, Activation, Indicator, Notification, Notifier,
};
use crate::server::{error::ServerError, models::ConsentErrorParams, AppState};

/// Parameters the consent screen appends when the user does not grant access
const CONSENT_ERROR_PARAMS: [&str; 3] = ["error", "error_description", "state"];

const SETTINGS_HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Xero Settings</title>
    <style>
        body {
            margin: 0;
            padding: 0;
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
            background: #F3F4F6;
            display: flex;
            justify-content: center;
            align-items: center;
            min-height: 100vh;
        }
        .container {
            background: white;
            border-radius: 12px;
            padding: 48px;
            box-shadow: 0 8px 32px rgba(0, 0, 0, 0.1);
            max-width: 480px;
            width: 100%;
        }
        h1 {
            color: #1F2937;
            margin: 0 0 24px 0;
            font-size: 24px;
            font-weight: 600;
        }
        .status {
            display: inline-block;
            border-radius: 999px;
            padding: 4px 12px;
            font-size: 14px;
            font-weight: 600;
        }
        .status.connected { background: #D1FAE5; color: #065F46; }
        .status.disconnected { background: #FEE2E2; color: #991B1B; }
        dl { color: #6B7280; line-height: 1.5; }
        dt { font-weight: 600; color: #1F2937; }
        .notification {
            border-radius: 8px;
            padding: 12px 16px;
            margin-bottom: 12px;
            font-size: 14px;
        }
        .notification.green { background: #D1FAE5; color: #065F46; }
        .notification.red { background: #FEE2E2; color: #991B1B; }
        .notification.blue { background: #DBEAFE; color: #1E40AF; }
        button {
            background: #13B5EA;
            color: white;
            border: 0;
            border-radius: 8px;
            padding: 12px 24px;
            font-size: 16px;
            cursor: pointer;
        }
    </style>
</head>
<body>
    <div class="container">
        <h1>Xero Settings</h1>
        {NOTIFICATIONS}
        <span class="status {STATUS_CLASS}">{STATUS}</span>
        <dl>
            <dt>Organisation</dt>
            <dd>{TENANT}</dd>
            <dt>Token expires</dt>
            <dd>{EXPIRES}</dd>
        </dl>
        <button id="authorize">Authorize</button>
    </div>
    <script>
        document.getElementById("authorize").addEventListener("click", async () => {
            const response = await fetch("/settings/authorize", { method: "POST" });
            const body = await response.json();
            if (response.ok) {
                window.open(body.authorization_url, "_blank", body.window_features);
            }
            window.location.reload();
        });
    </script>
</body>
</html>"#;

/// The hosting view. Every load is a view activation for the coordinator.
pub async fn settings_view(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<ConsentErrorParams>,
) -> Result<Response, ServerError> {
    let address = state
        .public_url
        .join(&uri.to_string())
        .map_err(|e| ServerError::BadRequest(format!("Invalid view address: {}", e)))?;

    if let Some(message) = params.message() {
        tracing::warn!(error = ?params.error, "Consent screen returned an error");
        state.notifications.notify(Notification::failure(message));
        return Ok(redirect(&strip_params(&address, &CONSENT_ERROR_PARAMS)));
    }

    match state.coordinator.on_view_activated(&address).await {
        Activation::Completed(completion) => Ok(redirect(&completion.address)),
        Activation::AlreadyProcessed => Ok(redirect(&strip_callback_params(&address))),
        Activation::Idle | Activation::Busy => {
            let status = state.coordinator.connection_status().await?;
            let notifications = state.notifications.drain();
            Ok(Html(render_settings(&status, &notifications)).into_response())
        }
    }
}

/// Redirect within this origin, keeping only path and query
fn redirect(address: &Url) -> Response {
    Redirect::to(&address[Position::BeforePath..]).into_response()
}

fn render_settings(status: &ConnectionStatus, notifications: &[Notification]) -> String {
    let notifications: String = notifications
        .iter()
        .map(|n| {
            let class = match n.indicator {
                Indicator::Green => "green",
                Indicator::Red => "red",
                Indicator::Blue => "blue",
            };
            format!(
                r#"<div class="notification {}">{}</div>"#,
                class,
                escape_html(&n.message)
            )
        })
        .collect();

    SETTINGS_HTML_TEMPLATE
        .replace("{NOTIFICATIONS}", &notifications)
        .replace(
            "{STATUS_CLASS}",
            if status.connected {
                "connected"
            } else {
                "disconnected"
            },
        )
        .replace("{STATUS}", &escape_html(&status.label))
        .replace(
            "{TENANT}",
            &escape_html(status.tenant_name.as_deref().unwrap_or("-")),
        )
        .replace(
            "{EXPIRES}",
            &status
                .expires_at
                .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "-".to_string()),
        )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
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
