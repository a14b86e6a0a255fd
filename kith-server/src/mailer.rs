//! Outgoing invite mail via the SendGrid HTTP API.

use anyhow::{anyhow, Context, Result};
use serde_json::json;

use kith_core::config::MailConfig;

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

static DEFAULT_FROM: &str = "no-reply@kith.local";
static DEFAULT_APP_URL: &str = "http://localhost:5173";

#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    api_key: Option<String>,
    from_address: String,
    app_url: String,
}

impl Mailer {
    pub fn new(config: &MailConfig) -> Self {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("SENDGRID_API_KEY").ok());

        Mailer {
            client: reqwest::Client::new(),
            api_key,
            from_address: config
                .from_address
                .clone()
                .unwrap_or_else(|| DEFAULT_FROM.to_string()),
            app_url: config
                .app_url
                .clone()
                .unwrap_or_else(|| DEFAULT_APP_URL.to_string()),
        }
    }

    /// The link a recipient clicks to accept the invite. `origin`
    /// overrides the configured app URL when the requesting client
    /// knows where it is served from.
    pub fn invite_link(&self, token: &str, origin: Option<&str>) -> String {
        let base = origin.unwrap_or(&self.app_url);
        format!("{}/join-circle?token={}", base.trim_end_matches('/'), token)
    }

    /// Send the invite mail and return the join link it contained.
    pub async fn send_circle_invite(
        &self,
        email: &str,
        circle_name: &str,
        token: &str,
        origin: Option<&str>,
    ) -> Result<String> {
        let link = self.invite_link(token, origin);

        let Some(api_key) = &self.api_key else {
            return Err(anyhow!(
                "Mail relay is not configured (no SendGrid API key)"
            ));
        };

        let response = self
            .client
            .post(SENDGRID_SEND_URL)
            .bearer_auth(api_key)
            .json(&invite_payload(email, circle_name, &link, &self.from_address))
            .send()
            .await
            .context("Failed to reach SendGrid")?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "SendGrid rejected the invite mail ({}): {}",
                status,
                detail
            ));
        }

        tracing::info!(email, circle_name, "invite mail sent");
        Ok(link)
    }
}

fn invite_payload(
    email: &str,
    circle_name: &str,
    link: &str,
    from_address: &str,
) -> serde_json::Value {
    json!({
        "personalizations": [{ "to": [{ "email": email }] }],
        "from": { "email": from_address },
        "subject": format!("Invite to join \u{201c}{}\u{201d} on kith", circle_name),
        "content": [{
            "type": "text/html",
            "value": format!(
                "<p>Hello,</p>\
                 <p>You've been invited to join the circle <strong>{}</strong> on kith.</p>\
                 <p><a href=\"{}\">Click here to accept your invite</a>.</p>\
                 <p>If you didn't expect this, you can ignore this email.</p>",
                circle_name, link
            ),
        }],
    })
}
