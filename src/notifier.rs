//! Outbound WhatsApp template messages.

use async_trait::async_trait;
use log::debug;
use serde::Serialize;

use crate::config::NotifierConfig;
use crate::error::NotifierError;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// False when no auth token is configured; callers skip sending entirely.
    fn is_configured(&self) -> bool;

    /// Sends one template message to an already normalized phone number.
    async fn send_template(
        &self,
        phone: &str,
        template: &str,
        params: &[String],
    ) -> Result<(), NotifierError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendTemplateBody<'a> {
    phone: &'a str,
    template_name: &'a str,
    origin_website: &'a str,
    body_params: &'a [String],
}

pub struct HttpNotifier {
    config: NotifierConfig,
    http_client: reqwest::Client,
}

impl HttpNotifier {
    /// Fails when the HTTP client cannot be built (e.g. no TLS backend).
    pub fn new(config: NotifierConfig) -> Result<Self, NotifierError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(HttpNotifier {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    fn is_configured(&self) -> bool {
        self.config.auth_token.is_some()
    }

    async fn send_template(
        &self,
        phone: &str,
        template: &str,
        params: &[String],
    ) -> Result<(), NotifierError> {
        let token = self
            .config
            .auth_token
            .as_deref()
            .ok_or(NotifierError::NotConfigured)?;
        if phone.is_empty() {
            return Err(NotifierError::InvalidPhone(phone.to_string()));
        }

        let body = SendTemplateBody {
            phone,
            template_name: template,
            origin_website: &self.config.origin_website,
            body_params: params,
        };
        debug!("Sending template {} to {}", template, phone);
        let response = self
            .http_client
            .post(&self.config.api_url)
            .bearer_auth(token)
            .header("X-Origin-Website", &self.config.origin_website)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer, token: Option<&str>) -> NotifierConfig {
        NotifierConfig {
            api_url: format!("{}/apis/template/sendTemplate", server.uri()),
            origin_website: "https://example.org/".into(),
            auth_token: token.map(str::to_string),
            ..NotifierConfig::default()
        }
    }

    #[tokio::test]
    async fn posts_template_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/apis/template/sendTemplate"))
            .and(header("Authorization", "Bearer tok"))
            .and(header("X-Origin-Website", "https://example.org/"))
            .and(body_json(serde_json::json!({
                "phone": "919876543210",
                "templateName": "daily_tasks_reminder",
                "originWebsite": "https://example.org/",
                "bodyParams": ["2024-03-10", "Report (Due: 2024-03-10, high)"],
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = HttpNotifier::new(config(&server, Some("tok"))).unwrap();
        notifier
            .send_template(
                "919876543210",
                "daily_tasks_reminder",
                &["2024-03-10".into(), "Report (Due: 2024-03-10, high)".into()],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn non_success_surfaces_response_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("template not approved"))
            .mount(&server)
            .await;

        let notifier = HttpNotifier::new(config(&server, Some("tok"))).unwrap();
        let err = notifier
            .send_template("919876543210", "task_assigned", &[])
            .await
            .unwrap_err();
        match err {
            NotifierError::Rejected { status, body } => {
                assert_eq!(status, 422);
                assert_eq!(body, "template not approved");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn refuses_without_token_or_phone() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let unconfigured = HttpNotifier::new(config(&server, None)).unwrap();
        assert!(!unconfigured.is_configured());
        assert!(matches!(
            unconfigured.send_template("919876543210", "t", &[]).await,
            Err(NotifierError::NotConfigured)
        ));

        let configured = HttpNotifier::new(config(&server, Some("tok"))).unwrap();
        assert!(matches!(
            configured.send_template("", "t", &[]).await,
            Err(NotifierError::InvalidPhone(_))
        ));
    }

    #[tokio::test]
    async fn slow_endpoint_hits_request_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let notifier = HttpNotifier::new(NotifierConfig {
            request_timeout: Duration::from_millis(200),
            ..config(&server, Some("tok"))
        })
        .unwrap();
        let err = notifier
            .send_template("919876543210", "task_assigned", &[])
            .await
            .unwrap_err();
        match err {
            NotifierError::Transport(e) => assert!(e.is_timeout()),
            other => panic!("unexpected error: {other}"),
        }
    }
}
