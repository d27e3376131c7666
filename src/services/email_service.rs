use serde::Serialize;

use crate::config::Settings;

const SENDGRID_URL: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Debug, Serialize)]
struct SendGridEmail {
    email: String,
}

#[derive(Debug, Serialize)]
struct SendGridPersonalization {
    to: Vec<SendGridEmail>,
}

#[derive(Debug, Serialize)]
struct SendGridContent {
    #[serde(rename = "type")]
    content_type: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct SendGridRequest {
    personalizations: Vec<SendGridPersonalization>,
    from: SendGridEmail,
    subject: String,
    content: Vec<SendGridContent>,
}

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: status {status}, body {body}")]
    Api { status: u16, body: String },
}

/// Sends transactional mail through SendGrid. Without an API key the message
/// is logged instead, which is what local runs and tests rely on.
#[derive(Clone)]
pub struct EmailService {
    api_key: Option<String>,
    from_email: String,
    frontend_url: String,
    client: reqwest::Client,
}

impl EmailService {
    pub fn new(settings: &Settings) -> Self {
        Self {
            api_key: settings.sendgrid_api_key.clone(),
            from_email: settings.from_email.clone(),
            frontend_url: settings.frontend_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/reset-password?token={}", self.frontend_url, token)
    }

    pub async fn send_password_reset(&self, to_email: &str, token: &str) -> Result<(), EmailError> {
        let link = self.reset_link(token);
        let body = format!(
            "Hi there,\n\n\
             You requested a password reset for your TravelMate account.\n\n\
             Open the link below to choose a new password:\n{}\n\n\
             This link expires in 24 hours.\n\n\
             If you didn't request this reset, you can ignore this email.\n\n\
             The TravelMate Team\n",
            link
        );

        self.send_email(to_email, "Password Reset - TravelMate", &body)
            .await
    }

    pub async fn send_email(&self, to_email: &str, subject: &str, content: &str) -> Result<(), EmailError> {
        let Some(api_key) = &self.api_key else {
            log::info!(
                "SENDGRID_API_KEY not set; email to {} not sent. Subject: {}\n{}",
                to_email,
                subject,
                content
            );
            return Ok(());
        };

        let request = SendGridRequest {
            personalizations: vec![SendGridPersonalization {
                to: vec![SendGridEmail {
                    email: to_email.to_string(),
                }],
            }],
            from: SendGridEmail {
                email: self.from_email.clone(),
            },
            subject: subject.to_string(),
            content: vec![SendGridContent {
                content_type: "text/plain".to_string(),
                value: content.to_string(),
            }],
        };

        let response = self
            .client
            .post(SENDGRID_URL)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(EmailError::Api { status, body })
        }
    }
}
