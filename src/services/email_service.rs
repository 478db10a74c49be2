use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use std::env;

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Failed to build email message: {0}")]
    MessageBuild(String),
    #[error("Failed to send email: {0}")]
    SendFailed(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Extra details rendered into the verification email.
#[derive(Debug, Clone, PartialEq)]
pub struct MailContext {
    pub user_name: String,
    pub expires_in_minutes: i64,
}

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait EmailService: Send + Sync {
    async fn send_verification_code(
        &self,
        to_email: &str,
        code: &str,
        context: &MailContext,
    ) -> Result<(), EmailError>;
}

pub(crate) fn verification_link(base_url: &str, email: &str, code: &str) -> String {
    format!(
        "{}/api/verify?email={}&certificationNumber={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(email),
        urlencoding::encode(code)
    )
}

pub struct ConsoleEmailService {
    base_url: String,
}

impl ConsoleEmailService {
    pub fn new() -> Self {
        let base_url = env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
        Self { base_url }
    }
}

impl Default for ConsoleEmailService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailService for ConsoleEmailService {
    async fn send_verification_code(
        &self,
        to_email: &str,
        code: &str,
        context: &MailContext,
    ) -> Result<(), EmailError> {
        let link = verification_link(&self.base_url, to_email, code);
        tracing::info!("📧 [CONSOLE EMAIL] Verification code to: {}", to_email);
        tracing::info!("   Subject: Confirm your CareerQuest account");
        tracing::info!("   Name: {}", context.user_name);
        tracing::info!("   Code: {}", code);
        tracing::info!("   Verification link: {}", link);
        tracing::info!("   Expires in: {} minutes", context.expires_in_minutes);
        tracing::info!("   ---");
        Ok(())
    }
}

pub struct SmtpEmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
    from_name: String,
    base_url: String,
}

impl SmtpEmailService {
    pub fn new() -> Result<Self, EmailError> {
        let smtp_host = env::var("SMTP_HOST")
            .map_err(|_| EmailError::ConfigError("SMTP_HOST not set".to_string()))?;
        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse::<u16>()
            .map_err(|_| EmailError::ConfigError("Invalid SMTP_PORT".to_string()))?;
        let smtp_username = env::var("SMTP_USERNAME")
            .map_err(|_| EmailError::ConfigError("SMTP_USERNAME not set".to_string()))?;
        let smtp_password = env::var("SMTP_PASSWORD")
            .map_err(|_| EmailError::ConfigError("SMTP_PASSWORD not set".to_string()))?;
        let from_email = env::var("SMTP_FROM_EMAIL")
            .map_err(|_| EmailError::ConfigError("SMTP_FROM_EMAIL not set".to_string()))?;
        let from_name = env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "CareerQuest".to_string());
        let base_url = env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());

        let encryption = env::var("SMTP_ENCRYPTION").unwrap_or_else(|_| "starttls".to_string());

        let credentials = Credentials::new(smtp_username, smtp_password);

        let mailer = match encryption.to_lowercase().as_str() {
            "tls" => AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp_host)
                .map_err(|e| EmailError::ConfigError(format!("SMTP relay error: {}", e)))?
                .port(smtp_port)
                .credentials(credentials)
                .build(),
            "starttls" => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp_host)
                .map_err(|e| EmailError::ConfigError(format!("SMTP starttls error: {}", e)))?
                .port(smtp_port)
                .credentials(credentials)
                .build(),
            "none" => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp_host)
                .port(smtp_port)
                .credentials(credentials)
                .build(),
            _ => {
                return Err(EmailError::ConfigError(format!(
                    "Invalid SMTP_ENCRYPTION value: {}. Use 'tls', 'starttls', or 'none'",
                    encryption
                )))
            }
        };

        Ok(Self {
            mailer,
            from_email,
            from_name,
            base_url,
        })
    }
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn render_verification_body(link: &str, code: &str, context: &MailContext) -> String {
    format!(
        r#"
<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
</head>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1 style="color: #333;">Welcome to CareerQuest, {name}!</h1>
    <p>Your verification code is:</p>
    <p style="text-align: center; font-size: 28px; letter-spacing: 6px; font-weight: bold;">{code}</p>
    <p style="text-align: center; margin: 30px 0;">
        <a href="{link}" style="background-color: #4CAF50; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px; display: inline-block;">Confirm Email Address</a>
    </p>
    <p style="color: #666; font-size: 14px; word-break: break-all;">{link}</p>
    <p style="color: #999; font-size: 12px; margin-top: 40px;">This code expires in {minutes} minutes. Requesting a new code invalidates this one.</p>
</body>
</html>
"#,
        name = escape_html(&context.user_name),
        code = code,
        link = escape_html(link),
        minutes = context.expires_in_minutes
    )
}

#[async_trait]
impl EmailService for SmtpEmailService {
    async fn send_verification_code(
        &self,
        to_email: &str,
        code: &str,
        context: &MailContext,
    ) -> Result<(), EmailError> {
        let link = verification_link(&self.base_url, to_email, code);
        let html_body = render_verification_body(&link, code, context);

        let email = Message::builder()
            .from(
                format!("{} <{}>", self.from_name, self.from_email)
                    .parse()
                    .map_err(|e| {
                        EmailError::MessageBuild(format!("Invalid from address: {}", e))
                    })?,
            )
            .to(to_email
                .parse()
                .map_err(|e| EmailError::MessageBuild(format!("Invalid to address: {}", e)))?)
            .subject("Confirm your CareerQuest account")
            .header(ContentType::TEXT_HTML)
            .body(html_body)
            .map_err(|e| EmailError::MessageBuild(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| EmailError::SendFailed(e.to_string()))?;

        Ok(())
    }
}

pub fn create_email_service() -> Box<dyn EmailService> {
    if env::var("SMTP_HOST").is_ok() {
        match SmtpEmailService::new() {
            Ok(service) => {
                tracing::info!("Using SMTP email service");
                Box::new(service)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize SMTP email service: {}. Falling back to console service",
                    e
                );
                Box::new(ConsoleEmailService::new())
            }
        }
    } else {
        tracing::info!(
            "SMTP not configured. Using console email service (emails will be logged)"
        );
        Box::new(ConsoleEmailService::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_link_encodes_email() {
        let link = verification_link("http://localhost:8080/", "user+tag@example.com", "012345");
        assert_eq!(
            link,
            "http://localhost:8080/api/verify?email=user%2Btag%40example.com&certificationNumber=012345"
        );
    }

    #[test]
    fn test_body_mentions_code_and_expiry() {
        let context = MailContext {
            user_name: "testName".to_string(),
            expires_in_minutes: 5,
        };
        let body = render_verification_body("http://link", "654321", &context);
        assert!(body.contains("654321"));
        assert!(body.contains("testName"));
        assert!(body.contains("5 minutes"));
    }

    #[test]
    fn test_body_escapes_user_name() {
        let context = MailContext {
            user_name: "<b>Eve</b>".to_string(),
            expires_in_minutes: 5,
        };
        let body = render_verification_body("http://link?a=1&b=2", "654321", &context);
        assert!(body.contains("&lt;b&gt;Eve&lt;/b&gt;"));
        assert!(body.contains("a=1&amp;b=2"));
    }

    #[tokio::test]
    async fn test_console_service_always_delivers() {
        let service = ConsoleEmailService::new();
        let context = MailContext {
            user_name: "testName".to_string(),
            expires_in_minutes: 5,
        };
        let result = service
            .send_verification_code("test@email.com", "123456", &context)
            .await;
        assert!(result.is_ok());
    }
}
