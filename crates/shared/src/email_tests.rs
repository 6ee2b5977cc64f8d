use super::*;
use crate::config::EmailConfig;
use serde_json::json;

fn service() -> EmailService {
    EmailService::new(EmailConfig::default())
}

#[tokio::test]
async fn test_create_transport() {
    let config = EmailConfig {
        smtp_host: "localhost".to_string(),
        smtp_port: 1025,
        smtp_username: "user".to_string(),
        smtp_password: "password".to_string(),
        from_email: "test@example.com".to_string(),
        from_name: "Test".to_string(),
        app_url: "http://localhost:3000".to_string(),
    };

    let service = EmailService::new(config);
    assert!(service.create_transport().is_ok());
}

#[test]
fn test_render_single_reminder() {
    let request = EmailRequest {
        recipient: "user@example.com".to_string(),
        template_key: TEMPLATE_RENEWAL_REMINDER.to_string(),
        data: json!({
            "items": [
                {"name": "Netflix", "amount": "15.99", "currency": "USD", "nextBillingDate": "2026-01-03"}
            ]
        }),
    };

    let (subject, body) = service().render(&request).unwrap();
    assert_eq!(subject, "Netflix renews soon");
    assert!(body.contains("- Netflix: 15.99 USD on 2026-01-03"));
    assert!(body.contains("http://localhost:3000/subscriptions"));
}

#[test]
fn test_render_digest_counts_items() {
    let request = EmailRequest {
        recipient: "user@example.com".to_string(),
        template_key: TEMPLATE_RENEWAL_DIGEST.to_string(),
        data: json!({
            "items": [
                {"name": "Netflix", "amount": "15.99", "currency": "USD", "nextBillingDate": "2026-01-03"},
                {"name": "Spotify", "amount": "9.99", "currency": "USD", "nextBillingDate": "2026-01-04"}
            ]
        }),
    };

    let (subject, body) = service().render(&request).unwrap();
    assert_eq!(subject, "2 subscriptions renew soon");
    assert!(body.contains("Spotify"));
}

#[test]
fn test_render_unknown_template() {
    let request = EmailRequest {
        recipient: "user@example.com".to_string(),
        template_key: "welcome".to_string(),
        data: json!({}),
    };

    assert!(matches!(
        service().render(&request),
        Err(EmailError::UnknownTemplate(_))
    ));
}

#[test]
fn test_email_error_display_and_transience() {
    assert_eq!(
        format!("{}", EmailError::BuildError("msg".into())),
        "Failed to build email: msg"
    );
    assert_eq!(
        format!("{}", EmailError::SendError("msg".into())),
        "Failed to send email: msg"
    );
    assert!(EmailError::SendError("timeout".into()).is_transient());
    assert!(!EmailError::InvalidAddress("x".into()).is_transient());
}
