use crate::db::AbstractWithAuthors;
use crate::env::SmtpConfig;
use crate::traits::Linkable;
use crate::error::AppResult;
use crate::{AppState, templates};

pub async fn send_email(
    smtp: &SmtpConfig,
    recipient: &str,
    subject: &str,
    text_body: &str,
    html_body: &str,
) -> AppResult {
    let message = mail_send::mail_builder::MessageBuilder::new()
        .from((smtp.from_name.as_str(), smtp.from_address.as_str()))
        .to(recipient)
        .subject(subject)
        .text_body(text_body)
        .html_body(html_body);

    let mut client = mail_send::SmtpClientBuilder::new(smtp.host.as_str(), smtp.port);
    if let (Some(username), Some(password)) = (&smtp.username, &smtp.password) {
        client = client.credentials((username.as_str(), password.as_str()));
    }
    client.connect().await?.send(message).await?;

    tracing::debug!("Sending email to {recipient}");

    Ok(())
}

/// Emails the reviewer and the contact author about a new abstract. Does
/// nothing unless SMTP and a reviewer address are configured. Failures are
/// logged.
pub async fn notify_abstract_submitted(state: &AppState, submitted: &AbstractWithAuthors) {
    let (Some(smtp), Some(reviewer)) = (&state.config.smtp, &state.config.reviewer_email) else {
        tracing::info!(
            id = submitted.r#abstract.id.0,
            "email is not configured; skipping abstract notification"
        );
        return;
    };

    let subject = format!(
        "Abstract submitted for {}: {}",
        submitted.r#abstract.year,
        crate::util::strip_html(&submitted.r#abstract.title),
    );
    let text_body = format!(
        "{}\n\nAuthors: {}\nPresentation type: {}\nContact: {}\nMeeting: {}\n",
        crate::util::strip_html(&submitted.r#abstract.title),
        submitted.author_names(),
        submitted.r#abstract.presentation_type,
        submitted.r#abstract.contact_email,
        submitted.r#abstract.absolute_url(),
    );
    let html_body = match templates::render_html_string("abstract-email.html", &submitted.to_json())
    {
        Ok(html) => html,
        Err(e) => {
            tracing::error!("error rendering abstract email: {e}");
            return;
        }
    };

    for recipient in [reviewer.as_str(), submitted.r#abstract.contact_email.as_str()] {
        if let Err(e) = send_email(smtp, recipient, &subject, &text_body, &html_body).await {
            tracing::error!(recipient, "error sending abstract email: {}", e.message());
        }
    }
}
