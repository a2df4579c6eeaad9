use actix_web::{HttpResponse, web};
use anyhow::Context;

use crate::{
    domain::SubscriberEmail,
    email_client::{EmailClient, SendEmailError},
    notion_client::{NotionClient, subscription_properties},
};

use super::{
    errors::SubscribeError,
    helpers::{get_welcome_email_html, get_welcome_email_subject},
    types::{NotificationOutcome, SubscribeResponse},
};

#[tracing::instrument(
    name = "Recording a new subscriber.",
    skip(body, notion_client, email_client),
    fields(subscriber_email = tracing::field::Empty)
)]
pub async fn subscribe(
    body: web::Bytes,
    notion_client: web::Data<Option<NotionClient>>,
    email_client: web::Data<Option<EmailClient>>,
) -> Result<HttpResponse, SubscribeError> {
    let body: serde_json::Value =
        serde_json::from_slice(&body).context("Failed to parse the request body as JSON.")?;

    let email = body
        .get("email")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| {
            SubscribeError::ValidationError("The email field is missing or not a string.".into())
        })?;

    let subscriber =
        SubscriberEmail::parse(email.to_string()).map_err(SubscribeError::ValidationError)?;
    tracing::Span::current().record(
        "subscriber_email",
        tracing::field::display(subscriber.as_ref()),
    );

    let notion_client = notion_client
        .get_ref()
        .as_ref()
        .ok_or(SubscribeError::NotConfigured)?;

    // The schema is read per request so the payload always targets the
    // database's current shape.
    let schema = notion_client
        .database_schema()
        .await
        .map_err(SubscribeError::schema_read)?;

    let properties = subscription_properties(&schema, subscriber.as_ref());
    notion_client
        .create_record(&properties)
        .await
        .map_err(SubscribeError::record_create)?;

    let email_sent = match email_client.get_ref() {
        Some(client) => Some(send_welcome_email(client, &subscriber).await),
        None => None,
    };

    Ok(HttpResponse::Ok().json(SubscribeResponse {
        success: true,
        email_sent,
    }))
}

/// Best effort: the record has already been created, so every failure mode
/// here is absorbed into a `NotificationOutcome` instead of an error.
#[tracing::instrument(
    name = "Sending a welcome email to a new subscriber",
    skip(email_client, subscriber)
)]
async fn send_welcome_email(
    email_client: &EmailClient,
    subscriber: &SubscriberEmail,
) -> NotificationOutcome {
    let subject = get_welcome_email_subject();
    let html = get_welcome_email_html();

    match email_client.send_email(subscriber, &subject, &html).await {
        Ok(()) => NotificationOutcome::delivered(),
        Err(SendEmailError::Rejected { status, body }) => {
            tracing::warn!(
                upstream_status = status.as_u16(),
                "The email provider rejected the welcome email."
            );
            NotificationOutcome::rejected(status.as_u16(), body)
        }
        Err(err) => {
            tracing::warn!(
                error.cause_chain = ?err,
                error.message = %err,
                "Failed to deliver the welcome email."
            );
            NotificationOutcome::failed(err.to_string())
        }
    }
}
