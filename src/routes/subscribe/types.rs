/// Outcome of the best-effort welcome email. Reported back to the caller as
/// metadata, never escalated into the overall response status.
#[derive(Debug, PartialEq, Eq, serde::Serialize)]
pub struct NotificationOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl NotificationOutcome {
    pub fn delivered() -> Self {
        Self {
            ok: true,
            details: None,
            status: None,
        }
    }

    pub fn rejected(status: u16, details: String) -> Self {
        Self {
            ok: false,
            details: Some(details),
            status: Some(status),
        }
    }

    pub fn failed(details: String) -> Self {
        Self {
            ok: false,
            details: Some(details),
            status: None,
        }
    }
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeResponse {
    pub success: bool,
    /// `None` when no email provider is configured and the step was skipped.
    pub email_sent: Option<NotificationOutcome>,
}
