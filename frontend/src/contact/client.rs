use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use gloo_net::http::Request;
use log::info;
use serde::Deserialize;

use crate::contact::form::{ContactSubmission, SubmitThrottle};
use crate::contact::sanitize::sanitize;
use crate::error::{FormError, RequestError};
use crate::network::{perform_request, NetworkErrorReporter};

const FALLBACK_FAILURE: &str = "Failed to send message";

#[derive(Debug, Deserialize)]
pub struct RelayResponse {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Prepared {
    /// Honeypot was filled in. Pretend it worked.
    Bot,
    Send(BTreeMap<String, String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent,
    DiscardedBot,
}

/// Posts contact requests to the Web3Forms relay.
pub struct ContactClient {
    endpoint: String,
    access_key: Option<String>,
    throttle: SubmitThrottle,
}

impl ContactClient {
    pub fn new(endpoint: &str, access_key: Option<&str>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            access_key: access_key.map(str::to_string),
            throttle: SubmitThrottle::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.access_key.is_some()
    }

    pub fn prepare(
        &self,
        submission: &ContactSubmission,
        now: DateTime<Utc>,
    ) -> Result<Prepared, FormError> {
        if let Some(first) = submission.validate().first() {
            return Err(FormError::Invalid(first.message.to_string()));
        }
        if submission.is_bot() {
            info!("Bot submission detected");
            return Ok(Prepared::Bot);
        }
        let access_key = self
            .access_key
            .as_deref()
            .ok_or(FormError::MissingAccessKey)?;
        self.throttle.acquire(now)?;

        let mut payload = submission.cleaned();
        payload.insert("access_key".to_string(), access_key.to_string());
        Ok(Prepared::Send(payload))
    }

    pub async fn submit(
        &self,
        submission: &ContactSubmission,
        reporter: &dyn NetworkErrorReporter,
    ) -> Result<SubmitOutcome, FormError> {
        let payload = match self.prepare(submission, Utc::now())? {
            Prepared::Bot => return Ok(SubmitOutcome::DiscardedBot),
            Prepared::Send(payload) => payload,
        };

        let request = Request::post(&self.endpoint)
            .header("Accept", "application/json")
            .json(&payload)
            .map_err(|e| RequestError::Network(e.to_string()))?;
        let response = perform_request(&self.endpoint, request, reporter).await?;
        let reply = response
            .json::<RelayResponse>()
            .await
            .map_err(|e| RequestError::Decode(e.to_string()))?;
        interpret(reply)
    }
}

pub fn interpret(reply: RelayResponse) -> Result<SubmitOutcome, FormError> {
    if reply.success {
        return Ok(SubmitOutcome::Sent);
    }
    let message = reply
        .message
        .map(|m| sanitize(&m))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| FALLBACK_FAILURE.to_string());
    Err(FormError::Rejected(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn submission() -> ContactSubmission {
        ContactSubmission::new()
            .with("name", "Grace Hopper")
            .with("email", "grace@example.com")
            .with("message", "Please send me your pricing sheet.")
            .with("utm_source", "newsletter")
    }

    fn client() -> ContactClient {
        ContactClient::new("https://api.web3forms.com/submit", Some("key-123"))
    }

    #[test]
    fn prepare_builds_clean_payload_with_key() {
        let prepared = client().prepare(&submission(), Utc::now()).unwrap();
        let Prepared::Send(payload) = prepared else {
            panic!("expected payload");
        };
        assert_eq!(payload["access_key"], "key-123");
        assert_eq!(payload["name"], "Grace Hopper");
        assert!(!payload.contains_key("utm_source"));
    }

    #[test]
    fn invalid_form_is_rejected_before_anything_else() {
        let client = client();
        let empty = ContactSubmission::new().with("website", "spam");
        assert!(matches!(
            client.prepare(&empty, Utc::now()),
            Err(FormError::Invalid(_))
        ));
    }

    #[test]
    fn bot_submission_short_circuits() {
        let bot = submission().with("website", "http://spam.example");
        assert_eq!(client().prepare(&bot, Utc::now()).unwrap(), Prepared::Bot);
    }

    #[test]
    fn missing_key_disables_sending() {
        let client = ContactClient::new("https://api.web3forms.com/submit", None);
        assert!(!client.is_enabled());
        assert!(matches!(
            client.prepare(&submission(), Utc::now()),
            Err(FormError::MissingAccessKey)
        ));
    }

    #[test]
    fn second_submit_inside_window_is_throttled() {
        let client = client();
        let now = Utc::now();
        assert!(client.prepare(&submission(), now).is_ok());
        assert!(matches!(
            client.prepare(&submission(), now + Duration::seconds(3)),
            Err(FormError::Throttled)
        ));
    }

    #[test]
    fn relay_reply_interpretation() {
        let ok: RelayResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert_eq!(interpret(ok).unwrap(), SubmitOutcome::Sent);

        let rejected: RelayResponse =
            serde_json::from_str(r#"{"success":false,"message":"Invalid <b>key</b>"}"#).unwrap();
        match interpret(rejected) {
            Err(FormError::Rejected(message)) => assert_eq!(message, "Invalid key"),
            other => panic!("unexpected {:?}", other),
        }

        let bare: RelayResponse = serde_json::from_str("{}").unwrap();
        match interpret(bare) {
            Err(FormError::Rejected(message)) => assert_eq!(message, FALLBACK_FAILURE),
            other => panic!("unexpected {:?}", other),
        }
    }
}
