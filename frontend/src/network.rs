use gloo_net::http::{Request, Response};
use log::error;

use crate::analytics::page::current_hostname;
use crate::error::RequestError;

pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error occurred. Please check your connection and try again.";

const ANALYTICS_MARKERS: &[&str] = &["google-analytics.com", "analytics", "gtag", "collect"];

/// Where user-visible request failures go. The app wires this to toasts.
pub trait NetworkErrorReporter {
    fn report(&self, message: &str);
}

pub fn is_analytics_url(url: &str) -> bool {
    ANALYTICS_MARKERS.iter().any(|marker| url.contains(marker))
}

/// Relative URLs, the page's own host, the form relay and `api.` hosts.
pub fn is_own_domain(url: &str, hostname: &str) -> bool {
    (!hostname.is_empty() && url.contains(hostname))
        || url.contains("web3forms.com")
        || url.contains("api.")
        || !url.contains("://")
}

pub fn api_error_message(status: u16) -> String {
    match status {
        400 => "Invalid request. Please check your input.".to_string(),
        401 => "Unauthorized. Please log in again.".to_string(),
        403 => "Access denied. You don't have permission to perform this action.".to_string(),
        404 => "The requested resource was not found.".to_string(),
        500 => "Server error. Please try again later.".to_string(),
        other => format!("Error: {}", other),
    }
}

/// Every outbound request goes through here.
///
/// A non-2xx reply is an error unless the URL belongs to analytics, whose
/// collectors answer oddly and are never worth bothering the visitor about.
/// Failures against our own endpoints are reported to `reporter`.
pub async fn perform_request(
    url: &str,
    request: Request,
    reporter: &dyn NetworkErrorReporter,
) -> Result<Response, RequestError> {
    let outcome = match request.send().await {
        Ok(response) if !response.ok() && !is_analytics_url(url) => {
            Err(RequestError::Status(response.status()))
        }
        Ok(response) => return Ok(response),
        Err(e) => Err(RequestError::Network(e.to_string())),
    };

    if let Err(e) = &outcome {
        if is_own_domain(url, &current_hostname()) {
            error!("Network Error: {}", e);
            let message = match e {
                RequestError::Status(status) => api_error_message(*status),
                _ => NETWORK_ERROR_MESSAGE.to_string(),
            };
            reporter.report(&message);
        }
    }
    outcome
}
