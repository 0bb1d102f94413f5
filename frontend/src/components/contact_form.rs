use gloo_timers::callback::Timeout;
use log::error;
use serde_json::{json, Map, Value};
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::components::notification::{Notifier, Toast};
use crate::config::TOAST_LIFETIME_MS;
use crate::contact::client::SubmitOutcome;
use crate::contact::form::{ContactSubmission, FieldError, HONEYPOT_FIELD};
use crate::contact::sanitize::sanitize;
use crate::error::FormError;
use crate::services::Services;

const SUCCESS_MESSAGE: &str = "Message sent successfully! We'll get back to you soon.";
const GENERIC_FAILURE: &str = "Failed to send message. Please try again later.";

#[derive(Clone, PartialEq)]
enum FormStatus {
    Idle,
    Sending,
    Failed(String),
}

fn field_error(errors: &[FieldError], field: &str) -> Option<&'static str> {
    errors.iter().find(|e| e.field == field).map(|e| e.message)
}

fn lead_params(submission: &ContactSubmission) -> Map<String, Value> {
    let params = json!({
        "form": "contact",
        "has_company": !submission.get("company").trim().is_empty(),
    });
    match params {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[function_component(ContactForm)]
pub fn contact_form() -> Html {
    let services = use_context::<Services>();
    let notifier = use_context::<Notifier>();
    let fields = use_state(ContactSubmission::new);
    let errors = use_state(Vec::<FieldError>::new);
    let status = use_state(|| FormStatus::Idle);

    let Some(services) = services else {
        return html! {};
    };
    let enabled = services.contact().is_enabled();

    let on_input = |name: &'static str| {
        let fields = fields.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let mut next = (*fields).clone();
            next.set(name, &input.value());
            fields.set(next);
        })
    };

    let onsubmit = {
        let services = services.clone();
        let fields = fields.clone();
        let errors = errors.clone();
        let status = status.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            if *status == FormStatus::Sending {
                return;
            }

            let submission = (*fields).clone();
            let found = submission.validate();
            if !found.is_empty() {
                errors.set(found);
                return;
            }
            errors.set(Vec::new());
            status.set(FormStatus::Sending);

            let services = services.clone();
            let fields = fields.clone();
            let status = status.clone();
            let notifier = notifier.clone();
            spawn_local(async move {
                let result = match &notifier {
                    Some(notifier) => services.contact().submit(&submission, notifier).await,
                    None => services.contact().submit(&submission, &LogOnly).await,
                };
                match result {
                    Ok(outcome) => {
                        if outcome == SubmitOutcome::Sent {
                            services
                                .dispatcher()
                                .track_event("generate_lead", lead_params(&submission));
                        }
                        if let Some(notifier) = &notifier {
                            notifier.notify(Toast::success(SUCCESS_MESSAGE));
                        }
                        fields.set(ContactSubmission::new());
                        status.set(FormStatus::Idle);
                    }
                    Err(e) => {
                        error!("Form submission error: {}", e);
                        let message = match e {
                            FormError::Request(_) => GENERIC_FAILURE.to_string(),
                            other => sanitize(&other.to_string()),
                        };
                        status.set(FormStatus::Failed(message));
                        Timeout::new(TOAST_LIFETIME_MS, move || status.set(FormStatus::Idle))
                            .forget();
                    }
                }
            });
        })
    };

    let input_class = |field: &str| {
        if field_error(&errors, field).is_some() {
            "form-input error"
        } else {
            "form-input"
        }
    };
    let error_line = |field: &str| match field_error(&errors, field) {
        Some(message) => html! { <div class="input-error show">{ message }</div> },
        None => html! {},
    };
    let sending = *status == FormStatus::Sending;

    html! {
        <form id="contactForm" class="contact-form" {onsubmit} novalidate={true}>
            <div class="input-wrapper">
                <label for="name">{"Name"}</label>
                <input id="name" name="name" type="text" class={input_class("name")}
                    value={fields.get("name").to_string()} oninput={on_input("name")} />
                { error_line("name") }
            </div>
            <div class="input-wrapper">
                <label for="email">{"Email"}</label>
                <input id="email" name="email" type="email" class={input_class("email")}
                    value={fields.get("email").to_string()} oninput={on_input("email")} />
                { error_line("email") }
            </div>
            <div class="input-wrapper">
                <label for="company">{"Company"}</label>
                <input id="company" name="company" type="text" class="form-input"
                    value={fields.get("company").to_string()} oninput={on_input("company")} />
            </div>
            <div class="input-wrapper">
                <label for="message">{"Message"}</label>
                <textarea id="message" name="message" rows="5" class={input_class("message")}
                    value={fields.get("message").to_string()} oninput={on_input("message")} />
                { error_line("message") }
            </div>
            // Hidden from people; bots fill it in.
            <input type="text" name={HONEYPOT_FIELD} id={HONEYPOT_FIELD} class="hidden" tabindex="-1"
                autocomplete="off" value={fields.get(HONEYPOT_FIELD).to_string()} oninput={on_input(HONEYPOT_FIELD)} />
            <button type="submit" disabled={!enabled || sending}
                title={(!enabled).then(|| "Form submission is disabled - API key not configured")}>
                if sending {
                    <span class="loading-spinner"></span>
                } else {
                    <span class="submit-text">{"Send message"}</span>
                }
            </button>
            if !enabled {
                <div class="bg-yellow-50 text-yellow-700 p-3 rounded mt-4">
                    { FormError::MissingAccessKey.to_string() }
                </div>
            }
            {
                match &*status {
                    FormStatus::Failed(message) => html! {
                        <div class="mt-4 p-4 bg-red-50 text-red-700 rounded-md error-message">{ message }</div>
                    },
                    FormStatus::Idle | FormStatus::Sending => html! {},
                }
            }
        </form>
    }
}

struct LogOnly;

impl crate::network::NetworkErrorReporter for LogOnly {
    fn report(&self, message: &str) {
        error!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_error_lookup() {
        let errors = vec![FieldError {
            field: "email".into(),
            message: "This field is required",
        }];
        assert_eq!(field_error(&errors, "email"), Some("This field is required"));
        assert_eq!(field_error(&errors, "name"), None);
    }

    #[test]
    fn lead_params_do_not_leak_contact_details() {
        let submission = ContactSubmission::new()
            .with("email", "ada@example.com")
            .with("company", "Acme");
        let params = lead_params(&submission);
        assert_eq!(params["has_company"], true);
        assert!(!params.values().any(|v| v == "ada@example.com"));
    }
}
