use yew::prelude::*;
use yew_router::prelude::*;

use crate::analytics::dispatcher::DispatcherState;
use crate::consent::store::{ConsentDecision, ConsentStatus};
use crate::services::Services;
use crate::Route;

fn describe_choice(status: &ConsentStatus) -> &'static str {
    match (status.decision, status.categories) {
        (ConsentDecision::Unset, _) => "You have not made a choice yet.",
        (ConsentDecision::AcceptedAll, _) => "You accepted all cookies.",
        (ConsentDecision::Custom, Some(c)) if c.analytics => {
            "You picked your own settings, with analytics allowed."
        }
        (ConsentDecision::Custom, _) => "You picked your own settings, without analytics.",
    }
}

fn describe_analytics(state: DispatcherState) -> &'static str {
    match state {
        DispatcherState::Ready => "Google Analytics is loaded on this page.",
        DispatcherState::Unavailable => "Google Analytics could not be loaded on this page.",
        DispatcherState::Uninitialized | DispatcherState::ScriptLoading => {
            "Google Analytics is still loading."
        }
    }
}

#[function_component]
pub fn CookiePolicy() -> Html {
    let services = use_context::<Services>();
    let current = services.map(|services| {
        html! {
            <section id="yourChoice">
                <h2>{"Your current choice"}</h2>
                <p>{ describe_choice(&services.consent_store().status()) }</p>
                <p>{ describe_analytics(services.dispatcher().state()) }</p>
                <p>{"Use the Cookie settings link at the bottom of any page to change it."}</p>
            </section>
        }
    });

    html! {
        <div class="legal-content">
            <div>
                <h1>{"Cookie Policy"}</h1>
                <section>
                    <h2>{"What we store"}</h2>
                    <p>
                        {"Your cookie choice is kept in your browser's local storage under "}
                        <code>{"cookieConsent"}</code>{" and "}<code>{"cookieSettings"}</code>
                        {". Nothing about it is sent to us."}
                    </p>
                </section>
                <section>
                    <h2>{"Categories"}</h2>
                    <h3>{"Performance"}</h3>
                    <p>{"Load-time measurements."}</p>
                    <h3>{"Functionality"}</h3>
                    <p>{"Remembering preferences between visits."}</p>
                    <h3>{"Targeting"}</h3>
                    <p>{"Relevant content on other sites."}</p>
                    <h3>{"Analytics"}</h3>
                    <p>
                        {"Google Analytics with anonymized IP addresses. It only runs after you accept all cookies or enable analytics in the settings. Page views that fail to send while you are offline are kept locally and sent once you are back online."}
                    </p>
                </section>
                { for current }
                <div class="legal-links">
                    <Link<Route> to={Route::Home}>{"Back to home"}</Link<Route>>
                </div>
            </div>
        </div>
    }
}
