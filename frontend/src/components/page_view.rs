use yew::prelude::*;
use yew_router::prelude::*;

use crate::services::Services;

/// Sends a page view whenever the router lands on a new path. The very first
/// one is usually dropped because gtag is still loading; `start_analytics`
/// covers that case.
#[function_component(PageViewTracker)]
pub fn page_view_tracker() -> Html {
    let services = use_context::<Services>();
    let path = use_location().map(|l| l.path().to_string()).unwrap_or_default();

    use_effect_with_deps(
        move |_| {
            if let Some(services) = services {
                services.dispatcher().track_page_view();
            }
            || ()
        },
        path,
    );

    html! {}
}
