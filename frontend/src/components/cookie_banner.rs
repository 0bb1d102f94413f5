use gloo_timers::callback::Timeout;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::config::BANNER_DELAY_MS;
use crate::consent::controller::BannerState;
use crate::consent::store::{Category, ConsentCategories};
use crate::services::Services;

const CATEGORY_ROWS: &[(Category, &str, &str)] = &[
    (
        Category::Performance,
        "Performance",
        "Help us measure how fast pages load.",
    ),
    (
        Category::Functionality,
        "Functionality",
        "Remember choices such as language.",
    ),
    (
        Category::Targeting,
        "Targeting",
        "Show relevant content on other sites.",
    ),
    (
        Category::Analytics,
        "Analytics",
        "Anonymous statistics about visits.",
    ),
];

#[function_component(CookieBanner)]
pub fn cookie_banner() -> Html {
    let services = use_context::<Services>();
    let banner = use_state(|| BannerState::Hidden);
    let modal_open = use_state(|| false);
    let choices = use_state(ConsentCategories::default);

    // Delay the banner a little so it does not jump in during first paint.
    {
        let services = services.clone();
        let banner = banner.clone();
        use_effect_with_deps(
            move |_| {
                let timeout = services
                    .filter(|s| s.consent().needs_banner())
                    .map(|services| {
                        Timeout::new(BANNER_DELAY_MS, move || {
                            banner.set(services.consent().show_banner());
                        })
                    });
                move || drop(timeout)
            },
            (),
        );
    }

    let Some(services) = services else {
        return html! {};
    };

    let sync = {
        let services = services.clone();
        let banner = banner.clone();
        let modal_open = modal_open.clone();
        move || {
            banner.set(services.consent().banner());
            modal_open.set(services.consent().settings_open());
        }
    };

    let accept_all = {
        let services = services.clone();
        let sync = sync.clone();
        Callback::from(move |_: MouseEvent| {
            if services.consent().accept_all() {
                sync();
            }
        })
    };

    let open_settings = {
        let services = services.clone();
        let choices = choices.clone();
        let modal_open = modal_open.clone();
        Callback::from(move |_: MouseEvent| {
            choices.set(services.consent().open_settings());
            modal_open.set(true);
        })
    };

    let close_settings = {
        let services = services.clone();
        let modal_open = modal_open.clone();
        Callback::from(move |_: MouseEvent| {
            services.consent().close_settings();
            modal_open.set(false);
        })
    };

    let save_settings = {
        let services = services.clone();
        let choices = choices.clone();
        Callback::from(move |_: MouseEvent| {
            if services.consent().save_custom(*choices) {
                sync();
            }
        })
    };

    let banner_class = match *banner {
        BannerState::Shown => "cookie-banner",
        BannerState::Hidden => "cookie-banner translate-y-full",
    };

    html! {
        <>
            <div id="cookieConsentBanner" class={banner_class} role="dialog" aria-live="polite">
                <p>
                    {"We use cookies to understand how the site is used. You can accept all of them or pick which ones to allow."}
                </p>
                <div class="cookie-banner-actions">
                    <button id="openCookieSettings" onclick={open_settings.clone()}>{"Cookie settings"}</button>
                    <button id="acceptCookies" class="primary" onclick={accept_all}>{"Accept all"}</button>
                </div>
            </div>
            // Always there, so a returning visitor can revisit their choice.
            <footer class="site-footer">
                <button id="manageCookies" class="footer-link" onclick={open_settings}>
                    {"Cookie settings"}
                </button>
            </footer>
            if *modal_open {
                <div id="cookieSettingsModal" class="cookie-modal flex" role="dialog" aria-modal="true">
                    <div class="cookie-modal-content">
                        <h2>{"Cookie settings"}</h2>
                        { for CATEGORY_ROWS.iter().map(|(category, label, description)| {
                            let category = *category;
                            let onchange = {
                                let choices = choices.clone();
                                Callback::from(move |e: Event| {
                                    let input: HtmlInputElement = e.target_unchecked_into();
                                    let mut next = *choices;
                                    next.set(category, input.checked());
                                    choices.set(next);
                                })
                            };
                            html! {
                                <label class="cookie-category">
                                    <input type="checkbox" checked={choices.get(category)} {onchange} />
                                    <span class="cookie-category-label">{ *label }</span>
                                    <span class="cookie-category-description">{ *description }</span>
                                </label>
                            }
                        }) }
                        <div class="cookie-modal-actions">
                            <button id="closeCookieSettings" onclick={close_settings}>{"Cancel"}</button>
                            <button id="saveCookieSettings" class="primary" onclick={save_settings}>{"Save preferences"}</button>
                        </div>
                    </div>
                </div>
            }
        </>
    }
}
