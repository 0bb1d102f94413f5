use yew::prelude::*;
use yew_router::prelude::*;
use log::{info, Level};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::MouseEvent;

mod config;
mod error;
mod network;
mod services;
mod storage;
mod analytics {
    pub mod buffer;
    pub mod dispatcher;
    pub mod page;
    pub mod script;
    pub mod tracker;
}
mod consent {
    pub mod controller;
    pub mod store;
}
mod contact {
    pub mod client;
    pub mod form;
    pub mod sanitize;
}
mod components {
    pub mod contact_form;
    pub mod cookie_banner;
    pub mod notification;
    pub mod page_view;
}
mod pages {
    pub mod home;
    pub mod privacy;
}

use components::{
    cookie_banner::CookieBanner,
    notification::ToastProvider,
    page_view::PageViewTracker,
};
use pages::{home::Home, privacy::CookiePolicy};
use services::Services;

#[derive(Clone, Routable, PartialEq)]
pub enum Route {
    #[at("/")]
    Home,
    #[at("/cookie-policy")]
    CookiePolicy,
    #[not_found]
    #[at("/404")]
    NotFound,
}

fn switch(routes: Route) -> Html {
    match routes {
        Route::Home => {
            info!("Rendering Home page");
            html! { <Home /> }
        },
        Route::CookiePolicy => {
            info!("Rendering Cookie Policy page");
            html! { <CookiePolicy /> }
        },
        Route::NotFound => {
            info!("Rendering NotFound page");
            html! { <Redirect<Route> to={Route::Home} /> }
        },
    }
}

#[function_component(Nav)]
pub fn nav() -> Html {
    let menu_open = use_state(|| false);

    let toggle_menu = {
        let menu_open = menu_open.clone();
        Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            menu_open.set(!*menu_open);
        })
    };

    let close_menu = {
        let menu_open = menu_open.clone();
        Callback::from(move |_: MouseEvent| menu_open.set(false))
    };

    let menu_class = if *menu_open {
        "nav-right mobile-menu-open"
    } else {
        "nav-right"
    };

    html! {
        <nav class="top-nav">
            <div class="nav-content">
                <Link<Route> to={Route::Home} classes="nav-logo">
                    {"fastapp"}
                </Link<Route>>
                <button class="burger-menu" onclick={toggle_menu}>
                    <span></span>
                    <span></span>
                    <span></span>
                </button>
                <div class={menu_class}>
                    <a href="/#services" class="nav-link" onclick={close_menu.clone()}>{"Services"}</a>
                    <a href="/#contact" class="nav-link" onclick={close_menu.clone()}>{"Contact"}</a>
                    <div onclick={close_menu}>
                        <Link<Route> to={Route::CookiePolicy} classes="nav-link">
                            {"Cookies"}
                        </Link<Route>>
                    </div>
                </div>
            </div>
        </nav>
    }
}

#[function_component]
fn App() -> Html {
    let services = use_state(Services::browser);

    // Bring gtag up once, and flush anything buffered while offline
    // whenever the connection comes back.
    {
        let services = (*services).clone();
        use_effect_with_deps(move |_| {
            let starting = services.clone();
            spawn_local(async move {
                starting.start_analytics().await;
            });

            let online_callback = Closure::wrap(Box::new(move || {
                info!("Back online, retrying failed analytics");
                services.dispatcher().retry_failed_analytics();
            }) as Box<dyn FnMut()>);

            let window = web_sys::window();
            if let Some(window) = &window {
                let _ = window.add_event_listener_with_callback(
                    "online",
                    online_callback.as_ref().unchecked_ref(),
                );
            }

            move || {
                if let Some(window) = window {
                    let _ = window.remove_event_listener_with_callback(
                        "online",
                        online_callback.as_ref().unchecked_ref(),
                    );
                }
            }
        }, ());
    }

    html! {
        <ContextProvider<Services> context={(*services).clone()}>
            <ToastProvider>
                <BrowserRouter>
                    <Nav />
                    <PageViewTracker />
                    <Switch<Route> render={switch} />
                    <CookieBanner />
                </BrowserRouter>
            </ToastProvider>
        </ContextProvider<Services>>
    }
}

fn main() {
    // Initialize console error panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging
    console_log::init_with_level(Level::Info).expect("error initializing log");

    info!("Starting application");
    yew::Renderer::<App>::new().render();
}
