use yew::prelude::*;

use crate::components::contact_form::ContactForm;

#[function_component]
pub fn Home() -> Html {
    html! {
        <main>
            <section class="hero">
                <h1>{"Apps, shipped fast."}</h1>
                <p>
                    {"We design and build mobile and web apps for small teams, from first sketch to store listing."}
                </p>
                <a href="#contact" class="hero-cta">{"Start a project"}</a>
            </section>
            <section id="services" class="services">
                <h2>{"What we do"}</h2>
                <ul>
                    <li>{"Native and cross-platform mobile apps"}</li>
                    <li>{"Web apps and landing pages"}</li>
                    <li>{"Maintenance for apps you already have"}</li>
                </ul>
            </section>
            <section id="contact" class="contact">
                <h2>{"Get in touch"}</h2>
                <ContactForm />
            </section>
        </main>
    }
}
