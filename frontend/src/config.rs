pub const GA_MEASUREMENT_ID: &str = "G-8BDXNPSHMS";
pub const FORMS_ENDPOINT: &str = "https://api.web3forms.com/submit";

pub const SCRIPT_TIMEOUT_MS: u32 = 3000;
pub const SCRIPT_SETTLE_MS: u32 = 200;
pub const BANNER_DELAY_MS: u32 = 1000;
pub const TOAST_LIFETIME_MS: u32 = 5000;
pub const SUBMIT_THROTTLE_MS: i64 = 10_000;

pub fn gtag_script_url() -> String {
    format!("https://www.googletagmanager.com/gtag/js?id={}", GA_MEASUREMENT_ID)
}

/// Injected at build time, the way the deploy job used to generate `config.js`.
pub fn web3forms_access_key() -> Option<&'static str> {
    option_env!("WEB3FORMS_ACCESS_KEY").filter(|key| !key.trim().is_empty())
}

#[cfg(debug_assertions)]
pub fn analytics_debug_mode(_hostname: &str) -> bool {
    true
}

#[cfg(not(debug_assertions))]
pub fn analytics_debug_mode(hostname: &str) -> bool {
    is_localhost(hostname)
}

pub fn is_localhost(hostname: &str) -> bool {
    hostname == "localhost" || hostname == "127.0.0.1"
}
