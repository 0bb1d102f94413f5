use web_sys::window;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContext {
    pub title: String,
    pub location: String,
    pub path: String,
}

pub trait PageSource {
    fn current(&self) -> PageContext;
}

/// Reads `document.title` and `window.location` at call time.
pub struct BrowserPage;

impl PageSource for BrowserPage {
    fn current(&self) -> PageContext {
        let Some(window) = window() else {
            return PageContext::default();
        };
        let title = window.document().map(|d| d.title()).unwrap_or_default();
        let location = window.location();
        PageContext {
            title,
            location: location.href().unwrap_or_default(),
            path: location.pathname().unwrap_or_else(|_| "/".to_string()),
        }
    }
}

pub fn current_hostname() -> String {
    window()
        .and_then(|w| w.location().hostname().ok())
        .unwrap_or_default()
}
