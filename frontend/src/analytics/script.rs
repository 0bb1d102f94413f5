use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use futures::channel::oneshot;
use log::warn;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{window, HtmlScriptElement};

use crate::error::ScriptError;

type Outcome = Result<(), ScriptError>;

/// Appends an async `<script>` and resolves once it fires `load` or `error`.
/// Resolves immediately when a script with the same `src` is already present.
pub fn load_script(src: &str) -> impl Future<Output = Outcome> {
    let (tx, rx) = oneshot::channel::<Outcome>();
    let injected = inject(src, tx);
    let src = src.to_string();
    async move {
        if !injected? {
            return Ok(());
        }
        rx.await
            .unwrap_or_else(|_| Err(ScriptError::LoadFailed(src)))
    }
}

fn inject(src: &str, tx: oneshot::Sender<Outcome>) -> Result<bool, ScriptError> {
    let document = window()
        .and_then(|w| w.document())
        .ok_or(ScriptError::NoDocument)?;

    let selector = format!("script[src=\"{}\"]", src);
    if let Ok(Some(_)) = document.query_selector(&selector) {
        return Ok(false);
    }

    let failed = || ScriptError::LoadFailed(src.to_string());
    let script: HtmlScriptElement = document
        .create_element("script")
        .map_err(|_| failed())?
        .dyn_into()
        .map_err(|_| failed())?;
    script.set_async(true);
    script.set_src(src);

    let tx = Rc::new(RefCell::new(Some(tx)));
    let on_load = {
        let tx = tx.clone();
        Closure::<dyn FnMut()>::new(move || {
            if let Some(tx) = tx.borrow_mut().take() {
                let _ = tx.send(Ok(()));
            }
        })
    };
    let on_error = {
        let src = src.to_string();
        Closure::<dyn FnMut()>::new(move || {
            warn!("Failed to load script {}", src);
            if let Some(tx) = tx.borrow_mut().take() {
                let _ = tx.send(Err(ScriptError::LoadFailed(src.clone())));
            }
        })
    };
    script.set_onload(Some(on_load.as_ref().unchecked_ref()));
    script.set_onerror(Some(on_error.as_ref().unchecked_ref()));
    on_load.forget();
    on_error.forget();

    let head = document.head().ok_or(ScriptError::NoDocument)?;
    head.append_child(&script).map_err(|_| failed())?;
    Ok(true)
}
