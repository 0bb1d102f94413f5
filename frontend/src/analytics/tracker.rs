use js_sys::{Array, Function, Reflect};
use serde::Serialize;
use serde_json::{Map, Value};
use wasm_bindgen::prelude::*;

use crate::error::TrackingError;

/// One call into the gtag command queue.
#[derive(Debug, Clone, PartialEq)]
pub enum GtagCommand {
    Js(String),
    Config {
        measurement_id: String,
        options: Map<String, Value>,
    },
    Event {
        name: String,
        params: Map<String, Value>,
    },
}

impl GtagCommand {
    pub fn event_name(&self) -> Option<&str> {
        match self {
            GtagCommand::Event { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn params(&self) -> Option<&Map<String, Value>> {
        match self {
            GtagCommand::Event { params, .. } => Some(params),
            GtagCommand::Config { options, .. } => Some(options),
            GtagCommand::Js(_) => None,
        }
    }
}

/// The tracking primitive. Only valid once the gtag script has loaded.
pub trait Tracker {
    fn emit(&self, command: &GtagCommand) -> Result<(), TrackingError>;
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_name = gtag)]
    fn gtag_call(command: &str, target: JsValue, args: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_name = gtag)]
    fn gtag_js(command: &str, date: &js_sys::Date) -> Result<(), JsValue>;
}

pub struct GtagTracker;

/// Defines `window.dataLayer` and the `gtag` queueing function the loaded
/// script drains. Leaves an existing `gtag` alone.
pub fn install_data_layer() -> Result<(), TrackingError> {
    let window = web_sys::window().ok_or_else(|| TrackingError::Send("no window".into()))?;
    let global: &JsValue = window.as_ref();
    let js_err = |e: JsValue| TrackingError::Send(format!("{:?}", e));

    if Reflect::get(global, &JsValue::from_str("gtag"))
        .map_err(js_err)?
        .is_function()
    {
        return Ok(());
    }
    if Reflect::get(global, &JsValue::from_str("dataLayer"))
        .map_err(js_err)?
        .is_undefined()
    {
        Reflect::set(global, &JsValue::from_str("dataLayer"), &Array::new()).map_err(js_err)?;
    }
    let gtag = Function::new_no_args("window.dataLayer.push(arguments);");
    Reflect::set(global, &JsValue::from_str("gtag"), &gtag).map_err(js_err)?;
    Ok(())
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, TrackingError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| TrackingError::Params(e.to_string()))
}

impl Tracker for GtagTracker {
    fn emit(&self, command: &GtagCommand) -> Result<(), TrackingError> {
        let result = match command {
            GtagCommand::Js(timestamp) => {
                gtag_js("js", &js_sys::Date::new(&JsValue::from_str(timestamp)))
            }
            GtagCommand::Config {
                measurement_id,
                options,
            } => gtag_call("config", JsValue::from_str(measurement_id), to_js(options)?),
            GtagCommand::Event { name, params } => {
                gtag_call("event", JsValue::from_str(name), to_js(params)?)
            }
        };
        result.map_err(|e| TrackingError::Send(format!("{:?}", e)))
    }
}
