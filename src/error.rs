//! Errors raised while wiring the game to the page. Gameplay itself never
//! fails; see `session`.

use thiserror::Error;
use wasm_bindgen::JsValue;

pub type BindResult<T> = Result<T, BindError>;

#[derive(Debug, Error)]
pub enum BindError {
    #[error("no global window (not running in a browser?)")]
    NoWindow,

    #[error("window has no document")]
    NoDocument,

    #[error("missing element: {0}")]
    MissingElement(String),

    #[error("element {0} is not a {1}")]
    WrongElement(String, &'static str),

    #[error("game already mounted")]
    AlreadyMounted,

    #[error("DOM call failed: {0}")]
    Js(String),
}

impl From<JsValue> for BindError {
    fn from(value: JsValue) -> Self {
        BindError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<BindError> for JsValue {
    fn from(err: BindError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
