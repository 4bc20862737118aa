//! LocalStorage / sessionStorage helpers

use serde::Serialize;
use serde::de::DeserializeOwned;
use web_sys::Storage;

pub fn local_storage() -> Option<Storage> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok())
        .flatten()
}

pub fn session_storage() -> Option<Storage> {
    web_sys::window()
        .and_then(|w| w.session_storage().ok())
        .flatten()
}

/// Read and parse a JSON value; any failure is `None`
pub fn load_json<T: DeserializeOwned>(storage: &Storage, key: &str) -> Option<T> {
    let json = storage.get_item(key).ok()??;
    match serde_json::from_str(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Discarding unreadable {key}: {e}");
            None
        }
    }
}

/// Serialize and store a JSON value. Returns whether it was written.
pub fn save_json<T: Serialize>(storage: &Storage, key: &str, value: &T) -> bool {
    match serde_json::to_string(value) {
        Ok(json) => storage.set_item(key, &json).is_ok(),
        Err(e) => {
            log::warn!("Could not serialize {key}: {e}");
            false
        }
    }
}
