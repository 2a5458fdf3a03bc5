//! Small JSON key-value persistence
//!
//! LocalStorage in the browser. Native builds write `<key>.json` files into
//! `$ARCADE_SIM_DATA_DIR` and persist nothing when it is unset.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CollaboratorError;

/// Read and decode `key`; missing or corrupt entries yield `None`
pub fn load_json<T: DeserializeOwned>(key: &str) -> Option<T> {
    let json = backend::read(key)?;
    match serde_json::from_str(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring corrupt '{}' entry: {}", key, e);
            None
        }
    }
}

pub fn save_json<T: Serialize>(key: &str, value: &T) -> Result<(), CollaboratorError> {
    let json =
        serde_json::to_string(value).map_err(|e| CollaboratorError::Rejected(e.to_string()))?;
    backend::write(key, &json)
}

#[cfg(target_arch = "wasm32")]
mod backend {
    use crate::error::CollaboratorError;

    fn local_storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }

    pub fn read(key: &str) -> Option<String> {
        local_storage()?.get_item(key).ok().flatten()
    }

    pub fn write(key: &str, json: &str) -> Result<(), CollaboratorError> {
        let storage = local_storage().ok_or(CollaboratorError::Unavailable("LocalStorage"))?;
        storage
            .set_item(key, json)
            .map_err(|_| CollaboratorError::Rejected(format!("quota exceeded for '{}'", key)))
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod backend {
    use std::path::PathBuf;

    use crate::error::CollaboratorError;

    const DATA_DIR_VAR: &str = "ARCADE_SIM_DATA_DIR";

    fn path(key: &str) -> Option<PathBuf> {
        let dir = std::env::var_os(DATA_DIR_VAR)?;
        Some(PathBuf::from(dir).join(format!("{}.json", key)))
    }

    pub fn read(key: &str) -> Option<String> {
        std::fs::read_to_string(path(key)?).ok()
    }

    pub fn write(key: &str, json: &str) -> Result<(), CollaboratorError> {
        let path = path(key).ok_or(CollaboratorError::Unavailable("data directory"))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CollaboratorError::Rejected(e.to_string()))?;
        }
        std::fs::write(&path, json).map_err(|e| CollaboratorError::Rejected(e.to_string()))
    }
}
