//! Host imports — functions provided by the JS runtime to the WASM module.
//!
//! On wasm32 targets these are real extern "C" imports. On native targets
//! (for testing) logging is a no-op and storage is a per-thread map.

use decision_lab_core::curriculum::{KeyValueStore, RepositoryError};

#[cfg(target_arch = "wasm32")]
mod ffi {
    unsafe extern "C" {
        pub fn host_log(level: i32, msg_ptr: *const u8, msg_len: u32);
        /// Writes up to `max_len` bytes of the value and returns its full
        /// length, or -1 when the key is absent.
        pub fn host_storage_get(
            key_ptr: *const u8,
            key_len: u32,
            out_ptr: *mut u8,
            max_len: u32,
        ) -> i32;
        /// Returns 0 on success.
        pub fn host_storage_set(
            key_ptr: *const u8,
            key_len: u32,
            value_ptr: *const u8,
            value_len: u32,
        ) -> i32;
    }
}

pub const LOG_WARN: i32 = 1;
pub const LOG_INFO: i32 = 2;

/// Safe wrapper: log a string at a given level.
pub fn log(level: i32, msg: &str) {
    #[cfg(target_arch = "wasm32")]
    unsafe {
        ffi::host_log(level, msg.as_ptr(), msg.len() as u32);
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (level, msg);
    }
}

#[cfg(not(target_arch = "wasm32"))]
thread_local! {
    static NATIVE_STORAGE: std::cell::RefCell<std::collections::HashMap<String, String>> =
        std::cell::RefCell::new(std::collections::HashMap::new());
}

#[cfg(target_arch = "wasm32")]
fn storage_get(key: &str) -> Result<Option<String>, RepositoryError> {
    let len = unsafe {
        ffi::host_storage_get(key.as_ptr(), key.len() as u32, std::ptr::null_mut(), 0)
    };
    if len < 0 {
        return Ok(None);
    }
    let mut buf = vec![0u8; len as usize];
    unsafe {
        ffi::host_storage_get(key.as_ptr(), key.len() as u32, buf.as_mut_ptr(), len as u32);
    }
    String::from_utf8(buf)
        .map(Some)
        .map_err(|e| RepositoryError::Storage(e.to_string()))
}

#[cfg(not(target_arch = "wasm32"))]
fn storage_get(key: &str) -> Result<Option<String>, RepositoryError> {
    Ok(NATIVE_STORAGE.with(|s| s.borrow().get(key).cloned()))
}

#[cfg(target_arch = "wasm32")]
fn storage_set(key: &str, value: &str) -> Result<(), RepositoryError> {
    let code = unsafe {
        ffi::host_storage_set(
            key.as_ptr(),
            key.len() as u32,
            value.as_ptr(),
            value.len() as u32,
        )
    };
    if code == 0 {
        Ok(())
    } else {
        Err(RepositoryError::Storage(format!("host_storage_set returned {code}")))
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn storage_set(key: &str, value: &str) -> Result<(), RepositoryError> {
    NATIVE_STORAGE.with(|s| s.borrow_mut().insert(key.to_string(), value.to_string()));
    Ok(())
}

/// The host's key/value storage (browser local storage).
#[derive(Debug, Default, Clone, Copy)]
pub struct HostStore;

impl KeyValueStore for HostStore {
    fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        storage_get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), RepositoryError> {
        storage_set(key, value)
    }
}
