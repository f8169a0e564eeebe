//! Console logging that also works in native test builds.

#[cfg(target_arch = "wasm32")]
pub fn warn(message: &str) {
    web_sys::console::warn_1(&message.into());
}

#[cfg(target_arch = "wasm32")]
pub fn error(message: &str) {
    web_sys::console::error_1(&message.into());
}

#[cfg(target_arch = "wasm32")]
pub fn debug(message: &str) {
    web_sys::console::debug_1(&message.into());
}

#[cfg(not(target_arch = "wasm32"))]
pub fn warn(message: &str) {
    eprintln!("WARN {message}");
}

#[cfg(not(target_arch = "wasm32"))]
pub fn error(message: &str) {
    eprintln!("ERROR {message}");
}

#[cfg(not(target_arch = "wasm32"))]
pub fn debug(_message: &str) {}
