use std::cell::RefCell;
use std::rc::{Rc, Weak};

use futures::future::LocalBoxFuture;
use serde::Deserialize;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::error::ClientError;
use crate::log;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
}

impl AuthUser {
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("Signed in")
    }
}

type Listener = Rc<dyn Fn(Option<&AuthUser>)>;

#[derive(Default)]
struct HubInner {
    /// `None` until the provider reports its initial state.
    state: Option<Option<AuthUser>>,
    listeners: Vec<(u64, Listener)>,
    next_id: u64,
}

/// Replaying observable of the current user.
///
/// Subscribers registered after the initial state is known are called
/// immediately with it; earlier subscribers get it on the first publish.
#[derive(Clone, Default)]
pub struct AuthHub {
    inner: Rc<RefCell<HubInner>>,
}

pub struct Subscription {
    hub: Weak<RefCell<HubInner>>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.borrow_mut().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

impl AuthHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn(Option<&AuthUser>) + 'static) -> Subscription {
        let listener: Listener = Rc::new(listener);
        let (id, known) = {
            let mut inner = self.inner.borrow_mut();
            inner.next_id += 1;
            let id = inner.next_id;
            inner.listeners.push((id, Rc::clone(&listener)));
            (id, inner.state.clone())
        };
        if let Some(user) = known {
            listener(user.as_ref());
        }
        Subscription {
            hub: Rc::downgrade(&self.inner),
            id,
        }
    }

    pub fn publish(&self, user: Option<AuthUser>) {
        let listeners: Vec<Listener> = {
            let mut inner = self.inner.borrow_mut();
            inner.state = Some(user.clone());
            inner.listeners.iter().map(|(_, l)| Rc::clone(l)).collect()
        };
        for listener in listeners {
            listener(user.as_ref());
        }
    }

    pub fn current(&self) -> Option<AuthUser> {
        self.inner.borrow().state.clone().flatten()
    }
}

/// Third-party sign-in provider.
pub trait IdentityProvider {
    fn sign_in(&self) -> LocalBoxFuture<'static, Result<AuthUser, ClientError>>;
    fn sign_out(&self) -> LocalBoxFuture<'static, Result<(), ClientError>>;
    fn id_token(&self) -> LocalBoxFuture<'static, Option<String>>;
    /// Forward every provider state change into `hub`, starting with the
    /// initial one.
    fn watch(&self, hub: AuthHub);
}

/// Bearer credential for authenticated requests.
pub trait TokenSource {
    fn id_token(&self) -> LocalBoxFuture<'static, Option<String>>;
}

#[derive(Clone)]
pub struct AuthService {
    hub: AuthHub,
    provider: Rc<dyn IdentityProvider>,
}

impl AuthService {
    pub fn new(provider: Rc<dyn IdentityProvider>) -> Self {
        let hub = AuthHub::new();
        provider.watch(hub.clone());
        Self { hub, provider }
    }

    pub async fn sign_in(&self) -> Result<AuthUser, ClientError> {
        self.provider.sign_in().await
    }

    pub async fn sign_out(&self) -> Result<(), ClientError> {
        self.provider.sign_out().await
    }

    pub fn subscribe(&self, listener: impl Fn(Option<&AuthUser>) + 'static) -> Subscription {
        self.hub.subscribe(listener)
    }

    pub fn is_signed_in(&self) -> bool {
        self.hub.current().is_some()
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.hub.current()
    }
}

impl TokenSource for AuthService {
    fn id_token(&self) -> LocalBoxFuture<'static, Option<String>> {
        if !self.is_signed_in() {
            return Box::pin(async { None });
        }
        self.provider.id_token()
    }
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = riversAuth, js_name = signIn)]
    fn js_sign_in() -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = riversAuth, js_name = signOut)]
    fn js_sign_out() -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = riversAuth, js_name = getIdToken)]
    fn js_get_id_token() -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = riversAuth, js_name = onAuthStateChanged)]
    fn js_on_auth_state_changed(callback: &Closure<dyn Fn(JsValue)>) -> Result<JsValue, JsValue>;
}

thread_local! {
    static AUTH_STATE_CALLBACK: RefCell<Option<Closure<dyn Fn(JsValue)>>> = const { RefCell::new(None) };
}

/// Bridge to the `window.riversAuth` object installed by the host page,
/// which wraps the identity provider's SDK.
pub struct JsIdentityProvider;

fn js_error_message(value: &JsValue) -> String {
    if let Some(message) = value.as_string() {
        return message;
    }
    js_sys::Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}

fn decode_user(value: JsValue) -> Option<AuthUser> {
    if value.is_null() || value.is_undefined() {
        return None;
    }
    match serde_wasm_bindgen::from_value::<AuthUser>(value) {
        Ok(user) => Some(user),
        Err(e) => {
            log::warn(&format!("unreadable auth user: {e}"));
            None
        }
    }
}

impl IdentityProvider for JsIdentityProvider {
    fn sign_in(&self) -> LocalBoxFuture<'static, Result<AuthUser, ClientError>> {
        Box::pin(async {
            let promise = js_sign_in().map_err(|e| ClientError::Auth(js_error_message(&e)))?;
            let value = JsFuture::from(promise)
                .await
                .map_err(|e| ClientError::Auth(js_error_message(&e)))?;
            decode_user(value).ok_or_else(|| ClientError::Auth("sign-in was cancelled".into()))
        })
    }

    fn sign_out(&self) -> LocalBoxFuture<'static, Result<(), ClientError>> {
        Box::pin(async {
            let promise = js_sign_out().map_err(|e| ClientError::Auth(js_error_message(&e)))?;
            JsFuture::from(promise)
                .await
                .map_err(|e| ClientError::Auth(js_error_message(&e)))?;
            Ok(())
        })
    }

    fn id_token(&self) -> LocalBoxFuture<'static, Option<String>> {
        Box::pin(async {
            let promise = js_get_id_token().ok()?;
            match JsFuture::from(promise).await {
                Ok(token) => token.as_string().filter(|t| !t.is_empty()),
                Err(e) => {
                    log::warn(&format!("id token unavailable: {}", js_error_message(&e)));
                    None
                }
            }
        })
    }

    fn watch(&self, hub: AuthHub) {
        let publisher = hub.clone();
        let callback = Closure::<dyn Fn(JsValue)>::new(move |user: JsValue| {
            publisher.publish(decode_user(user));
        });
        match js_on_auth_state_changed(&callback) {
            Ok(_) => {
                AUTH_STATE_CALLBACK.with(|slot| {
                    *slot.borrow_mut() = Some(callback);
                });
            }
            Err(e) => {
                // No provider on the page: behave as permanently signed out.
                log::warn(&format!("identity provider unavailable: {}", js_error_message(&e)));
                hub.publish(None);
            }
        }
    }
}
