use std::rc::Rc;

use futures::future::LocalBoxFuture;
use gloo_net::http::{Request, RequestBuilder, Response};
use rivers_shared::{FavoriteRequest, NoteRequest, UserNote, UserPreferences};

use crate::api::encode_path_segment;
use crate::auth::TokenSource;
use crate::error::ClientError;
use crate::orchestrator::FavoritesSource;

pub fn preferences_url(base_url: &str) -> String {
    format!("{base_url}/user/preferences")
}

pub fn favorites_url(base_url: &str) -> String {
    format!("{base_url}/user/preferences/favorites")
}

pub fn note_url(base_url: &str, river_id: &str) -> String {
    format!("{base_url}/user/notes/{}", encode_path_segment(river_id))
}

/// Authenticated client for the user's favorites and notes. Every call
/// needs a credential; writes are fire-and-confirm.
#[derive(Clone)]
pub struct PreferencesClient {
    base_url: String,
    tokens: Rc<dyn TokenSource>,
}

enum Method {
    Get,
    Post,
    Delete,
}

impl PreferencesClient {
    pub fn new(base_url: impl Into<String>, tokens: Rc<dyn TokenSource>) -> Self {
        Self {
            base_url: base_url.into(),
            tokens,
        }
    }

    async fn authorized(&self, method: Method, url: &str) -> Result<RequestBuilder, ClientError> {
        let token = self
            .tokens
            .id_token()
            .await
            .ok_or(ClientError::AuthRequired)?;
        let builder = match method {
            Method::Get => Request::get(url),
            Method::Post => Request::post(url),
            Method::Delete => Request::delete(url),
        };
        Ok(builder.header("Authorization", &format!("Bearer {token}")))
    }

    /// `None` when the user has never saved preferences.
    pub async fn get_preferences(&self) -> Result<Option<UserPreferences>, ClientError> {
        let url = preferences_url(&self.base_url);
        let resp = self.authorized(Method::Get, &url).await?.send().await?;
        read_optional(resp).await
    }

    pub async fn favorite_ids(&self) -> Result<Vec<String>, ClientError> {
        Ok(self
            .get_preferences()
            .await?
            .map(|prefs| prefs.favorite_rivers)
            .unwrap_or_default())
    }

    pub async fn add_favorite(&self, river_id: &str) -> Result<(), ClientError> {
        self.send_favorite(Method::Post, river_id).await
    }

    pub async fn remove_favorite(&self, river_id: &str) -> Result<(), ClientError> {
        self.send_favorite(Method::Delete, river_id).await
    }

    async fn send_favorite(&self, method: Method, river_id: &str) -> Result<(), ClientError> {
        let url = favorites_url(&self.base_url);
        let body = FavoriteRequest {
            site_code: river_id.to_string(),
        };
        let resp = self
            .authorized(method, &url)
            .await?
            .json(&body)?
            .send()
            .await?;
        ensure_ok(&resp)
    }

    /// `None` when no note exists for the river.
    pub async fn get_note(&self, river_id: &str) -> Result<Option<UserNote>, ClientError> {
        let url = note_url(&self.base_url, river_id);
        let resp = self.authorized(Method::Get, &url).await?.send().await?;
        read_optional(resp).await
    }

    /// Create or replace the note.
    pub async fn save_note(&self, river_id: &str, text: &str) -> Result<(), ClientError> {
        let url = note_url(&self.base_url, river_id);
        let body = NoteRequest {
            note: text.to_string(),
        };
        let resp = self
            .authorized(Method::Post, &url)
            .await?
            .json(&body)?
            .send()
            .await?;
        ensure_ok(&resp)
    }

    pub async fn delete_note(&self, river_id: &str) -> Result<(), ClientError> {
        let url = note_url(&self.base_url, river_id);
        let resp = self.authorized(Method::Delete, &url).await?.send().await?;
        ensure_ok(&resp)
    }
}

impl FavoritesSource for PreferencesClient {
    fn favorite_ids(&self) -> LocalBoxFuture<'static, Result<Vec<String>, ClientError>> {
        let client = self.clone();
        Box::pin(async move { client.favorite_ids().await })
    }
}

fn ensure_ok(resp: &Response) -> Result<(), ClientError> {
    if resp.ok() {
        Ok(())
    } else {
        Err(ClientError::Request {
            status: resp.status(),
            message: resp.status_text(),
        })
    }
}

async fn read_optional<T: serde::de::DeserializeOwned>(
    resp: Response,
) -> Result<Option<T>, ClientError> {
    if resp.status() == 404 {
        return Ok(None);
    }
    ensure_ok(&resp)?;
    resp.json::<T>()
        .await
        .map(Some)
        .map_err(|e| ClientError::Network(format!("parse error: {e}")))
}
