use crate::models::{
    AuthUser, ErrorResponse, Profile, Session, SignInRequest, SignUpRequest, SwipeRecord,
};
use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use validator::Validate;

/// Errors that can occur when talking to the Supabase backend
#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("No active session")]
    NoSession,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Table names used by the app
#[derive(Debug, Clone)]
pub struct SupabaseTables {
    pub profiles: String,
    pub swipes: String,
}

impl Default for SupabaseTables {
    fn default() -> Self {
        Self {
            profiles: "profiles".to_string(),
            swipes: "swipes".to_string(),
        }
    }
}

/// Refresh this many seconds before the access token actually expires
const EXPIRY_LEEWAY_SECS: i64 = 30;

/// Supabase auth + table API client
///
/// Holds the signed-in session. Table requests are made with the user's
/// access token when signed in and with the anon key otherwise.
pub struct SupabaseClient {
    base_url: String,
    anon_key: String,
    client: Client,
    tables: SupabaseTables,
    session: RwLock<Option<Session>>,
}

impl SupabaseClient {
    pub fn new(
        base_url: String,
        anon_key: String,
        tables: SupabaseTables,
        timeout: Duration,
    ) -> Result<Self, SupabaseError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            client,
            tables,
            session: RwLock::new(None),
        })
    }

    pub fn tables(&self) -> &SupabaseTables {
        &self.tables
    }

    /// Copy of the current session, if signed in
    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// Create an account. When the backend signs the user in straight away
    /// (no email confirmation) a profile row is created for them as well.
    /// If that insert fails the new session is dropped.
    pub async fn create_account(&self, req: &SignUpRequest) -> Result<AuthUser, SupabaseError> {
        req.validate()?;

        let url = format!("{}/auth/v1/signup", self.base_url);
        let body = json!({
            "email": req.email,
            "password": req.password,
            "data": { "name": req.name },
        });

        let response = self.anon(self.client.post(&url)).json(&body).send().await?;
        let json: Value = Self::parse(response).await?;

        // Signed in immediately: the body is a session. Otherwise it is the
        // bare user awaiting confirmation.
        if json.get("access_token").is_some() {
            let session: Session = serde_json::from_value(json)
                .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse session: {}", e)))?;
            let user = session.user.clone();
            *self.session.write().await = Some(session);

            // The account exists either way; on failure the caller is left
            // signed out and can sign in again to retry the profile
            let profile = Profile::new(user.id.clone(), req.name.clone());
            if let Err(e) = self.insert_profile(&profile).await {
                self.session.write().await.take();
                return Err(e);
            }

            tracing::info!("Created account and profile for {}", user.id);
            Ok(user)
        } else {
            let user: AuthUser = serde_json::from_value(json.get("user").cloned().unwrap_or(json))
                .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse user: {}", e)))?;

            tracing::info!("Created account {} (awaiting confirmation)", user.id);
            Ok(user)
        }
    }

    /// Sign in with email and password
    pub async fn sign_in(&self, req: &SignInRequest) -> Result<Session, SupabaseError> {
        req.validate()?;

        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        let body = json!({ "email": req.email, "password": req.password });

        let response = self.anon(self.client.post(&url)).json(&body).send().await?;
        let session: Session = Self::parse(response).await?;

        tracing::info!("Signed in as {}", session.user.id);
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    /// Exchange the refresh token for a new session
    pub async fn refresh_session(&self) -> Result<Session, SupabaseError> {
        let refresh_token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.refresh_token.clone())
            .ok_or(SupabaseError::NoSession)?;

        let url = format!("{}/auth/v1/token?grant_type=refresh_token", self.base_url);
        let response = self
            .anon(self.client.post(&url))
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        let session: Session = Self::parse(response).await?;

        tracing::debug!("Refreshed session for {}", session.user.id);
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    /// Sign out. The local session is dropped even if the backend call fails.
    pub async fn sign_out(&self) -> Result<(), SupabaseError> {
        let Some(session) = self.session.write().await.take() else {
            return Ok(());
        };

        let url = format!("{}/auth/v1/logout", self.base_url);
        let response = self
            .anon(self.client.post(&url))
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        tracing::info!("Signed out {}", session.user.id);
        Ok(())
    }

    /// Fetch the signed-in user from the auth API
    pub async fn get_current_user(&self) -> Result<AuthUser, SupabaseError> {
        let token = self.access_token().await?;
        let url = format!("{}/auth/v1/user", self.base_url);

        let response = self
            .anon(self.client.get(&url))
            .bearer_auth(token)
            .send()
            .await?;

        Self::parse(response).await
    }

    /// Fetch a profile row by user id
    pub async fn get_profile(&self, user_id: &str) -> Result<Profile, SupabaseError> {
        let url = format!(
            "{}/rest/v1/{}?id=eq.{}&select=*",
            self.base_url,
            self.tables.profiles,
            urlencoding::encode(user_id)
        );

        tracing::debug!("Fetching profile for user: {}", user_id);

        let response = self.authed(self.client.get(&url)).await?.send().await?;
        let mut rows: Vec<Profile> = Self::parse(response).await?;

        if rows.is_empty() {
            return Err(SupabaseError::NotFound(format!("Profile not found for user {}", user_id)));
        }
        Ok(rows.swap_remove(0))
    }

    /// Insert or update a profile row, stamping `updated_at`
    pub async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, SupabaseError> {
        profile.validate()?;

        let mut row = profile.clone();
        row.updated_at = Some(Utc::now());

        let url = format!("{}/rest/v1/{}", self.base_url, self.tables.profiles);
        let response = self
            .authed(self.client.post(&url))
            .await?
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&row)
            .send()
            .await?;

        let mut rows: Vec<Profile> = Self::parse(response).await?;
        if rows.is_empty() {
            return Err(SupabaseError::InvalidResponse("Upsert returned no rows".into()));
        }

        tracing::debug!("Upserted profile {}", row.id);
        Ok(rows.swap_remove(0))
    }

    /// List profiles for the swipe deck, optionally excluding the viewer
    pub async fn list_profiles(
        &self,
        exclude_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Profile>, SupabaseError> {
        let mut url = format!(
            "{}/rest/v1/{}?select=*&order=created_at.desc&limit={}",
            self.base_url, self.tables.profiles, limit
        );
        if let Some(id) = exclude_id {
            url.push_str(&format!("&id=neq.{}", urlencoding::encode(id)));
        }

        let response = self.authed(self.client.get(&url)).await?.send().await?;
        let profiles: Vec<Profile> = Self::parse(response).await?;

        tracing::debug!("Listed {} profiles", profiles.len());
        Ok(profiles)
    }

    /// Persist a swipe decision
    pub async fn record_swipe(&self, record: &SwipeRecord) -> Result<(), SupabaseError> {
        let url = format!("{}/rest/v1/{}", self.base_url, self.tables.swipes);

        let response = self
            .authed(self.client.post(&url))
            .await?
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        tracing::debug!(
            "Recorded swipe: {} -> {} ({})",
            record.user_id,
            record.target_id,
            record.direction
        );
        Ok(())
    }

    async fn insert_profile(&self, profile: &Profile) -> Result<(), SupabaseError> {
        let url = format!("{}/rest/v1/{}", self.base_url, self.tables.profiles);

        let response = self
            .authed(self.client.post(&url))
            .await?
            .header("Prefer", "return=minimal")
            .json(profile)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(())
    }

    /// Access token for the current session, refreshed if it is about to expire
    async fn access_token(&self) -> Result<String, SupabaseError> {
        let token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
            .ok_or(SupabaseError::NoSession)?;

        match token_expiry(&token) {
            Some(exp) if exp - EXPIRY_LEEWAY_SECS <= Utc::now().timestamp() => {
                tracing::debug!("Access token expired, refreshing");
                Ok(self.refresh_session().await?.access_token)
            }
            _ => Ok(token),
        }
    }

    fn anon(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("apikey", &self.anon_key)
    }

    /// Signed-out callers go out under the anon key. A session that cannot
    /// be refreshed is an error, not a silent downgrade.
    async fn authed(&self, builder: RequestBuilder) -> Result<RequestBuilder, SupabaseError> {
        let builder = self.anon(builder);
        match self.access_token().await {
            Ok(token) => Ok(builder.bearer_auth(token)),
            Err(SupabaseError::NoSession) => Ok(builder.bearer_auth(&self.anon_key)),
            Err(e) => Err(e),
        }
    }

    async fn parse<T>(response: Response) -> Result<T, SupabaseError>
    where
        T: for<'de> Deserialize<'de>,
    {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| SupabaseError::InvalidResponse(format!("{}: {}", e, body)))
    }

    async fn error_from(response: Response) -> SupabaseError {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read body".to_string());

        let message = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .and_then(|e| e.describe())
            .unwrap_or(body);

        tracing::error!("Supabase request failed: {} - {}", status, message);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SupabaseError::Unauthorized(message),
            StatusCode::NOT_FOUND => SupabaseError::NotFound(message),
            _ => SupabaseError::ApiError {
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    exp: i64,
}

/// Expiry (unix seconds) of a JWT access token.
///
/// The signature is not checked: the backend does that on every request,
/// the client only needs to know when to refresh.
pub fn token_expiry(token: &str) -> Option<i64> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()
        .map(|data| data.claims.exp)
}
