use std::{fmt, path::PathBuf, time::Duration};

use hostcraft_config::{HytaleAuthConfig, LogType};
use hostcraft_net::{HttpResponse, HttpTransport};
use serde_json::json;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    AuthError, CacheState, TokenCache,
    oauth::{
        AUTHORIZATION_PENDING, DEVICE_CODE_GRANT, DeviceAuthorization, GameSession, Profile,
        ProfilesResponse, REFRESH_TOKEN_GRANT, SLOW_DOWN, SessionResponse, TokenResponse,
        TokenSet,
    },
};

const SLOW_DOWN_STEP: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    NoCache,
    CachedValid,
    CachedInvalid,
    Authenticating,
    Authenticated,
    SessionActive,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthState::NoCache => "no-cache",
            AuthState::CachedValid => "cached-valid",
            AuthState::CachedInvalid => "cached-invalid",
            AuthState::Authenticating => "authenticating",
            AuthState::Authenticated => "authenticated",
            AuthState::SessionActive => "session-active",
        };
        f.write_str(name)
    }
}

type Prompt = Box<dyn Fn(&DeviceAuthorization) + Send + Sync>;

/// Obtains a game session for a Hytale server, reusing the cached refresh
/// token when the provider still accepts it.
pub struct HytaleAuthenticator<T: HttpTransport> {
    transport: T,
    config: HytaleAuthConfig,
    cache: TokenCache,
    prompt: Prompt,
}

impl<T: HttpTransport> HytaleAuthenticator<T> {
    pub fn new(transport: T, config: HytaleAuthConfig, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            transport,
            config,
            cache: TokenCache::new(cache_path),
            prompt: Box::new(default_prompt),
        }
    }

    /// Replaces the operator prompt shown when a device code is issued.
    pub fn with_prompt(
        mut self,
        prompt: impl Fn(&DeviceAuthorization) + Send + Sync + 'static,
    ) -> Self {
        self.prompt = Box::new(prompt);
        self
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    fn enter(&self, state: AuthState) {
        debug!(
            log_type = LogType::Authentication.as_str(),
            state = %state,
            "Authentication state changed"
        );
    }

    #[instrument(name = "hytale_session", skip_all)]
    pub async fn session(&self, cancel: &CancellationToken) -> Result<GameSession, AuthError> {
        match self.cache.load().await? {
            CacheState::Valid(record) => {
                self.enter(AuthState::CachedValid);
                match self.refresh(&record.refresh_token).await {
                    Ok(tokens) => {
                        let refresh_token = tokens
                            .refresh_token
                            .as_deref()
                            .unwrap_or(&record.refresh_token);
                        self.cache.store(refresh_token, &record.profile_uuid).await?;
                        self.enter(AuthState::Authenticated);
                        info!(
                            log_type = LogType::Authentication.as_str(),
                            "Refreshed credentials from cache"
                        );
                        return self
                            .create_session(&tokens.access_token, &record.profile_uuid, None)
                            .await;
                    }
                    Err(e) => {
                        self.enter(AuthState::CachedInvalid);
                        warn!(
                            log_type = LogType::Authentication.as_str(),
                            "Cached refresh token rejected ({}), starting interactive login", e
                        );
                        self.cache.clear().await?;
                    }
                }
            }
            CacheState::Invalid(_) => self.enter(AuthState::CachedInvalid),
            CacheState::Missing => self.enter(AuthState::NoCache),
        }

        let tokens = self.authenticate_interactive(cancel).await?;
        self.enter(AuthState::Authenticated);

        let profile = self.select_profile(&tokens.access_token).await?;
        info!(
            log_type = LogType::Authentication.as_str(),
            "Using profile {} ({})", profile.username, profile.uuid
        );

        match tokens.refresh_token.as_deref() {
            Some(refresh_token) => {
                self.cache.store(refresh_token, &profile.uuid).await?;
            }
            None => warn!(
                log_type = LogType::Authentication.as_str(),
                "No refresh token issued; the next start will need interactive login"
            ),
        }

        self.create_session(&tokens.access_token, &profile.uuid, Some(profile.username))
            .await
    }

    /// Exchanges a refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, AuthError> {
        let url = &self.config.endpoints.token;
        let response = self
            .transport
            .post_form(
                url,
                &[
                    ("grant_type", REFRESH_TOKEN_GRANT),
                    ("client_id", self.config.client_id.as_str()),
                    ("refresh_token", refresh_token),
                ],
                None,
            )
            .await?;

        let body: TokenResponse = response.json().unwrap_or_default();
        if let Some(error) = body.error {
            return Err(AuthError::AuthorizationError {
                error,
                description: body.error_description,
            });
        }
        if !response.is_success() {
            return Err(unexpected(url, &response));
        }
        token_set(url, &response, body)
    }

    /// Device-code grant. Polls until the operator approves, the provider
    /// returns a hard error, or `cancel` fires.
    pub async fn authenticate_interactive(
        &self,
        cancel: &CancellationToken,
    ) -> Result<TokenSet, AuthError> {
        self.enter(AuthState::Authenticating);

        let url = &self.config.endpoints.device_authorization;
        let response = self
            .transport
            .post_form(
                url,
                &[
                    ("client_id", self.config.client_id.as_str()),
                    ("scope", self.config.scope.as_str()),
                ],
                None,
            )
            .await?;
        if !response.is_success() {
            return Err(unexpected(url, &response));
        }
        let authorization: DeviceAuthorization =
            response.json().map_err(|_| unexpected(url, &response))?;

        (self.prompt)(&authorization);

        let mut interval = Duration::from_secs(
            authorization
                .interval
                .unwrap_or(self.config.default_poll_interval_secs)
                .max(1),
        );
        let token_url = &self.config.endpoints.token;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AuthError::Cancelled),
                _ = sleep(interval) => {}
            }

            let response = self
                .transport
                .post_form(
                    token_url,
                    &[
                        ("grant_type", DEVICE_CODE_GRANT),
                        ("device_code", authorization.device_code.as_str()),
                        ("client_id", self.config.client_id.as_str()),
                    ],
                    None,
                )
                .await?;

            let body: TokenResponse = response.json().unwrap_or_default();
            match body.error.as_deref() {
                Some(AUTHORIZATION_PENDING) => {
                    debug!(log_type = LogType::Authentication.as_str(), "Authorization pending");
                }
                Some(SLOW_DOWN) => {
                    interval += SLOW_DOWN_STEP;
                    debug!(
                        log_type = LogType::Authentication.as_str(),
                        "Provider asked to slow down, polling every {}s",
                        interval.as_secs()
                    );
                }
                Some(_) => {
                    return Err(AuthError::AuthorizationError {
                        error: body.error.unwrap_or_default(),
                        description: body.error_description,
                    });
                }
                None if response.is_success() => return token_set(token_url, &response, body),
                None => return Err(unexpected(token_url, &response)),
            }
        }
    }

    /// Lists the account's profiles and picks the configured one, or the first.
    pub async fn select_profile(&self, access_token: &str) -> Result<Profile, AuthError> {
        let url = &self.config.endpoints.profiles;
        let response = self.transport.get(url, Some(access_token)).await?;
        if !response.is_success() {
            return Err(unexpected(url, &response));
        }
        let mut listing: ProfilesResponse = response
            .json()
            .map_err(|_| unexpected(url, &response))?;

        if listing.profiles.is_empty() {
            return Err(AuthError::EmptyProfileSet);
        }

        let Some(requested) = self.config.profile.as_deref() else {
            return listing.profiles.into_iter().next().ok_or(AuthError::EmptyProfileSet);
        };

        match listing
            .profiles
            .iter()
            .position(|p| p.username.eq_ignore_ascii_case(requested) || p.uuid == requested)
        {
            Some(index) => Ok(listing.profiles.swap_remove(index)),
            None => Err(AuthError::ProfileNotFound {
                requested: requested.to_string(),
                available: listing.profiles.into_iter().map(|p| p.username).collect(),
            }),
        }
    }

    pub async fn create_session(
        &self,
        access_token: &str,
        profile_uuid: &str,
        username: Option<String>,
    ) -> Result<GameSession, AuthError> {
        let url = &self.config.endpoints.session;
        let response = self
            .transport
            .post_json(url, &json!({ "uuid": profile_uuid }), Some(access_token))
            .await?;
        if !response.is_success() {
            return Err(unexpected(url, &response));
        }

        let malformed = || AuthError::MalformedSessionResponse {
            body: response.excerpt(),
        };
        let parsed: SessionResponse = response.json().map_err(|_| malformed())?;

        let (Some(session_token), Some(identity_token)) = (
            parsed.session_token.filter(|t| !t.is_empty()),
            parsed.identity_token.filter(|t| !t.is_empty()),
        ) else {
            return Err(malformed());
        };

        self.enter(AuthState::SessionActive);
        Ok(GameSession {
            session_token,
            identity_token,
            profile_uuid: profile_uuid.to_string(),
            username,
            expires_at: parsed.expires_at,
        })
    }
}

fn token_set(
    url: &str,
    response: &HttpResponse,
    body: TokenResponse,
) -> Result<TokenSet, AuthError> {
    let access_token = body
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| unexpected(url, response))?;
    Ok(TokenSet {
        access_token,
        refresh_token: body.refresh_token.filter(|t| !t.is_empty()),
        expires_in: body.expires_in,
    })
}

fn unexpected(url: &str, response: &HttpResponse) -> AuthError {
    AuthError::UnexpectedResponse {
        url: url.to_string(),
        status: response.status,
        body: response.excerpt(),
    }
}

fn default_prompt(authorization: &DeviceAuthorization) {
    let uri = authorization.display_uri().unwrap_or("<no verification URL>");
    info!(
        log_type = LogType::Authentication.as_str(),
        "Waiting for device authorization at {}",
        uri
    );
    eprintln!();
    eprintln!("To authorize this server, open:");
    eprintln!("    {}", uri);
    if let Some(code) = &authorization.user_code {
        eprintln!("and confirm the code: {}", code);
    }
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_names() {
        assert_eq!(AuthState::NoCache.to_string(), "no-cache");
        assert_eq!(AuthState::SessionActive.to_string(), "session-active");
    }
}
