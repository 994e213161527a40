//! Credential verification and session token issuance
//!
//! Sessions are stateless: the signed token in the session cookie is the
//! only record of a login, so nothing about a session lives in process
//! memory between requests.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    config::AdminConfig,
    error::{ApiError, ApiResult},
    jwt::JwtService,
    models::{LoginRequest, NewUser, Role, SignupRequest},
    repositories::{USERS_EMAIL_KEY, UserStore},
    validation::{normalize_email, validate_email, validate_name, validate_password},
};

/// Caller identity resolved from a session cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionUser {
    pub id: Uuid,
    pub role: Role,
}

/// A freshly issued session
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub role: Role,
}

/// Session manager for signup, login and session checks
#[derive(Clone)]
pub struct SessionManager {
    users: Arc<dyn UserStore>,
    jwt_service: JwtService,
    cookie_name: String,
    cookie_secure: bool,
}

fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {}", e);
            ApiError::InternalServerError
        })
}

fn verify_password(password: &str, password_hash: &str) -> ApiResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|e| {
        error!("Failed to parse password hash: {}", e);
        ApiError::InternalServerError
    })?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(
        users: Arc<dyn UserStore>,
        jwt_service: JwtService,
        cookie_name: impl Into<String>,
        cookie_secure: bool,
    ) -> Self {
        Self {
            users,
            jwt_service,
            cookie_name: cookie_name.into(),
            cookie_secure,
        }
    }

    /// Register a new account with the `user` role and log it in
    pub async fn signup(&self, req: SignupRequest) -> ApiResult<IssuedSession> {
        validate_name(&req.name).map_err(ApiError::Validation)?;
        validate_email(&req.email).map_err(ApiError::Validation)?;
        validate_password(&req.password).map_err(ApiError::Validation)?;

        let email = normalize_email(&req.email);
        if self.users.find_by_email(&email).await?.is_some() {
            warn!("Signup rejected, email already registered: {}", email);
            return Err(ApiError::DuplicateEmail);
        }

        let new_user = NewUser {
            name: req.name.trim().to_string(),
            email,
            password_hash: hash_password(&req.password)?,
            role: Role::User,
        };

        let user = self.users.create(&new_user).await.map_err(|e| {
            if e.violates(USERS_EMAIL_KEY) {
                ApiError::DuplicateEmail
            } else {
                e.into()
            }
        })?;

        info!("User {} ({}) signed up", user.id, user.email);
        self.issue(user.id, user.role)
    }

    /// Verify credentials and issue a session
    pub async fn login(&self, req: LoginRequest) -> ApiResult<IssuedSession> {
        if req.email.trim().is_empty() || req.password.is_empty() {
            return Err(ApiError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let email = normalize_email(&req.email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(ApiError::EmailNotFound)?;

        if !verify_password(&req.password, &user.password_hash)? {
            warn!("Login rejected, wrong password for user {}", user.id);
            return Err(ApiError::PasswordMismatch);
        }

        info!(
            "User {} logged in with {} ticket(s) on record",
            user.id,
            user.ticket_ids.len()
        );
        self.issue(user.id, user.role)
    }

    /// Resolve a session token to the caller's current identity and role
    pub async fn check_session(&self, token: Option<&str>) -> ApiResult<SessionUser> {
        let token = token.ok_or(ApiError::Unauthorized)?;

        let claims = self.jwt_service.validate_token(token).map_err(|e| {
            warn!("Rejected session token: {}", e);
            ApiError::InvalidToken
        })?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(ApiError::InvalidToken)?;

        Ok(SessionUser {
            id: user.id,
            role: user.role,
        })
    }

    /// Ensure the operator-configured admin account exists
    pub async fn provision_admin(&self, admin: &AdminConfig) -> ApiResult<()> {
        validate_email(&admin.email).map_err(ApiError::Validation)?;
        if admin.password.is_empty() {
            return Err(ApiError::Validation("Admin password is required".to_string()));
        }

        let email = normalize_email(&admin.email);
        if let Some(existing) = self.users.find_by_email(&email).await? {
            if existing.role == Role::Admin {
                info!("Admin account {} already present", email);
            } else {
                warn!(
                    "Account {} exists with role {}; leaving it unchanged",
                    email, existing.role
                );
            }
            return Ok(());
        }

        let new_user = NewUser {
            name: admin.name.trim().to_string(),
            email,
            password_hash: hash_password(&admin.password)?,
            role: Role::Admin,
        };
        let user = self.users.create(&new_user).await?;

        info!("Provisioned admin account {} for {}", user.id, user.name);
        Ok(())
    }

    /// Session token carried by the request, if any
    pub fn token_from<'a>(&self, jar: &'a CookieJar) -> Option<&'a str> {
        jar.get(&self.cookie_name).map(|cookie| cookie.value())
    }

    /// Cookie carrying a session token
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        let max_age = i64::try_from(self.jwt_service.token_ttl()).unwrap_or(i64::MAX);

        Cookie::build((self.cookie_name.clone(), token))
            .http_only(true)
            .secure(self.cookie_secure)
            .same_site(SameSite::None)
            .path("/")
            .max_age(time::Duration::seconds(max_age))
            .build()
    }

    /// Cookie that clears the session on the client
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build((self.cookie_name.clone(), ""))
            .http_only(true)
            .secure(self.cookie_secure)
            .same_site(SameSite::None)
            .path("/")
            .build();
        cookie.make_removal();
        cookie
    }

    fn issue(&self, user_id: Uuid, role: Role) -> ApiResult<IssuedSession> {
        let token = self.jwt_service.generate_token(user_id).map_err(|e| {
            error!("Failed to generate session token: {}", e);
            ApiError::InternalServerError
        })?;

        Ok(IssuedSession { token, role })
    }
}
