//! Dashboard authentication
//!
//! One check decides access for every gated route:
//! [`Authenticator::is_authenticated`]. A request passes with either
//!
//! - a valid HS256 JWT, from `Authorization: Bearer` or the `token` cookie, or
//! - the shared dashboard password, from the `password` cookie or the
//!   `X-Dashboard-Password` header (older clients). The cookie carries it
//!   URL-safe Base64 encoded, see [`password_cookie_value`].
//!
//! The JWT is what `/login` hands out in exchange for the shared password.
//! Without a configured password the dashboard is open.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const TOKEN_COOKIE: &str = "token";
pub const PASSWORD_COOKIE: &str = "password";
pub const PASSWORD_HEADER: &str = "x-dashboard-password";

/// Shortest accepted JWT signing secret
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("no dashboard password is configured")]
    NotConfigured,
    #[error("invalid password")]
    InvalidCredentials,
    #[error("JWT secret must be at least 32 characters")]
    WeakSecret,
    #[error("token error: {0}")]
    Token(String),
}

/// JWT payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
}

/// Credentials presented with a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub token: Option<String>,
    pub password: Option<String>,
}

impl AuthContext {
    /// Collect credentials from request headers. Header names are matched
    /// case-insensitively; an `Authorization` header wins over the cookie.
    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut ctx = AuthContext::default();
        let mut cookie_token = None;
        let mut cookie_password = None;

        for (name, value) in headers {
            match name.to_ascii_lowercase().as_str() {
                "authorization" => {
                    if let Some(token) = bearer_token(value) {
                        ctx.token = Some(token.to_string());
                    }
                }
                PASSWORD_HEADER => ctx.password = Some(value.to_string()),
                "cookie" => {
                    if let Some(v) = cookie_value(value, TOKEN_COOKIE) {
                        cookie_token = Some(v.to_string());
                    }
                    if let Some(v) = cookie_value(value, PASSWORD_COOKIE) {
                        cookie_password = decode_password_cookie(v);
                    }
                }
                _ => {}
            }
        }

        ctx.token = ctx.token.or(cookie_token);
        ctx.password = ctx.password.or(cookie_password);
        ctx
    }
}

fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

/// Value of cookie `name` in a `Cookie` header, if present and non-empty
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

/// Cookie-safe form of the password. Raw passwords may hold `;`, spaces or
/// non-ASCII text, none of which survive a `Set-Cookie` header.
pub fn password_cookie_value(password: &str) -> String {
    URL_SAFE_NO_PAD.encode(password)
}

fn decode_password_cookie(value: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(value).ok()?;
    String::from_utf8(bytes).ok()
}

/// What a successful login yields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginGrant {
    /// Signed token for the `token` cookie
    Token(String),
    /// No signing secret configured; the password itself is the credential
    Password,
}

#[derive(Clone)]
struct JwtKeys {
    secret: String,
    expiry_seconds: u64,
}

/// The authentication boundary
#[derive(Clone)]
pub struct Authenticator {
    password: Option<String>,
    jwt: Option<JwtKeys>,
}

impl Authenticator {
    pub fn new(
        password: Option<String>,
        jwt_secret: Option<String>,
        expiry_seconds: u64,
    ) -> Result<Self, AuthError> {
        let jwt = match jwt_secret.filter(|s| !s.is_empty()) {
            Some(secret) if secret.len() < MIN_SECRET_LEN => return Err(AuthError::WeakSecret),
            Some(secret) => Some(JwtKeys { secret, expiry_seconds }),
            None => None,
        };

        Ok(Self {
            password: password.filter(|p| !p.is_empty()),
            jwt,
        })
    }

    /// No credentials required
    pub fn open() -> Self {
        Self { password: None, jwt: None }
    }

    pub fn is_open(&self) -> bool {
        self.password.is_none()
    }

    pub fn issues_tokens(&self) -> bool {
        self.jwt.is_some()
    }

    pub fn is_authenticated(&self, ctx: &AuthContext) -> bool {
        let Some(expected) = self.password.as_deref() else {
            return true;
        };

        if let Some(token) = ctx.token.as_deref() {
            match self.verify_token(token) {
                Ok(_) => return true,
                Err(e) => debug!(error = %e, "token rejected"),
            }
        }

        ctx.password
            .as_deref()
            .map(|given| constant_time_eq(given.as_bytes(), expected.as_bytes()))
            .unwrap_or(false)
    }

    /// Exchange the shared password for a credential
    pub fn login(&self, password: &str) -> Result<LoginGrant, AuthError> {
        let expected = self.password.as_deref().ok_or(AuthError::NotConfigured)?;
        if !constant_time_eq(password.as_bytes(), expected.as_bytes()) {
            return Err(AuthError::InvalidCredentials);
        }

        match &self.jwt {
            Some(keys) => {
                let now = chrono::Utc::now().timestamp().max(0) as u64;
                let claims = Claims {
                    sub: "dashboard".to_string(),
                    iat: now,
                    exp: now + keys.expiry_seconds,
                };
                encode(&Header::default(), &claims, &EncodingKey::from_secret(keys.secret.as_bytes()))
                    .map(LoginGrant::Token)
                    .map_err(|e| AuthError::Token(e.to_string()))
            }
            None => Ok(LoginGrant::Password),
        }
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let keys = self
            .jwt
            .as_ref()
            .ok_or_else(|| AuthError::Token("token signing is not configured".to_string()))?;

        decode::<Claims>(token, &DecodingKey::from_secret(keys.secret.as_bytes()), &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                let msg = match e.kind() {
                    ErrorKind::ExpiredSignature => "token expired",
                    ErrorKind::InvalidSignature => "invalid signature",
                    ErrorKind::InvalidToken => "invalid token",
                    _ => "token validation failed",
                };
                AuthError::Token(msg.to_string())
            })
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
