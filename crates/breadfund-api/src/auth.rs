use std::sync::Arc;

use anyhow::anyhow;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{error, info};
use uuid::Uuid;

use breadfund_db::models::{NewUser, UserRow};
use breadfund_db::{Database, Session};
use breadfund_types::api::{ACCESS_TOKEN_PURPOSE, Claims, LoginForm, LoginResponse, SignupRequest};

use crate::error::{ApiError, ApiResult, USER_EMAIL_EXISTS, USER_NOT_FOUND};
use crate::extract::{ApiForm, ApiJson};

/// Access tokens live for 24 hours from issuance.
pub const TOKEN_LIFETIME_HOURS: i64 = 24;

pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*()-+=?.,:;<>[]{}~";

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenConfig,
    /// Base URL encoded into QR codes when the caller does not supply one.
    pub public_url: String,
    pub max_upload_bytes: usize,
}

impl AppStateInner {
    /// Run `f` as one transaction on the blocking pool: commit on `Ok`,
    /// roll back on `Err`.
    pub async fn unit_of_work<T, F>(self: &Arc<Self>, f: F) -> ApiResult<T>
    where
        F: FnOnce(&Session<'_>) -> ApiResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let state = Arc::clone(self);
        blocking(move || state.db.unit_of_work(f)).await
    }
}

/// Run CPU-bound work (Argon2) on the blocking pool. Keep it out of
/// `unit_of_work` so the store lock is never held while hashing.
pub async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow!("worker task failed"))
    })?
}

/// Symmetric signing settings, fixed at process start.
pub struct TokenConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    /// Placeholder URL carried in the `iss` claim.
    pub issuer: String,
}

impl TokenConfig {
    pub fn claims_for(&self, user_id: Uuid, issued_at: chrono::DateTime<chrono::Utc>) -> Claims {
        let now = issued_at.timestamp();
        Claims {
            iss: self.issuer.clone(),
            sub: user_id,
            iat: now,
            nbf: now,
            exp: (issued_at + chrono::Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
            jti: Uuid::new_v4().to_string(),
            prv: ACCESS_TOKEN_PURPOSE.to_string(),
        }
    }

    pub fn sign(&self, claims: &Claims) -> anyhow::Result<String> {
        let token = encode(
            &Header::new(self.algorithm),
            claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok(token)
    }

    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign(&self.claims_for(user_id, chrono::Utc::now()))
    }

    /// Check signature, algorithm, issuer, expiry and not-before.
    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_nbf = true;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "nbf", "iat", "sub", "iss"]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|_| ApiError::InvalidAccessToken)?;

        if data.claims.prv != ACCESS_TOKEN_PURPOSE {
            return Err(ApiError::InvalidAccessToken);
        }
        Ok(data.claims)
    }
}

/// Registration-only password rule: at least six characters, one digit and
/// one symbol from [`PASSWORD_SYMBOLS`], nothing outside word characters
/// plus that symbol set.
pub fn password_meets_policy(password: &str) -> bool {
    let is_symbol = |c: char| PASSWORD_SYMBOLS.contains(c);

    password.chars().count() >= PASSWORD_MIN_LEN
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(is_symbol)
        && password
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || is_symbol(c))
}

fn validate_signup(req: &SignupRequest) -> ApiResult<()> {
    let valid_email = req
        .email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty() && !domain.contains('@'));
    if !valid_email {
        return Err(ApiError::Validation("email: not a valid email address".into()));
    }
    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err(ApiError::Validation("first_name and last_name must not be empty".into()));
    }
    if !password_meets_policy(&req.password) {
        return Err(ApiError::Validation(format!(
            "password: at least {} characters with a digit and one of {}",
            PASSWORD_MIN_LEN, PASSWORD_SYMBOLS
        )));
    }
    Ok(())
}

fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

/// Look the user up by (lowercased) email.
pub fn find_user(session: &Session<'_>, email: &str) -> ApiResult<UserRow> {
    session
        .get_user_by_email(&email.to_lowercase())?
        .ok_or(ApiError::NotFound(USER_NOT_FOUND))
}

pub fn verify_password(stored_hash: &str, password: &str) -> ApiResult<()> {
    let parsed_hash =
        PasswordHash::new(stored_hash).map_err(|e| anyhow!("stored hash unreadable: {}", e))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::InvalidCredentials)
}

/// Resolve the user for `email` and check `password` against its hash.
/// The row is read in its own unit of work; verification runs after the
/// transaction has been released.
pub async fn authenticate(state: &AppState, email: String, password: String) -> ApiResult<UserRow> {
    let user = state.unit_of_work(move |s| find_user(s, &email)).await?;

    blocking(move || {
        verify_password(&user.password, &password)?;
        Ok(user)
    })
    .await
}

pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_signup(&req)?;
    let SignupRequest {
        email,
        first_name,
        last_name,
        password,
        gender,
    } = req;
    let email = email.to_lowercase();

    // Hash password with Argon2id
    let password_hash = blocking(move || Ok(hash_password(&password)?)).await?;

    state
        .unit_of_work(move |s| {
            if s.get_user_by_email(&email)?.is_some() {
                return Err(ApiError::BadRequest(USER_EMAIL_EXISTS));
            }

            let user_id = Uuid::new_v4().to_string();
            let created = s.create_user(&NewUser {
                id: &user_id,
                email: &email,
                first_name: first_name.trim(),
                last_name: last_name.trim(),
                gender: gender.as_str(),
                password_hash: &password_hash,
            })?;
            if !created {
                return Err(ApiError::BadRequest(USER_EMAIL_EXISTS));
            }

            info!("User {} registered", user_id);
            Ok(())
        })
        .await?;

    Ok(StatusCode::CREATED)
}

pub async fn login(
    State(state): State<AppState>,
    ApiForm(form): ApiForm<LoginForm>,
) -> ApiResult<impl IntoResponse> {
    let user = authenticate(&state, form.username, form.password).await?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| anyhow!("corrupt user id '{}': {}", user.id, e))?;

    let access_token = state.tokens.issue(user_id)?;

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> TokenConfig {
        TokenConfig {
            secret: "unit-test-secret".into(),
            algorithm: Algorithm::HS256,
            issuer: "http://localhost:8000".into(),
        }
    }

    #[test]
    fn password_policy() {
        assert!(password_meets_policy("Abc123!"));
        assert!(password_meets_policy("a_b1c#"));
        assert!(!password_meets_policy("Ab1!"), "too short");
        assert!(!password_meets_policy("Abcdef!"), "no digit");
        assert!(!password_meets_policy("Abc1234"), "no symbol");
        assert!(!password_meets_policy("Abc 123!"), "space is not allowed");
    }

    #[test]
    fn issued_token_verifies_with_expected_claims() {
        let tokens = tokens();
        let user_id = Uuid::new_v4();

        let claims = tokens.verify(&tokens.issue(user_id).unwrap()).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.prv, ACCESS_TOKEN_PURPOSE);
        assert_eq!(claims.iss, "http://localhost:8000");
        assert_eq!(claims.exp - claims.iat, TOKEN_LIFETIME_HOURS * 3600);
        assert_eq!(claims.nbf, claims.iat);
    }

    #[test]
    fn each_token_has_a_unique_id() {
        let tokens = tokens();
        let user_id = Uuid::new_v4();
        let now = chrono::Utc::now();
        assert_ne!(tokens.claims_for(user_id, now).jti, tokens.claims_for(user_id, now).jti);
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = tokens();
        let issued = chrono::Utc::now() - chrono::Duration::days(2);
        let token = tokens.sign(&tokens.claims_for(Uuid::new_v4(), issued)).unwrap();

        assert!(matches!(tokens.verify(&token), Err(ApiError::InvalidAccessToken)));
    }

    #[test]
    fn not_yet_valid_token_is_rejected() {
        let tokens = tokens();
        let issued = chrono::Utc::now() + chrono::Duration::hours(1);
        let token = tokens.sign(&tokens.claims_for(Uuid::new_v4(), issued)).unwrap();

        assert!(matches!(tokens.verify(&token), Err(ApiError::InvalidAccessToken)));
    }

    #[test]
    fn wrong_secret_or_garbage_is_rejected() {
        let token = tokens().issue(Uuid::new_v4()).unwrap();
        let other = TokenConfig {
            secret: "another-secret".into(),
            ..tokens()
        };

        assert!(matches!(other.verify(&token), Err(ApiError::InvalidAccessToken)));
        assert!(matches!(tokens().verify("not.a.jwt"), Err(ApiError::InvalidAccessToken)));
    }

    #[test]
    fn token_with_other_purpose_is_rejected() {
        let tokens = tokens();
        let mut claims = tokens.claims_for(Uuid::new_v4(), chrono::Utc::now());
        claims.prv = "refresh".into();
        let token = tokens.sign(&claims).unwrap();

        assert!(matches!(tokens.verify(&token), Err(ApiError::InvalidAccessToken)));
    }

    fn state_with_user(email: &str, password: &str) -> AppState {
        let db = Database::open_in_memory().unwrap();
        let hash = hash_password(password).unwrap();
        db.unit_of_work(|s| {
            s.create_user(&NewUser {
                id: &Uuid::new_v4().to_string(),
                email,
                first_name: "Ada",
                last_name: "Obi",
                gender: "female",
                password_hash: &hash,
            })
        })
        .unwrap();

        Arc::new(AppStateInner {
            db,
            tokens: tokens(),
            public_url: "http://localhost:8000".into(),
            max_upload_bytes: 1024,
        })
    }

    #[test]
    fn password_hash_verifies_without_a_session() {
        let hash = hash_password("Abc123!").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(&hash, "Abc123!").is_ok());
        assert!(matches!(verify_password(&hash, "Abc124!"), Err(ApiError::InvalidCredentials)));
        assert!(matches!(verify_password("not-a-phc-string", "x"), Err(ApiError::Internal(_))));
    }

    #[tokio::test]
    async fn authenticate_checks_email_then_password() {
        let state = state_with_user("a@b.com", "Abc123!");

        let user = authenticate(&state, "A@B.com".into(), "Abc123!".into()).await.unwrap();
        assert_eq!(user.email, "a@b.com");

        let wrong = authenticate(&state, "a@b.com".into(), "nope1!".into()).await;
        assert!(matches!(wrong, Err(ApiError::InvalidCredentials)));

        let missing = authenticate(&state, "x@b.com".into(), "Abc123!".into()).await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));
    }
}
