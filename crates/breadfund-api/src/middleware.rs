use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use breadfund_db::models::UserRow;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};

/// The authenticated caller, resolved from the bearer token's subject.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: String,
    pub email: String,
}

impl From<UserRow> for Principal {
    fn from(user: UserRow) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

/// Verify the bearer token and load its user. A token whose user no longer
/// exists is rejected the same way as a bad token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(ApiError::InvalidAccessToken)?;

    let claims = state.tokens.verify(bearer.token())?;

    let user_id = claims.sub.to_string();
    let principal = state
        .unit_of_work(move |s| {
            s.get_user_by_id(&user_id)?
                .map(Principal::from)
                .ok_or(ApiError::InvalidAccessToken)
        })
        .await?;

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}
