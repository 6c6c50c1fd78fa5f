use tracing::{info, warn};

use super::dto::{LoginRequest, PublicUser, RegisterRequest};
use super::password::{hash_password_async, verify_password_async};
use super::session::SessionIssuer;
use super::validation::{validate_login, validate_registration};
use crate::error::{ApiError, LOGIN_FAILED, REGISTER_FAILED};
use crate::users::repo::{StoreError, UserStore};
use crate::users::repo_types::NewUser;

/// Validates, checks uniqueness, hashes and stores a new account.
pub async fn register(users: &dyn UserStore, payload: RegisterRequest) -> Result<(), ApiError> {
    let reg = validate_registration(payload)?;

    let existing = users
        .find_by_email(&reg.email)
        .await
        .map_err(|e| ApiError::upstream(REGISTER_FAILED, e))?;
    if existing.is_some() {
        warn!("registration with an email already in use");
        return Err(ApiError::Conflict);
    }

    let password_hash = hash_password_async(reg.password)
        .await
        .map_err(|e| ApiError::upstream(REGISTER_FAILED, e))?;

    let created = users
        .create(NewUser {
            first_name: reg.first_name,
            last_name: reg.last_name,
            email: reg.email,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::DuplicateEmail => ApiError::Conflict,
            StoreError::Backend(e) => ApiError::upstream(REGISTER_FAILED, e),
        })?;

    info!(user_id = %created.id, "user registered");
    Ok(())
}

pub struct LoggedIn {
    pub user: PublicUser,
    pub token: String,
}

/// Checks credentials and issues a session. Unknown email and wrong password
/// fail identically.
pub async fn login(
    users: &dyn UserStore,
    sessions: &SessionIssuer,
    payload: LoginRequest,
) -> Result<LoggedIn, ApiError> {
    let creds = validate_login(payload)?;

    let Some(user) = users
        .find_by_email(&creds.email)
        .await
        .map_err(|e| ApiError::upstream(LOGIN_FAILED, e))?
    else {
        warn!("login with unknown email");
        return Err(ApiError::Authentication);
    };

    let ok = verify_password_async(creds.password, user.password_hash.clone())
        .await
        .map_err(|e| ApiError::upstream(LOGIN_FAILED, e))?;
    if !ok {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ApiError::Authentication);
    }

    let token = sessions.issue(user.id)?;

    info!(user_id = %user.id, "user logged in");
    Ok(LoggedIn {
        user: PublicUser::from(&user),
        token,
    })
}
