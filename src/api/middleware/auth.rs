use sqlx::PgPool;
use tower_sessions::Session;

use super::session::SESSION_KEY_USER_ID;
use crate::error::{AppError, Result};
use crate::models::UserDetail;

const LOGIN_REQUIRED: &str = "Authentication required. Please log in.";

/// The logged-in user's id, or 401
pub async fn current_user_id(session: &Session) -> Result<i32> {
    session
        .get::<i32>(SESSION_KEY_USER_ID)
        .await?
        .ok_or_else(|| AppError::Unauthorized(LOGIN_REQUIRED.to_string()))
}

/// The logged-in user's id when there is one
pub async fn optional_user_id(session: &Session) -> Result<Option<i32>> {
    Ok(session.get::<i32>(SESSION_KEY_USER_ID).await?)
}

/// Loads the logged-in user. A session pointing at a deleted account is
/// flushed and treated as logged out.
pub async fn current_user(pool: &PgPool, session: &Session) -> Result<UserDetail> {
    let user_id = current_user_id(session).await?;

    match UserDetail::find_by_id(pool, user_id).await? {
        Some(user) => Ok(user),
        None => {
            discard_stale_session(session, user_id).await?;
            Err(AppError::Unauthorized(LOGIN_REQUIRED.to_string()))
        }
    }
}

/// The logged-in user's id when that account still exists. Sessions of
/// deleted accounts are flushed and read as anonymous.
pub async fn optional_current_user_id(pool: &PgPool, session: &Session) -> Result<Option<i32>> {
    let Some(user_id) = optional_user_id(session).await? else {
        return Ok(None);
    };

    if UserDetail::find_by_id(pool, user_id).await?.is_some() {
        return Ok(Some(user_id));
    }

    discard_stale_session(session, user_id).await?;
    Ok(None)
}

async fn discard_stale_session(session: &Session, user_id: i32) -> Result<()> {
    tracing::warn!(user_id, "Session refers to a missing user");
    session.flush().await?;
    Ok(())
}

/// Loads the logged-in user and requires the admin flag
pub async fn require_admin(pool: &PgPool, session: &Session) -> Result<UserDetail> {
    let user = current_user(pool, session).await?;
    if !user.is_admin {
        return Err(AppError::Forbidden);
    }
    Ok(user)
}

/// Owners may act on their own records; admins on anyone's
pub fn ensure_owner_or_admin(user: &UserDetail, owner_id: i32) -> Result<()> {
    if user.is_admin || user.user_id == owner_id {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    fn user(user_id: i32, is_admin: bool) -> UserDetail {
        UserDetail {
            user_id,
            username: "sam".to_string(),
            email: "sam@example.com".to_string(),
            password_hash: String::new(),
            is_premium: false,
            is_admin,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_owner_or_admin() {
        assert!(ensure_owner_or_admin(&user(1, false), 1).is_ok());
        assert!(ensure_owner_or_admin(&user(2, true), 1).is_ok());
        assert!(matches!(
            ensure_owner_or_admin(&user(2, false), 1),
            Err(AppError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_stale_session_is_discarded() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        session.insert(SESSION_KEY_USER_ID, 42).await.unwrap();
        assert_eq!(optional_user_id(&session).await.unwrap(), Some(42));

        discard_stale_session(&session, 42).await.unwrap();

        assert_eq!(optional_user_id(&session).await.unwrap(), None);
        assert!(matches!(
            current_user_id(&session).await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
