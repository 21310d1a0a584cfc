mod common;

use chrono::Duration;
use common::{Harness, UnavailableStore, t0};
use eventpass::PassError;
use eventpass::service::{ManualClock, SessionManager};
use std::collections::HashSet;
use std::sync::Arc;

const COOKIE: &str = "eventpass_session";

fn manager(h: &Harness, ttl_secs: i64) -> SessionManager {
    SessionManager::new(h.store.clone(), h.clock(), Duration::seconds(ttl_secs), COOKIE)
}

fn cookie_for(token: &str) -> String {
    format!("theme=dark; {COOKIE}={token}")
}

#[tokio::test]
async fn session_is_valid_until_ttl_elapses() {
    let h = Harness::new().await;
    h.seed_user(42, "ada").await;
    let sessions = manager(&h, 3600);

    let session = sessions.create_session(42).await.expect("create session");
    assert_eq!(session.user_id, 42);
    assert_eq!(session.created_at, t0());
    assert_eq!(session.expires_at, t0() + Duration::seconds(3600));

    let cookie = cookie_for(&session.token);

    h.clock.set(t0() + Duration::seconds(1800));
    let auth = sessions
        .get_session_from_cookie(Some(&cookie))
        .await
        .expect("lookup")
        .expect("session should be live at t0+1800s");
    assert_eq!(auth.session.user_id, 42);
    assert_eq!(auth.user.id, 42);
    assert_eq!(auth.user.username, "ada");

    h.clock.set(t0() + Duration::seconds(3601));
    let expired = sessions
        .get_session_from_cookie(Some(&cookie))
        .await
        .expect("lookup");
    assert!(expired.is_none());
}

#[tokio::test]
async fn session_expires_exactly_at_expires_at() {
    let h = Harness::new().await;
    h.seed_user(1, "lin").await;
    let sessions = manager(&h, 60);
    let session = sessions.create_session(1).await.expect("create session");
    let cookie = cookie_for(&session.token);

    h.clock.set(session.expires_at - Duration::milliseconds(1));
    assert!(
        sessions
            .get_session_from_cookie(Some(&cookie))
            .await
            .expect("lookup")
            .is_some()
    );

    h.clock.set(session.expires_at);
    assert!(
        sessions
            .get_session_from_cookie(Some(&cookie))
            .await
            .expect("lookup")
            .is_none()
    );
}

#[tokio::test]
async fn expired_rows_are_not_deleted_on_read() {
    let h = Harness::new().await;
    h.seed_user(7, "kai").await;
    let sessions = manager(&h, 10);
    let session = sessions.create_session(7).await.expect("create session");

    h.clock.advance(Duration::seconds(11));
    assert!(
        sessions
            .get_session(&session.token)
            .await
            .expect("lookup")
            .is_none()
    );
    let row = h.store.find_session(&session.token).await.expect("find");
    assert_eq!(row, Some(session));
}

#[tokio::test]
async fn absent_header_or_cookie_is_none_not_error() {
    let h = Harness::new().await;
    let sessions = manager(&h, 3600);

    assert!(sessions.get_session_from_cookie(None).await.expect("lookup").is_none());
    assert!(
        sessions
            .get_session_from_cookie(Some("theme=dark; lang=en"))
            .await
            .expect("lookup")
            .is_none()
    );
    assert!(
        sessions
            .get_session_from_cookie(Some(&cookie_for("never-issued-token")))
            .await
            .expect("lookup")
            .is_none()
    );
}

#[tokio::test]
async fn delete_session_is_idempotent_and_revokes() {
    let h = Harness::new().await;
    h.seed_user(42, "ada").await;
    let sessions = manager(&h, 3600);
    let session = sessions.create_session(42).await.expect("create session");
    let cookie = cookie_for(&session.token);

    sessions.delete_session(&session.token).await.expect("first delete");
    sessions.delete_session(&session.token).await.expect("second delete");
    sessions.delete_session("never-existed").await.expect("unknown delete");

    let after = sessions
        .get_session_from_cookie(Some(&cookie))
        .await
        .expect("lookup");
    assert!(after.is_none());
}

#[tokio::test]
async fn revocation_is_visible_to_other_managers_immediately() {
    let h = Harness::new().await;
    h.seed_user(5, "mo").await;
    let a = manager(&h, 3600);
    let b = manager(&h, 3600);
    let session = a.create_session(5).await.expect("create session");

    assert!(b.get_session(&session.token).await.expect("lookup").is_some());
    a.delete_session(&session.token).await.expect("delete");
    assert!(b.get_session(&session.token).await.expect("lookup").is_none());
}

#[tokio::test]
async fn tokens_do_not_collide() {
    let h = Harness::new().await;
    h.seed_user(9, "zo").await;
    let sessions = manager(&h, 3600);

    let mut tokens = HashSet::new();
    for _ in 0..200 {
        let session = sessions.create_session(9).await.expect("create session");
        assert!(tokens.insert(session.token));
    }
}

#[tokio::test]
async fn session_for_unknown_user_is_rejected() {
    let h = Harness::new().await;
    let sessions = manager(&h, 3600);
    let err = sessions.create_session(404).await.expect_err("no such user");
    assert!(matches!(err, PassError::UnknownUser));
}

#[tokio::test]
async fn session_of_deleted_user_does_not_authenticate() {
    let h = Harness::new().await;
    h.seed_user(3, "ex").await;
    let sessions = manager(&h, 3600);
    let session = sessions.create_session(3).await.expect("create session");

    // Turn off FK enforcement so the session row outlives its user.
    sqlx::query("PRAGMA foreign_keys = OFF")
        .execute(h.sqlite.pool())
        .await
        .expect("pragma");
    sqlx::query("DELETE FROM users WHERE id = 3")
        .execute(h.sqlite.pool())
        .await
        .expect("delete user");

    assert!(sessions.get_session(&session.token).await.expect("lookup").is_none());
}

#[tokio::test]
async fn store_failures_are_surfaced() {
    let sessions = SessionManager::new(
        Arc::new(UnavailableStore),
        Arc::new(ManualClock::new(t0())),
        Duration::seconds(3600),
        COOKIE,
    );

    assert!(matches!(
        sessions.get_session_from_cookie(Some(&cookie_for("tok"))).await,
        Err(PassError::DatabaseError(_))
    ));
    assert!(matches!(
        sessions.delete_session("tok").await,
        Err(PassError::DatabaseError(_))
    ));
    assert!(matches!(
        sessions.create_session(1).await,
        Err(PassError::DatabaseError(_))
    ));
    // No cookie means no store call at all.
    assert!(sessions.get_session_from_cookie(None).await.expect("no io").is_none());
}
