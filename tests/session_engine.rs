mod common;

use common::*;
use dashgate::application_impl::*;
use dashgate::domain_model::*;
use dashgate::domain_port::*;
use std::sync::Arc;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn login_then_refresh_once() {
    let h = Harness::new();
    let principal = h.add_principal("u1@example.com", "secret123");

    let authed = h
        .engine
        .authenticate(&Harness::credentials("u1@example.com", "secret123"))
        .await
        .unwrap();
    assert_eq!(authed, principal);

    let issued = h.engine.issue_session(&authed).await.unwrap();
    let sessions = h.store.inner.sessions_for_user(principal.id);
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0], issued.refresh_session);
    assert!(!sessions[0].used);
    assert_eq!(sessions[0].created_at, t0());
    assert_eq!(sessions[0].expires_at, t0() + chrono::Duration::hours(1));

    let id = issued.refresh_session.id;
    let rotated = h.engine.refresh_session(id, None).await.unwrap();
    assert_ne!(rotated.refresh_session.id, id);
    assert_eq!(rotated.refresh_session.user_id, principal.id);
    assert_ne!(rotated.access_token, issued.access_token);

    assert!(matches!(
        h.engine.refresh_session(id, None).await,
        Err(SessionError::RefreshTokenUsed)
    ));
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_alike() {
    let h = Harness::new();
    h.add_principal("u1@example.com", "secret123");

    let before = h.checks();
    let wrong_password = h
        .engine
        .authenticate(&Harness::credentials("u1@example.com", "secret124"))
        .await;
    assert!(matches!(wrong_password, Err(SessionError::PasswordIncorrect)));
    assert_eq!(h.checks(), before + 1);

    let unknown_user = h
        .engine
        .authenticate(&Harness::credentials("ghost@example.com", "secret123"))
        .await;
    assert!(matches!(unknown_user, Err(SessionError::UserNotFound)));
    // Same hash work on both paths.
    assert_eq!(h.checks(), before + 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_refreshes_have_exactly_one_winner() {
    let h = Harness::new();
    let principal = h.add_principal("u1@example.com", "secret123");
    let issued = h.engine.issue_session(&principal).await.unwrap();
    let id = issued.refresh_session.id;

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..32 {
        let engine = h.engine.clone();
        tasks.spawn(async move { engine.refresh_session(id, None).await });
    }

    let mut winners = Vec::new();
    let mut used = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Ok(issued) => winners.push(issued),
            Err(SessionError::RefreshTokenUsed) => used += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(winners.len(), 1);
    assert_eq!(used, 31);

    // The original plus exactly one rotated session.
    let sessions = h.store.inner.sessions_for_user(principal.id);
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions.iter().filter(|s| !s.used).count(), 1);
}

#[tokio::test]
async fn expired_session_never_rotates() {
    let h = Harness::new();
    let principal = h.add_principal("u1@example.com", "secret123");
    let issued = h.engine.issue_session(&principal).await.unwrap();
    let id = issued.refresh_session.id;

    h.clock.set(issued.refresh_session.expires_at);
    assert!(matches!(
        h.engine.refresh_session(id, None).await,
        Err(SessionError::RefreshTokenExpired)
    ));

    // Rejection did not mutate the record.
    let stored = h.store.inner.get(id).await.unwrap();
    assert!(!stored.used);
    assert_eq!(stored, issued.refresh_session);
}

#[tokio::test]
async fn expiry_is_reported_before_reuse() {
    let h = Harness::new();
    let principal = h.add_principal("u1@example.com", "secret123");
    let a = h.engine.issue_session(&principal).await.unwrap();
    h.engine
        .refresh_session(a.refresh_session.id, None)
        .await
        .unwrap();

    h.clock.advance(chrono::Duration::hours(2));
    assert!(matches!(
        h.engine.refresh_session(a.refresh_session.id, None).await,
        Err(SessionError::RefreshTokenExpired)
    ));
}

#[tokio::test]
async fn rotation_chain_is_monotonic() {
    let h = Harness::new();
    let principal = h.add_principal("u1@example.com", "secret123");
    let a = h.engine.issue_session(&principal).await.unwrap();

    h.clock.advance(chrono::Duration::minutes(10));
    let b = h
        .engine
        .refresh_session(a.refresh_session.id, None)
        .await
        .unwrap();
    assert_eq!(
        b.refresh_session.expires_at,
        t0() + chrono::Duration::minutes(70)
    );

    h.clock.advance(chrono::Duration::minutes(10));
    let c = h
        .engine
        .refresh_session(b.refresh_session.id, None)
        .await
        .unwrap();

    for id in [a.refresh_session.id, b.refresh_session.id] {
        assert!(h.store.inner.get(id).await.unwrap().used);
        assert!(matches!(
            h.engine.refresh_session(id, None).await,
            Err(SessionError::RefreshTokenUsed)
        ));
        assert!(h.store.inner.get(id).await.unwrap().used);
    }

    // Reuse without family revocation leaves the live head alone.
    assert!(!h.store.inner.get(c.refresh_session.id).await.unwrap().used);
    h.engine
        .refresh_session(c.refresh_session.id, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let h = Harness::new();
    assert!(matches!(
        h.engine.refresh_session(RefreshSessionId::new(), None).await,
        Err(SessionError::RefreshSessionNotFound)
    ));
}

#[tokio::test]
async fn mismatched_identity_is_rejected_without_mutation() {
    let h = Harness::new();
    let owner = h.add_principal("u1@example.com", "secret123");
    let other = h.add_principal("u2@example.com", "hunter22");
    let issued = h.engine.issue_session(&owner).await.unwrap();
    let id = issued.refresh_session.id;

    assert!(matches!(
        h.engine.refresh_session(id, Some(other.id)).await,
        Err(SessionError::RefreshTokenUserMismatch)
    ));
    assert!(!h.store.inner.get(id).await.unwrap().used);

    h.engine.refresh_session(id, Some(owner.id)).await.unwrap();
}

#[tokio::test]
async fn reuse_revokes_the_family_when_enabled() {
    let h = Harness::with_policy(SessionPolicy {
        session_ttl: chrono::Duration::hours(1),
        revoke_family_on_reuse: true,
    });
    let principal = h.add_principal("u1@example.com", "secret123");
    let bystander = h.add_principal("u2@example.com", "hunter22");

    let a = h.engine.issue_session(&principal).await.unwrap();
    let other_device = h.engine.issue_session(&principal).await.unwrap();
    let unrelated = h.engine.issue_session(&bystander).await.unwrap();
    let b = h
        .engine
        .refresh_session(a.refresh_session.id, None)
        .await
        .unwrap();

    // A stolen copy of `a` shows up again.
    assert!(matches!(
        h.engine.refresh_session(a.refresh_session.id, None).await,
        Err(SessionError::RefreshTokenUsed)
    ));

    for id in [b.refresh_session.id, other_device.refresh_session.id] {
        assert!(matches!(
            h.engine.refresh_session(id, None).await,
            Err(SessionError::RefreshTokenUsed)
        ));
    }
    assert!(
        !h.store
            .inner
            .get(unrelated.refresh_session.id)
            .await
            .unwrap()
            .used
    );
}

#[tokio::test]
async fn failed_update_leaves_session_unused() {
    let h = Harness::new();
    let principal = h.add_principal("u1@example.com", "secret123");
    let issued = h.engine.issue_session(&principal).await.unwrap();
    let id = issued.refresh_session.id;

    h.store.fail_update.store(true, Ordering::SeqCst);
    assert!(matches!(
        h.engine.refresh_session(id, None).await,
        Err(SessionError::Store(StoreError::InternalError(_)))
    ));
    assert!(!h.store.inner.get(id).await.unwrap().used);

    h.store.fail_update.store(false, Ordering::SeqCst);
    h.engine.refresh_session(id, None).await.unwrap();
}

#[tokio::test]
async fn failed_insert_after_consume_is_not_retried() {
    let h = Harness::new();
    let principal = h.add_principal("u1@example.com", "secret123");
    let issued = h.engine.issue_session(&principal).await.unwrap();
    let id = issued.refresh_session.id;

    h.store.fail_insert.store(true, Ordering::SeqCst);
    assert!(matches!(
        h.engine.refresh_session(id, None).await,
        Err(SessionError::Store(StoreError::InternalError(_)))
    ));
    // The old session was consumed; presenting it again is reuse.
    h.store.fail_insert.store(false, Ordering::SeqCst);
    assert!(matches!(
        h.engine.refresh_session(id, None).await,
        Err(SessionError::RefreshTokenUsed)
    ));
    assert_eq!(h.store.inner.sessions_for_user(principal.id).len(), 1);
}

#[tokio::test]
async fn revoke_session_consumes_active_sessions_only() {
    let h = Harness::new();
    let principal = h.add_principal("u1@example.com", "secret123");

    let active = h.engine.issue_session(&principal).await.unwrap();
    h.engine
        .revoke_session(active.refresh_session.id)
        .await
        .unwrap();
    assert!(
        h.store
            .inner
            .get(active.refresh_session.id)
            .await
            .unwrap()
            .used
    );
    // Idempotent.
    h.engine
        .revoke_session(active.refresh_session.id)
        .await
        .unwrap();
    assert!(matches!(
        h.engine
            .refresh_session(active.refresh_session.id, None)
            .await,
        Err(SessionError::RefreshTokenUsed)
    ));

    let stale = h.engine.issue_session(&principal).await.unwrap();
    h.clock.advance(chrono::Duration::hours(3));
    h.engine
        .revoke_session(stale.refresh_session.id)
        .await
        .unwrap();
    assert!(
        !h.store
            .inner
            .get(stale.refresh_session.id)
            .await
            .unwrap()
            .used
    );

    assert!(matches!(
        h.engine.revoke_session(RefreshSessionId::new()).await,
        Err(SessionError::RefreshSessionNotFound)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn independent_chains_rotate_in_parallel() {
    let h = Harness::new();
    let mut heads = Vec::new();
    for i in 0..8 {
        let principal = h.add_principal(&format!("u{}@example.com", i), "secret123");
        heads.push(h.engine.issue_session(&principal).await.unwrap());
    }

    let mut tasks = tokio::task::JoinSet::new();
    for head in heads {
        let engine: Arc<AuthSessionEngine> = h.engine.clone();
        tasks.spawn(async move {
            let mut id = head.refresh_session.id;
            for _ in 0..5 {
                id = engine.refresh_session(id, None).await?.refresh_session.id;
            }
            Ok::<_, SessionError>(id)
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }
    assert_eq!(h.store.inner.len(), 8 * 6);
}

#[tokio::test]
async fn unrepresentable_session_expiry_is_an_error() {
    let h = Harness::with_policy(SessionPolicy {
        session_ttl: chrono::Duration::MAX,
        revoke_family_on_reuse: false,
    });
    let principal = h.add_principal("u1@example.com", "secret123");

    assert!(matches!(
        h.engine.issue_session(&principal).await,
        Err(SessionError::InternalError(_))
    ));
    assert!(h.store.inner.is_empty());
}
