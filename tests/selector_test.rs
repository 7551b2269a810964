use std::env;
use std::sync::Arc;

use jobtrack_core::storage::selector;

/// The selector constructs and initializes the adapter exactly once per
/// process; later calls return the cached instance.
#[tokio::test]
async fn selector_initializes_once_and_caches() {
    let dir = tempfile::tempdir().expect("tempdir");
    env::set_var("JOBTRACK_BACKEND", "kv");
    env::set_var("JOBTRACK_DATA_DIR", dir.path());
    jobtrack_core::config::init_config().expect("init config");

    let first = selector::active().await;
    let second = selector::active().await;
    assert!(Arc::ptr_eq(&first, &second));

    // The activated adapter is usable end-to-end.
    let state = jobtrack_core::AppState::from_env().await;
    jobtrack_core::seed::seed_demo_data(&state).await.expect("seed");
    // Seeding is idempotent.
    jobtrack_core::seed::seed_demo_data(&state).await.expect("seed again");

    let admin = state
        .users
        .get_by_email("admin@jobtrack.test")
        .await
        .expect("seeded admin");
    let actor = jobtrack_core::models::actor::Actor::new(admin.id, admin.role);
    let users = state.users.list_all(&actor).await.expect("list users");
    assert_eq!(users.len(), 3);
}
