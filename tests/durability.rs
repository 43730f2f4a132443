//! Restart behaviour through the HTTP surface

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use tempfile::TempDir;
use tower::ServiceExt; // for `oneshot`

use hitcount::api::router;
use hitcount::api::state::AppState;
use hitcount::app::App;
use hitcount::config::{Config, DurabilityStrategy, HumanDuration};
use hitcount::journal;
use hitcount::snapshot::{self, SnapshotFormat};

fn test_config(dir: &TempDir, strategy: DurabilityStrategy) -> Config {
    let mut config = Config::default();
    config.durability.strategy = strategy;
    config.window.length = HumanDuration::from_secs(3600);
    config.journal.path = dir.path().join("hits.journal");
    config.snapshot.path = dir.path().join("hits.snapshot");
    config
}

async fn hit(app: &Router) -> String {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn test_journal_survives_restart() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, DurabilityStrategy::Journal);

    let app = App::start(&config).unwrap();
    let routes = router(AppState::from_app(&app));
    assert_eq!(hit(&routes).await, "1");
    assert_eq!(hit(&routes).await, "2");
    app.shutdown().await.unwrap();

    let replayed = journal::replay(&config.journal.path).unwrap();
    assert_eq!(replayed.events.len(), 2);

    let app = App::start(&config).unwrap();
    let routes = router(AppState::from_app(&app));
    assert_eq!(hit(&routes).await, "3");
    app.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_none_strategy_forgets_on_restart() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, DurabilityStrategy::None);

    for _ in 0..2 {
        let app = App::start(&config).unwrap();
        let routes = router(AppState::from_app(&app));
        assert_eq!(hit(&routes).await, "1");
        app.shutdown().await.unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_strategy_restores_when_enabled() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir, DurabilityStrategy::Snapshot);
    config.snapshot.interval = HumanDuration::from_secs(1);
    config.snapshot.format = SnapshotFormat::Protobuf;
    config.snapshot.restore_on_start = true;

    let app = App::start(&config).unwrap();
    let routes = router(AppState::from_app(&app));
    hit(&routes).await;
    hit(&routes).await;

    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
    app.shutdown().await.unwrap();

    let saved = snapshot::restore(&config.snapshot.path, SnapshotFormat::Protobuf)
        .unwrap()
        .unwrap();
    assert_eq!(saved.len(), 2);

    let app = App::start(&config).unwrap();
    let routes = router(AppState::from_app(&app));
    assert_eq!(hit(&routes).await, "3");
    app.shutdown().await.unwrap();
}
