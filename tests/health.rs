mod common;

use common::{body_json, get, router, test_state, ScriptedUpstream};

#[tokio::test]
async fn healthz_reports_cached_proxies() {
    let upstream = ScriptedUpstream::with_replies(vec![(200, "[]")]);
    let app = router(test_state(upstream.clone()));

    get(&app, "/api/markets").await;
    let response = get(&app, "/healthz").await;

    assert_eq!(response.status(), 200);
    let json = body_json(response).await;
    assert_eq!(json["status"], "Healthy");

    let components = json["components"].as_array().unwrap();
    assert_eq!(components.len(), 2);
    assert_eq!(components[0]["name"], "markets");
    assert_eq!(components[0]["details"]["cached_entries"], 1);
    assert_eq!(components[0]["details"]["metrics"]["total_fetches"], 1);
    assert_eq!(components[1]["name"], "coin");
    // health checks never reach upstream
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn healthz_flags_failing_upstream_without_data() {
    let upstream = ScriptedUpstream::with_replies(vec![]);
    let app = router(test_state(upstream));

    assert_eq!(get(&app, "/api/markets").await.status(), 502);

    let json = body_json(get(&app, "/healthz").await).await;
    assert_eq!(json["status"], "Unhealthy");
    assert_eq!(json["components"][0]["status"], "Unhealthy");
}
