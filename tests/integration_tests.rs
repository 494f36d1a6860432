// Integration tests for Roomie Match

use actix_web::{http::StatusCode, test, web, App};
use roomie_match::config::RankingSettings;
use roomie_match::core::{CompatibilityScorer, SwipeCoordinator};
use roomie_match::engine::MatchEngine;
use roomie_match::error::EngineError;
use roomie_match::models::{CanonicalPair, LikeOutcome, PairState, ProfileSnapshot};
use roomie_match::routes::{self, AppState};
use roomie_match::services::{CacheManager, MemoryProfiles, MemoryStore, SwipeStore};
use std::collections::HashMap;
use std::sync::Arc;

fn create_test_profile(id: &str, age: u8, university: &str) -> ProfileSnapshot {
    ProfileSnapshot::new(id, age, "female")
        .with_university(university)
        .with_lifestyle(["tidy", "non-smoker"])
        .with_interests(["hiking", "film"])
}

fn create_engine(profiles: Vec<ProfileSnapshot>) -> (MatchEngine, Arc<MemoryProfiles>, Arc<MemoryStore>) {
    let provider = Arc::new(MemoryProfiles::with_profiles(profiles));
    let store = Arc::new(MemoryStore::new());
    let engine = MatchEngine::new(provider.clone(), store.clone(), CompatibilityScorer::default())
        .with_cache(Arc::new(CacheManager::local(1000, 300)))
        .with_resolve_concurrency(4);
    (engine, provider, store)
}

fn campus() -> Vec<ProfileSnapshot> {
    vec![
        create_test_profile("alice", 20, "State"),
        create_test_profile("bella", 21, "State"),
        create_test_profile("cara", 29, "Tech"),
        create_test_profile("dana", 20, "State").with_interests(["chess"]),
    ]
}

#[tokio::test]
async fn test_compatibility_is_oriented_to_caller() {
    let (engine, _, _) = create_engine(campus());

    let ab = engine.compatibility("alice", "bella").await.unwrap();
    let ba = engine.compatibility("bella", "alice").await.unwrap();

    assert_eq!(ab.user_a, "alice");
    assert_eq!(ba.user_a, "bella");
    // Both directions score the same live snapshots
    assert!((ab.composite_score - ba.composite_score).abs() < 1e-9);
    assert_eq!(ab.level, ba.level);
}

#[tokio::test]
async fn test_end_to_end_ranking() {
    let (engine, _, _) = create_engine(campus());
    let ids: Vec<String> = ["bella", "cara", "dana"].iter().map(|s| s.to_string()).collect();

    let result = engine.rank("alice", &ids, 10).await.unwrap();
    let ranked: Vec<&str> = result.candidates.iter().map(|c| c.user_id.as_str()).collect();

    assert_eq!(ranked, vec!["bella", "dana", "cara"]);
    for pair in result.candidates.windows(2) {
        assert!(pair[0].compatibility.composite_score >= pair[1].compatibility.composite_score);
    }
}

#[tokio::test]
async fn test_ranking_limit_and_partial_failure() {
    let mut profiles = campus();
    let mut incomplete = create_test_profile("erin", 22, "State");
    incomplete.age = None;
    profiles.push(incomplete);

    let (engine, provider, _) = create_engine(profiles);
    provider.make_unreachable("cara");

    let ids: Vec<String> = ["bella", "cara", "dana", "erin", "nobody"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let result = engine.rank("alice", &ids, 1).await.unwrap();

    assert_eq!(result.candidates.len(), 1);
    assert_eq!(result.candidates[0].user_id, "bella");
    assert_eq!(result.skipped, 3);
}

#[tokio::test]
async fn test_ranking_empty_pool() {
    let (engine, _, _) = create_engine(campus());

    let result = engine.rank("alice", &[], 10).await.unwrap();

    assert!(result.candidates.is_empty());
    assert_eq!(result.total_candidates, 0);
}

#[tokio::test]
async fn test_swipe_lifecycle() {
    let (engine, _, store) = create_engine(campus());
    let swipes = engine.swipes();

    let first = engine.record_like("alice", "bella").await.unwrap();
    assert_eq!(first, LikeOutcome { created: false, match_id: None });

    engine.record_pass("bella", "alice").await.unwrap();
    assert_eq!(
        swipes.pair_state("alice", "bella").await.unwrap(),
        PairState::OneSidedLike { from: "alice".into(), to: "bella".into() }
    );

    let matched = engine.record_like("bella", "alice").await.unwrap();
    assert!(matched.created);

    let matches = swipes.matches_for("bella").await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].other_user("bella"), "alice");
    assert_eq!(Some(matches[0].match_id), matched.match_id);
    assert_eq!(store.match_count(), 1);

    // Later passes leave the match alone
    engine.record_pass("alice", "bella").await.unwrap();
    assert!(matches!(
        swipes.pair_state("bella", "alice").await.unwrap(),
        PairState::Matched { .. }
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_mutual_likes_create_one_match_per_pair() {
    let store = Arc::new(MemoryStore::new());
    let swipes = SwipeCoordinator::new(store.clone());
    let pairs = 1000;

    let mut handles = Vec::with_capacity(pairs * 2);
    for i in 0..pairs {
        let (a, b) = (format!("a{}", i), format!("b{}", i));

        let forward = swipes.clone();
        let (actor, target) = (a.clone(), b.clone());
        handles.push(tokio::spawn(async move { (i, forward.record_like(&actor, &target).await) }));

        let backward = swipes.clone();
        handles.push(tokio::spawn(async move { (i, backward.record_like(&b, &a).await) }));
    }

    let mut outcomes: HashMap<usize, Vec<LikeOutcome>> = HashMap::new();
    for handle in handles {
        let (i, outcome) = handle.await.unwrap();
        outcomes.entry(i).or_default().push(outcome.unwrap());
    }

    assert_eq!(store.match_count(), pairs);

    for (i, results) in outcomes {
        let created: Vec<&LikeOutcome> = results.iter().filter(|o| o.created).collect();
        assert_eq!(created.len(), 1, "pair {} created {} matches", i, created.len());

        let match_id = created[0].match_id.unwrap();
        for outcome in &results {
            if let Some(id) = outcome.match_id {
                assert_eq!(id, match_id);
            }
        }

        let (a, b) = (format!("a{}", i), format!("b{}", i));
        let pair = CanonicalPair::new(&a, &b).unwrap();
        let stored = store.find_match(&pair).await.unwrap().unwrap();
        assert_eq!(stored.match_id, match_id);

        // With the reciprocal no longer Liked, a repeat like still reports the match
        swipes.record_pass(&b, &a).await.unwrap();
        let repeat = swipes.record_like(&a, &b).await.unwrap();
        assert!(!repeat.created);
        assert_eq!(repeat.match_id, Some(match_id), "pair {} lost its match id", i);
    }

    assert_eq!(store.match_count(), pairs);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_repeated_concurrent_likes_single_audit_entry() {
    let store = Arc::new(MemoryStore::new());
    let swipes = SwipeCoordinator::new(store.clone());

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let swipes = swipes.clone();
            tokio::spawn(async move { swipes.record_like("alice", "bella").await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(swipes.action_history("alice", "bella").await.unwrap().len(), 1);
    assert_eq!(store.match_count(), 0);
}

#[tokio::test]
async fn test_store_outage_surfaces_unavailable() {
    let (engine, _, store) = create_engine(campus());
    store.set_available(false);

    assert!(matches!(
        engine.record_like("alice", "bella").await,
        Err(EngineError::Unavailable(_))
    ));
    // Scoring does not touch the swipe store
    assert!(engine.compatibility("alice", "bella").await.is_ok());
}

fn app_state(engine: MatchEngine) -> web::Data<AppState> {
    web::Data::new(AppState {
        engine,
        ranking: RankingSettings::default(),
    })
}

#[actix_web::test]
async fn test_http_compatibility_and_rank() {
    let (engine, _, _) = create_engine(campus());
    let app = test::init_service(
        App::new()
            .app_data(app_state(engine))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/compatibility/alice/bella")
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["userIdA"], "alice");
    assert!(body["compositeScore"].as_f64().unwrap() > 0.8);
    assert!(body["dimensions"]["age"]["score"].is_number());

    let req = test::TestRequest::post()
        .uri("/api/v1/rank")
        .set_json(serde_json::json!({
            "userId": "alice",
            "candidateIds": ["bella", "cara"],
            "limit": 1
        }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["candidates"].as_array().unwrap().len(), 1);
    assert_eq!(body["candidates"][0]["userId"], "bella");
    assert_eq!(body["total_candidates"], 2);
}

#[actix_web::test]
async fn test_http_error_statuses() {
    let (engine, _, _) = create_engine(campus());
    let app = test::init_service(
        App::new()
            .app_data(app_state(engine))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/compatibility/alice/ghost")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/api/v1/swipes/like")
        .set_json(serde_json::json!({ "actorId": "alice", "targetId": "alice" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_actor");

    let req = test::TestRequest::post()
        .uri("/api/v1/rank")
        .set_json(serde_json::json!({ "userId": "", "candidateIds": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::put()
        .uri("/api/v1/matches/active")
        .set_json(serde_json::json!({ "userA": "alice", "userB": "bella", "isActive": false }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_http_swipe_flow() {
    let (engine, _, _) = create_engine(campus());
    let app = test::init_service(
        App::new()
            .app_data(app_state(engine))
            .configure(routes::configure_routes),
    )
    .await;

    let like = |actor: &str, target: &str| {
        test::TestRequest::post()
            .uri("/api/v1/swipes/like")
            .set_json(serde_json::json!({ "actorId": actor, "targetId": target }))
            .to_request()
    };

    let body: serde_json::Value = test::call_and_read_body_json(&app, like("alice", "bella")).await;
    assert_eq!(body["created"], false);
    assert!(body["matchId"].is_null());

    let req = test::TestRequest::get()
        .uri("/api/v1/swipes/state?userA=bella&userB=alice")
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["state"], "one_sided_like");
    assert_eq!(body["from"], "alice");

    let body: serde_json::Value = test::call_and_read_body_json(&app, like("bella", "alice")).await;
    assert_eq!(body["created"], true);
    let match_id = body["matchId"].clone();

    let req = test::TestRequest::get()
        .uri("/api/v1/matches?userId=alice")
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["matches"][0]["matchId"], match_id);

    let req = test::TestRequest::put()
        .uri("/api/v1/matches/active")
        .set_json(serde_json::json!({ "userA": "bella", "userB": "alice", "isActive": false }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["isActive"], false);

    let req = test::TestRequest::get()
        .uri("/api/v1/swipes/history?userA=alice&userB=bella")
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["history"][0]["action"], "like");

    let req = test::TestRequest::get()
        .uri("/api/v1/swipes/outgoing?userId=bella")
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["actions"][0]["targetId"], "alice");

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
}
