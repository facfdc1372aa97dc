//! Tests for the users HTTP handlers.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::domain::ports::{MockLeaderboardQuery, MockUserAccountCommand, MockUserAccountQuery};
use crate::domain::{StreakState, UserId, UserProfileRecord};
use crate::inbound::http::test_utils::test_app;

#[fixture]
fn profile() -> UserProfile {
    UserProfile::restore(UserProfileRecord {
        id: UserId::random(),
        anonymous_id: AnonymousId::new("k3j9x0a1b").expect("anonymous id"),
        username: Some(Username::new("sugar_warrior").expect("username")),
        name: "Ada".to_owned(),
        gender: String::new(),
        attributes: PhysicalAttributes::new(29, 170.0, 70.0).expect("attributes"),
        daily_limit_grams: 30.0,
        avatar: DEFAULT_AVATAR.to_owned(),
        onboarded: true,
        activity: Activity::default(),
        points: 42,
        streak: StreakState {
            current: 2,
            last_log_date: NaiveDate::from_ymd_opt(2026, 4, 2),
        },
    })
}

fn entry(name: &str, xp: u64) -> LeaderboardEntry {
    LeaderboardEntry {
        user_id: UserId::random(),
        username: Some(name.to_lowercase()),
        name: name.to_owned(),
        avatar: DEFAULT_AVATAR.to_owned(),
        xp,
    }
}

#[rstest]
#[case::absent("/api/v1/users/leaderboard", LeaderboardTimeframe::Daily)]
#[case::monthly("/api/v1/users/leaderboard?timeframe=monthly", LeaderboardTimeframe::Monthly)]
#[case::unknown("/api/v1/users/leaderboard?timeframe=weekly", LeaderboardTimeframe::Daily)]
#[actix_web::test]
async fn leaderboard_selects_timeframe(#[case] uri: &str, #[case] expected: LeaderboardTimeframe) {
    let mut query = MockLeaderboardQuery::new();
    query
        .expect_leaderboard()
        .withf(move |timeframe| *timeframe == expected)
        .times(1)
        .returning(|_| Ok(vec![entry("Ada", 30), entry("Bo", 12)]));
    let state = HttpState {
        leaderboard: Arc::new(query),
        ..HttpState::fixtures()
    };
    let app = actix_test::init_service(test_app(state)).await;

    let response =
        actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let entries: Vec<LeaderboardEntryBody> = actix_test::read_body_json(response).await;
    let xp: Vec<u64> = entries.iter().map(|e| e.xp).collect();
    assert_eq!(xp, vec![30, 12]);
}

#[rstest]
#[actix_web::test]
async fn register_returns_created_profile_with_bmi(profile: UserProfile) {
    let mut command = MockUserAccountCommand::new();
    command
        .expect_register()
        .withf(|new_profile| {
            new_profile.attributes.height_cm() == DEFAULT_HEIGHT_CM
                && new_profile.daily_limit_grams == DEFAULT_DAILY_LIMIT_GRAMS
                && new_profile.avatar == DEFAULT_AVATAR
        })
        .times(1)
        .return_once(move |_| Ok(profile));
    let state = HttpState {
        accounts: Arc::new(command),
        ..HttpState::fixtures()
    };
    let app = actix_test::init_service(test_app(state)).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/users")
        .set_json(json!({"anonymousId": "k3j9x0a1b", "age": 29, "username": "sugar_warrior"}))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["bmi"], json!(24.2));
    assert_eq!(body["currentStreak"], json!(2));
    assert_eq!(body["lastLogDate"], json!("2026-04-02"));
}

#[rstest]
#[case::missing_age(json!({"anonymousId": "k3j9x0a1b"}), "age")]
#[case::missing_anonymous_id(json!({"age": 30}), "anonymousId")]
#[case::bad_username(json!({"anonymousId": "k3j9x0a1b", "age": 30, "username": "no spaces"}), "username")]
#[case::bad_height(json!({"anonymousId": "k3j9x0a1b", "age": 30, "height": 0.0}), "height")]
#[actix_web::test]
async fn register_rejects_invalid_payloads(#[case] body: Value, #[case] field: &str) {
    let app = actix_test::init_service(test_app(HttpState::fixtures())).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/users")
        .set_json(body)
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload: Value = actix_test::read_body_json(response).await;
    assert_eq!(payload["details"]["field"], json!(field));
}

#[rstest]
#[actix_web::test]
async fn taken_username_surfaces_as_bad_request() {
    let mut command = MockUserAccountCommand::new();
    command.expect_register().returning(|_| {
        Err(Error::invalid_request("username sugar_warrior is already taken")
            .with_details(json!({"field": "username", "code": "username_taken"})))
    });
    let state = HttpState {
        accounts: Arc::new(command),
        ..HttpState::fixtures()
    };
    let app = actix_test::init_service(test_app(state)).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/users")
        .set_json(json!({"anonymousId": "zz", "age": 30, "username": "sugar_warrior"}))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload: Value = actix_test::read_body_json(response).await;
    assert_eq!(payload["details"]["code"], json!("username_taken"));
}

#[rstest]
#[actix_web::test]
async fn login_unknown_username_is_not_found() {
    let mut query = MockUserAccountQuery::new();
    query
        .expect_login()
        .returning(|username| Err(Error::not_found(format!("user {username} not found"))));
    let state = HttpState {
        accounts_query: Arc::new(query),
        ..HttpState::fixtures()
    };
    let app = actix_test::init_service(test_app(state)).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/users/login")
        .set_json(json!({"username": "ghost_user"}))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[rstest]
#[case::too_short("ab")]
#[case::bad_characters("no spaces")]
#[actix_web::test]
async fn login_with_malformed_username_is_not_found(#[case] username: &str) {
    let mut query = MockUserAccountQuery::new();
    query.expect_login().never();
    let state = HttpState {
        accounts_query: Arc::new(query),
        ..HttpState::fixtures()
    };
    let app = actix_test::init_service(test_app(state)).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/users/login")
        .set_json(json!({ "username": username }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload: Value = actix_test::read_body_json(response).await;
    assert_eq!(payload["code"], json!("not_found"));
}

#[rstest]
#[actix_web::test]
async fn leaderboard_path_is_not_captured_as_profile() {
    let mut accounts_query = MockUserAccountQuery::new();
    accounts_query.expect_get_profile().never();
    let mut query = MockLeaderboardQuery::new();
    query.expect_leaderboard().returning(|_| Ok(Vec::new()));
    let state = HttpState {
        accounts_query: Arc::new(accounts_query),
        leaderboard: Arc::new(query),
        ..HttpState::fixtures()
    };
    let app = actix_test::init_service(test_app(state)).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/users/leaderboard")
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[rstest]
#[actix_web::test]
async fn update_forwards_only_editable_fields(profile: UserProfile) {
    let mut command = MockUserAccountCommand::new();
    command
        .expect_update_profile()
        .withf(|anonymous_id, update| {
            anonymous_id.as_ref() == "k3j9x0a1b"
                && update.weight_kg == Some(82.5)
                && update.username.is_none()
        })
        .times(1)
        .return_once(move |_, _| Ok(profile));
    let state = HttpState {
        accounts: Arc::new(command),
        ..HttpState::fixtures()
    };
    let app = actix_test::init_service(test_app(state)).await;

    let request = actix_test::TestRequest::put()
        .uri("/api/v1/users/k3j9x0a1b")
        .set_json(json!({"weight": 82.5, "points": 9999, "currentStreak": 40}))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["points"], json!(42));
}
