//! Catalog queries: film pagination, single film lookup, cuts.

mod common;

use common::{GqlRequest, create_test_app, gql};
use serde_json::json;

#[tokio::test]
async fn test_films_first_page() {
    let (app, _db, _codec) = create_test_app().await;

    let body = gql(
        &app,
        "query Films($limit: Int, $cursor: Int) {
            films(limit: $limit, cursor: $cursor) {
                films { id title director { name } }
                cursor
            }
        }",
        json!({ "limit": 6, "cursor": 1 }),
        GqlRequest::default(),
    )
    .await;

    let films = body["data"]["films"]["films"].as_array().unwrap();
    assert_eq!(films.len(), 6);

    let ids: Vec<i64> = films.iter().map(|f| f["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);

    // More films exist, so the cursor is one past the last returned id
    assert_eq!(body["data"]["films"]["cursor"], json!(7));

    // Field resolver wires directors in
    assert!(films[0]["director"]["name"].as_str().is_some());
}

#[tokio::test]
async fn test_films_defaults_match_first_page() {
    let (app, _db, _codec) = create_test_app().await;

    let body = gql(
        &app,
        "{ films { films { id } cursor } }",
        json!(null),
        GqlRequest::default(),
    )
    .await;

    let films = body["data"]["films"]["films"].as_array().unwrap();
    assert_eq!(films.len(), 6);
    assert_eq!(films[0]["id"], json!(1));
}

#[tokio::test]
async fn test_films_last_page_has_null_cursor() {
    let (app, _db, _codec) = create_test_app().await;

    let body = gql(
        &app,
        "query Films($cursor: Int) { films(cursor: $cursor) { films { id } cursor } }",
        json!({ "cursor": 7 }),
        GqlRequest::default(),
    )
    .await;

    let films = body["data"]["films"]["films"].as_array().unwrap();
    assert!(!films.is_empty());
    assert!(body["data"]["films"]["cursor"].is_null());
}

#[tokio::test]
async fn test_films_limit_is_capped_at_six() {
    let (app, _db, _codec) = create_test_app().await;

    let body = gql(
        &app,
        "query Films($limit: Int) { films(limit: $limit) { films { id } } }",
        json!({ "limit": 50 }),
        GqlRequest::default(),
    )
    .await;

    assert_eq!(body["data"]["films"]["films"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_films_unknown_cursor_is_empty() {
    let (app, _db, _codec) = create_test_app().await;

    let body = gql(
        &app,
        "query Films($cursor: Int) { films(cursor: $cursor) { films { id } cursor } }",
        json!({ "cursor": 9999 }),
        GqlRequest::default(),
    )
    .await;

    assert!(body["data"]["films"]["films"].as_array().unwrap().is_empty());
    assert!(body["data"]["films"]["cursor"].is_null());
}

#[tokio::test]
async fn test_single_film_lookup() {
    let (app, _db, _codec) = create_test_app().await;

    let body = gql(
        &app,
        "query Film($filmId: Int!) {
            film(filmId: $filmId) { id title genre runningTime posterImg }
        }",
        json!({ "filmId": 3 }),
        GqlRequest::default(),
    )
    .await;

    assert_eq!(body["data"]["film"]["id"], json!(3));
    assert!(body["data"]["film"]["title"].as_str().is_some());
    assert!(body["data"]["film"]["runningTime"].as_f64().is_some());

    let body = gql(
        &app,
        "query Film($filmId: Int!) { film(filmId: $filmId) { id } }",
        json!({ "filmId": 9999 }),
        GqlRequest::default(),
    )
    .await;
    assert!(body["data"]["film"].is_null());
}

#[tokio::test]
async fn test_cuts_for_film() {
    let (app, _db, _codec) = create_test_app().await;

    let body = gql(
        &app,
        "query Cuts($filmId: Int!) {
            cuts(filmId: $filmId) { id src filmId film { title } }
        }",
        json!({ "filmId": 3 }),
        GqlRequest::default(),
    )
    .await;

    let cuts = body["data"]["cuts"].as_array().unwrap();
    assert!(!cuts.is_empty());
    for cut in cuts {
        assert_eq!(cut["filmId"], json!(3));
        assert!(cut["src"].as_str().unwrap().ends_with(".jpg"));
        assert!(cut["film"]["title"].as_str().is_some());
    }
}

#[tokio::test]
async fn test_anonymous_cut_has_zero_votes_and_not_voted() {
    let (app, _db, _codec) = create_test_app().await;

    let body = gql(
        &app,
        "query Cut($cutId: Int!) {
            cut(cutId: $cutId) { id votesCount isVoted }
        }",
        json!({ "cutId": 301 }),
        GqlRequest::default(),
    )
    .await;

    assert_eq!(body["data"]["cut"]["id"], json!(301));
    assert_eq!(body["data"]["cut"]["votesCount"], json!(0));
    assert_eq!(body["data"]["cut"]["isVoted"], json!(false));
}
