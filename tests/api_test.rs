//! JSON API integration tests

mod common;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use flagpost::middleware::{ClientCtx, PERSON_ID_HEADER};
use serde_json::{json, Value};

macro_rules! init_app {
    ($db:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($db))
                .wrap(ClientCtx::default())
                .configure(flagpost::api::configure),
        )
        .await
    };
}

#[actix_rt::test]
async fn test_requests_without_identity_are_unauthorized() {
    let db = common::database::setup_test_database()
        .await
        .expect("Failed to setup test database");
    let app = init_app!(db);

    let req = test::TestRequest::get()
        .uri("/api/feature-flags/v1/feature-flags")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "missing Personid header");

    let req = test::TestRequest::get()
        .uri("/api/feature-flags/v1/feature-flags")
        .insert_header((PERSON_ID_HEADER, "abc"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid Personid format");
}

#[actix_rt::test]
async fn test_create_and_list_feature_flags() {
    let db = common::database::setup_test_database().await.unwrap();
    let person = common::fixtures::create_test_person(&db, "Ana").await.unwrap();
    let app = init_app!(db);
    let person_id = person.id.to_string();

    for name in ["FIRST", "SECOND", "THIRD"] {
        let req = test::TestRequest::post()
            .uri("/api/feature-flags/v1/feature-flags")
            .insert_header((PERSON_ID_HEADER, person_id.as_str()))
            .set_json(json!({ "name": name, "description": "d", "isActive": true }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED, "create {}", name);
    }

    let req = test::TestRequest::post()
        .uri("/api/feature-flags/v1/feature-flags")
        .insert_header((PERSON_ID_HEADER, person_id.as_str()))
        .set_json(json!({ "name": "FIRST", "description": "d" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "feature flag FIRST already exists");

    let req = test::TestRequest::get()
        .uri("/api/feature-flags/v1/feature-flags?page=2&limit=1")
        .insert_header((PERSON_ID_HEADER, person_id.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["items"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(body["items"][0]["name"], "SECOND");
    assert_eq!(body["items"][0]["isActive"], true);
    assert_eq!(body["items"][0]["expirationDate"], "");
    assert_eq!(body["items"][0]["person"]["email"], "ana@test.com");
}

#[actix_rt::test]
async fn test_invalid_payloads_are_bad_requests() {
    let db = common::database::setup_test_database().await.unwrap();
    let person = common::fixtures::create_test_person(&db, "Ana").await.unwrap();
    let app = init_app!(db);
    let person_id = person.id.to_string();

    let req = test::TestRequest::post()
        .uri("/api/feature-flags/v1/feature-flags")
        .insert_header((PERSON_ID_HEADER, person_id.as_str()))
        .set_json(json!({ "name": "lower", "description": "d" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "name-format");
    assert_eq!(body["field"], "name");

    let req = test::TestRequest::get()
        .uri("/api/feature-flags/v1/feature-flags?isActive=yes")
        .insert_header((PERSON_ID_HEADER, person_id.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::put()
        .uri("/api/feature-flags/v1/feature-flags/abc")
        .insert_header((PERSON_ID_HEADER, person_id.as_str()))
        .set_json(json!({ "description": "d" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_update_feature_flag() {
    let db = common::database::setup_test_database().await.unwrap();
    let person = common::fixtures::create_test_person(&db, "Ana").await.unwrap();
    let flag = common::fixtures::create_test_feature_flag(&db, "CHECKOUT", person.id, false)
        .await
        .unwrap();
    let app = init_app!(db);
    let person_id = person.id.to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/api/feature-flags/v1/feature-flags/{}", flag.id))
        .insert_header((PERSON_ID_HEADER, person_id.as_str()))
        .set_json(json!({ "description": "d2", "isGlobal": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/feature-flags/v1/feature-flags?id={}", flag.id))
        .insert_header((PERSON_ID_HEADER, person_id.as_str()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["items"][0]["description"], "d2");
    assert_eq!(body["items"][0]["isGlobal"], true);
    assert_eq!(body["items"][0]["isActive"], false);
    assert_eq!(body["items"][0]["expirationDate"], "");

    let req = test::TestRequest::put()
        .uri("/api/feature-flags/v1/feature-flags/999")
        .insert_header((PERSON_ID_HEADER, person_id.as_str()))
        .set_json(json!({ "description": "d2" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_assignment_endpoints() {
    let db = common::database::setup_test_database().await.unwrap();
    let ana = common::fixtures::create_test_person(&db, "Ana").await.unwrap();
    let bo = common::fixtures::create_test_person(&db, "Bo").await.unwrap();
    let flag = common::fixtures::create_test_feature_flag(&db, "CHECKOUT", ana.id, false)
        .await
        .unwrap();
    let app = init_app!(db);
    let person_id = ana.id.to_string();
    let payload = json!({ "personId": bo.id, "featureFlagId": flag.id });

    let req = test::TestRequest::post()
        .uri("/api/feature-flags/v1/assignments")
        .insert_header((PERSON_ID_HEADER, person_id.as_str()))
        .set_json(&payload)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/feature-flags/v1/assignments")
        .insert_header((PERSON_ID_HEADER, person_id.as_str()))
        .set_json(&payload)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/feature-flags/v1/people/feature-flags/{}?isAssigned=true",
            flag.id
        ))
        .insert_header((PERSON_ID_HEADER, person_id.as_str()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["name"], "Bo");
    assert_eq!(body["items"][0]["isAssigned"], true);

    let req = test::TestRequest::get()
        .uri(&format!("/api/feature-flags/v1/people/{}/assigned-feature-flags", bo.id))
        .insert_header((PERSON_ID_HEADER, person_id.as_str()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body[0]["name"], "CHECKOUT");

    let req = test::TestRequest::delete()
        .uri("/api/feature-flags/v1/assignments")
        .insert_header((PERSON_ID_HEADER, person_id.as_str()))
        .set_json(&payload)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::delete()
        .uri("/api/feature-flags/v1/assignments")
        .insert_header((PERSON_ID_HEADER, person_id.as_str()))
        .set_json(&payload)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/feature-flags/v1/assignments")
        .insert_header((PERSON_ID_HEADER, person_id.as_str()))
        .set_json(json!({ "featureFlagId": flag.id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "person-id-required");
}

#[actix_rt::test]
async fn test_people_endpoints() {
    let db = common::database::setup_test_database().await.unwrap();
    let ana = common::fixtures::create_test_person(&db, "Ana").await.unwrap();
    common::fixtures::create_test_person(&db, "Bo").await.unwrap();
    let app = init_app!(db);
    let person_id = ana.id.to_string();

    let req = test::TestRequest::get()
        .uri("/api/feature-flags/v1/people?name=Bo")
        .insert_header((PERSON_ID_HEADER, person_id.as_str()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["email"], "bo@test.com");

    let req = test::TestRequest::get()
        .uri("/api/feature-flags/v1/people/feature-flags/42")
        .insert_header((PERSON_ID_HEADER, person_id.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_huge_page_is_an_empty_page() {
    let db = common::database::setup_test_database().await.unwrap();
    let person = common::fixtures::create_test_person(&db, "Ana").await.unwrap();
    common::fixtures::create_test_feature_flag(&db, "CHECKOUT", person.id, false)
        .await
        .unwrap();
    let app = init_app!(db);
    let person_id = person.id.to_string();

    for uri in [
        "/api/feature-flags/v1/feature-flags?page=9223372036854775807&limit=10",
        "/api/feature-flags/v1/people?page=9223372036854775807&limit=9223372036854775807",
    ] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header((PERSON_ID_HEADER, person_id.as_str()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["total"], 1, "{}", uri);
        assert_eq!(body["items"].as_array().map(|a| a.len()), Some(0), "{}", uri);
    }
}
