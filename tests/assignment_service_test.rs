//! Assignment service integration tests

mod common;

use flagpost::error::ServiceError;
use flagpost::repository::AssignmentRepository;
use flagpost::service::assignment::AssignmentRequest;
use flagpost::service::AssignmentService;

#[actix_rt::test]
async fn test_apply_then_delete_lifecycle() {
    let db = common::database::setup_test_database()
        .await
        .expect("Failed to setup test database");
    let person = common::fixtures::create_test_person(&db, "Ana").await.unwrap();
    let flag = common::fixtures::create_test_feature_flag(&db, "CHECKOUT", person.id, false)
        .await
        .unwrap();
    let service = AssignmentService::new(&db);
    let request = AssignmentRequest {
        person_id: person.id,
        feature_flag_id: flag.id,
    };

    service.apply_assignment(request, person.id).await.expect("first apply");

    let err = service.apply_assignment(request, person.id).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::AlreadyAssigned {
            person_id: person.id,
            feature_flag_id: flag.id,
        }
    );
    assert_eq!(common::fixtures::count_assignments(&db).await.unwrap(), 1);

    service.delete_assignment(request, person.id).await.expect("delete");

    let err = service.delete_assignment(request, person.id).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        format!(
            "Person {} is not assigned to the feature flag {}",
            person.id, flag.id
        )
    );
    assert_eq!(common::fixtures::count_assignments(&db).await.unwrap(), 0);
}

#[actix_rt::test]
async fn test_zero_ids_are_rejected() {
    let db = common::database::setup_test_database().await.unwrap();
    let service = AssignmentService::new(&db);

    let err = service
        .apply_assignment(
            AssignmentRequest {
                person_id: 0,
                feature_flag_id: 3,
            },
            1,
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.field_error().map(|e| e.code()),
        Some("person-id-required".to_string())
    );

    let err = service
        .delete_assignment(
            AssignmentRequest {
                person_id: 3,
                feature_flag_id: 0,
            },
            1,
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.field_error().map(|e| e.code()),
        Some("feature-flag-id-required".to_string())
    );
}

#[actix_rt::test]
async fn test_unique_index_rejects_duplicate_pairs() {
    let db = common::database::setup_test_database().await.unwrap();
    let person = common::fixtures::create_test_person(&db, "Ana").await.unwrap();
    let flag = common::fixtures::create_test_feature_flag(&db, "CHECKOUT", person.id, false)
        .await
        .unwrap();
    let repository = AssignmentRepository::new(&db);

    repository.add(person.id, flag.id).await.expect("first insert");
    let err = repository.add(person.id, flag.id).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::AlreadyAssigned {
            person_id: person.id,
            feature_flag_id: flag.id,
        }
    );
}

#[actix_rt::test]
async fn test_toggle_assignment() {
    let db = common::database::setup_test_database().await.unwrap();
    let person = common::fixtures::create_test_person(&db, "Ana").await.unwrap();
    let flag = common::fixtures::create_test_feature_flag(&db, "CHECKOUT", person.id, false)
        .await
        .unwrap();
    let service = AssignmentService::new(&db);
    let request = AssignmentRequest {
        person_id: person.id,
        feature_flag_id: flag.id,
    };

    assert!(service.toggle_assignment(request, person.id).await.unwrap());
    assert_eq!(common::fixtures::count_assignments(&db).await.unwrap(), 1);
    assert!(!service.toggle_assignment(request, person.id).await.unwrap());
    assert_eq!(common::fixtures::count_assignments(&db).await.unwrap(), 0);
}
