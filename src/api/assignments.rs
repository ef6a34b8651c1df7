use super::{acting_person, ApiError, MessageResponse};
use crate::middleware::ClientCtx;
use crate::service::assignment::AssignmentRequest;
use crate::service::AssignmentService;
use actix_web::{delete, post, web, HttpResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(apply_assignment).service(delete_assignment);
}

#[post("/v1/assignments")]
pub async fn apply_assignment(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    body: web::Json<AssignmentRequest>,
) -> Result<HttpResponse, ApiError> {
    let person_id = acting_person(&client)?;
    let request = body.into_inner();

    AssignmentService::new(&db)
        .apply_assignment(request, person_id)
        .await?;

    Ok(HttpResponse::Created().json(MessageResponse::new(format!(
        "feature flag {} assigned to person {}",
        request.feature_flag_id, request.person_id
    ))))
}

/// Answers 201 on success; existing clients expect it.
#[delete("/v1/assignments")]
pub async fn delete_assignment(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    body: web::Json<AssignmentRequest>,
) -> Result<HttpResponse, ApiError> {
    let person_id = acting_person(&client)?;
    let request = body.into_inner();

    AssignmentService::new(&db)
        .delete_assignment(request, person_id)
        .await?;

    Ok(HttpResponse::Created().json(MessageResponse::new(format!(
        "feature flag {} removed from person {}",
        request.feature_flag_id, request.person_id
    ))))
}
