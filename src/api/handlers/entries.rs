use crate::AppState;
use crate::api::error::AppError;
use crate::api::session::{Session, notification_cookie};
use crate::services::dropbox::{BatchKind, BatchRequest, DeleteArg, Relocation, RelocationPath};
use crate::services::jobs::JobSnapshot;
use crate::utils::paths;
use crate::utils::validation::{validate_destination, validate_entry_name};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use axum_extra::extract::{SignedCookieJar, WithRejection};
use validator::Validate;

use super::types::*;

#[utoipa::path(
    get,
    path = "/api/entries",
    params(ListQuery),
    responses(
        (status = 200, description = "Folder listing", body = ListingResponse),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "Folder not found")
    ),
    tag = "entries"
)]
pub async fn list_entries(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    WithRejection(Query(query), _): WithRejection<Query<ListQuery>, AppError>,
) -> Result<Json<ListingResponse>, AppError> {
    let path = paths::normalize(query.path.as_deref().unwrap_or(""));
    let mut entries = state
        .storage
        .list_folder(&session.access_token, &path)
        .await?;
    super::browse::sort_entries(&mut entries);

    Ok(Json(ListingResponse {
        breadcrumbs: paths::breadcrumbs(&path),
        entries: entries.iter().map(EntryResponse::from).collect(),
        path,
    }))
}

#[utoipa::path(
    post,
    path = "/api/folders",
    request_body = CreateFolderRequest,
    responses(
        (status = 200, description = "Folder created", body = OperationResponse),
        (status = 400, description = "Invalid name"),
        (status = 401, description = "Not signed in"),
        (status = 409, description = "Name already taken")
    ),
    tag = "entries"
)]
pub async fn create_folder(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    jar: SignedCookieJar,
    WithRejection(Json(req), _): WithRejection<Json<CreateFolderRequest>, AppError>,
) -> Result<(SignedCookieJar, Json<OperationResponse>), AppError> {
    let name = validate_entry_name(&req.name).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let path = paths::join(req.parent.as_deref().unwrap_or(""), name);
    tracing::info!("Creating folder: {}", path);
    state
        .storage
        .create_folder(&session.access_token, &path)
        .await?;

    Ok(flash(jar, format!("Created folder: {}", name)))
}

#[utoipa::path(
    post,
    path = "/api/rename",
    request_body = RenameRequest,
    responses(
        (status = 200, description = "Entry renamed", body = OperationResponse),
        (status = 400, description = "Invalid name"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "Entry not found"),
        (status = 409, description = "Name already taken")
    ),
    tag = "entries"
)]
pub async fn rename_entry(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    jar: SignedCookieJar,
    WithRejection(Json(req), _): WithRejection<Json<RenameRequest>, AppError>,
) -> Result<(SignedCookieJar, Json<OperationResponse>), AppError> {
    let name = validate_entry_name(&req.name).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let src = selected_path(&req.item)?;
    let dst = paths::join(&paths::parent(&src), name);
    if dst == src {
        return Err(AppError::BadRequest("New name matches the old one".to_string()));
    }

    tracing::info!("Rename {} to {}", src, dst);
    state
        .storage
        .relocate(&session.access_token, Relocation::Move, &src, &dst)
        .await?;

    Ok(flash(
        jar,
        format!(
            "Renamed {}: {} to {}",
            req.item.kind_label(),
            paths::basename(&src),
            name
        ),
    ))
}

#[utoipa::path(
    post,
    path = "/api/move",
    request_body = RelocateRequest,
    responses(
        (status = 200, description = "Entries moved or batch job started", body = OperationResponse),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Not signed in")
    ),
    tag = "entries"
)]
pub async fn move_entries(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    jar: SignedCookieJar,
    WithRejection(Json(req), _): WithRejection<Json<RelocateRequest>, AppError>,
) -> Result<(SignedCookieJar, Json<OperationResponse>), AppError> {
    relocate_entries(state, session, jar, Relocation::Move, req).await
}

#[utoipa::path(
    post,
    path = "/api/copy",
    request_body = RelocateRequest,
    responses(
        (status = 200, description = "Entries copied or batch job started", body = OperationResponse),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Not signed in")
    ),
    tag = "entries"
)]
pub async fn copy_entries(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    jar: SignedCookieJar,
    WithRejection(Json(req), _): WithRejection<Json<RelocateRequest>, AppError>,
) -> Result<(SignedCookieJar, Json<OperationResponse>), AppError> {
    relocate_entries(state, session, jar, Relocation::Copy, req).await
}

#[utoipa::path(
    post,
    path = "/api/delete",
    request_body = DeleteRequest,
    responses(
        (status = 200, description = "Entries deleted or batch job started", body = OperationResponse),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Not signed in")
    ),
    tag = "entries"
)]
pub async fn delete_entries(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    jar: SignedCookieJar,
    WithRejection(Json(req), _): WithRejection<Json<DeleteRequest>, AppError>,
) -> Result<(SignedCookieJar, Json<OperationResponse>), AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let targets = req
        .items
        .iter()
        .map(selected_path)
        .collect::<Result<Vec<_>, _>>()?;

    if let [item] = req.items.as_slice() {
        let path = &targets[0];
        tracing::info!("Deleting {}: {}", item.kind_label(), path);
        state.storage.delete(&session.access_token, path).await?;

        return Ok(flash(
            jar,
            format!("Deleted {}: {}", item.kind_label(), paths::basename(path)),
        ));
    }

    let request = BatchRequest::Delete(targets.into_iter().map(|path| DeleteArg { path }).collect());
    start_batch(state, session, jar, request).await
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    params(
        ("id" = String, Path, description = "Batch job id")
    ),
    responses(
        (status = 200, description = "Batch job status", body = JobSnapshot),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "Unknown job")
    ),
    tag = "entries"
)]
pub async fn job_status(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    jar: SignedCookieJar,
    Path(job_id): Path<String>,
) -> Result<(SignedCookieJar, Json<JobSnapshot>), AppError> {
    let snapshot = state
        .jobs
        .status(&job_id, &session.access_token)
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    let jar = if snapshot.status.is_terminal() {
        jar.add(notification_cookie(snapshot.message.clone()))
    } else {
        jar
    };

    Ok((jar, Json(snapshot)))
}

async fn relocate_entries(
    state: AppState,
    session: Session,
    jar: SignedCookieJar,
    kind: Relocation,
    req: RelocateRequest,
) -> Result<(SignedCookieJar, Json<OperationResponse>), AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let destination =
        validate_destination(&req.destination).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let entries = req
        .items
        .iter()
        .map(|item| -> Result<RelocationPath, AppError> {
            let from_path = selected_path(item)?;
            let to_path = paths::join(&destination, paths::basename(&from_path));
            Ok(RelocationPath { from_path, to_path })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let batch_kind = BatchKind::from(kind);

    if let [item] = req.items.as_slice() {
        let entry = &entries[0];
        tracing::info!(
            "{} {}: {} to {}",
            batch_kind.progressive(),
            item.kind_label(),
            entry.from_path,
            entry.to_path
        );
        state
            .storage
            .relocate(&session.access_token, kind, &entry.from_path, &entry.to_path)
            .await?;

        return Ok(flash(
            jar,
            format!(
                "{} {}: {}",
                batch_kind.past_tense(),
                item.kind_label(),
                paths::basename(&entry.from_path)
            ),
        ));
    }

    let request = match kind {
        Relocation::Move => BatchRequest::Move(entries),
        Relocation::Copy => BatchRequest::Copy(entries),
    };
    start_batch(state, session, jar, request).await
}

async fn start_batch(
    state: AppState,
    session: Session,
    jar: SignedCookieJar,
    request: BatchRequest,
) -> Result<(SignedCookieJar, Json<OperationResponse>), AppError> {
    let snapshot = state.jobs.start(&session.access_token, request).await?;

    let jar = if snapshot.status.is_terminal() {
        jar.add(notification_cookie(snapshot.message.clone()))
    } else {
        jar
    };

    Ok((
        jar,
        Json(OperationResponse {
            status: snapshot.status,
            job_id: Some(snapshot.job_id),
            message: snapshot.message,
        }),
    ))
}

fn selected_path(item: &SelectedItem) -> Result<String, AppError> {
    let path = paths::normalize(&item.path);
    if path.is_empty() {
        return Err(AppError::BadRequest(
            "The root folder cannot be changed".to_string(),
        ));
    }
    Ok(path)
}

fn flash(jar: SignedCookieJar, message: String) -> (SignedCookieJar, Json<OperationResponse>) {
    tracing::info!("{}", message);
    (
        jar.add(notification_cookie(message.clone())),
        Json(OperationResponse::complete(message)),
    )
}
