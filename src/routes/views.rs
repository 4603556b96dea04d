use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        listing_dto::ListingViewResponse,
        view_dto::{CreateViewPayload, LoginPayload, NavigatePayload, PagePayload, PageSizePayload},
    },
    error::Result,
    models::filter::FilterChange,
    services::session_service::bearer_token,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/views",
    request_body = CreateViewPayload,
    responses(
        (status = 201, description = "Listing view opened and first page loaded"),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Session token has expired")
    )
)]
#[axum::debug_handler]
pub async fn create_view(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateViewPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let view = state
        .views
        .create(&payload.query, bearer_token(&headers))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ListingViewResponse::from(view.snapshot())),
    ))
}

#[utoipa::path(
    get,
    path = "/api/views/{id}",
    params(
        ("id" = Uuid, Path, description = "Listing view ID")
    ),
    responses(
        (status = 200, description = "Current listing"),
        (status = 404, description = "Listing view not found")
    )
)]
#[axum::debug_handler]
pub async fn get_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let view = state.views.get(id)?;
    Ok(Json(ListingViewResponse::from(view.snapshot())))
}

#[utoipa::path(
    delete,
    path = "/api/views/{id}",
    params(
        ("id" = Uuid, Path, description = "Listing view ID")
    ),
    responses(
        (status = 204, description = "Listing view closed"),
        (status = 404, description = "Listing view not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.views.remove(id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/views/{id}/filters",
    params(
        ("id" = Uuid, Path, description = "Listing view ID")
    ),
    request_body = FilterChange,
    responses(
        (status = 200, description = "Filter applied"),
        (status = 400, description = "Unrecognized value, filter unchanged"),
        (status = 404, description = "Listing view not found")
    )
)]
#[axum::debug_handler]
pub async fn apply_filter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(change): Json<FilterChange>,
) -> Result<impl IntoResponse> {
    let view = state.views.get(id)?;
    let snapshot = view.apply_change(change).await?;
    Ok(Json(ListingViewResponse::from(snapshot)))
}

#[utoipa::path(
    post,
    path = "/api/views/{id}/navigate",
    params(
        ("id" = Uuid, Path, description = "Listing view ID")
    ),
    request_body = NavigatePayload,
    responses(
        (status = 200, description = "Link followed"),
        (status = 404, description = "Listing view not found")
    )
)]
#[axum::debug_handler]
pub async fn navigate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NavigatePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let view = state.views.get(id)?;
    Ok(Json(ListingViewResponse::from(view.navigate(&payload.query).await)))
}

#[utoipa::path(
    post,
    path = "/api/views/{id}/back",
    params(
        ("id" = Uuid, Path, description = "Listing view ID")
    ),
    responses(
        (status = 200, description = "Previous history entry"),
        (status = 404, description = "Listing view not found")
    )
)]
#[axum::debug_handler]
pub async fn back(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let view = state.views.get(id)?;
    Ok(Json(ListingViewResponse::from(view.back().await)))
}

#[utoipa::path(
    post,
    path = "/api/views/{id}/forward",
    params(
        ("id" = Uuid, Path, description = "Listing view ID")
    ),
    responses(
        (status = 200, description = "Next history entry"),
        (status = 404, description = "Listing view not found")
    )
)]
#[axum::debug_handler]
pub async fn forward(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let view = state.views.get(id)?;
    Ok(Json(ListingViewResponse::from(view.forward().await)))
}

#[utoipa::path(
    post,
    path = "/api/views/{id}/page",
    params(
        ("id" = Uuid, Path, description = "Listing view ID")
    ),
    request_body = PagePayload,
    responses(
        (status = 200, description = "Page selected, or unchanged when outside the listing"),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Listing view not found")
    )
)]
#[axum::debug_handler]
pub async fn go_to_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PagePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let view = state.views.get(id)?;
    let snapshot = view.go_to_page(payload.page).await?;
    Ok(Json(ListingViewResponse::from(snapshot)))
}

#[utoipa::path(
    post,
    path = "/api/views/{id}/page-size",
    params(
        ("id" = Uuid, Path, description = "Listing view ID")
    ),
    request_body = PageSizePayload,
    responses(
        (status = 200, description = "Page size changed"),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Listing view not found")
    )
)]
#[axum::debug_handler]
pub async fn change_page_size(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PageSizePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let view = state.views.get(id)?;
    let snapshot = view.change_page_size(payload.page_size).await?;
    Ok(Json(ListingViewResponse::from(snapshot)))
}

#[utoipa::path(
    post,
    path = "/api/views/{id}/refresh",
    params(
        ("id" = Uuid, Path, description = "Listing view ID")
    ),
    responses(
        (status = 200, description = "Listing refetched"),
        (status = 404, description = "Listing view not found")
    )
)]
#[axum::debug_handler]
pub async fn refresh(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let view = state.views.get(id)?;
    Ok(Json(ListingViewResponse::from(view.refresh().await)))
}

#[utoipa::path(
    post,
    path = "/api/views/{id}/session",
    params(
        ("id" = Uuid, Path, description = "Listing view ID")
    ),
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Signed in, listing refetched with the token"),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Session token has expired"),
        (status = 404, description = "Listing view not found")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let view = state.views.get(id)?;
    let snapshot = view.login(&payload.token, payload.user).await?;
    Ok(Json(ListingViewResponse::from(snapshot)))
}

#[utoipa::path(
    delete,
    path = "/api/views/{id}/session",
    params(
        ("id" = Uuid, Path, description = "Listing view ID")
    ),
    responses(
        (status = 200, description = "Signed out, listing refetched anonymously"),
        (status = 404, description = "Listing view not found")
    )
)]
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let view = state.views.get(id)?;
    Ok(Json(ListingViewResponse::from(view.logout().await)))
}
