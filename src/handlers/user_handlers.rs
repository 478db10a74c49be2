use crate::error::Result;
use crate::models::registration::{PasswordUpdateForm, SimpleResponse};
use crate::services::user_service::UpdatePasswordRequest;
use crate::AppState;
use axum::{extract::State, response::Json, Form};

/// `PATCH /api/users/password`
pub async fn update_password_handler(
    State(app_state): State<AppState>,
    Form(form): Form<PasswordUpdateForm>,
) -> Result<Json<SimpleResponse>> {
    let request = UpdatePasswordRequest {
        user_id: form.user_id.trim().to_string(),
        current_password: Some(form.current_password),
        new_password: form.new_password1,
        new_password_confirm: Some(form.new_password2),
    };

    app_state.user_service.update_password(request).await?;

    Ok(Json(SimpleResponse {
        msg: "Password changed".to_string(),
    }))
}

/// `GET /health`
pub async fn health_handler(State(app_state): State<AppState>) -> Result<Json<SimpleResponse>> {
    sqlx::query("SELECT 1").execute(&app_state.pool).await?;
    Ok(Json(SimpleResponse {
        msg: "ok".to_string(),
    }))
}
