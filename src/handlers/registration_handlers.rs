use crate::models::registration::{ConfirmedResponse, RegisterForm, RegisterResponse, VerifyQuery};
use crate::models::user::UserSummary;
use crate::services::registration_service::RegistrationError;
use crate::services::verification_service::VerificationError;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Form,
};

pub const MSG_VERIFICATION_REQUESTED: &str = "Email verification requested";
pub const MSG_INVALID_REQUEST: &str = "Invalid registration request";
pub const MSG_USER_ID_TAKEN: &str = "User ID already exists";
pub const MSG_USER_ID_AVAILABLE: &str = "User ID is available";
pub const MSG_EMAIL_TAKEN: &str = "Email already exists";
pub const MSG_EMAIL_AVAILABLE: &str = "Email is available";
pub const MSG_DELIVERY_FAILED: &str = "Failed to send verification email. Please try again.";
pub const MSG_INTERNAL: &str = "An error occurred. Please try again.";
pub const MSG_REGISTERED: &str = "Registration complete";
pub const MSG_NOT_FOUND: &str = "No verification was requested for this email";
pub const MSG_EXPIRED: &str = "Verification code expired. Please register again.";
pub const MSG_MISMATCH: &str = "Verification code does not match. Please register again.";
pub const MSG_DUPLICATE: &str = "User ID or email is already registered";

fn respond(status: StatusCode, body: RegisterResponse) -> Response {
    (status, Json(body)).into_response()
}

fn registration_failure(form: &RegisterForm, err: RegistrationError) -> Response {
    match err {
        RegistrationError::Validation(violations) => {
            let errors = violations.into_iter().map(|v| v.message).collect();
            respond(
                StatusCode::BAD_REQUEST,
                RegisterResponse::echo(form, MSG_INVALID_REQUEST).with_errors(errors),
            )
        }
        RegistrationError::DuplicateUserId => respond(
            StatusCode::BAD_REQUEST,
            RegisterResponse::echo(form, MSG_USER_ID_TAKEN),
        ),
        RegistrationError::DuplicateEmail => respond(
            StatusCode::BAD_REQUEST,
            RegisterResponse::echo(form, MSG_EMAIL_TAKEN),
        ),
        RegistrationError::Verification(VerificationError::Delivery(e)) => {
            tracing::error!("[register] delivery failed for {}: {}", form.email, e);
            respond(
                StatusCode::BAD_GATEWAY,
                RegisterResponse::echo(form, MSG_DELIVERY_FAILED),
            )
        }
        other => {
            tracing::error!("[register] internal failure for {}: {}", form.user_id, other);
            respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                RegisterResponse::echo(form, MSG_INTERNAL),
            )
        }
    }
}

/// `POST /api/register`
pub async fn register_handler(
    State(app_state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Response {
    let form = form.normalized();

    match app_state.registration_service.register(&form).await {
        Ok(_) => respond(
            StatusCode::OK,
            RegisterResponse::echo(&form, MSG_VERIFICATION_REQUESTED),
        ),
        Err(e) => registration_failure(&form, e),
    }
}

/// `POST /api/duplicate-check-id`
pub async fn duplicate_check_id_handler(
    State(app_state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Response {
    let form = form.normalized();

    match app_state.registration_service.check_user_id(&form).await {
        Ok(()) => {
            tracing::info!("[register] user id available: {}", form.user_id);
            respond(
                StatusCode::OK,
                RegisterResponse::echo(&form, MSG_USER_ID_AVAILABLE),
            )
        }
        Err(e) => registration_failure(&form, e),
    }
}

/// `POST /api/duplicate-check-email`
pub async fn duplicate_check_email_handler(
    State(app_state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Response {
    let form = form.normalized();

    match app_state.registration_service.check_email(&form).await {
        Ok(()) => {
            tracing::info!("[register] email available: {}", form.email);
            respond(
                StatusCode::OK,
                RegisterResponse::echo(&form, MSG_EMAIL_AVAILABLE),
            )
        }
        Err(e) => registration_failure(&form, e),
    }
}

/// `GET /api/verify?email=&certificationNumber=`
///
/// Any attempt consumes the pending entry; after a failure the visitor has
/// to register again.
pub async fn verify_handler(
    State(app_state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Response {
    let email = query.email.trim();
    let code = query.certification_number.trim();

    match app_state.verification_service.confirm(email, code).await {
        Ok(user) => (
            StatusCode::OK,
            Json(ConfirmedResponse {
                msg: MSG_REGISTERED.to_string(),
                user: UserSummary::from(&user),
            }),
        )
            .into_response(),
        Err(err) => {
            let msg = match &err {
                VerificationError::NotFound => MSG_NOT_FOUND,
                VerificationError::Expired(_) => MSG_EXPIRED,
                VerificationError::Mismatch(_) => MSG_MISMATCH,
                VerificationError::Duplicate(_) => MSG_DUPLICATE,
                VerificationError::ExpiryOutOfRange
                | VerificationError::Delivery(_)
                | VerificationError::Repository(_) => {
                    tracing::error!("[verify] internal failure for {}: {}", email, err);
                    return respond(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        RegisterResponse {
                            email: email.to_string(),
                            msg: MSG_INTERNAL.to_string(),
                            ..Default::default()
                        },
                    );
                }
            };

            let body = match err.pending() {
                Some(pending) => RegisterResponse {
                    user_id: pending.user_id.clone(),
                    user_name: pending.user_name.clone(),
                    email: pending.email.clone(),
                    phone_num: pending.phone_num.clone(),
                    msg: msg.to_string(),
                    errors: Vec::new(),
                },
                None => RegisterResponse {
                    email: email.to_string(),
                    msg: msg.to_string(),
                    ..Default::default()
                },
            };

            tracing::warn!("[verify] verification failed for {}: {}", email, err);
            respond(StatusCode::BAD_REQUEST, body)
        }
    }
}
