use axum::{body::Bytes, extract::State, Json};
use tracing::{info, warn};

use crate::{
    email_client::{SendOutcome, SentEmail},
    web::{
        types::{SignupDetails, SignupRequest, SubscriptionResponse, ValidEmail},
        Error, WebResult,
    },
    AppState,
};

/// Validate -> verify (if enabled) -> send welcome email (best effort) -> log -> respond.
///
/// Only a bad email or a failed bot check change the outcome for the client, once those pass the
/// signup is a success no matter what happens to the welcome email.
///
/// The body is read as raw bytes, so the `Content-Type` header is not checked.
#[tracing::instrument(name = "Processing waitlist signup", skip_all)]
pub async fn subscribe(
    State(app_state): State<AppState>,
    body: Bytes,
) -> WebResult<Json<SubscriptionResponse>> {
    let request =
        SignupRequest::from_slice(&body).map_err(|er| Error::BodyRejected(er.to_string()))?;

    let email = ValidEmail::parse_json(request.email.as_ref())?;

    if let Some(verifier) = &app_state.captcha_verifier {
        let token = request.token().ok_or(Error::CaptchaTokenMissing)?;
        verifier.check(token).await?;
    }

    let details = SignupDetails::new(request.role, request.company);
    let outcome = send_welcome_email(&app_state, &email, &details).await;

    info!(
        email = email.as_ref(),
        role = details.role.as_deref(),
        company = details.company.as_deref(),
        email_sent = outcome.sent,
        "New email signup"
    );

    let diagnostic = app_state.diagnostics.then_some(&outcome);
    Ok(Json(SubscriptionResponse::success(diagnostic)))
}

/// Never fails, whatever goes wrong ends up in the returned `SendOutcome`.
async fn send_welcome_email(
    app_state: &AppState,
    email: &ValidEmail,
    details: &SignupDetails,
) -> SendOutcome {
    match try_send_welcome_email(app_state, email, details).await {
        Ok(sent_email) => SendOutcome::delivered(sent_email),
        Err(er) => {
            warn!("{:<12} - welcome email not sent: {er}", "subscribe");
            SendOutcome::failed(er.to_string())
        }
    }
}

#[tracing::instrument(name = "Sending welcome email", skip_all)]
async fn try_send_welcome_email(
    app_state: &AppState,
    email: &ValidEmail,
    details: &SignupDetails,
) -> WebResult<SentEmail> {
    let welcome = app_state
        .templ_mgr
        .render_welcome_email(details, &app_state.base_url)?;

    let sent_email = app_state
        .email_client
        .send_email(
            email,
            app_state.email_subject.as_str(),
            welcome.html.as_str(),
            welcome.text.as_str(),
        )
        .await?;

    info!("SUCCESS");
    Ok(sent_email)
}
