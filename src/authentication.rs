use actix_web::body::MessageBody;
use actix_web::dev::ServiceRequest;
use actix_web::dev::ServiceResponse;
use actix_web::error::InternalError;
use actix_web::http::header;
use actix_web::http::header::HeaderMap;
use actix_web::web;
use actix_web::HttpResponse;
use actix_web_lab::middleware::Next;
use anyhow::Context;
use secrecy::ExposeSecret;
use secrecy::Secret;
use sha2::Digest;
use sha2::Sha256;

/// Bearer token guarding `/admin`; wrapped so it can't be confused with other
/// `Secret<String>`s in app data.
#[derive(Clone)]
pub struct AdminToken(pub Secret<String>);

fn bearer_token(headers: &HeaderMap) -> Result<&str, anyhow::Error> {
    headers
        .get(header::AUTHORIZATION)
        .context("No Authorization header")?
        .to_str()
        .context("Authorization header is not valid ASCII")?
        .strip_prefix("Bearer ")
        .context("Authorization scheme was not 'Bearer'")
}

/// Digests are compared instead of the raw strings, so comparison time does
/// not depend on how many leading bytes of the guess are right.
fn token_matches(
    given: &str,
    expected: &Secret<String>,
) -> bool {
    Sha256::digest(given.as_bytes()) == Sha256::digest(expected.expose_secret().as_bytes())
}

/// Middleware for the `/admin` scope: rejects requests without
/// `Authorization: Bearer <application.admin_token>` with 401.
///
/// See `actix_web_lab::middleware::from_fn`.
pub async fn reject_non_admins(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let expected = req
        .app_data::<web::Data<AdminToken>>()
        .context("Admin token is not registered")
        .map_err(actix_web::error::ErrorInternalServerError)?;

    let verdict = bearer_token(req.headers()).and_then(|given| {
        match token_matches(given, &expected.0) {
            true => Ok(()),
            false => Err(anyhow::anyhow!("Invalid admin token")),
        }
    });

    match verdict {
        Ok(()) => next.call(req).await,
        Err(e) => {
            tracing::warn!(error = %e, path = %req.path(), "Rejected admin request");
            let resp = HttpResponse::Unauthorized()
                .insert_header((header::WWW_AUTHENTICATE, r#"Bearer realm="admin""#))
                .finish();
            Err(InternalError::from_response(e, resp).into())
        }
    }
}
