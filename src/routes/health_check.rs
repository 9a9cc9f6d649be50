use actix_web::HttpResponse;

/// `GET /health_check`
///
/// Does not touch the email service; a disabled provider is not an outage.
pub async fn health_check() -> HttpResponse { HttpResponse::Ok().finish() }
