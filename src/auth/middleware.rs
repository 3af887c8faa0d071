use crate::auth::auth::AuthUser;
use crate::config::Config;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};

/// Resolves the bearer token once per request on protected scopes and
/// leaves the [`AuthUser`] in the request extensions for the extractor.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let authenticated = {
        let config = req
            .app_data::<Data<Config>>()
            .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;
        AuthUser::from_headers(req.headers(), &config.jwt_secret)
    };

    match authenticated {
        Ok(user) => {
            tracing::debug!(
                user = %user.username,
                employee_id = user.employee_id,
                role = %user.role,
                path = %req.path(),
                "Authenticated request"
            );
            req.extensions_mut().insert(user);
            next.call(req).await
        }
        Err(rejection) => {
            tracing::debug!(reason = %rejection, path = %req.path(), "Rejected request");
            let resp = rejection.error_response();
            Ok(req.into_response(resp))
        }
    }
}
