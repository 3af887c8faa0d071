use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::{employee::EmployeeId, role::Role};
use actix_web::{
    FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError,
    dev::Payload,
    http::{StatusCode, header::HeaderMap},
    web::Data,
};
use derive_more::Display;
use futures::future::{Ready, ready};
use serde_json::json;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    pub employee_id: EmployeeId,
    pub role: Role,
}

/// Why a request carries no usable identity. Always answered with 401.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum AuthRejection {
    #[display(fmt = "Missing Authorization header")]
    MissingHeader,
    #[display(fmt = "Invalid Authorization header encoding")]
    BadEncoding,
    #[display(fmt = "Authorization header must start with Bearer")]
    NotBearer,
    #[display(fmt = "Invalid or expired token")]
    InvalidToken(String),
    #[display(fmt = "Invalid role")]
    UnknownRole(u8),
}

impl ResponseError for AuthRejection {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AuthRejection::InvalidToken(details) => {
                json!({ "error": self.to_string(), "details": details })
            }
            _ => json!({ "error": self.to_string() }),
        };
        HttpResponse::Unauthorized().json(body)
    }
}

impl AuthUser {
    /// Resolves the caller from an `Authorization: Bearer <access token>` header.
    pub fn from_headers(headers: &HeaderMap, secret: &str) -> Result<Self, AuthRejection> {
        let header = headers
            .get("Authorization")
            .ok_or(AuthRejection::MissingHeader)?
            .to_str()
            .map_err(|_| AuthRejection::BadEncoding)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthRejection::NotBearer)?;
        let claims = verify_token(token, secret).map_err(AuthRejection::InvalidToken)?;
        let role = Role::from_id(claims.role).ok_or(AuthRejection::UnknownRole(claims.role))?;

        Ok(AuthUser {
            username: claims.sub,
            employee_id: claims.employee_id,
            role,
        })
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // set by auth_middleware on protected scopes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let Some(config) = req.app_data::<Data<Config>>() else {
            return ready(Err(actix_web::error::ErrorInternalServerError(
                "Config missing",
            )));
        };
        ready(AuthUser::from_headers(req.headers(), &config.jwt_secret).map_err(Into::into))
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin only"))
        }
    }

    pub fn require_manager_or_admin(&self) -> actix_web::Result<()> {
        if matches!(self.role, Role::Admin | Role::Manager) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Manager/Admin only"))
        }
    }

    /// Passes when acting on one's own records, or as an admin.
    pub fn require_employee(&self, employee: EmployeeId) -> actix_web::Result<()> {
        if self.employee_id == employee || self.is_admin() {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Only the employee or an admin may do this"))
        }
    }
}
