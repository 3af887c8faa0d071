use crate::models::{Claims, TokenType};
use jsonwebtoken::{DecodingKey, Validation, decode};

/// Decodes an access token. Refresh tokens are refused.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())?;

    if claims.token_type != TokenType::Access {
        return Err("Access token required".to_string());
    }
    Ok(claims)
}

#[cfg(test)]
fn now() -> usize {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

#[cfg(test)]
fn sign(claims: &Claims, secret: &str) -> String {
    use jsonwebtoken::{EncodingKey, Header, encode};
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[cfg(test)]
pub fn generate_access_token(
    username: String,
    employee_id: u64,
    role: u8,
    secret: &str,
    ttl: usize,
) -> String {
    let claims = Claims {
        sub: username,
        employee_id,
        role,
        exp: now() + ttl,
        jti: uuid::Uuid::new_v4().to_string(),
        token_type: TokenType::Access,
    };
    sign(&claims, secret)
}
