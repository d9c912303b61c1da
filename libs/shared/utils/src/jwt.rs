use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use shared_models::auth::{AuthUser, JwtClaims, JwtHeader};

type HmacSha256 = Hmac<Sha256>;

fn sign(signing_input: &str, jwt_secret: &str) -> Result<Vec<u8>, String> {
    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(signing_input.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Issue an HS256 token for `user` that expires after `ttl_hours`.
pub fn issue_token(user: &AuthUser, jwt_secret: &str, ttl_hours: i64) -> Result<String, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let now = Utc::now();
    let exp = Duration::try_hours(ttl_hours)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| format!("Token lifetime of {} hours is out of range", ttl_hours))?
        .timestamp()
        .max(0) as u64;

    let header = JwtHeader {
        alg: "HS256".to_string(),
        typ: "JWT".to_string(),
    };
    let claims = JwtClaims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        role: user.role,
        exp: Some(exp),
        iat: Some(now.timestamp().max(0) as u64),
    };

    let header_json = serde_json::to_vec(&header).map_err(|e| e.to_string())?;
    let claims_json = serde_json::to_vec(&claims).map_err(|e| e.to_string())?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(claims_json)
    );
    let signature = sign(&signing_input, jwt_secret)?;

    debug!("Issued token for user: {}", user.id);
    Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
}

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<AuthUser, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    // Split token into parts
    let parts: Vec<&str> = token.split('.').collect();
    let (header_b64, claims_b64, signature_b64) = match parts.as_slice() {
        [header, claims, signature] => (*header, *claims, *signature),
        _ => return Err("Invalid token format".to_string()),
    };

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    let signing_input = format!("{}.{}", header_b64, claims_b64);
    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(signing_input.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    let claims_json = URL_SAFE_NO_PAD
        .decode(claims_b64)
        .map_err(|_| "Invalid claims encoding".to_string())?;

    let claims: JwtClaims = match serde_json::from_slice(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        }
    };

    if let Some(exp) = claims.exp {
        let now = Utc::now().timestamp().max(0) as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err("Token expired".to_string());
        }
    }

    let id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| "Invalid subject claim".to_string())?;

    let user = AuthUser {
        id,
        username: claims.username,
        role: claims.role,
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_models::auth::Role;

    fn provider() -> AuthUser {
        AuthUser {
            id: 7,
            username: "studio".to_string(),
            role: Role::Provider,
        }
    }

    #[test]
    fn test_issued_token_validates() {
        let token = issue_token(&provider(), "secret", 1).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let user = validate_token(&token, "secret").unwrap();
        assert_eq!(user, provider());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = issue_token(&provider(), "secret", 1).unwrap();
        assert_eq!(
            validate_token(&token, "other-secret"),
            Err("Invalid token signature".to_string())
        );
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = issue_token(&provider(), "secret", -1).unwrap();
        assert_eq!(validate_token(&token, "secret"), Err("Token expired".to_string()));
    }

    #[test]
    fn test_malformed_token_is_rejected() {
        assert_eq!(
            validate_token("invalid.token", "secret"),
            Err("Invalid token format".to_string())
        );
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        assert!(issue_token(&provider(), "secret", i64::MAX).is_err());
    }

    #[test]
    fn test_empty_secret_never_issues() {
        assert!(issue_token(&provider(), "", 1).is_err());
    }
}
