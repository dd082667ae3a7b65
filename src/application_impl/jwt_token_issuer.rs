use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub signing_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: String, // user id as string
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
    jti: String,
}

/// HS256 access tokens.
pub struct JwtAccessTokenIssuer {
    cfg: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtAccessTokenIssuer {
    pub fn new(cfg: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(&cfg.signing_key);
        let decoding_key = DecodingKey::from_secret(&cfg.signing_key);
        JwtAccessTokenIssuer {
            cfg,
            encoding_key,
            decoding_key,
        }
    }

    #[inline]
    fn gen_jti() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn encode_claims(&self, claims: &AccessClaims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::InternalError(e.to_string()))
    }

    fn decode_claims(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let mut v = Validation::new(Algorithm::HS256);
        v.validate_exp = true;
        v.set_audience(&[self.cfg.audience.clone()]);
        v.set_issuer(&[self.cfg.issuer.clone()]);
        let data = decode::<AccessClaims>(token, &self.decoding_key, &v).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;
        Ok(data.claims)
    }
}

#[async_trait::async_trait]
impl TokenIssuer for JwtAccessTokenIssuer {
    async fn issue_access_token(
        &self,
        user_id: UserId,
    ) -> Result<(AccessToken, DateTime<Utc>), TokenError> {
        let iat_dt = Utc::now();
        let ttl = chrono::Duration::from_std(self.cfg.access_ttl)
            .map_err(|e| TokenError::InternalError(e.to_string()))?;
        let exp_dt = iat_dt
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::InternalError("access token expiry out of range".to_string()))?;
        let claims = AccessClaims {
            sub: user_id.to_string(),
            exp: exp_dt.timestamp(),
            iat: iat_dt.timestamp(),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
            jti: Self::gen_jti(),
        };
        let token = self.encode_claims(&claims)?;
        Ok((AccessToken(token), exp_dt))
    }

    async fn verify_access_token(&self, token: &AccessToken) -> Result<UserId, TokenError> {
        let claims = self.decode_claims(&token.0)?;
        claims.sub.parse::<UserId>().map_err(|_| TokenError::Invalid)
    }
}
