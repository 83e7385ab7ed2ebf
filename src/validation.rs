use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{ApiError, ParseError};
use crate::store::ListQuery;

/// JSON body that has been deserialized and passed its `Validate` rules
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Request validation utilities
pub struct RequestValidator;

impl RequestValidator {
    /// Parse a product id path segment
    pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
        raw.trim()
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("invalid product id {:?}", raw)))
    }

    /// Decode a raw query string into its key/value pairs
    pub fn query_pairs(raw: Option<&str>) -> Result<Vec<(String, String)>, ApiError> {
        serde_urlencoded::from_str(raw.unwrap_or_default())
            .map_err(|e| ParseError::Malformed(e.to_string()).into())
    }

    /// Parse and validate list parameters
    pub fn list_query(pairs: &[(String, String)]) -> Result<ListQuery, ApiError> {
        let query = ListQuery::from_pairs(pairs)?;
        query.validate()?;
        Ok(query)
    }
}
