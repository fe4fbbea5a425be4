use axum::http::HeaderMap;

use super::error::ApiError;

pub const TOKEN_HEADER: &str = "x-scrape-token";

/// Shared-secret gate for the scrape trigger. A non-empty query parameter wins over the
/// header; an unset secret rejects every caller.
pub fn check_scrape_token(query_token: Option<&str>, headers: &HeaderMap, secret: Option<&str>) -> Result<(), ApiError> {
    let token = query_token
        .filter(|t| !t.trim().is_empty())
        .or_else(|| headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok()))
        .unwrap_or("")
        .trim();
    let secret = secret.map(str::trim).unwrap_or("");
    if token.is_empty() || secret.is_empty() || token != secret {
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(token: Option<&str>) -> HeaderMap {
        let mut h = HeaderMap::new();
        if let Some(t) = token {
            h.insert(TOKEN_HEADER, HeaderValue::from_str(t).unwrap());
        }
        h
    }

    #[test]
    fn accepts_matching_query_or_header() {
        assert!(check_scrape_token(Some("s3cret"), &headers(None), Some("s3cret")).is_ok());
        assert!(check_scrape_token(None, &headers(Some(" s3cret ")), Some("s3cret")).is_ok());
    }

    #[test]
    fn query_token_takes_precedence() {
        assert!(check_scrape_token(Some("wrong"), &headers(Some("s3cret")), Some("s3cret")).is_err());
    }

    #[test]
    fn rejects_missing_or_wrong_token() {
        assert!(check_scrape_token(None, &headers(None), Some("s3cret")).is_err());
        assert!(check_scrape_token(Some("   "), &headers(None), Some("s3cret")).is_err());
        assert!(check_scrape_token(Some("nope"), &headers(None), Some("s3cret")).is_err());
    }

    #[test]
    fn unset_secret_rejects_everyone() {
        assert!(check_scrape_token(Some("anything"), &headers(None), None).is_err());
        assert!(check_scrape_token(Some(""), &headers(None), Some("")).is_err());
    }
}
