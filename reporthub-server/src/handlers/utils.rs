use crate::error::ApiError;

pub fn parse_positive_u32(
    raw: Option<&String>,
    fallback: u32,
    field: &str,
) -> Result<u32, ApiError> {
    match raw {
        Some(value) => {
            let parsed = value
                .parse::<u32>()
                .map_err(|_| ApiError::bad_request(format!("{field} must be a positive integer")))?;
            if parsed == 0 {
                return Err(ApiError::bad_request(format!("{field} must be at least 1")));
            }
            Ok(parsed)
        }
        None => Ok(fallback),
    }
}
