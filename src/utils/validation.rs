use crate::error::Result;
use validator::Validate;

/// Run derive-based validation and lift failures into the API error type.
pub fn validate<T: Validate>(payload: &T) -> Result<()> {
    payload.validate()?;
    Ok(())
}
