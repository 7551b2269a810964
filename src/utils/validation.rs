use validator::Validate;

use crate::error::Result;

/// Runs a payload's declared validation rules, mapping failures into the
/// crate error taxonomy.
pub fn validate<T: Validate>(payload: &T) -> Result<()> {
    payload.validate()?;
    Ok(())
}
