use crate::error::QualifyError;
use serde::{Deserialize, Serialize};

/// Trait for configuration sections
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<(), QualifyError>;
}

pub(crate) fn ensure_non_negative(section: &str, field: &str, value: f64) -> Result<(), QualifyError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(QualifyError::Configuration(format!(
            "{section}.{field} must be a non-negative number, got {value}"
        )))
    }
}
