//! Result type alias for arcport
//!
//! This module provides a convenient Result type alias that uses ArcportError
//! as the error type.

use super::errors::ArcportError;

/// Result type alias for arcport operations
///
/// # Examples
///
/// ```
/// use arcport::domain::result::Result;
/// use arcport::domain::errors::ArcportError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(ArcportError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ArcportError>;
