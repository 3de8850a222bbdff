pub mod bans_routes;
pub mod history_routes;

use serde::Deserialize;

/// Shared `?hours=N` query parameter for both history endpoints.
#[derive(Deserialize)]
pub struct HoursQuery {
    #[serde(default = "default_hours")]
    pub hours: i64,
}

fn default_hours() -> i64 {
    24
}

/// One year. Retention keeps far less than this; anything larger is a
/// client error, and extreme values would overflow cutoff arithmetic.
const MAX_HOURS: i64 = 24 * 365;

impl HoursQuery {
    pub fn validated(&self) -> Result<i64, crate::web::AppError> {
        if self.hours <= 0 || self.hours > MAX_HOURS {
            return Err(crate::web::AppError::InvalidInput(format!(
                "hours must be between 1 and {MAX_HOURS}"
            )));
        }
        Ok(self.hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_bounds_are_enforced() {
        assert!(HoursQuery { hours: 0 }.validated().is_err());
        assert!(HoursQuery { hours: -5 }.validated().is_err());
        assert!(HoursQuery { hours: MAX_HOURS + 1 }.validated().is_err());
        assert!(HoursQuery { hours: i64::MAX }.validated().is_err());
        assert_eq!(HoursQuery { hours: 1 }.validated().unwrap(), 1);
        assert_eq!(HoursQuery { hours: default_hours() }.validated().unwrap(), 24);
        assert_eq!(HoursQuery { hours: MAX_HOURS }.validated().unwrap(), MAX_HOURS);
    }
}
