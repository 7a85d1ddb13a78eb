//! Input checks applied before anything reaches the backend.

use crate::error::{BoardError, Result};

pub const MAX_TITLE_LENGTH: usize = 255;

pub const MAX_DESCRIPTION_LENGTH: usize = 32_000;

pub const MAX_COMMENT_LENGTH: usize = 4_000;

pub const MAX_TAG_LENGTH: usize = 50;

/// Largest team the ETA projection will plan lanes for.
pub const MAX_DEV_COUNT: u32 = 500;

/// Largest single-ticket size, in working days.
pub const MAX_TICKET_DAYS: f64 = 2_000.0;

pub fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(BoardError::Validation("Title cannot be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(BoardError::Validation(format!(
            "Title exceeds maximum length of {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<()> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(BoardError::Validation(format!(
            "Description exceeds maximum length of {} characters",
            MAX_DESCRIPTION_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_comment(body: &str) -> Result<()> {
    if body.chars().count() > MAX_COMMENT_LENGTH {
        return Err(BoardError::Validation(format!(
            "Comment exceeds maximum length of {} characters",
            MAX_COMMENT_LENGTH
        )));
    }
    Ok(())
}

/// Tags arrive as one comma-separated string.
pub fn validate_tags(tags: &str) -> Result<()> {
    for tag in tags.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if tag.chars().count() > MAX_TAG_LENGTH {
            return Err(BoardError::Validation(format!(
                "Tag '{}' exceeds maximum length of {} characters",
                tag, MAX_TAG_LENGTH
            )));
        }
    }
    Ok(())
}

pub fn validate_sort_order(sort_order: f64) -> Result<()> {
    if !sort_order.is_finite() {
        return Err(BoardError::Validation(format!(
            "Sort order must be a finite number, got {}",
            sort_order
        )));
    }
    Ok(())
}

/// Sizes and hours: finite and not negative.
pub fn validate_amount(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(BoardError::Validation(format!(
            "{} must be a non-negative number, got {}",
            name, value
        )));
    }
    Ok(())
}

pub fn validate_dev_count(dev_count: u32) -> Result<()> {
    if dev_count == 0 || dev_count > MAX_DEV_COUNT {
        return Err(BoardError::Validation(format!(
            "Developer count must be between 1 and {}, got {}",
            MAX_DEV_COUNT, dev_count
        )));
    }
    Ok(())
}

pub fn validate_size(days: f64) -> Result<()> {
    validate_amount("Developer days", days)?;
    if days > MAX_TICKET_DAYS {
        return Err(BoardError::Validation(format!(
            "Developer days cannot exceed {}, got {}",
            MAX_TICKET_DAYS, days
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_title() {
        assert!(validate_title("").is_err());
        assert!(validate_title("   ").is_err());
        assert!(validate_title("Fix the export").is_ok());
        assert!(validate_title(&"a".repeat(MAX_TITLE_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_tags() {
        assert!(validate_tags("ui, , backend").is_ok());
        let long = format!("ok, {}", "x".repeat(MAX_TAG_LENGTH + 1));
        assert!(validate_tags(&long).is_err());
    }

    #[test]
    fn test_validate_numbers() {
        assert!(validate_sort_order(1.5).is_ok());
        assert!(validate_sort_order(f64::NAN).is_err());
        assert!(validate_sort_order(f64::INFINITY).is_err());
        assert!(validate_amount("Size", 0.0).is_ok());
        assert!(validate_amount("Size", -1.0).is_err());
    }

    #[test]
    fn test_validate_comment_length() {
        assert!(validate_comment("looks good").is_ok());
        assert!(validate_comment(&"a".repeat(MAX_COMMENT_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_capacity_bounds() {
        assert!(validate_dev_count(1).is_ok());
        assert!(validate_dev_count(MAX_DEV_COUNT).is_ok());
        assert!(validate_dev_count(0).is_err());
        assert!(validate_dev_count(u32::MAX).is_err());
        assert!(validate_size(3.5).is_ok());
        assert!(validate_size(MAX_TICKET_DAYS + 1.0).is_err());
        assert!(validate_size(1e12).is_err());
    }
}
