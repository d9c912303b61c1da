//! Registration and profile input checks.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::{
    IdentityError, NewAccount, NewGalleryImage, NewUser, WeeklyAvailability,
};

pub const MIN_PASSWORD_LENGTH: usize = 4;
pub const MAX_GALLERY_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const GALLERY_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

fn email_regex() -> Option<&'static Regex> {
    static EMAIL_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL_REGEX
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+$").ok())
        .as_ref()
}

pub fn validate_email(email: &str) -> Result<(), IdentityError> {
    if email.is_empty() {
        return Err(IdentityError::Validation("Email is required".to_string()));
    }

    match email_regex() {
        Some(regex) if !regex.is_match(email) => {
            Err(IdentityError::Validation("Invalid email format".to_string()))
        }
        _ => Ok(()),
    }
}

/// Checks a registration after its text fields have been trimmed.
pub fn validate_registration(new_user: &NewUser) -> Result<(), IdentityError> {
    if new_user.username.is_empty() || new_user.password.is_empty() || new_user.email.is_empty() {
        return Err(IdentityError::Validation(
            "Username, email, and password are required".to_string(),
        ));
    }

    validate_email(&new_user.email)?;

    if new_user.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(IdentityError::Validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }

    if let NewAccount::Provider(details) = &new_user.account {
        if details.business_name.is_empty() {
            return Err(IdentityError::Validation(
                "Business name is required for service providers".to_string(),
            ));
        }
        if details.service_category.is_empty() {
            return Err(IdentityError::Validation(
                "Service category is required for service providers".to_string(),
            ));
        }
        if let Some(availability) = &details.availability {
            validate_availability(availability)?;
        }
    }

    Ok(())
}

pub fn validate_availability(availability: &WeeklyAvailability) -> Result<(), IdentityError> {
    for (day, hours) in availability {
        if hours.enabled && hours.start >= hours.end {
            return Err(IdentityError::Validation(format!(
                "Opening time must be before closing time on {}",
                day
            )));
        }
    }
    Ok(())
}

/// Returns the lowercased extension of an acceptable gallery upload.
pub fn validate_gallery_image(image: &NewGalleryImage) -> Result<String, IdentityError> {
    let extension = image
        .filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if !GALLERY_EXTENSIONS.contains(&extension.as_str()) {
        return Err(IdentityError::InvalidImage(
            "Invalid image format. Please use JPG, PNG, GIF, or WebP.".to_string(),
        ));
    }

    if image.bytes.is_empty() {
        return Err(IdentityError::InvalidImage("No image data provided".to_string()));
    }

    if image.bytes.len() > MAX_GALLERY_IMAGE_BYTES {
        return Err(IdentityError::InvalidImage(
            "Image too large. Maximum size is 5MB.".to_string(),
        ));
    }

    Ok(extension)
}
