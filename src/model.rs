//! Observation Record Types
//!
//! Wire and storage shape of a wildlife sighting, plus submission validation.
//! Field names serialize in camelCase so stored records and API payloads keep
//! the shape earlier deployments wrote.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024; // 5MB
const ACCEPTED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// A single user-submitted wildlife sighting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    /// Assigned at creation, immutable.
    pub id: String,
    /// Absent on records written before observer attribution existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species_name: Option<String>,
    pub date_observed: DateTime<Utc>,
    /// Free-text place description; never empty on stored records.
    pub location: String,
    /// Base64 data URI or a reference URL, depending on how the record was
    /// submitted.
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub ai_suggested_species: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Submission payload: everything the observer provides. `id` and
/// `created_at` are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewObservation {
    pub observer_name: String,
    #[serde(default)]
    pub species_name: Option<String>,
    pub date_observed: DateTime<Utc>,
    pub location: String,
    pub image_url: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub ai_suggested_species: Vec<String>,
}

/// One leaderboard row.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObserverCount {
    pub observer_name: String,
    pub count: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Observer name is required.")]
    MissingObserverName,
    #[error("Location is required.")]
    MissingLocation,
    #[error("Image is required.")]
    MissingImage,
    #[error("Max image size is 5MB.")]
    ImageTooLarge,
    #[error("Only .jpg, .jpeg, .png and .webp formats are accepted.")]
    UnsupportedImageType,
    #[error("Image must be a base64 data URI or an http(s) URL.")]
    MalformedImageUrl,
}

impl NewObservation {
    /// Trim free-text fields and enforce the submission rules. Returns the
    /// normalized payload ready for storage.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        self.observer_name = self.observer_name.trim().to_string();
        self.location = self.location.trim().to_string();
        self.species_name = non_empty_trimmed(self.species_name);
        self.notes = non_empty_trimmed(self.notes);

        if self.observer_name.is_empty() {
            return Err(ValidationError::MissingObserverName);
        }
        if self.location.is_empty() {
            return Err(ValidationError::MissingLocation);
        }
        validate_image_url(&self.image_url)?;

        Ok(self)
    }
}

fn non_empty_trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Accepts an `http(s)` reference URL or an embedded image data URI of an
/// accepted media type within the size cap.
fn validate_image_url(image_url: &str) -> Result<(), ValidationError> {
    if image_url.is_empty() {
        return Err(ValidationError::MissingImage);
    }

    if image_url.starts_with("http://") || image_url.starts_with("https://") {
        return Ok(());
    }

    let Some(rest) = image_url.strip_prefix("data:") else {
        return Err(ValidationError::MalformedImageUrl);
    };
    let Some((header, payload)) = rest.split_once(',') else {
        return Err(ValidationError::MalformedImageUrl);
    };

    let media_type = header.split(';').next().unwrap_or("");
    if !ACCEPTED_IMAGE_TYPES.contains(&media_type) {
        return Err(ValidationError::UnsupportedImageType);
    }

    // Base64 expands 3 bytes to 4 characters; close enough for a cap check
    // without decoding megabytes of payload
    let decoded_len = payload.len() / 4 * 3;
    if decoded_len > MAX_IMAGE_BYTES {
        return Err(ValidationError::ImageTooLarge);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> NewObservation {
        NewObservation {
            observer_name: "NatureFan123".to_string(),
            species_name: Some("Kalij Pheasant".to_string()),
            date_observed: Utc.with_ymd_and_hms(2024, 5, 18, 7, 30, 0).unwrap(),
            location: "Margalla Hills, Trail 5".to_string(),
            image_url: "data:image/jpeg;base64,/9j/4AAQSkZJRg==".to_string(),
            notes: Some("Pair foraging near the stream.".to_string()),
            ai_suggested_species: vec![],
        }
    }

    #[test]
    fn test_valid_submission_passes() {
        assert!(sample().validated().is_ok());
    }

    #[test]
    fn test_blank_observer_name_rejected() {
        let mut new = sample();
        new.observer_name = "   ".to_string();
        assert_eq!(
            new.validated().unwrap_err(),
            ValidationError::MissingObserverName
        );
    }

    #[test]
    fn test_blank_location_rejected() {
        let mut new = sample();
        new.location = String::new();
        assert_eq!(new.validated().unwrap_err(), ValidationError::MissingLocation);
    }

    #[test]
    fn test_fields_are_trimmed() {
        let mut new = sample();
        new.observer_name = "  NatureFan123 ".to_string();
        new.species_name = Some("   ".to_string());
        let validated = new.validated().unwrap();
        assert_eq!(validated.observer_name, "NatureFan123");
        assert_eq!(validated.species_name, None);
    }

    #[test]
    fn test_reference_url_accepted() {
        let mut new = sample();
        new.image_url = "https://example.com/photos/pheasant.jpg".to_string();
        assert!(new.validated().is_ok());
    }

    #[test]
    fn test_unsupported_media_type_rejected() {
        let mut new = sample();
        new.image_url = "data:image/gif;base64,R0lGODlh".to_string();
        assert_eq!(
            new.validated().unwrap_err(),
            ValidationError::UnsupportedImageType
        );
    }

    #[test]
    fn test_oversized_data_uri_rejected() {
        let mut new = sample();
        // ~6MB decoded
        let payload = "A".repeat(8 * 1024 * 1024);
        new.image_url = format!("data:image/png;base64,{}", payload);
        assert_eq!(new.validated().unwrap_err(), ValidationError::ImageTooLarge);
    }

    #[test]
    fn test_bare_string_image_rejected() {
        let mut new = sample();
        new.image_url = "pheasant.jpg".to_string();
        assert_eq!(
            new.validated().unwrap_err(),
            ValidationError::MalformedImageUrl
        );
    }

    #[test]
    fn test_camel_case_wire_shape() {
        let obs = Observation {
            id: "abc".to_string(),
            observer_name: Some("NatureFan123".to_string()),
            species_name: None,
            date_observed: Utc.with_ymd_and_hms(2024, 5, 18, 7, 30, 0).unwrap(),
            location: "Rawal Lake".to_string(),
            image_url: "https://example.com/p.jpg".to_string(),
            notes: None,
            ai_suggested_species: vec!["Common Coot".to_string()],
            created_at: Utc.with_ymd_and_hms(2024, 5, 18, 8, 0, 0).unwrap(),
        };

        let json = serde_json::to_value(&obs).unwrap();
        assert!(json.get("observerName").is_some());
        assert!(json.get("dateObserved").is_some());
        assert!(json.get("aiSuggestedSpecies").is_some());
        assert!(json.get("species_name").is_none());
    }
}
