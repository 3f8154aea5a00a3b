use places_client::Place;
use serde::{Deserialize, Serialize};

/// An upstream place stamped with the neighborhood query that found it.
///
/// Serializes flat: the upstream record's own keys plus `neighborhood` and
/// `borough`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CollectedPlace {
    #[serde(flatten)]
    pub place: Place,
    pub neighborhood: String,
    pub borough: String,
}

impl CollectedPlace {
    pub fn new(place: Place, neighborhood: impl Into<String>, borough: impl Into<String>) -> Self {
        Self {
            place,
            neighborhood: neighborhood.into(),
            borough: borough.into(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.place.key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_flat_with_annotations() {
        let place: Place = serde_json::from_value(json!({
            "id": "p1",
            "displayName": { "text": "Lucali" },
            "rating": 4.7
        }))
        .unwrap();

        let collected = CollectedPlace::new(place, "Carroll Gardens", "Brooklyn");
        let value = serde_json::to_value(collected).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "p1",
                "displayName": { "text": "Lucali" },
                "rating": 4.7,
                "neighborhood": "Carroll Gardens",
                "borough": "Brooklyn"
            })
        );
    }

    #[test]
    fn test_annotations_not_captured_as_extra() {
        let collected: CollectedPlace = serde_json::from_value(json!({
            "id": "p1",
            "neighborhood": "Astoria",
            "borough": "Queens"
        }))
        .unwrap();
        assert_eq!(collected.neighborhood, "Astoria");
        assert!(collected.place.extra.is_empty());
    }

    #[test]
    fn test_nested_fields_survive_annotation() {
        let raw = json!({
            "id": "p1",
            "regularOpeningHours": {
                "openNow": true,
                "nextCloseTime": "2025-03-14T22:00:00Z"
            },
            "types": [],
            "neighborhood": "Inwood",
            "borough": "Manhattan"
        });

        let collected: CollectedPlace = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&collected).unwrap(), raw);
    }
}
