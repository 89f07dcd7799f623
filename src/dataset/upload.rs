//! The training-data upload format:
//! `{"<label>": {"samples": [{"landmarks": [{"x", "y", "z"} x 21]}]}}`.

use std::fmt;
use std::path::Path;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{Dataset, GestureClass, ValidationError};
use crate::landmarks::Sample;

#[derive(Serialize)]
struct ClassRecordRef<'a> {
    samples: &'a [Sample],
}

#[derive(Deserialize)]
struct ClassRecord {
    samples: Vec<Sample>,
}

impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.classes.len()))?;
        for class in &self.classes {
            map.serialize_entry(
                &class.label,
                &ClassRecordRef {
                    samples: &class.samples,
                },
            )?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Dataset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(DatasetVisitor)
    }
}

struct DatasetVisitor;

impl<'de> Visitor<'de> for DatasetVisitor {
    type Value = Dataset;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map from gesture label to {\"samples\": [...]}")
    }

    // Reading entries in document order keeps class order stable.
    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Dataset, A::Error> {
        let mut classes: Vec<GestureClass> = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((label, record)) = access.next_entry::<String, ClassRecord>()? {
            if classes.iter().any(|class| class.label == label) {
                return Err(de::Error::custom(format!("duplicate class label '{label}'")));
            }
            classes.push(GestureClass::new(label, record.samples));
        }
        Ok(Dataset { classes })
    }
}

impl Dataset {
    /// Parse and validate an upload document. Nothing is returned unless every
    /// sample is well formed.
    pub fn from_json(text: &str) -> Result<Self, ValidationError> {
        let dataset: Dataset = serde_json::from_str(text)?;
        if dataset.labels().any(str::is_empty) {
            return Err(ValidationError::EmptyLabel);
        }
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn load(path: &Path) -> Result<Self, ValidationError> {
        let text = std::fs::read_to_string(path).map_err(|source| ValidationError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::from_json(&text)?;
        tracing::info!(
            "Loaded training data from {}: {} classes, {} samples",
            path.display(),
            dataset.class_count(),
            dataset.sample_count()
        );
        Ok(dataset)
    }

    pub fn to_json(&self) -> Result<String, ValidationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the dataset in the upload format.
    pub fn save(&self, path: &Path) -> Result<(), ValidationError> {
        let text = self.to_json()?;
        std::fs::write(path, text).map_err(|source| ValidationError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{LANDMARK_COUNT, Landmark};

    fn landmarks_json(count: usize, value: f32) -> String {
        let points: Vec<String> = (0..count)
            .map(|_| format!("{{\"x\":{value},\"y\":{value},\"z\":{value}}}"))
            .collect();
        format!("{{\"landmarks\":[{}]}}", points.join(","))
    }

    #[test]
    fn parses_classes_in_document_order() {
        let text = format!(
            "{{\"zeta\":{{\"samples\":[{}]}},\"alpha\":{{\"samples\":[{},{}]}}}}",
            landmarks_json(LANDMARK_COUNT, 0.1),
            landmarks_json(LANDMARK_COUNT, 0.2),
            landmarks_json(LANDMARK_COUNT, 0.3)
        );
        let dataset = Dataset::from_json(&text).unwrap();
        assert_eq!(dataset.labels().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert_eq!(dataset.class("alpha").unwrap().samples.len(), 2);
        assert_eq!(
            dataset.class("zeta").unwrap().samples[0].landmarks[0],
            Landmark::new(0.1, 0.1, 0.1)
        );
    }

    #[test]
    fn short_sample_is_rejected() {
        let text = format!(
            "{{\"open\":{{\"samples\":[{}]}}}}",
            landmarks_json(LANDMARK_COUNT - 1, 0.1)
        );
        let err = Dataset::from_json(&text).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::LandmarkCount { found: 20, index: 0, .. }
        ));
    }

    #[test]
    fn duplicate_and_malformed_documents_are_rejected() {
        let sample = landmarks_json(LANDMARK_COUNT, 0.1);
        let duplicate = format!(
            "{{\"open\":{{\"samples\":[{sample}]}},\"open\":{{\"samples\":[{sample}]}}}}"
        );
        assert!(matches!(
            Dataset::from_json(&duplicate),
            Err(ValidationError::Json(_))
        ));
        assert!(matches!(
            Dataset::from_json("[1, 2, 3]"),
            Err(ValidationError::Json(_))
        ));
        assert!(matches!(
            Dataset::from_json("{\"open\": {}}"),
            Err(ValidationError::Json(_))
        ));
    }

    #[test]
    fn json_output_reloads_to_same_dataset() {
        let mut dataset = Dataset::new();
        let hand = vec![Landmark::new(0.5, -0.25, 0.125); LANDMARK_COUNT];
        dataset.add_sample("thumbs_up", Sample::new(hand.clone())).unwrap();
        dataset.add_sample("peace", Sample::new(hand)).unwrap();

        let reloaded = Dataset::from_json(&dataset.to_json().unwrap()).unwrap();
        assert_eq!(reloaded, dataset);
    }
}
