use std::collections::HashSet;
use std::sync::Arc;

use super::{
    ArtifactError, ArtifactOrigin, ArtifactPayload, ArtifactPayloads, METADATA_MARKER,
    ModelArtifact, ModelMetadata, PAYLOAD_COUNT, Topology,
};
use crate::landmarks::FEATURE_LEN;

const WEIGHTS_TOKEN: &str = "weights";
const WEIGHTS_SUFFIX: &str = ".weights.bin";
use crate::ml::mlp::{self, MlpModel};
use crate::ml::{GestureClassifier, MinMaxScaling, ModelKind};

/// Serialize `artifact` into `<name>.json`, `<name>.weights.bin` and
/// `<name>_meta.json` payloads.
///
/// Names that contain the metadata marker or `weights` are rejected so the
/// payloads stay distinguishable on load.
pub fn save(artifact: &ModelArtifact, name: &str) -> Result<ArtifactPayloads, ArtifactError> {
    check_name(name)?;
    let metadata = artifact.metadata();
    let topology = Topology::from_metadata(metadata);
    let payloads = ArtifactPayloads {
        topology: ArtifactPayload::new(
            format!("{name}.json"),
            serde_json::to_vec_pretty(&topology)?,
        ),
        weights: ArtifactPayload::new(
            format!("{name}{WEIGHTS_SUFFIX}"),
            encode_weights(&artifact.classifier().weights()),
        ),
        metadata: ArtifactPayload::new(
            format!("{name}{METADATA_MARKER}.json"),
            serde_json::to_vec_pretty(metadata)?,
        ),
    };
    tracing::debug!(
        "Serialized model v{} ({} labels, {} weight bytes)",
        artifact.version(),
        metadata.output_dim,
        payloads.weights.bytes.len()
    );
    Ok(payloads)
}

/// Rebuild a model from its payloads.
///
/// Metadata is located and parsed first, the network shape is derived from it,
/// then the weights are attached. The returned artifact carries `version`.
pub fn load(payloads: &[ArtifactPayload], version: u64) -> Result<ModelArtifact, ArtifactError> {
    if payloads.len() < PAYLOAD_COUNT {
        return Err(ArtifactError::InsufficientPayloads {
            found: payloads.len(),
        });
    }
    let meta_idx = find_metadata(payloads).ok_or(ArtifactError::MetadataMissing)?;
    let metadata: ModelMetadata = serde_json::from_slice(&payloads[meta_idx].bytes)
        .map_err(|err| ArtifactError::InvalidMetadata(err.to_string()))?;
    validate_metadata(&metadata)?;

    let rest: Vec<(usize, &ArtifactPayload)> = payloads
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != meta_idx)
        .collect();
    let weights_idx = rest
        .iter()
        .find(|(_, payload)| payload.name.ends_with(WEIGHTS_SUFFIX))
        .or_else(|| rest.iter().find(|(_, payload)| is_weights_name(&payload.name)))
        .map(|(idx, _)| *idx)
        .ok_or_else(|| {
            ArtifactError::WeightsMissing(rest.iter().map(|(_, p)| p.name.clone()).collect())
        })?;
    if let Some((_, topology)) = rest
        .iter()
        .find(|(idx, payload)| *idx != weights_idx && payload.name.ends_with(".json"))
    {
        check_topology(topology, &metadata);
    }

    let params = decode_weights(&payloads[weights_idx].bytes)?;
    let expected = mlp::parameter_count(
        metadata.input_dim,
        metadata.hidden_units,
        metadata.output_dim,
    );
    if params.len() != expected {
        return Err(ArtifactError::DimensionMismatch {
            output_dim: metadata.output_dim,
            expected,
            found: params.len(),
            implied_output_dim: mlp::implied_output_dim(
                params.len(),
                metadata.input_dim,
                metadata.hidden_units,
            ),
        });
    }
    if metadata.labels.len() != metadata.output_dim {
        return Err(ArtifactError::InvalidMetadata(format!(
            "outputDim {} does not match {} labels",
            metadata.output_dim,
            metadata.labels.len()
        )));
    }

    let classifier: Arc<dyn GestureClassifier> = match metadata.model_kind {
        ModelKind::MlpV1 => {
            let scaling = metadata
                .normalization
                .clone()
                .unwrap_or_else(|| MinMaxScaling::identity(metadata.input_dim));
            let model = MlpModel::from_parameters(
                metadata.labels.clone(),
                metadata.input_dim,
                metadata.hidden_units,
                scaling,
                &params,
            )
            .map_err(ArtifactError::InvalidModel)?;
            Arc::new(model)
        }
    };
    Ok(ModelArtifact {
        version,
        origin: ArtifactOrigin::Loaded,
        metadata,
        classifier,
    })
}

fn check_name(name: &str) -> Result<(), ArtifactError> {
    if name.is_empty() || name.contains(METADATA_MARKER) || name.contains(WEIGHTS_TOKEN) {
        return Err(ArtifactError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Index of the metadata payload, preferring an exact `_meta.json` suffix.
///
/// `<name>.json` also ends in the suffix when `<name>` ends in the marker, so
/// the longest matching name wins.
fn find_metadata(payloads: &[ArtifactPayload]) -> Option<usize> {
    let suffix = format!("{METADATA_MARKER}.json");
    payloads
        .iter()
        .enumerate()
        .filter(|(_, payload)| payload.name.ends_with(&suffix))
        .max_by_key(|(idx, payload)| (payload.name.len(), std::cmp::Reverse(*idx)))
        .map(|(idx, _)| idx)
        .or_else(|| {
            payloads
                .iter()
                .position(|payload| payload.name.contains(METADATA_MARKER))
        })
}

fn is_weights_name(name: &str) -> bool {
    name.ends_with(".bin") || name.contains(WEIGHTS_TOKEN)
}

fn validate_metadata(metadata: &ModelMetadata) -> Result<(), ArtifactError> {
    let invalid = |msg: String| Err(ArtifactError::InvalidMetadata(msg));
    if metadata.input_dim != FEATURE_LEN {
        return invalid(format!(
            "inputDim {} (expected {FEATURE_LEN})",
            metadata.input_dim
        ));
    }
    if metadata.labels.is_empty() {
        return invalid("no labels".to_string());
    }
    let mut seen = HashSet::new();
    if let Some(dup) = metadata.labels.iter().find(|label| !seen.insert(label.as_str())) {
        return invalid(format!("duplicate label '{dup}'"));
    }
    if metadata.hidden_units == 0 {
        return invalid("hiddenUnits must be at least 1".to_string());
    }
    if let Some(scaling) = &metadata.normalization {
        if !scaling.is_consistent(metadata.input_dim) {
            return invalid("normalization does not match inputDim".to_string());
        }
    }
    Ok(())
}

fn check_topology(payload: &ArtifactPayload, metadata: &ModelMetadata) {
    match serde_json::from_slice::<Topology>(&payload.bytes) {
        Ok(topology) if topology != Topology::from_metadata(metadata) => {
            tracing::warn!(
                "Topology in {} disagrees with metadata; using metadata",
                payload.name
            );
        }
        Ok(_) => {}
        Err(err) => {
            tracing::warn!("Ignoring unreadable topology {}: {err}", payload.name);
        }
    }
}

pub(crate) fn encode_weights(weights: &[f32]) -> Vec<u8> {
    weights.iter().flat_map(|w| w.to_le_bytes()).collect()
}

pub(crate) fn decode_weights(bytes: &[u8]) -> Result<Vec<f32>, ArtifactError> {
    if bytes.len() % 4 != 0 {
        return Err(ArtifactError::CorruptWeights(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(labels: &[&str]) -> ModelArtifact {
        let hidden = 4;
        let outputs = labels.len();
        let params: Vec<f32> = (0..mlp::parameter_count(FEATURE_LEN, hidden, outputs))
            .map(|i| ((i % 7) as f32 - 3.0) * 0.05)
            .collect();
        let model = MlpModel::from_parameters(
            labels.iter().map(|l| l.to_string()).collect(),
            FEATURE_LEN,
            hidden,
            MinMaxScaling::identity(FEATURE_LEN),
            &params,
        )
        .unwrap();
        ModelArtifact::new(Arc::new(model), 1, ArtifactOrigin::Trained)
    }

    fn probe() -> Vec<f32> {
        (0..FEATURE_LEN).map(|i| (i as f32 * 0.37).sin().abs()).collect()
    }

    #[test]
    fn save_names_three_payloads() {
        let payloads = save(&artifact(&["open", "closed"]), "hands").unwrap();
        assert_eq!(payloads.topology.name, "hands.json");
        assert_eq!(payloads.weights.name, "hands.weights.bin");
        assert_eq!(payloads.metadata.name, "hands_meta.json");

        let meta: serde_json::Value = serde_json::from_slice(&payloads.metadata.bytes).unwrap();
        assert_eq!(meta["inputDim"], 63);
        assert_eq!(meta["outputDim"], 2);
        assert_eq!(meta["labels"][1], "closed");
    }

    #[test]
    fn load_accepts_payloads_in_any_order() {
        let original = artifact(&["open", "closed", "point"]);
        let mut payloads = save(&original, "model").unwrap().into_vec();
        payloads.reverse();
        let loaded = load(&payloads, 2).unwrap();
        assert_eq!(loaded.version(), 2);
        assert_eq!(loaded.origin(), ArtifactOrigin::Loaded);
        assert_eq!(loaded.labels(), original.labels());
        assert_eq!(loaded.classify(&probe()), original.classify(&probe()));
    }

    #[test]
    fn missing_metadata_marker_is_reported() {
        let mut payloads = save(&artifact(&["open", "closed"]), "model")
            .unwrap()
            .into_vec();
        payloads[2].name = "model.meta.json".to_string();
        assert!(matches!(
            load(&payloads, 1),
            Err(ArtifactError::MetadataMissing)
        ));
    }

    #[test]
    fn odd_weight_length_is_corrupt() {
        let mut payloads = save(&artifact(&["open", "closed"]), "model").unwrap();
        payloads.weights.bytes.pop();
        let err = load(&payloads.into_vec(), 1).unwrap_err();
        assert!(matches!(err, ArtifactError::CorruptWeights(_)));
    }

    #[test]
    fn metadata_must_describe_landmark_features() {
        let mut payloads = save(&artifact(&["open", "closed"]), "model").unwrap();
        let mut meta: serde_json::Value =
            serde_json::from_slice(&payloads.metadata.bytes).unwrap();
        meta["inputDim"] = 42.into();
        payloads.metadata.bytes = serde_json::to_vec(&meta).unwrap();
        let err = load(&payloads.into_vec(), 1).unwrap_err();
        assert!(matches!(err, ArtifactError::InvalidMetadata(_)), "{err}");
    }

    #[test]
    fn unreadable_topology_does_not_block_loading() {
        let mut payloads = save(&artifact(&["open", "closed"]), "model").unwrap();
        payloads.topology.bytes = b"not json".to_vec();
        assert!(load(&payloads.into_vec(), 1).is_ok());
    }

    #[test]
    fn names_that_shadow_payload_markers_are_rejected() {
        let model = artifact(&["open", "closed"]);
        for name in ["weights", "hand_meta", ""] {
            let err = save(&model, name).unwrap_err();
            assert!(matches!(err, ArtifactError::InvalidName(_)), "{name}: {err}");
        }
    }

    #[test]
    fn exact_suffixes_win_over_marker_substrings() {
        let original = artifact(&["open", "closed"]);
        let payloads = save(&original, "model").unwrap();
        for name in ["weights", "hand_meta"] {
            let renamed = vec![
                ArtifactPayload::new(format!("{name}.json"), payloads.topology.bytes.clone()),
                ArtifactPayload::new(format!("{name}.weights.bin"), payloads.weights.bytes.clone()),
                ArtifactPayload::new(format!("{name}_meta.json"), payloads.metadata.bytes.clone()),
            ];
            let loaded = load(&renamed, 2).unwrap_or_else(|err| panic!("{name}: {err}"));
            assert_eq!(loaded.classify(&probe()), original.classify(&probe()));
        }
    }

    #[test]
    fn output_dim_alone_disagreeing_with_weights_is_a_dimension_mismatch() {
        let mut payloads = save(&artifact(&["open", "closed"]), "model").unwrap();
        let mut meta: serde_json::Value =
            serde_json::from_slice(&payloads.metadata.bytes).unwrap();
        meta["outputDim"] = 3.into();
        payloads.metadata.bytes = serde_json::to_vec(&meta).unwrap();
        let err = load(&payloads.into_vec(), 1).unwrap_err();
        match err {
            ArtifactError::DimensionMismatch {
                output_dim,
                implied_output_dim,
                ..
            } => {
                assert_eq!(output_dim, 3);
                assert_eq!(implied_output_dim, Some(2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn labels_disagreeing_with_consistent_weights_are_invalid() {
        let mut payloads = save(&artifact(&["open", "closed"]), "model").unwrap();
        let mut meta: serde_json::Value =
            serde_json::from_slice(&payloads.metadata.bytes).unwrap();
        meta["labels"] = serde_json::json!(["open", "closed", "point"]);
        payloads.metadata.bytes = serde_json::to_vec(&meta).unwrap();
        let err = load(&payloads.into_vec(), 1).unwrap_err();
        assert!(matches!(err, ArtifactError::InvalidMetadata(_)), "{err}");
    }

    #[test]
    fn weights_round_trip_through_bytes() {
        let weights = vec![0.0, -1.5, f32::MIN_POSITIVE, 1e9];
        let bytes = encode_weights(&weights);
        assert_eq!(bytes.len(), 16);
        assert_eq!(decode_weights(&bytes).unwrap(), weights);
    }
}
