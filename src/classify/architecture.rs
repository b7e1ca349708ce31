use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metadata::training_metadata::{TrainingMetadata, BASE_MODEL_VERSION_KEY};

/// Version tag a host application assigns to a loaded network.
///
/// Parsed from the host's enum name; names outside the known set are kept
/// verbatim so they can be reported unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SdVersion {
    Sd1,
    Sd2,
    Sdxl,
    Other(String),
}

impl SdVersion {
    pub fn from_name(name: &str) -> Self {
        match name {
            "SD1" => SdVersion::Sd1,
            "SD2" => SdVersion::Sd2,
            "SDXL" => SdVersion::Sdxl,
            other => SdVersion::Other(other.to_owned()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SdVersion::Sd1 => "SD1",
            SdVersion::Sd2 => "SD2",
            SdVersion::Sdxl => "SDXL",
            SdVersion::Other(name) => name,
        }
    }
}

impl fmt::Display for SdVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for SdVersion {
    fn from(name: String) -> Self {
        SdVersion::from_name(&name)
    }
}

impl From<SdVersion> for String {
    fn from(version: SdVersion) -> Self {
        version.name().to_owned()
    }
}

/// Infers the base architecture tag (`SD`, `SDXL`, `FLUX`).
///
/// A host-reported version wins; otherwise `ss_base_model_version` is
/// matched by substring. Unrecognized metadata strings give `None`, while
/// unrecognized host versions are passed through by name.
pub fn infer_architecture(host_version: Option<&SdVersion>, metadata: &TrainingMetadata) -> Option<String> {
    if let Some(version) = host_version {
        let tag = match version {
            SdVersion::Sd1 | SdVersion::Sd2 => "SD",
            SdVersion::Sdxl => "SDXL",
            SdVersion::Other(name) => name.as_str(),
        };
        return Some(tag.to_owned());
    }

    let version = metadata.get_str(BASE_MODEL_VERSION_KEY)?.to_lowercase();
    let tag = if version.contains("sd_") || version.contains("sd3") {
        "SD"
    } else if version.contains("sdxl") {
        "SDXL"
    } else if version.contains("flux") {
        "FLUX"
    } else {
        return None;
    };
    Some(tag.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(version: &str) -> TrainingMetadata {
        [(BASE_MODEL_VERSION_KEY, version)].into_iter().collect()
    }

    #[test]
    fn host_versions() {
        let empty = TrainingMetadata::new();
        assert_eq!(infer_architecture(Some(&SdVersion::Sd1), &empty).as_deref(), Some("SD"));
        assert_eq!(infer_architecture(Some(&SdVersion::Sd2), &empty).as_deref(), Some("SD"));
        assert_eq!(infer_architecture(Some(&SdVersion::Sdxl), &empty).as_deref(), Some("SDXL"));
        assert_eq!(
            infer_architecture(Some(&SdVersion::from_name("Unknown")), &empty).as_deref(),
            Some("Unknown")
        );
    }

    #[test]
    fn host_version_takes_priority_over_metadata() {
        let m = meta("flux1");
        assert_eq!(infer_architecture(Some(&SdVersion::Sd1), &m).as_deref(), Some("SD"));
    }

    #[test]
    fn metadata_strings() {
        assert_eq!(infer_architecture(None, &meta("sd_v1")).as_deref(), Some("SD"));
        assert_eq!(infer_architecture(None, &meta("sd3_base")).as_deref(), Some("SD"));
        assert_eq!(infer_architecture(None, &meta("sdxl_base_v1-0")).as_deref(), Some("SDXL"));
        assert_eq!(infer_architecture(None, &meta("SDXL_Base")).as_deref(), Some("SDXL"));
        assert_eq!(infer_architecture(None, &meta("flux_dev")).as_deref(), Some("FLUX"));
        assert_eq!(infer_architecture(None, &meta("unknown_x")), None);
    }

    #[test]
    fn no_source_gives_none() {
        assert_eq!(infer_architecture(None, &TrainingMetadata::new()), None);
        let numeric: TrainingMetadata = [(BASE_MODEL_VERSION_KEY, 3)].into_iter().collect();
        assert_eq!(infer_architecture(None, &numeric), None);
    }

    #[test]
    fn version_names_round_trip_through_strings() {
        for name in ["SD1", "SD2", "SDXL", "Flux"] {
            assert_eq!(SdVersion::from_name(name).name(), name);
        }
    }
}
