//! Error types for Quarry

use thiserror::Error;

/// The main error type for Quarry operations
#[derive(Debug, Error)]
pub enum QuarryError {
    #[error("Malformed section header at offset {offset}: {remaining} byte(s) left, header needs {needed}")]
    MalformedHeader {
        offset: usize,
        remaining: usize,
        needed: usize,
    },

    #[error("Truncated payload in section '{tag}' at offset {offset}: needs {needed} byte(s), {remaining} left")]
    TruncatedPayload {
        tag: String,
        offset: usize,
        needed: u64,
        remaining: usize,
    },

    #[error("Unrecognized section '{tag}' at offset {offset}")]
    UnrecognizedSection { tag: String, offset: usize },

    #[error("Unrecognized wedge format: stride {0}")]
    UnrecognizedWedgeFormat(u32),

    #[error("Unrecognized face format: stride {0}")]
    UnrecognizedFaceFormat(u32),

    #[error("Unexpected stride in section '{tag}': expected {expected}, got {found}")]
    UnexpectedStride {
        tag: String,
        expected: u32,
        found: u32,
    },

    #[error("Corrupt mesh data: {0}")]
    CorruptMeshData(String),

    #[error("Mesh not found: {0}")]
    MeshNotFound(String),

    #[error("Texture not found: {0}")]
    TextureNotFound(String),

    #[error("Placement parse error: {0}")]
    PlacementParse(String),

    #[error("Placement cycle detected: {0}")]
    PlacementCycle(String),

    #[error("Material error: {0}")]
    MaterialError(String),

    #[error("Light error: {0}")]
    LightError(String),

    #[error("Unknown scene handle: {0}")]
    UnknownHandle(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),
}

/// Result type alias for Quarry operations
pub type Result<T> = std::result::Result<T, QuarryError>;

/// Coarse classification used to decide how far a failure propagates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed or unsupported binary input. Fatal for the affected asset.
    StructuralFormat,
    /// A referenced file does not exist. Triggers fallback substitution.
    ResourceMissing,
    /// The placement tree itself could not be read or walked.
    Placement,
    /// A material or light collaborator rejected its input.
    Collaborator,
    Io,
    Config,
}

impl QuarryError {
    pub fn class(&self) -> ErrorClass {
        match self {
            QuarryError::MalformedHeader { .. }
            | QuarryError::TruncatedPayload { .. }
            | QuarryError::UnrecognizedSection { .. }
            | QuarryError::UnrecognizedWedgeFormat(_)
            | QuarryError::UnrecognizedFaceFormat(_)
            | QuarryError::UnexpectedStride { .. }
            | QuarryError::CorruptMeshData(_) => ErrorClass::StructuralFormat,
            QuarryError::MeshNotFound(_) | QuarryError::TextureNotFound(_) => {
                ErrorClass::ResourceMissing
            }
            QuarryError::PlacementParse(_) | QuarryError::PlacementCycle(_) => {
                ErrorClass::Placement
            }
            QuarryError::MaterialError(_)
            | QuarryError::LightError(_)
            | QuarryError::UnknownHandle(_) => ErrorClass::Collaborator,
            QuarryError::IoError(_) => ErrorClass::Io,
            QuarryError::ConfigError(_) | QuarryError::TomlParseError(_) => ErrorClass::Config,
        }
    }
}

impl From<toml::de::Error> for QuarryError {
    fn from(err: toml::de::Error) -> Self {
        QuarryError::TomlParseError(err.to_string())
    }
}

/// A recoverable problem reported alongside a successful result
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Warning {
    /// Faces whose corners did not resolve to three distinct vertices
    #[error("Discarded {0} degenerate face(s)")]
    DegenerateFaces(usize),
    /// Points that received conflicting colors from different wedges
    #[error("{0} vertex(es) with ambiguous vertex colors")]
    AmbiguousVertexColors(usize),
    /// Placement had no mesh reference
    #[error("No mesh, defaulting to fallback mesh")]
    NoMeshReference,
    /// Mesh file could not be located
    #[error("Mesh not imported, defaulting to fallback mesh: {0}")]
    MissingMesh(String),
    /// Texture file could not be located
    #[error("Texture not found: {0}")]
    MissingTexture(String),
    /// Light group index not present in the lights file
    #[error("Light group {0} not found")]
    MissingLightGroup(i32),
    /// Material could not be matched to a slot by name or index
    #[error("Material {0} matched no slot by name or index")]
    UnassignedMaterial(String),
}

impl Warning {
    /// Data-integrity warnings come from the mesh content itself; the rest
    /// describe resources that could not be resolved.
    pub fn is_data_integrity(&self) -> bool {
        matches!(
            self,
            Warning::DegenerateFaces(_) | Warning::AmbiguousVertexColors(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_errors_are_structural() {
        let err = QuarryError::UnrecognizedWedgeFormat(20);
        assert_eq!(err.class(), ErrorClass::StructuralFormat);
        assert_eq!(err.to_string(), "Unrecognized wedge format: stride 20");
    }

    #[test]
    fn test_missing_resources_classified() {
        assert_eq!(
            QuarryError::MeshNotFound("/Game/Rock".into()).class(),
            ErrorClass::ResourceMissing
        );
    }

    #[test]
    fn test_warning_kinds() {
        assert!(Warning::DegenerateFaces(2).is_data_integrity());
        assert!(!Warning::MissingTexture("T_Rock".into()).is_data_integrity());
        assert_eq!(
            Warning::DegenerateFaces(3).to_string(),
            "Discarded 3 degenerate face(s)"
        );
        assert_eq!(
            Warning::MissingLightGroup(4).to_string(),
            "Light group 4 not found"
        );
        assert_eq!(
            Warning::MissingMesh("/Game/Rock".into()).to_string(),
            "Mesh not imported, defaulting to fallback mesh: /Game/Rock"
        );
    }
}
