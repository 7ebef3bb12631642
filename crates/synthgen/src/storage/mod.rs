pub mod artifacts;

pub use artifacts::{ArtifactDir, ArtifactStore, ARTIFACT_EXTENSIONS};
