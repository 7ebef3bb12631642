use crate::sanitize::filename_component;

const QUALITY_QUALIFIER: &str = "high quality, detailed";

/// Prompt for the `index`-th item (1-based) of a batch.
pub fn build_prompt(label: &str, index: u32) -> String {
    if index > 1 {
        format!("{}, {}, variation {}", label, QUALITY_QUALIFIER, index)
    } else {
        format!("{}, {}", label, QUALITY_QUALIFIER)
    }
}

/// `<label>_<NNN>.<ext>` with the label made safe for the filesystem.
pub fn artifact_filename(label: &str, index: u32, extension: &str) -> String {
    format!("{}_{:03}.{}", filename_component(label), index, extension)
}
