use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};

use crate::generator::{
    GeneratedArtifact, GenerationMetadata, Generator, GeneratorError, InferenceParams,
};

/// Renders a flat tint derived from the prompt, overlaid with random grain.
///
/// Useful for demos and smoke runs where no real model is available. The
/// same prompt always gets the same tint; the grain differs per call unless
/// a seed is given.
pub struct PlaceholderGenerator {
    device: String,
}

impl PlaceholderGenerator {
    pub fn new(device: &str) -> Self {
        Self {
            device: device.to_string(),
        }
    }
}

impl Generator for PlaceholderGenerator {
    fn generate(
        &self,
        prompt: &str,
        params: &InferenceParams,
    ) -> Result<GeneratedArtifact, GeneratorError> {
        let tint = tint_for(prompt);
        let mut rng = XorShift::new(
            params
                .seed
                .unwrap_or_else(|| uuid::Uuid::new_v4().as_u128() as u64),
        );

        let image = RgbImage::from_fn(params.width.max(1), params.height.max(1), |_, _| {
            let grain = (rng.next() % 48) as i16 - 24;
            Rgb([
                shade(tint[0], grain),
                shade(tint[1], grain),
                shade(tint[2], grain),
            ])
        });

        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| GeneratorError::Encode(e.to_string()))?;

        Ok(GeneratedArtifact {
            bytes,
            extension: "png".to_string(),
            metadata: GenerationMetadata::new(&self.device, params),
        })
    }

    fn device(&self) -> &str {
        &self.device
    }
}

/// FNV-1a over the prompt, folded into an RGB triple.
fn tint_for(prompt: &str) -> [u8; 3] {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in prompt.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    [(hash >> 16) as u8, (hash >> 8) as u8, hash as u8]
}

fn shade(channel: u8, grain: i16) -> u8 {
    (i16::from(channel) + grain).clamp(0, 255) as u8
}

struct XorShift(u64);

impl XorShift {
    fn new(seed: u64) -> Self {
        // Zero is a fixed point of xorshift.
        Self(if seed == 0 { 0x9e37_79b9_7f4a_7c15 } else { seed })
    }

    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}
