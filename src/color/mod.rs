//! Color math for the animation controller.
//!
//! All colors are `Srgb<f32>` with channels in the 0.0-1.0 range. Everything
//! here is total: bad input (NaN, infinities, out-of-range channels) gets
//! clamped rather than reported, so the animation never stops over a number.

use palette::{Mix, Srgb};

pub const BLACK: Srgb<f32> = Srgb::new(0.0, 0.0, 0.0);

/// Clamp a color into the valid channel range. Non-finite channels become
/// 0.0.
pub fn sanitize(color: Srgb<f32>) -> Srgb<f32> {
    let clean = |channel: f32| {
        if channel.is_finite() {
            channel.clamp(0.0, 1.0)
        } else {
            0.0
        }
    };

    Srgb::new(clean(color.red), clean(color.green), clean(color.blue))
}

/// Component-wise linear interpolation between two colors at
/// `step / total_steps`.
///
/// `total_steps == 0` returns `end` immediately, and `step >= total_steps`
/// returns `end` exactly rather than trusting floating point to land there.
pub fn interpolate(start: Srgb<f32>, end: Srgb<f32>, step: u32, total_steps: u32) -> Srgb<f32> {
    let start = sanitize(start);
    let end = sanitize(end);

    if step >= total_steps {
        return end;
    }

    let progress = (step as f32 / total_steps as f32).clamp(0.0, 1.0);
    start.mix(end, progress)
}

/// Scale a color's brightness by `intensity`, clamped back into range.
pub fn scale(color: Srgb<f32>, intensity: f32) -> Srgb<f32> {
    sanitize(Srgb::new(
        color.red * intensity,
        color.green * intensity,
        color.blue * intensity,
    ))
}

/// Hex-encode a color as `#rrggbb` for display renderers.
pub fn to_hex(color: Srgb<f32>) -> String {
    let bytes: Srgb<u8> = sanitize(color).into_format();
    format!("#{:02x}{:02x}{:02x}", bytes.red, bytes.green, bytes.blue)
}
