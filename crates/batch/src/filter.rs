// Scale/crop/pad filter graph for the two framing strategies

use crate::preset::Strategy;

/// Build the `-vf` expression that frames the source into `width`x`height`.
///
/// - cover: scale until both sides reach the target, center-crop the excess
/// - contain: scale until both sides fit, center-pad with `pad_color`
///
/// Both end with `setsar=1` so players see square pixels.
pub fn build_filter(width: u32, height: u32, strategy: Strategy, pad_color: &str) -> String {
    match strategy {
        Strategy::Cover => format!(
            "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1",
            w = width,
            h = height
        ),
        Strategy::Contain => format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:{color},setsar=1",
            w = width,
            h = height,
            color = pad_color
        ),
    }
}
