/// Pre-rotation corrector
///
/// Produces the two matrices the vertex stage needs to draw upright content on a surface
/// whose images are physically rotated: a 2×2 rotation derived only from the surface
/// transform, and a 4×4 scale that letterboxes the content into the logical surface.
/// Both travel in one push-constant block and are multiplied in the shader.

use bytemuck::{Pod, Zeroable};
use glam::{Mat2, Mat4, Vec2, Vec3};
use crate::surface::{Extent2D, PreTransform};

/// 2×2 rotation compensating the surface transform
///
/// Built from exact column vectors (no trigonometry) so that
/// `correction_matrix(Rotate90) * correction_matrix(Rotate270)` is exactly identity.
/// Columns follow the usual counter-clockwise convention: `(cos, sin), (-sin, cos)`.
pub fn correction_matrix(transform: PreTransform) -> Mat2 {
    match transform {
        PreTransform::Identity => Mat2::IDENTITY,
        PreTransform::Rotate90 => Mat2::from_cols(Vec2::new(0.0, 1.0), Vec2::new(-1.0, 0.0)),
        PreTransform::Rotate180 => Mat2::from_cols(Vec2::new(-1.0, 0.0), Vec2::new(0.0, -1.0)),
        PreTransform::Rotate270 => Mat2::from_cols(Vec2::new(0.0, -1.0), Vec2::new(1.0, 0.0)),
    }
}

/// 4×4 scale fitting `content` into the logical surface while preserving its aspect
///
/// Must be given the logical (unrotated) surface size: with the physical size the
/// content would appear stretched whenever a 90°/270° rotation swaps width and height.
/// Neither axis scale exceeds 1.0. A zero dimension yields identity.
pub fn scene_scale_matrix(logical_surface: Extent2D, content: Extent2D) -> Mat4 {
    let (scale_x, scale_y) = fit_scale(logical_surface, content);
    Mat4::from_scale(Vec3::new(scale_x, scale_y, 1.0))
}

fn fit_scale(surface: Extent2D, content: Extent2D) -> (f32, f32) {
    if surface.width == 0 || surface.height == 0 || content.width == 0 || content.height == 0 {
        return (1.0, 1.0);
    }

    let scale_w = surface.width as f32 / content.width as f32;
    let scale_h = surface.height as f32 / content.height as f32;
    let minimal = scale_w.min(scale_h);

    (minimal / scale_w, minimal / scale_h)
}

/// Vertex-stage push constants
///
/// Layout matches `layout(push_constant) uniform { mat4 mvp; mat2 preRotate; }`
/// (80 bytes, column-major).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PushConstantBlock {
    pub mvp: Mat4,
    pub pre_rotate: Mat2,
}

impl PushConstantBlock {
    pub const SIZE: u32 = std::mem::size_of::<PushConstantBlock>() as u32;

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Per-frame correction for one generation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationCorrection {
    pub scene_scale: Mat4,
    pub pre_rotate: Mat2,
}

impl RotationCorrection {
    pub fn compute(logical_surface: Extent2D, content: Extent2D, transform: PreTransform) -> Self {
        Self {
            scene_scale: scene_scale_matrix(logical_surface, content),
            pre_rotate: correction_matrix(transform),
        }
    }

    pub fn push_constants(&self) -> PushConstantBlock {
        PushConstantBlock {
            mvp: self.scene_scale,
            pre_rotate: self.pre_rotate,
        }
    }

    /// Both matrices folded into one 4×4 (rotation applied after the scale)
    ///
    /// Equivalent to what the shader computes from the separate matrices.
    pub fn fused(&self) -> Mat4 {
        let r = self.pre_rotate;
        let rotation = Mat4::from_cols_array(&[
            r.x_axis.x, r.x_axis.y, 0.0, 0.0,
            r.y_axis.x, r.y_axis.y, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ]);
        rotation * self.scene_scale
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "corrector_tests.rs"]
mod tests;
