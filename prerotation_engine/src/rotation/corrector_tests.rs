//! Unit tests for corrector.rs

use glam::{Mat2, Mat4, Vec2, Vec4};
use crate::rotation::corrector::{
    correction_matrix, scene_scale_matrix, PushConstantBlock, RotationCorrection,
};
use crate::surface::{Extent2D, PreTransform};

const EPSILON: f32 = 1e-5;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// Pixel size of the unit quad on the surface after scaling
fn on_screen_size(surface: Extent2D, content: Extent2D) -> (f32, f32) {
    let m = scene_scale_matrix(surface, content);
    (m.x_axis.x * surface.width as f32, m.y_axis.y * surface.height as f32)
}

// ============================================================================
// correction_matrix
// ============================================================================

#[test]
fn test_identity_has_no_correction() {
    assert_eq!(correction_matrix(PreTransform::Identity), Mat2::IDENTITY);
}

#[test]
fn test_each_rotation_matches_its_angle() {
    for transform in PreTransform::ALL {
        let expected = Mat2::from_angle(transform.degrees().to_radians());
        let actual = correction_matrix(transform);
        assert!(
            actual.abs_diff_eq(expected, EPSILON),
            "{:?}: {:?} != {:?}",
            transform,
            actual,
            expected
        );
    }
}

#[test]
fn test_rotate90_maps_x_axis_to_y_axis() {
    let rotated = correction_matrix(PreTransform::Rotate90) * Vec2::X;
    assert_eq!(rotated, Vec2::Y);
}

#[test]
fn test_quarter_turns_cancel_exactly() {
    let r90 = correction_matrix(PreTransform::Rotate90);
    let r270 = correction_matrix(PreTransform::Rotate270);
    assert_eq!(r90 * r270, Mat2::IDENTITY);
    assert_eq!(r270 * r90, Mat2::IDENTITY);
}

#[test]
fn test_half_turn_is_its_own_inverse() {
    let r180 = correction_matrix(PreTransform::Rotate180);
    assert_eq!(r180 * r180, Mat2::IDENTITY);
    assert_eq!(r180, -Mat2::IDENTITY);
}

#[test]
fn test_rotations_compose() {
    let r90 = correction_matrix(PreTransform::Rotate90);
    assert_eq!(r90 * r90, correction_matrix(PreTransform::Rotate180));
    assert_eq!(r90 * r90 * r90, correction_matrix(PreTransform::Rotate270));
}

// ============================================================================
// scene_scale_matrix
// ============================================================================

#[test]
fn test_scale_preserves_content_aspect() {
    let surfaces = [
        Extent2D::new(1080, 1920),
        Extent2D::new(1920, 1080),
        Extent2D::new(800, 600),
        Extent2D::new(1, 1000),
    ];
    let contents = [Extent2D::new(256, 256), Extent2D::new(1024, 512), Extent2D::new(300, 900)];

    for surface in surfaces {
        for content in contents {
            let (w, h) = on_screen_size(surface, content);
            let content_aspect = content.width as f32 / content.height as f32;
            assert!(
                (w / h - content_aspect).abs() < 1e-3 * content_aspect,
                "surface {:?} content {:?}: {} vs {}",
                surface,
                content,
                w / h,
                content_aspect
            );
        }
    }
}

#[test]
fn test_scale_never_exceeds_one() {
    for (surface, content) in [
        (Extent2D::new(1080, 1920), Extent2D::new(512, 512)),
        (Extent2D::new(1920, 1080), Extent2D::new(512, 128)),
        (Extent2D::new(600, 800), Extent2D::new(10, 4000)),
    ] {
        let m = scene_scale_matrix(surface, content);
        assert!(m.x_axis.x <= 1.0 + EPSILON);
        assert!(m.y_axis.y <= 1.0 + EPSILON);
        // One axis always fills the surface
        assert!(approx_eq(m.x_axis.x, 1.0) || approx_eq(m.y_axis.y, 1.0));
    }
}

#[test]
fn test_square_texture_on_portrait_surface() {
    let m = scene_scale_matrix(Extent2D::new(1080, 1920), Extent2D::new(512, 512));
    assert!(approx_eq(m.x_axis.x, 1.0));
    assert!(approx_eq(m.y_axis.y, 1080.0 / 1920.0));
    assert_eq!(m.z_axis.z, 1.0);
    assert_eq!(m.w_axis, Vec4::W);
}

#[test]
fn test_matching_aspect_is_identity() {
    let m = scene_scale_matrix(Extent2D::new(800, 600), Extent2D::new(400, 300));
    assert!(m.abs_diff_eq(Mat4::IDENTITY, EPSILON));
}

#[test]
fn test_zero_dimension_yields_identity() {
    assert_eq!(scene_scale_matrix(Extent2D::new(0, 600), Extent2D::new(4, 4)), Mat4::IDENTITY);
    assert_eq!(scene_scale_matrix(Extent2D::new(800, 600), Extent2D::new(4, 0)), Mat4::IDENTITY);
}

// ============================================================================
// PushConstantBlock / RotationCorrection
// ============================================================================

#[test]
fn test_push_constant_block_layout() {
    assert_eq!(PushConstantBlock::SIZE, 80);
    let block = PushConstantBlock {
        mvp: Mat4::IDENTITY,
        pre_rotate: correction_matrix(PreTransform::Rotate90),
    };
    let bytes = block.as_bytes();
    assert_eq!(bytes.len(), 80);

    // mat2 starts right after the mat4, column-major: (0, 1), (-1, 0)
    let pre_rotate: &[f32] = bytemuck::cast_slice(&bytes[64..80]);
    assert_eq!(pre_rotate, &[0.0, 1.0, -1.0, 0.0]);
}

#[test]
fn test_correction_keeps_matrices_separate() {
    let correction = RotationCorrection::compute(
        Extent2D::new(1080, 1920),
        Extent2D::new(512, 512),
        PreTransform::Rotate90,
    );
    let block = correction.push_constants();
    assert_eq!(block.pre_rotate, correction_matrix(PreTransform::Rotate90));
    assert_eq!(block.mvp, scene_scale_matrix(Extent2D::new(1080, 1920), Extent2D::new(512, 512)));
}

#[test]
fn test_fused_matches_separate_application() {
    let correction = RotationCorrection::compute(
        Extent2D::new(1080, 1920),
        Extent2D::new(1024, 512),
        PreTransform::Rotate270,
    );
    let corner = Vec4::new(1.0, -1.0, 0.0, 1.0);

    let scaled = correction.scene_scale * corner;
    let rotated = correction.pre_rotate * Vec2::new(scaled.x, scaled.y);
    let fused = correction.fused() * corner;

    assert!(approx_eq(fused.x, rotated.x));
    assert!(approx_eq(fused.y, rotated.y));
    assert!(approx_eq(fused.w, 1.0));
}
