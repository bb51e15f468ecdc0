//! Conversion from exported (left-handed, centimeter) placements to the
//! host's right-handed, meter-based, Z-up convention.
//!
//! Handedness flips by negating Y. For rotations that reflection maps a
//! quaternion `(x, y, z, w)` to `(-x, y, -z, w)`.

use crate::format::RotationValue;
use glam::{EulerRot, Quat};
use quarry_core::{Transform, Vec3};
use quarry_import::UNIT_SCALE;

/// Centimeters to meters, mirrored across the XZ plane
pub fn scale_position(position: [f32; 3]) -> Vec3 {
    Vec3::new(
        position[0] * UNIT_SCALE,
        -position[1] * UNIT_SCALE,
        position[2] * UNIT_SCALE,
    )
}

/// Quaternion of an exported rotator, in source handedness
fn source_rotator_quat(pitch: f32, yaw: f32, roll: f32) -> Quat {
    let (sp, cp) = (pitch.to_radians() * 0.5).sin_cos();
    let (sy, cy) = (yaw.to_radians() * 0.5).sin_cos();
    let (sr, cr) = (roll.to_radians() * 0.5).sin_cos();
    Quat::from_xyzw(
        cr * sp * sy - sr * cp * cy,
        -cr * sp * cy - sr * cp * sy,
        cr * cp * sy - sr * sp * cy,
        cr * cp * cy + sr * sp * sy,
    )
}

fn mirror(q: Quat) -> Quat {
    Quat::from_xyzw(-q.x, q.y, -q.z, q.w)
}

/// Host rotation for a rotator given as [pitch, yaw, roll] degrees
pub fn rotator_to_quat(rotator: [f32; 3]) -> Quat {
    let [pitch, yaw, roll] = rotator;
    mirror(source_rotator_quat(pitch, yaw, roll)).normalize()
}

/// Host rotation for either exported rotation form
pub fn rotation_to_quat(rotation: RotationValue) -> Quat {
    match rotation {
        RotationValue::Rotator(rotator) => rotator_to_quat(rotator),
        RotationValue::Quat([x, y, z, w]) => {
            let q = Quat::from_xyzw(x, y, z, w);
            if q.length_squared() <= f32::EPSILON {
                Quat::IDENTITY
            } else {
                mirror(q.normalize())
            }
        }
    }
}

/// Direct Euler permutation `(roll, -pitch, -yaw)` applied X, then Y, then Z.
///
/// Equivalent to [`rotator_to_quat`] up to quaternion sign; kept for
/// comparing against scenes imported with the Euler path.
pub fn legacy_euler(rotator: [f32; 3]) -> Quat {
    let [pitch, yaw, roll] = rotator;
    Quat::from_euler(
        EulerRot::ZYX,
        (-yaw).to_radians(),
        (-pitch).to_radians(),
        roll.to_radians(),
    )
}

/// Offset applied to every light: exported lights point along +X, host
/// lights along -Z.
pub fn light_correction() -> Quat {
    Quat::from_rotation_y(-std::f32::consts::FRAC_PI_2)
}

/// Full transform of a placement record
pub fn placement_transform(
    position: Option<[f32; 3]>,
    rotation: Option<RotationValue>,
    scale: Option<[f32; 3]>,
) -> Transform {
    let mut transform = Transform::IDENTITY;
    if let Some(position) = position {
        transform.position = scale_position(position);
    }
    if let Some(rotation) = rotation {
        transform.rotation = rotation_to_quat(rotation).to_array();
    }
    if let Some(scale) = scale {
        transform.scale = Vec3::from_array(scale);
    }
    transform
}
