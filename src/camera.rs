use maths_rs::Mat4f;
use maths_rs::Vec3f;
use maths_rs::Vec4f;
use maths_rs::*;

// matrices in this module use the row vector convention: a point is transformed by `p * m`,
// so translation sits in the last row and transforms compose left to right

/// Right handed perspective projection mapping depth into 0..1
pub fn create_perspective_fov_rh(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4f {
    let h = 1.0 / f32::tan(fov_y * 0.5);
    let w = h / aspect;
    let range = far / (near - far);
    Mat4f::from((
        Vec4f::new(w, 0.0, 0.0, 0.0),
        Vec4f::new(0.0, h, 0.0, 0.0),
        Vec4f::new(0.0, 0.0, range, -1.0),
        Vec4f::new(0.0, 0.0, range * near, 0.0),
    ))
}

/// Right handed view matrix for a camera at `eye` looking towards `at`
pub fn create_look_at_rh(eye: Vec3f, at: Vec3f, up: Vec3f) -> Mat4f {
    let r2 = normalize(eye - at);
    let r0 = normalize(cross(up, r2));
    let r1 = cross(r2, r0);
    let neg_eye = -eye;
    Mat4f::from((
        Vec4f::new(r0.x, r1.x, r2.x, 0.0),
        Vec4f::new(r0.y, r1.y, r2.y, 0.0),
        Vec4f::new(r0.z, r1.z, r2.z, 0.0),
        Vec4f::new(dot(r0, neg_eye), dot(r1, neg_eye), dot(r2, neg_eye), 1.0),
    ))
}

/// Rotation about the y-axis by `radians`
pub fn create_rotation_y(radians: f32) -> Mat4f {
    let (s, c) = radians.sin_cos();
    Mat4f::from((
        Vec4f::new(c, 0.0, -s, 0.0),
        Vec4f::new(0.0, 1.0, 0.0, 0.0),
        Vec4f::new(s, 0.0, c, 0.0),
        Vec4f::new(0.0, 0.0, 0.0, 1.0),
    ))
}

/// Transform a point by a row vector convention matrix, including the perspective divide
pub fn transform_point(p: Vec3f, m: &Mat4f) -> Vec3f {
    let v = Vec4f::new(p.x, p.y, p.z, 1.0);
    let col = |c: usize| v.x * m.m[c] + v.y * m.m[4 + c] + v.z * m.m[8 + c] + v.w * m.m[12 + c];
    let w = col(3);
    Vec3f::new(col(0) / w, col(1) / w, col(2) / w)
}
