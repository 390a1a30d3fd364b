/// World-space vector, same tuple layout the network packets use
pub type Vec3 = (f32, f32, f32);

pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    (a.0 + b.0, a.1 + b.1, a.2 + b.2)
}

pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    (a.0 - b.0, a.1 - b.1, a.2 - b.2)
}

pub fn scale(v: Vec3, s: f32) -> Vec3 {
    (v.0 * s, v.1 * s, v.2 * s)
}

pub fn dot(a: Vec3, b: Vec3) -> f32 {
    a.0 * b.0 + a.1 * b.1 + a.2 * b.2
}

pub fn length(v: Vec3) -> f32 {
    dot(v, v).sqrt()
}

pub fn distance(a: Vec3, b: Vec3) -> f32 {
    length(sub(a, b))
}

/// Unit vector in the direction of `v`, or None for a zero-length input
pub fn normalize(v: Vec3) -> Option<Vec3> {
    let len = length(v);
    if len <= f32::EPSILON || !len.is_finite() {
        return None;
    }
    Some(scale(v, 1.0 / len))
}
