//! Collision Geometry
//!
//! Pure overlap predicates shared by movement validation, respawn safety
//! checks, and bullet physics. No side effects; scalar clamping is
//! `f32::clamp` from std.

/// Check whether a circle overlaps an axis-aligned square.
///
/// True iff the squared distance from the circle center to the closest
/// point of the square is less than `radius²`. Touching exactly at the
/// radius does not count as overlap.
#[inline]
pub fn circle_rect_overlap(cx: f32, cy: f32, radius: f32, rx: f32, ry: f32, size: f32) -> bool {
    let closest_x = cx.clamp(rx, rx + size);
    let closest_y = cy.clamp(ry, ry + size);

    let dx = cx - closest_x;
    let dy = cy - closest_y;

    dx * dx + dy * dy < radius * radius
}

/// Check whether a point lies within an axis-aligned square, edges included.
#[inline]
pub fn point_in_rect(px: f32, py: f32, rx: f32, ry: f32, size: f32) -> bool {
    px >= rx && px <= rx + size && py >= ry && py <= ry + size
}
