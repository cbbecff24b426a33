//! Camera geometry: pixel ↔ normalized device coordinates, projection
//! inversion and camera-to-world mapping of recognised regions.
//!
//! Conventions follow the head-mounted locatable camera: camera space looks
//! down `-z`, the projection matrix has an upper-triangular 3×3 block, and
//! image rows grow downwards while NDC `y` grows upwards.

use nalgebra::{Matrix4, Point2, Point3, UnitQuaternion, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Camera image size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Map a pixel position into `[-1, 1]²` normalized device coordinates.
#[inline]
pub fn pixel_to_ndc(px: f32, py: f32, width: f32, height: f32) -> Vector2<f32> {
    let zero_to_one = Vector2::new(px / width, 1.0 - py / height);
    zero_to_one * 2.0 - Vector2::new(1.0, 1.0)
}

/// Inverse of [`pixel_to_ndc`].
#[inline]
pub fn ndc_to_pixel(ndc: Vector2<f32>, width: f32, height: f32) -> Point2<f32> {
    let zero_to_one = (ndc + Vector2::new(1.0, 1.0)) * 0.5;
    Point2::new(zero_to_one.x * width, (1.0 - zero_to_one.y) * height)
}

/// Solve `P₃ₓ₃ · from = to` for the camera-space point `from`.
///
/// The 3×3 block of a skew-free perspective projection is upper triangular
/// with `P[0][1] = 0`, so this is plain back-substitution: `z` from the third
/// row, then `y`, then `x`. With `to = (ndc.x, ndc.y, 1)` the result lies on
/// the viewing ray of that NDC position.
pub fn unproject_vector(projection: &Matrix4<f32>, to: &Vector3<f32>) -> Vector3<f32> {
    let p = projection;
    let z = to.z / p[(2, 2)];
    let y = (to.y - z * p[(1, 2)]) / p[(1, 1)];
    let x = (to.x - z * p[(0, 2)]) / p[(0, 0)];
    Vector3::new(x, y, z)
}

/// Forward counterpart of [`unproject_vector`]: project a camera-space point
/// and normalise by the third row, giving `(ndc.x, ndc.y, 1)`.
///
/// Returns `None` for points on the camera plane.
pub fn project_vector(projection: &Matrix4<f32>, from: &Vector3<f32>) -> Option<Vector3<f32>> {
    let row = |r: usize| {
        projection[(r, 0)] * from.x + projection[(r, 1)] * from.y + projection[(r, 2)] * from.z
    };
    let w = row(2);
    if w.abs() < 1e-9 {
        return None;
    }
    Some(Vector3::new(row(0) / w, row(1) / w, 1.0))
}

/// Camera pose and intrinsics captured together with a photo.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraMatrices {
    pub camera_to_world: Matrix4<f32>,
    pub projection: Matrix4<f32>,
}

impl CameraMatrices {
    pub fn new(camera_to_world: Matrix4<f32>, projection: Matrix4<f32>) -> Self {
        Self {
            camera_to_world,
            projection,
        }
    }

    /// Camera centre in world space.
    #[inline]
    pub fn camera_position(&self) -> Point3<f32> {
        self.camera_to_world.transform_point(&Point3::origin())
    }

    /// A world-space point on the viewing ray through pixel `(px, py)`.
    pub fn pixel_ray_point(&self, pixel: Point2<f32>, resolution: Resolution) -> Point3<f32> {
        let ndc = pixel_to_ndc(
            pixel.x,
            pixel.y,
            resolution.width as f32,
            resolution.height as f32,
        );
        let camera_space = unproject_vector(&self.projection, &Vector3::new(ndc.x, ndc.y, 1.0));
        self.camera_to_world
            .transform_point(&Point3::from(camera_space))
    }

    /// Pixel position of a world point, `None` if it is behind the camera
    /// plane or the pose is not invertible.
    pub fn project_world_point(
        &self,
        world: &Point3<f32>,
        resolution: Resolution,
    ) -> Option<Point2<f32>> {
        let world_to_camera = self.camera_to_world.try_inverse()?;
        let camera = world_to_camera.transform_point(world);
        let ndc = project_vector(&self.projection, &camera.coords)?;
        Some(ndc_to_pixel(
            ndc.xy(),
            resolution.width as f32,
            resolution.height as f32,
        ))
    }

    /// Lift an image-space quadrilateral into world-space viewing rays.
    pub fn world_quad(&self, quad: &ImageQuad, resolution: Resolution) -> WorldQuad {
        WorldQuad {
            camera: self.camera_position(),
            middle: self.pixel_ray_point(quad.middle(), resolution),
            top_left: self.pixel_ray_point(quad.top_left, resolution),
            top_right: self.pixel_ray_point(quad.top_right, resolution),
            bottom_right: self.pixel_ray_point(quad.bottom_right, resolution),
            bottom_left: self.pixel_ray_point(quad.bottom_left, resolution),
        }
    }
}

/// Recognised region in image coordinates (pixels, origin top-left).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageQuad {
    pub top_left: Point2<f32>,
    pub top_right: Point2<f32>,
    pub bottom_right: Point2<f32>,
    pub bottom_left: Point2<f32>,
}

impl ImageQuad {
    /// Middle of the region, taken from the top edge width and left edge height.
    #[inline]
    pub fn middle(&self) -> Point2<f32> {
        Point2::new(
            self.top_left.x + (self.top_right.x - self.top_left.x) / 2.0,
            self.top_left.y + (self.bottom_left.y - self.top_left.y) / 2.0,
        )
    }
}

/// Recognised region lifted into world space: the camera centre plus one
/// point on each viewing ray.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldQuad {
    pub camera: Point3<f32>,
    pub middle: Point3<f32>,
    pub top_left: Point3<f32>,
    pub top_right: Point3<f32>,
    pub bottom_right: Point3<f32>,
    pub bottom_left: Point3<f32>,
}

impl WorldQuad {
    /// The five ray targets, middle first.
    pub fn targets(&self) -> [Point3<f32>; 5] {
        [
            self.middle,
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }
}

/// Orientation whose local `+z` axis points along `forward`.
///
/// With `yaw_only` the direction is flattened onto the horizontal plane first,
/// which keeps anchored content upright on slightly tilted walls.
pub fn look_rotation(forward: &Vector3<f32>, yaw_only: bool) -> UnitQuaternion<f32> {
    let dir = if yaw_only {
        Vector3::new(forward.x, 0.0, forward.z)
    } else {
        *forward
    };
    if dir.norm_squared() < 1e-12 {
        return UnitQuaternion::identity();
    }
    let up = if dir.normalize().cross(&Vector3::y()).norm_squared() < 1e-8 {
        Vector3::z()
    } else {
        Vector3::y()
    };
    UnitQuaternion::face_towards(&dir, &up)
}

/// Position and orientation of an anchored object.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl Pose {
    pub fn new(position: Point3<f32>, rotation: UnitQuaternion<f32>) -> Self {
        Self { position, rotation }
    }

    pub fn identity() -> Self {
        Self::new(Point3::origin(), UnitQuaternion::identity())
    }

    #[inline]
    pub fn forward(&self) -> Vector3<f32> {
        self.rotation * Vector3::z()
    }

    /// Move along the pose's own axes.
    pub fn translate_local(mut self, offset: &Vector3<f32>) -> Self {
        self.position += self.rotation * offset;
        self
    }
}
