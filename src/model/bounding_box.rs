use glam::Vec3;

/// Axis-aligned bounding box.
///
/// [`BoundingBox::EMPTY`] holds the seed values `min = +inf`, `max = -inf`;
/// a box computed from zero points keeps them, so check [`is_empty`] before
/// using the extent for anything.
///
/// [`is_empty`]: BoundingBox::is_empty
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub const EMPTY: BoundingBox = BoundingBox { min: Vec3::INFINITY, max: Vec3::NEG_INFINITY };

    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        points.into_iter().fold(Self::EMPTY, |bb, p| bb.including(p))
    }

    /// Bounds over the first three floats of every `stride`-sized record.
    /// A trailing partial record is ignored.
    pub fn from_records(data: &[f32], stride: usize) -> Self {
        if stride < 3 {
            return Self::EMPTY;
        }
        Self::from_points(data.chunks_exact(stride).map(|r| Vec3::new(r[0], r[1], r[2])))
    }

    pub fn including(self, p: Vec3) -> Self {
        Self { min: self.min.min(p), max: self.max.max(p) }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Largest componentwise dimension.
    pub fn max_extent(&self) -> f32 {
        self.size().max_element()
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}
