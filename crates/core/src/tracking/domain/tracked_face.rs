use std::fmt;

use crate::shared::bounding_box::BoundingBox;

/// Identifier assigned when a track is created and kept across updates.
///
/// Ids grow monotonically per table and are never reused, so readers can
/// tell a continued face from a new one even when table positions shift.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A face carried across frames: its id plus the latest box assigned to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedFace {
    pub id: TrackId,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl TrackedFace {
    pub fn new(id: TrackId, bbox: &BoundingBox) -> Self {
        Self {
            id,
            x1: bbox.left,
            y1: bbox.top,
            x2: bbox.right,
            y2: bbox.bottom,
        }
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.x1, self.y1, self.x2, self.y2)
    }

    /// Overwrites the box in place; the id is untouched.
    pub fn assign(&mut self, bbox: &BoundingBox) {
        self.x1 = bbox.left;
        self.y1 = bbox.top;
        self.x2 = bbox.right;
        self.y2 = bbox.bottom;
    }
}

/// Ordered table of tracked faces.
///
/// Order is display order (first created first) and is the only ordering
/// readers may rely on. The id counter lives here so the association step
/// stays a pure function of its inputs.
#[derive(Clone, Debug)]
pub struct TrackTable {
    faces: Vec<TrackedFace>,
    next_id: u64,
}

impl TrackTable {
    pub fn new() -> Self {
        Self {
            faces: Vec::new(),
            next_id: 1,
        }
    }

    /// Builds a table with one fresh track per box, in order.
    pub fn from_boxes(boxes: &[BoundingBox]) -> Self {
        let mut table = Self::new();
        for b in boxes {
            table.push(b);
        }
        table
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn faces(&self) -> &[TrackedFace] {
        &self.faces
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrackedFace> {
        self.faces.iter()
    }

    pub fn boxes(&self) -> Vec<BoundingBox> {
        self.faces.iter().map(TrackedFace::bbox).collect()
    }

    pub fn ids(&self) -> Vec<TrackId> {
        self.faces.iter().map(|f| f.id).collect()
    }

    /// Appends a new track for `bbox` and returns its id.
    pub fn push(&mut self, bbox: &BoundingBox) -> TrackId {
        let id = TrackId(self.next_id);
        self.next_id += 1;
        self.faces.push(TrackedFace::new(id, bbox));
        id
    }

    /// Drops every track. The id counter keeps counting.
    pub fn clear(&mut self) {
        self.faces.clear();
    }

    pub(crate) fn get(&self, index: usize) -> Option<&TrackedFace> {
        self.faces.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut TrackedFace> {
        self.faces.get_mut(index)
    }

    pub(crate) fn faces_mut(&mut self) -> std::slice::IterMut<'_, TrackedFace> {
        self.faces.iter_mut()
    }

    pub(crate) fn remove(&mut self, index: usize) -> TrackedFace {
        self.faces.remove(index)
    }

    pub(crate) fn retain<F: FnMut(&TrackedFace) -> bool>(&mut self, keep: F) {
        self.faces.retain(keep);
    }
}

impl Default for TrackTable {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a TrackTable {
    type Item = &'a TrackedFace;
    type IntoIter = std::slice::Iter<'a, TrackedFace>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
