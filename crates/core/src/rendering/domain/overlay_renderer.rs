use ndarray::ArrayViewMut3;

use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::{OVERLAY_COLOR, OVERLAY_LABEL_SCALE, OVERLAY_THICKNESS};
use crate::shared::frame::Frame;
use crate::tracking::domain::track_store::TrackStore;
use crate::tracking::domain::tracked_face::{TrackId, TrackedFace};

/// 3x5 dot glyphs for `0`..=`9`, one row per byte, most significant of the
/// low three bits on the left.
const DIGIT_GLYPHS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b001, 0b001, 0b001],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];
const GLYPH_WIDTH: i32 = 3;
const GLYPH_HEIGHT: i32 = 5;

/// Draws an outline around every tracked face, optionally labelled with
/// its track id.
///
/// Boxes partly outside the frame are clipped; boxes entirely outside are
/// skipped. Only the first three channels are painted. The label sits just
/// above the box, or just inside its top edge when there is no room above.
#[derive(Clone, Copy, Debug)]
pub struct OverlayRenderer {
    color: [u8; 3],
    thickness: u32,
    label_scale: u32,
}

impl OverlayRenderer {
    /// Outline only; see [`with_label_scale`](Self::with_label_scale).
    pub fn new(color: [u8; 3], thickness: u32) -> Self {
        Self {
            color,
            thickness: thickness.max(1),
            label_scale: 0,
        }
    }

    /// Labels each box with its track id, `scale` pixels per glyph dot.
    /// 0 turns labels off.
    pub fn with_label_scale(mut self, scale: u32) -> Self {
        self.label_scale = scale;
        self
    }

    /// Draws the store's current tracks while holding its lock, so the
    /// overlay never mixes two association passes. Returns the number of
    /// outlines drawn.
    pub fn render<S: TrackStore>(&self, store: &S, frame: &mut Frame) -> usize {
        store.with_exclusive_access(|state| self.draw(frame, state.table.faces()))
    }

    pub fn draw(&self, frame: &mut Frame, faces: &[TrackedFace]) -> usize {
        let mut view = frame.as_ndarray_mut();
        let mut drawn = 0;
        for face in faces {
            if self.draw_outline(&mut view, face.bbox()) {
                if self.label_scale > 0 {
                    self.draw_label(&mut view, face.bbox(), face.id);
                }
                drawn += 1;
            }
        }
        drawn
    }

    fn draw_outline(&self, view: &mut ArrayViewMut3<'_, u8>, bbox: BoundingBox) -> bool {
        let (h, w, _) = view.dim();
        let (h, w) = (h as i32, w as i32);
        if w == 0 || h == 0 {
            return false;
        }

        let left = bbox.left.max(0);
        let top = bbox.top.max(0);
        let right = bbox.right.min(w - 1);
        let bottom = bbox.bottom.min(h - 1);
        if left > right || top > bottom {
            return false;
        }

        for t in 0..self.thickness as i32 {
            for row in [bbox.top + t, bbox.bottom - t] {
                for x in left..=right {
                    self.paint(view, x, row);
                }
            }
            for col in [bbox.left + t, bbox.right - t] {
                for y in top..=bottom {
                    self.paint(view, col, y);
                }
            }
        }
        true
    }

    fn draw_label(&self, view: &mut ArrayViewMut3<'_, u8>, bbox: BoundingBox, id: TrackId) {
        let scale = self.label_scale as i32;
        let above = bbox.top - (GLYPH_HEIGHT + 1) * scale;
        let y0 = if above >= 0 {
            above
        } else {
            bbox.top + self.thickness as i32 + scale
        };

        let mut x0 = bbox.left;
        for digit in id.0.to_string().bytes().map(|b| usize::from(b - b'0')) {
            for (row, bits) in DIGIT_GLYPHS[digit].iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits >> (GLYPH_WIDTH - 1 - col) & 1 == 0 {
                        continue;
                    }
                    let x = x0 + col * scale;
                    let y = y0 + row as i32 * scale;
                    for dy in 0..scale {
                        for dx in 0..scale {
                            self.paint(view, x + dx, y + dy);
                        }
                    }
                }
            }
            x0 += (GLYPH_WIDTH + 1) * scale;
        }
    }

    /// Paints one pixel; coordinates outside the frame are ignored.
    fn paint(&self, view: &mut ArrayViewMut3<'_, u8>, x: i32, y: i32) {
        let (h, w, channels) = view.dim();
        if x < 0 || y < 0 || x as usize >= w || y as usize >= h {
            return;
        }
        for c in 0..channels.min(3) {
            view[[y as usize, x as usize, c]] = self.color[c];
        }
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new(OVERLAY_COLOR, OVERLAY_THICKNESS).with_label_scale(OVERLAY_LABEL_SCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::infrastructure::shared_track_store::SharedTrackStore;

    const RED: [u8; 3] = [255, 0, 0];

    fn blank(w: u32, h: u32) -> Frame {
        Frame::new(vec![0u8; (w * h * 3) as usize], w, h, 3, 0)
    }

    fn face(l: i32, t: i32, r: i32, b: i32) -> TrackedFace {
        TrackedFace::new(TrackId(1), &BoundingBox::new(l, t, r, b))
    }

    fn pixel(frame: &Frame, x: usize, y: usize) -> [u8; 3] {
        let arr = frame.as_ndarray();
        [arr[[y, x, 0]], arr[[y, x, 1]], arr[[y, x, 2]]]
    }

    #[test]
    fn test_outline_painted_interior_untouched() {
        let mut frame = blank(10, 10);
        let renderer = OverlayRenderer::new(RED, 1);
        assert_eq!(renderer.draw(&mut frame, &[face(2, 2, 7, 7)]), 1);

        assert_eq!(pixel(&frame, 2, 2), RED);
        assert_eq!(pixel(&frame, 7, 7), RED);
        assert_eq!(pixel(&frame, 4, 2), RED);
        assert_eq!(pixel(&frame, 2, 5), RED);
        assert_eq!(pixel(&frame, 4, 4), [0, 0, 0]);
        assert_eq!(pixel(&frame, 0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_thickness_extends_inward() {
        let mut frame = blank(10, 10);
        let renderer = OverlayRenderer::new(RED, 2);
        renderer.draw(&mut frame, &[face(1, 1, 8, 8)]);

        assert_eq!(pixel(&frame, 2, 4), RED);
        assert_eq!(pixel(&frame, 4, 7), RED);
        assert_eq!(pixel(&frame, 3, 3), [0, 0, 0]);
    }

    #[test]
    fn test_box_partly_outside_is_clipped() {
        let mut frame = blank(10, 10);
        let renderer = OverlayRenderer::new(RED, 1);
        assert_eq!(renderer.draw(&mut frame, &[face(-5, -5, 4, 4)]), 1);

        assert_eq!(pixel(&frame, 4, 0), RED);
        assert_eq!(pixel(&frame, 0, 4), RED);
        assert_eq!(pixel(&frame, 2, 2), [0, 0, 0]);
    }

    #[test]
    fn test_box_fully_outside_is_skipped() {
        let mut frame = blank(10, 10);
        let renderer = OverlayRenderer::new(RED, 1);
        assert_eq!(renderer.draw(&mut frame, &[face(20, 20, 30, 30)]), 0);
        assert!(frame.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_single_channel_frame_gets_first_component() {
        let mut frame = Frame::new(vec![0u8; 16], 4, 4, 1, 0);
        let renderer = OverlayRenderer::new([9, 8, 7], 1);
        renderer.draw(&mut frame, &[face(0, 0, 3, 3)]);
        assert_eq!(frame.as_ndarray()[[0, 0, 0]], 9);
    }

    #[test]
    fn test_render_reads_store_tracks() {
        let store = SharedTrackStore::new();
        store.with_exclusive_access(|state| {
            state.table.push(&BoundingBox::new(1, 1, 3, 3));
            state.table.push(&BoundingBox::new(5, 5, 8, 8));
            state.face_count = state.table.len();
        });

        let mut frame = blank(10, 10);
        let drawn = OverlayRenderer::default().render(&store, &mut frame);

        assert_eq!(drawn, 2);
        assert_eq!(pixel(&frame, 1, 1), OVERLAY_COLOR);
        assert_eq!(pixel(&frame, 8, 8), OVERLAY_COLOR);
    }

    fn labelled(id: u64, l: i32, t: i32, r: i32, b: i32) -> TrackedFace {
        TrackedFace::new(TrackId(id), &BoundingBox::new(l, t, r, b))
    }

    #[test]
    fn test_label_drawn_above_box() {
        let mut frame = blank(20, 20);
        let renderer = OverlayRenderer::new(RED, 1).with_label_scale(1);
        renderer.draw(&mut frame, &[labelled(7, 4, 10, 15, 18)]);

        // "7": top row fully lit, then a single column on the right.
        for x in 4..7 {
            assert_eq!(pixel(&frame, x, 4), RED);
        }
        assert_eq!(pixel(&frame, 6, 8), RED);
        assert_eq!(pixel(&frame, 4, 8), [0, 0, 0]);
        // Nothing inside the box.
        assert_eq!(pixel(&frame, 8, 14), [0, 0, 0]);
    }

    #[test]
    fn test_label_moves_inside_when_no_room_above() {
        let mut frame = blank(20, 20);
        let renderer = OverlayRenderer::new(RED, 1).with_label_scale(1);
        renderer.draw(&mut frame, &[labelled(1, 2, 1, 17, 17)]);

        // "1" starts at (2, 3): middle dot of its top row.
        assert_eq!(pixel(&frame, 3, 3), RED);
        assert_eq!(pixel(&frame, 4, 3), [0, 0, 0]);
    }

    #[test]
    fn test_multi_digit_ids_advance_per_glyph() {
        let mut frame = blank(30, 30);
        let renderer = OverlayRenderer::new(RED, 1).with_label_scale(1);
        renderer.draw(&mut frame, &[labelled(10, 2, 10, 25, 25)]);

        // "1" at x 2..5, gap at x 5, "0" at x 6..9.
        assert_eq!(pixel(&frame, 3, 4), RED);
        assert_eq!(pixel(&frame, 5, 4), [0, 0, 0]);
        assert_eq!(pixel(&frame, 6, 6), RED);
        assert_eq!(pixel(&frame, 7, 6), [0, 0, 0]);
        assert_eq!(pixel(&frame, 8, 6), RED);
    }

    #[test]
    fn test_label_scale_enlarges_dots() {
        let mut frame = blank(30, 30);
        let renderer = OverlayRenderer::new(RED, 1).with_label_scale(2);
        renderer.draw(&mut frame, &[labelled(7, 4, 15, 25, 25)]);

        // Label starts at y = 15 - 12 = 3; top row spans x 4..10.
        assert_eq!(pixel(&frame, 9, 3), RED);
        assert_eq!(pixel(&frame, 9, 4), RED);
        assert_eq!(pixel(&frame, 10, 3), [0, 0, 0]);
    }

    #[test]
    fn test_label_clipped_at_frame_edge() {
        let mut frame = blank(6, 12);
        let renderer = OverlayRenderer::new(RED, 1).with_label_scale(1);
        assert_eq!(renderer.draw(&mut frame, &[labelled(88, 4, 7, 5, 11)]), 1);
        assert_eq!(pixel(&frame, 4, 1), RED);
    }

    #[test]
    fn test_default_labels_track_ids() {
        let store = SharedTrackStore::new();
        store.with_exclusive_access(|state| {
            state.table.push(&BoundingBox::new(2, 20, 15, 28));
        });
        let mut frame = blank(30, 30);
        OverlayRenderer::default().render(&store, &mut frame);

        // Track #1 at scale 2: label rows 8..18, middle column x 4..6.
        assert_eq!(pixel(&frame, 4, 8), OVERLAY_COLOR);
        assert_eq!(pixel(&frame, 2, 8), [0, 0, 0]);
    }
}
