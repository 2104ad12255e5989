// Render projection
//
// Maps a level to the list of water segments the view layer draws, bottom
// segment first. Pure: no state, no side effects.

/// One visible unit of water, addressed by its position from the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    index: u32,
}

impl Segment {
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Class names the view attaches to this segment.
    pub fn css_class(&self) -> String {
        format!("bathtub-waterlevel level-{}", self.index)
    }
}

/// Segments for `level`: exactly `level` of them, indexed `0..level`.
pub fn project(level: u32) -> Vec<Segment> {
    (0..level).map(|index| Segment { index }).collect()
}
