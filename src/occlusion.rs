// Occlusion model: rectangles in image pixel space and the mouse drag that
// produces them. Kept free of any GUI types so the gesture can be tested.

use log::debug;

pub const MAX_OCCLUSIONS: usize = 100;
pub const GREY: [u8; 4] = [128, 128, 128, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle, top-left origin, never negative in size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: a.x.abs_diff(b.x),
            height: a.y.abs_diff(b.y),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersect with a `width` x `height` image.
    pub fn clamp_to(&self, width: u32, height: u32) -> Region {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Region {
            x,
            y,
            width: self.width.min(width - x),
            height: self.height.min(height - y),
        }
    }

    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occlusion {
    pub region: Region,
    pub color: [u8; 4],
}

impl Occlusion {
    pub fn grey(region: Region) -> Self {
        Self { region, color: GREY }
    }
}

/// Left-button drag gesture plus the occlusions finished so far.
#[derive(Debug, Default)]
pub struct DragState {
    start: Option<Point>,
    current: Option<Region>,
    occlusions: Vec<Occlusion>,
}

impl DragState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drawing(&self) -> bool {
        self.start.is_some()
    }

    pub fn is_full(&self) -> bool {
        self.occlusions.len() >= MAX_OCCLUSIONS
    }

    pub fn press(&mut self, p: Point) {
        if self.is_full() {
            debug!("occlusion limit reached, ignoring press at {:?}", p);
            return;
        }
        self.start = Some(p);
        self.current = Some(Region::from_corners(p, p));
    }

    pub fn motion(&mut self, p: Point) {
        if let Some(start) = self.start {
            self.current = Some(Region::from_corners(start, p));
        }
    }

    /// Finish the drag. Returns the occlusion that was added, if any.
    pub fn release(&mut self, p: Point) -> Option<Occlusion> {
        let start = self.start.take()?;
        self.current = None;
        let region = Region::from_corners(start, p);
        // A click without movement leaves nothing to hide or crop.
        if region.is_empty() {
            debug!("discarding empty drag at {:?}", start);
            return None;
        }
        let occlusion = Occlusion::grey(region);
        self.occlusions.push(occlusion);
        debug!("occlusion #{} at {:?}", self.occlusions.len(), region);
        Some(occlusion)
    }

    /// The rectangle being dragged right now.
    pub fn preview(&self) -> Option<Region> {
        self.current
    }

    pub fn occlusions(&self) -> &[Occlusion] {
        &self.occlusions
    }

    pub fn into_occlusions(self) -> Vec<Occlusion> {
        self.occlusions
    }
}
