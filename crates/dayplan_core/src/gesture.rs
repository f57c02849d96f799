//! Horizontal swipe to day navigation.
//!
//! A drag moves the list sideways by at most [`MAX_DRAG_PX`]. While dragging,
//! every [`PIXELS_PER_DAY`] of travel previews one day further away from the
//! anchor (dragging right goes back in time). On release the swipe commits to
//! the adjacent day if it travelled more than [`COMMIT_THRESHOLD_PX`] or the
//! previewed day changed at any point; otherwise it snaps back to the anchor.

use time::{Date, Duration};

pub const MAX_DRAG_PX: f64 = 300.0;
pub const PIXELS_PER_DAY: f64 = 250.0;
pub const COMMIT_THRESHOLD_PX: f64 = 249.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragFrame {
    pub offset_px: f64,
    pub displayed: Date,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwipeRelease {
    Commit { day: Date, snap_from_px: f64 },
    Cancel { day: Date, snap_from_px: f64 },
}

impl SwipeRelease {
    pub fn day(&self) -> Date {
        match self {
            Self::Commit { day, .. } | Self::Cancel { day, .. } => *day,
        }
    }

    pub fn is_commit(&self) -> bool {
        matches!(self, Self::Commit { .. })
    }
}

#[derive(Debug, Clone)]
pub struct DaySwipe {
    anchor: Date,
    displayed: Date,
    offset_px: f64,
    crossed_day: bool,
}

impl DaySwipe {
    pub fn begin(anchor: Date) -> Self {
        Self {
            anchor,
            displayed: anchor,
            offset_px: 0.0,
            crossed_day: false,
        }
    }

    pub fn anchor(&self) -> Date {
        self.anchor
    }

    pub fn drag(&mut self, dx: f64) -> DragFrame {
        let clamped = clamp_drag(dx);
        let days = (clamped / PIXELS_PER_DAY).round() as i64;
        let displayed = step_day(self.anchor, -days);

        if displayed != self.displayed {
            self.crossed_day = true;
            self.displayed = displayed;
        }
        self.offset_px = clamped;

        DragFrame {
            offset_px: clamped,
            displayed,
        }
    }

    pub fn release(self, dx: f64) -> SwipeRelease {
        let dx = if dx.is_finite() { dx } else { 0.0 };
        let snap_from_px = self.offset_px;

        if dx.abs() > COMMIT_THRESHOLD_PX || self.crossed_day {
            let delta = if dx > 0.0 { -1 } else { 1 };
            SwipeRelease::Commit {
                day: step_day(self.anchor, delta),
                snap_from_px,
            }
        } else {
            SwipeRelease::Cancel {
                day: self.anchor,
                snap_from_px,
            }
        }
    }
}

fn clamp_drag(dx: f64) -> f64 {
    if dx.is_finite() {
        dx.clamp(-MAX_DRAG_PX, MAX_DRAG_PX)
    } else {
        0.0
    }
}

/// `day` moved by `delta` days, saturating at [`Date::MIN`] and [`Date::MAX`].
pub fn step_day(day: Date, delta: i64) -> Date {
    let span = i64::from(Date::MAX.to_julian_day()) - i64::from(Date::MIN.to_julian_day());
    let edge = if delta < 0 { Date::MIN } else { Date::MAX };
    day.checked_add(Duration::days(delta.clamp(-span, span)))
        .unwrap_or(edge)
}
