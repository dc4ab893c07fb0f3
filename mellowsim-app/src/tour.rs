//! Guided tours: recorded cursor positions replayed as a sequence of zooms.
//!
//! The first non-comment line holds the raster width the tour was captured
//! at; every following line is one `x,y` cursor position. Blank lines and
//! lines starting with `#` are ignored.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info};

use crate::error::TourError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tour {
    recorded_width: u32,
    points: Vec<(u32, u32)>,
}

impl Tour {
    pub fn new(recorded_width: u32, points: Vec<(u32, u32)>) -> Result<Self, TourError> {
        if recorded_width == 0 {
            return Err(TourError::Malformed {
                line: 1,
                reason: "recorded width must be > 0".into(),
            });
        }
        Ok(Self {
            recorded_width,
            points,
        })
    }

    pub fn parse(text: &str) -> Result<Self, TourError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

        let (line, header) = lines.next().ok_or(TourError::Malformed {
            line: 1,
            reason: "missing recorded width".into(),
        })?;
        let recorded_width = header.parse::<u32>().map_err(|e| TourError::Malformed {
            line,
            reason: format!("invalid recorded width {header:?}: {e}"),
        })?;

        let points = lines
            .map(|(line, l)| parse_point(line, l))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(recorded_width, points)
    }

    pub fn recorded_width(&self) -> u32 {
        self.recorded_width
    }

    pub fn points(&self) -> &[(u32, u32)] {
        &self.points
    }

    /// Points scaled from the recorded width to `live_width`.
    ///
    /// The ratio between the two widths must be a whole number in one
    /// direction or the other. A point outside the recorded width, or one
    /// that does not fit a `u32` once scaled, is out of bounds.
    pub fn rescale(&self, live_width: u32) -> Result<Vec<(u32, u32)>, TourError> {
        let recorded = self.recorded_width;
        let incompatible = TourError::IncompatibleWidth {
            recorded,
            live: live_width,
        };
        if live_width == 0 {
            return Err(incompatible);
        }
        let (mul, div) = if live_width >= recorded && live_width % recorded == 0 {
            (live_width / recorded, 1)
        } else if recorded % live_width == 0 {
            (1, recorded / live_width)
        } else {
            return Err(incompatible);
        };
        let scale = |v: u32| v.checked_mul(mul).map(|v| v / div);
        let points = self
            .points
            .iter()
            .map(|&(x, y)| match (x < recorded, scale(x), scale(y)) {
                (true, Some(sx), Some(sy)) => Ok((sx, sy)),
                _ => Err(TourError::OutOfBounds { x, y }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(recorded, live_width, "Tour rescaled");
        Ok(points)
    }
}

fn parse_point(line: usize, text: &str) -> Result<(u32, u32), TourError> {
    let malformed = |reason: String| TourError::Malformed { line, reason };
    let (x, y) = text
        .split_once(',')
        .ok_or_else(|| malformed(format!("expected `x,y`, got {text:?}")))?;
    let x = x
        .trim()
        .parse::<u32>()
        .map_err(|e| malformed(format!("invalid x {x:?}: {e}")))?;
    let y = y
        .trim()
        .parse::<u32>()
        .map_err(|e| malformed(format!("invalid y {y:?}: {e}")))?;
    Ok((x, y))
}

/// Read and parse a tour file.
pub fn load_tour(path: &Path) -> Result<Tour, TourError> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TourError::NotFound(path.to_path_buf()),
        _ => TourError::Malformed {
            line: 0,
            reason: format!("cannot read {}: {e}", path.display()),
        },
    })?;
    let tour = Tour::parse(&text)?;
    info!(
        path = %path.display(),
        points = tour.points.len(),
        recorded_width = tour.recorded_width,
        "Loaded tour"
    );
    Ok(tour)
}
