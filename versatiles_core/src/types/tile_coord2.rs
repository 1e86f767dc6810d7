//! A plain 2D tile coordinate (no zoom level), used where a bounding box
//! needs to address a single `(x, y)` cell at its own, already-known level.

use anyhow::{Result, ensure};
use std::{
	f64::consts::PI as PI32,
	fmt,
	ops::{Add, Sub},
};

#[derive(Eq, PartialEq, Clone, Hash, Copy)]
pub struct TileCoord2 {
	pub x: u32,
	pub y: u32,
}

#[allow(dead_code)]
impl TileCoord2 {
	pub fn new(x: u32, y: u32) -> TileCoord2 {
		TileCoord2 { x, y }
	}

	pub fn from_geo(x: f64, y: f64, z: u8, round_up: bool) -> Result<TileCoord2> {
		ensure!(z <= 31, "z {z} must be <= 31");
		ensure!(x >= -180., "x must be >= -180");
		ensure!(x <= 180., "x must be <= 180");
		ensure!(y >= -90., "y must be >= -90");
		ensure!(y <= 90., "y must be <= 90");

		let zoom: f64 = 2.0f64.powi(z as i32);
		let mut x = zoom * (x / 360.0 + 0.5);
		let mut y = zoom * (0.5 - 0.5 * (y * PI32 / 360.0 + PI32 / 4.0).tan().ln() / PI32);

		if round_up {
			x = x.sub(1e-6).floor();
			y = y.sub(1e-6).floor();
		} else {
			x = x.add(1e-6).floor();
			y = y.add(1e-6).floor();
		}

		Ok(TileCoord2 {
			x: x.min(zoom - 1.0).max(0.0) as u32,
			y: y.min(zoom - 1.0).max(0.0) as u32,
		})
	}

	pub fn subtract(&mut self, c: &TileCoord2) {
		self.x -= c.x;
		self.y -= c.y;
	}

	pub fn scale_by(&mut self, s: u32) {
		self.x *= s;
		self.y *= s;
	}
}

impl fmt::Debug for TileCoord2 {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_fmt(format_args!("TileCoord2({}, {})", &self.x, &self.y))
	}
}

impl PartialOrd for TileCoord2 {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		match self.y.partial_cmp(&other.y) {
			Some(core::cmp::Ordering::Equal) => {}
			ord => return ord,
		}
		self.x.partial_cmp(&other.x)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn from_geo() {
		let test = |z: u8, x: u32, y: u32, xf: f64, yf: f64| {
			assert_eq!(TileCoord2::from_geo(xf, yf, z, false).unwrap(), TileCoord2::new(x, y));
			assert_eq!(TileCoord2::from_geo(xf, yf, z, true).unwrap(), TileCoord2::new(x, y));
		};

		test(9, 267, 168, 8.0653, 52.2564);
		test(9, 273, 170, 12.3528, 51.3563);
	}

	#[test]
	fn subtract_and_scale() {
		let mut coord1 = TileCoord2::new(5, 7);
		let coord2 = TileCoord2::new(2, 3);
		coord1.subtract(&coord2);
		assert_eq!(coord1, TileCoord2::new(3, 4));
		coord1.scale_by(2);
		assert_eq!(coord1, TileCoord2::new(6, 8));
	}
}
