pub type Coordinates0 = [f64; 2];

pub type Coordinates1 = Vec<Coordinates0>;

pub type Coordinates2 = Vec<Coordinates1>;

pub type Coordinates3 = Vec<Coordinates2>;

pub trait Convertible
where
	Self: Copy,
{
	fn convert_coordinates0(value: [Self; 2]) -> Coordinates0
	where
		Self: Sized;
	fn convert_coordinates1(value: Vec<[Self; 2]>) -> Coordinates1
	where
		Self: Sized;
	fn convert_coordinates2(value: Vec<Vec<[Self; 2]>>) -> Coordinates2
	where
		Self: Sized;
	fn convert_coordinates3(value: Vec<Vec<Vec<[Self; 2]>>>) -> Coordinates3
	where
		Self: Sized;
}

macro_rules! impl_from_array {
	($($t:ty),*) => {$(
		impl Convertible for $t {
			fn convert_coordinates0(value: [$t; 2]) -> Coordinates0 {
				[value[0] as f64, value[1] as f64]
			}
			fn convert_coordinates1(value: Vec<[$t; 2]>) -> Coordinates1 {
				Vec::from_iter(value.into_iter().map(<$t>::convert_coordinates0))
			}
			fn convert_coordinates2(value: Vec<Vec<[$t; 2]>>) -> Coordinates2 {
				Vec::from_iter(value.into_iter().map(<$t>::convert_coordinates1))
			}
			fn convert_coordinates3(value: Vec<Vec<Vec<[$t; 2]>>>) -> Coordinates3 {
				Vec::from_iter(value.into_iter().map(<$t>::convert_coordinates2))
			}
		}
	)*}
}
impl_from_array!(i8, u8, i16, u16, i32, u32, i64, u64, f32);

impl Convertible for f64 {
	fn convert_coordinates0(value: [f64; 2]) -> Coordinates0 {
		value
	}
	fn convert_coordinates1(value: Vec<[f64; 2]>) -> Coordinates1 {
		value
	}
	fn convert_coordinates2(value: Vec<Vec<[f64; 2]>>) -> Coordinates2 {
		value
	}
	fn convert_coordinates3(value: Vec<Vec<Vec<[f64; 2]>>>) -> Coordinates3 {
		value
	}
}

use std::fmt::{self, Debug};
use versatiles_core::json::JsonValue;

/// A single `(x, y)` coordinate pair, the scalar building block every geometry
/// type in this module is ultimately made of.
#[derive(Clone, Copy, PartialEq)]
pub struct Coordinates(f64, f64);

impl Coordinates {
	#[must_use]
	pub fn new(x: f64, y: f64) -> Self {
		Self(x, y)
	}
	#[must_use]
	pub fn x(&self) -> f64 {
		self.0
	}
	#[must_use]
	pub fn y(&self) -> f64 {
		self.1
	}

	/// Projects this coordinate from WGS84 degrees to spherical Web Mercator meters.
	#[must_use]
	pub fn to_mercator(&self) -> Coordinates {
		const R: f64 = 6_378_137.0;
		let x = self.0.to_radians() * R;
		let y = (std::f64::consts::FRAC_PI_4 + self.1.to_radians() / 2.0).tan().ln() * R;
		Coordinates(x, y)
	}

	#[must_use]
	pub fn to_json(&self, precision: Option<u8>) -> JsonValue {
		let round = |v: f64| -> f64 {
			match precision {
				Some(p) => {
					let f = 10f64.powi(i32::from(p));
					(v * f).round() / f
				}
				None => v,
			}
		};
		JsonValue::from(&[round(self.0), round(self.1)])
	}
}

impl Debug for Coordinates {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}, {}]", self.0, self.1)
	}
}

impl<T: Convertible> From<[T; 2]> for Coordinates {
	fn from(value: [T; 2]) -> Self {
		let c = T::convert_coordinates0(value);
		Coordinates(c[0], c[1])
	}
}

impl<'a, T: Convertible> From<&'a [T; 2]> for Coordinates {
	fn from(value: &'a [T; 2]) -> Self {
		Coordinates::from(*value)
	}
}
