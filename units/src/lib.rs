//! Physical quantities used throughout the dose pipeline.
//!
//! Every distance in the event table, the phantom dimensions and the beam
//! geometry is naturally expressed in centimetres, so the `uom` system defined
//! here uses the centimetre as its base length unit. Values therefore pass
//! through `cm(..)` / `cm_(..)` without any scaling.

pub mod todo;

pub mod cgs {

  use uom::si::{
    length::centimeter,
    mass::kilogram,
    time::second,
    electric_current::ampere,
    thermodynamic_temperature::kelvin,
    amount_of_substance::mole,
    luminous_intensity::candela,
  };

  // TODO: replace with system! macro, once it has been fixed in uom
  #[allow(unused)]
  type Units = dyn uom::si::Units<
      f32,
    length                    = centimeter,
    mass                      = kilogram,
    time                      = second,
    electric_current          = ampere,
    thermodynamic_temperature = kelvin,
    amount_of_substance       = mole,
    luminous_intensity        = candela>;

  pub mod f32 {
    use uom::{ISQ, system};
    ISQ!(uom::si, f32, (centimeter, kilogram, second, ampere, kelvin, mole, candela));
  }

}

pub use uom;
pub use float_eq;
pub use uom::si::Quantity;
pub use cgs::f32::{Angle, Area, Length, Ratio};

/// Unit markers for `Quantity::get` and `assert_uom_eq!`
pub mod unit {
  pub use uom::si::{length::{millimeter, centimeter, meter},
                    area  ::square_centimeter,
                    ratio ::ratio,
                    angle ::{radian, degree},
  };
}
use unit as units;

// Making values from float literals is very long-winded, so provide some
// pithily-named convenience constructors.

/// Generate a function called NAME which returns QUANTITY by interpreting its
/// argument as UNIT
///
/// wrap!(NAME QUANTITY UNIT);
macro_rules! wrap {
  ($name:ident $quantity:ident $unit:ident ) => {
    pub fn $name(x: f32) -> $quantity { $quantity::new::<units::$unit>(x) }
  };
}

wrap!(cm     Length        centimeter);
wrap!(mm     Length        millimeter);
wrap!(m      Length             meter);
wrap!(cm2    Area   square_centimeter);
wrap!(ratio  Ratio              ratio);
wrap!(deg    Angle             degree);
wrap!(radian Angle             radian);

// Reverse direction of the above.
pub fn cm_    (x: Length) -> f32 { x.get::<units::centimeter>() }
pub fn mm_    (x: Length) -> f32 { x.get::<units::millimeter>() }
pub fn cm2_   (x: Area  ) -> f32 { x.get::<units::square_centimeter>() }
pub fn ratio_ (x: Ratio ) -> f32 { x.get::<units::ratio>() }
pub fn deg_   (x: Angle ) -> f32 { x.get::<units::degree>() }
pub fn radian_(x: Angle ) -> f32 { x.get::<units::radian>() }

#[macro_export]
macro_rules! assert_uom_eq {
  ($unit:ident, $lhs:expr, $rhs:expr, $algo:ident <= $tol:expr) => {
    $crate::float_eq::assert_float_eq!($lhs.get::<$unit>(), $rhs.get::<$unit>(), $algo <= $tol)
  };
}

#[cfg(test)]
mod tests {
  use super::*;
  use super::unit::{millimeter, centimeter, square_centimeter};
  use rstest::rstest;

  #[test]
  fn sum_of_mixed_lengths() {
    let v = vec![mm(1.0), cm(1.0)];
    let total: Length = v.into_iter().sum();
    assert_uom_eq!(millimeter, total, mm(11.0), ulps <= 1);
  }

  #[test]
  fn centimetre_is_the_base_unit() {
    float_eq::assert_float_eq!(cm(12.5).value, 12.5, ulps <= 1);
    float_eq::assert_float_eq!(cm_(cm(-3.25)), -3.25, ulps <= 1);
    float_eq::assert_float_eq!(cm2(7.0).value, 7.0, ulps <= 1);
  }

  #[rstest(/**/ text      , expected,
           case("120 cm"  , 120.0  ),
           case("15 mm"   ,   1.5  ),
           case("2.815 m" , 281.5  ),
  )]
  fn parse_length_with_units(text: &str, expected: f32) {
    let l: Length = text.parse().unwrap();
    float_eq::assert_float_eq!(cm_(l), expected, r2nd <= 1e-6);
  }

  #[test]
  fn area_of_lengths() {
    let a: Area = cm(10.0) * cm(5.0);
    assert_uom_eq!(square_centimeter, a, cm2(50.0), ulps <= 1);
    assert_uom_eq!(centimeter, a.sqrt(), cm(50f32.sqrt()), ulps <= 1);
  }

  #[test]
  fn degrees_and_radians() {
    float_eq::assert_float_eq!(radian_(deg(180.0)), std::f32::consts::PI, ulps <= 1);
    float_eq::assert_float_eq!(deg_(radian(std::f32::consts::FRAC_PI_2)), 90.0, ulps <= 1);
  }

  #[test]
  fn length_over_length_is_ratio() {
    let r: Ratio = cm(50.0) / cm(100.0);
    float_eq::assert_float_eq!(ratio_(r), 0.5, ulps <= 1);
  }
}
