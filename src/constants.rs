//! # Constants and type definitions for relorbit
//!
//! This module centralizes the **physical constants**, **internal unit ratios**, and
//! **common type aliases** used throughout the crate.
//!
//! ## Internal unit system
//!
//! The simulation runs in a unit system tied to the distance `R0` of the observer
//! to the central object:
//!
//! - Mass: solar mass (M☉)
//! - Length: one arcsecond seen at distance `R0` (i.e. `R0 × 1 au` when `R0` is in parsec)
//! - Time: Julian year (365.25 days)
//!
//! The ratios below are the `R0`-independent parts of the normalized constants.
//! [`InternalUnits`](crate::units::InternalUnits) divides or multiplies them by the
//! appropriate power of `R0` for each run.

// -------------------------------------------------------------------------------------------------
// Physical constants (SI)
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Nominal solar mass parameter G·M☉ in m³/s² (IAU 2015 resolution B3)
pub const GM_SUN: f64 = 1.327_124_4e20;

/// Speed of light in vacuum, m/s
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Astronomical unit in meters (IAU 2012); equal to one arcsecond at one parsec
pub const AU_M: f64 = 149_597_870_700.0;

/// Number of seconds in a Julian day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Number of days in a Julian year
pub const DAYS_PER_JULIAN_YEAR: f64 = 365.25;

/// Julian year in seconds
pub const JULIAN_YEAR_S: f64 = DAYS_PER_JULIAN_YEAR * SECONDS_PER_DAY;

/// Kilometers per meter, used for velocity reporting
pub const KM_PER_M: f64 = 1e-3;

/// Offset between Julian and modified Julian dates
pub const JDTOMJD: f64 = 2_400_000.5;

/// Julian date of the J2000.0 epoch (2000-01-01 12:00:00), i.e. decimal Julian year 2000.0
pub const JD_J2000: f64 = 2_451_545.0;

// -------------------------------------------------------------------------------------------------
// Internal unit ratios (fixed for the process, scaled by R0 per run)
// -------------------------------------------------------------------------------------------------

/// `G·M_unit·T_unit²/L_unit³` for `R0 = 1`; the normalized gravitational constant is this value over `R0³`.
pub const GRAVITATIONAL_CONSTANT_TIMES_R0_CUBED: f64 =
    GM_SUN * JULIAN_YEAR_S * JULIAN_YEAR_S / (AU_M * AU_M * AU_M);

/// `c·T_unit/L_unit` for `R0 = 1`; the normalized speed of light is this value over `R0`.
pub const SPEED_OF_LIGHT_TIMES_R0: f64 = SPEED_OF_LIGHT * JULIAN_YEAR_S / AU_M;

/// `(L_unit/T_unit)` expressed in km/s for `R0 = 1`; multiplied by `R0` per run.
pub const VELOCITY_CONVERSION_PER_R0: f64 = AU_M / JULIAN_YEAR_S * KM_PER_M;

/// Symbol used in parameter files to designate the system barycenter as a primary
pub const BARYCENTER_SYMBOL: &str = "com";

/// Decimal places kept for reported orbital elements
pub const ORBIT_REPORT_DECIMALS: i32 = 6;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Epoch or duration in Julian years
pub type Year = f64;
/// Velocity in km/s
pub type KmPerSec = f64;
/// Length in internal units (arcsec at distance R0)
pub type ArcSec = f64;
/// Mass in solar masses
pub type SolarMass = f64;
