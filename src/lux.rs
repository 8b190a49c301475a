//! Lux conversion
//!
//! Integer-only conversion of the two raw channel counts into lux, following the
//! piecewise-linear approximation from the TSL2561 datasheet. All scaling is done with
//! fixed-point shifts; intermediates are held in `u64` so full-scale counts at 1× gain and
//! 13.7 ms integration cannot wrap.

use crate::{Gain, IntegrationTime, PackageType};

/// Scale channel values by 2^10.
pub const CH_SCALE: u32 = 10;
/// Scale the channel ratio by 2^9.
pub const RATIO_SCALE: u32 = 9;
/// Scale lux by 2^14.
pub const LUX_SCALE: u32 = 14;

/// 322/11 * 2^CH_SCALE, normalizes a 13.7 ms reading to 402 ms.
pub const CHSCALE_TINT0: u32 = 0x7517;
/// 322/81 * 2^CH_SCALE, normalizes a 101 ms reading to 402 ms.
pub const CHSCALE_TINT1: u32 = 0x0FE7;

/// Number of bands in each coefficient table.
pub const COEFFICIENT_BANDS: usize = 8;

/// One band of the piecewise-linear approximation.
///
/// The band applies to every ratio up to and including `threshold`; inside it
/// `lux ~ channel0 * b - channel1 * m` (before scale-out).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Coefficients {
    pub threshold: u32,
    pub b: u32,
    pub m: u32,
}

const fn band(threshold: u32, b: u32, m: u32) -> Coefficients {
    Coefficients { threshold, b, m }
}

/// Coefficients for the T, FN and CL packages.
pub static T_FN_CL_COEFFICIENTS: [Coefficients; COEFFICIENT_BANDS] = [
    band(0x0040, 0x01F2, 0x01BE), // 0.125 * 2^RATIO_SCALE
    band(0x0080, 0x0214, 0x02D1), // 0.250
    band(0x00C0, 0x023F, 0x037B), // 0.375
    band(0x0100, 0x0270, 0x03FE), // 0.50
    band(0x0138, 0x016F, 0x01FC), // 0.61
    band(0x019A, 0x00D2, 0x00FB), // 0.80
    band(0x029A, 0x0018, 0x0012), // 1.3
    band(0x029A, 0x0000, 0x0000), // > 1.3
];

/// Coefficients for the CS package.
pub static CS_COEFFICIENTS: [Coefficients; COEFFICIENT_BANDS] = [
    band(0x0043, 0x0204, 0x01AD), // 0.130 * 2^RATIO_SCALE
    band(0x0085, 0x0228, 0x02C1), // 0.260
    band(0x00C8, 0x0253, 0x0363), // 0.390
    band(0x010A, 0x0282, 0x03DF), // 0.520
    band(0x014D, 0x0177, 0x01DD), // 0.65
    band(0x019A, 0x0101, 0x0127), // 0.80
    band(0x029A, 0x0037, 0x002B), // 1.3
    band(0x029A, 0x0000, 0x0000), // > 1.3
];

/// Coefficient table for a package, `None` if the package is not supported.
pub fn coefficient_table(
    package: PackageType,
) -> Option<&'static [Coefficients; COEFFICIENT_BANDS]> {
    match package {
        PackageType::Cs => Some(&CS_COEFFICIENTS),
        PackageType::TFnCl => Some(&T_FN_CL_COEFFICIENTS),
        PackageType::Unknown(_) => None,
    }
}

/// Channel scale factor for the given integration time and gain.
///
/// The reference calibration is 402 ms at 16× gain, so 1× gain multiplies the factor by 16.
pub fn channel_scale(integration_time: IntegrationTime, gain: Gain) -> u32 {
    let scale = match integration_time {
        IntegrationTime::Ms13 => CHSCALE_TINT0,
        IntegrationTime::Ms101 => CHSCALE_TINT1,
        _ => 1 << CH_SCALE,
    };

    match gain {
        Gain::Low => scale << 4,
        Gain::High => scale,
    }
}

/// Normalizes a raw count to the reference integration time and gain.
pub fn scale_channel(raw: u16, channel_scale: u32) -> u64 {
    (u64::from(raw) * u64::from(channel_scale)) >> CH_SCALE
}

/// Rounded ratio `channel1 / channel0` scaled by 2^RATIO_SCALE.
///
/// A zero channel 0 gives a ratio of 0.
pub fn ratio(channel0: u64, channel1: u64) -> u64 {
    let unrounded = if channel0 != 0 {
        (channel1 << (RATIO_SCALE + 1)) / channel0
    } else {
        0
    };

    (unrounded + 1) >> 1
}

/// Selects the band for `ratio`: the first whose threshold is not below it, or the last band
/// once the ratio exceeds every threshold.
pub fn coefficients(package: PackageType, ratio: u64) -> Option<Coefficients> {
    let table = coefficient_table(package)?;

    let selected = table
        .iter()
        .find(|band| ratio <= u64::from(band.threshold))
        .copied()
        .unwrap_or(table[COEFFICIENT_BANDS - 1]);

    Some(selected)
}

/// Rounds to the nearest integer at `LUX_SCALE` and strips the fractional part.
fn scale_out(temp: u64) -> u32 {
    let lux = (temp + (1 << (LUX_SCALE - 1))) >> LUX_SCALE;
    lux.min(u64::from(u32::MAX)) as u32
}

/// Converts raw channel counts into lux.
///
/// An unsupported package uses zero coefficients and therefore yields 0. The device level
/// [`compute_lux`](crate::TSL2561::compute_lux) additionally reports that case.
pub fn calculate_lux(
    channel0: u16,
    channel1: u16,
    gain: Gain,
    integration_time: IntegrationTime,
    package: PackageType,
) -> u32 {
    let scale = channel_scale(integration_time, gain);

    let channel0 = scale_channel(channel0, scale);
    let channel1 = scale_channel(channel1, scale);

    let ratio = ratio(channel0, channel1);
    let Coefficients { b, m, .. } = coefficients(package, ratio).unwrap_or(band(0, 0, 0));

    let broadband = channel0 * u64::from(b);
    let infrared = channel1 * u64::from(m);

    // Do not allow a negative lux value
    let temp = broadband.saturating_sub(infrared);

    scale_out(temp)
}
