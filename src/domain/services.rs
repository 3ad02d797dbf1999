//! Pricing and volume formatting rules shared by the cart and the product list.

use super::models::VolumeUnit;

/// Price of `volume` units of a product whose `price` covers `minimum_volume`.
///
/// Scales linearly with integer division, so fractional currency units are
/// truncated. A zero minimum volume is treated as one.
///
/// # Examples
///
/// ```
/// use grocer::domain::calculate_price;
///
/// assert_eq!(calculate_price(100, 1, 3), 300);
/// assert_eq!(calculate_price(40, 500, 750), 60);
/// assert_eq!(calculate_price(10, 3, 4), 13);
/// ```
pub fn calculate_price(price: u32, minimum_volume: u32, volume: u32) -> u64 {
    let scaled = u64::from(price) * u64::from(volume);
    scaled / u64::from(minimum_volume.max(1))
}

/// Human readable volume, e.g. `"500 gm"` or `"1.5 kg"`.
///
/// Grams and millilitres switch to the larger unit at 1000.
///
/// # Examples
///
/// ```
/// use grocer::domain::{format_volume, VolumeUnit};
///
/// assert_eq!(format_volume(250, VolumeUnit::Gram), "250 gm");
/// assert_eq!(format_volume(1500, VolumeUnit::Gram), "1.5 kg");
/// assert_eq!(format_volume(2000, VolumeUnit::Millilitre), "2 ltr");
/// assert_eq!(format_volume(3, VolumeUnit::Bunch), "3 bunch");
/// ```
pub fn format_volume(volume: u32, unit: VolumeUnit) -> String {
    match unit {
        VolumeUnit::Gram if volume >= 1000 => {
            format!("{} {}", thousandths(volume), VolumeUnit::Kilogram.suffix())
        }
        VolumeUnit::Millilitre if volume >= 1000 => {
            format!("{} {}", thousandths(volume), VolumeUnit::Litre.suffix())
        }
        _ => format!("{} {}", volume, unit.suffix()),
    }
}

fn thousandths(volume: u32) -> String {
    let whole = volume / 1000;
    let fraction = volume % 1000;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{:03}", fraction);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Next volume after stepping up, if it stays within `maximum`.
pub fn step_up(current: u32, step: u32, maximum: u32) -> Option<u32> {
    current.checked_add(step).filter(|v| *v <= maximum)
}

/// Next volume after stepping down, if it stays within `minimum`.
pub fn step_down(current: u32, step: u32, minimum: u32) -> Option<u32> {
    current.checked_sub(step).filter(|v| *v >= minimum)
}
