use uom::si::f64::{Length as UomLength, Time as UomTime};

use crate::{CoreError, CoreResult};

// Public canonical unit types (SI, f64)
pub type Length = UomLength;
pub type Time = UomTime;

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn km(v: f64) -> Length {
    use uom::si::length::kilometer;
    Length::new::<kilometer>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn meters(l: Length) -> f64 {
    use uom::si::length::meter;
    l.get::<meter>()
}

#[inline]
pub fn seconds(t: Time) -> f64 {
    use uom::si::time::second;
    t.get::<second>()
}

/// Build a length from a value and a textual unit. An empty unit means meters.
pub fn length(value: f64, unit: &str) -> CoreResult<Length> {
    use uom::si::length::{mile, nautical_mile};
    let unit = unit.trim();
    match unit {
        "" | "m" => Ok(m(value)),
        "km" => Ok(km(value)),
        "mi" => Ok(Length::new::<mile>(value)),
        "nmi" => Ok(Length::new::<nautical_mile>(value)),
        _ => Err(CoreError::UnknownUnit {
            what: "length",
            unit: unit.to_string(),
        }),
    }
}
