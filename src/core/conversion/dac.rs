use super::VoltageRange;

/// Converts a domain value into the voltage handed to an analog output.
pub trait Dac {
    type Digital;

    fn to_voltage(&self, digital: Self::Digital) -> f64;
}

/// Interprets input as a fraction of the output span: `0` is the lower bound
/// and `1` the upper. Input outside the unit interval is clamped first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Normalized(pub VoltageRange);

/// Passes a raw voltage through, truncated to the range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Clamped(pub VoltageRange);

impl Dac for Normalized {
    type Digital = f64;

    #[inline]
    fn to_voltage(&self, digital: f64) -> f64 {
        let fraction = if digital.is_nan() {
            0.0
        } else {
            digital.clamp(0.0, 1.0)
        };

        let range = self.0;
        // Keeps the upper bound exact rather than `min + span` after rounding.
        if fraction == 1.0 {
            return range.max();
        }

        range.clamp(fraction * range.span() + range.min())
    }
}

impl Dac for Clamped {
    type Digital = f64;

    #[inline]
    fn to_voltage(&self, digital: f64) -> f64 {
        self.0.clamp(digital)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ten_volts() -> Normalized {
        Normalized(VoltageRange::new(0.0, 10.0).expect("Valid range"))
    }

    #[test]
    fn normalized_midpoint() {
        assert_eq!(ten_volts().to_voltage(0.5), 5.0);
    }

    #[test]
    fn normalized_clamps_below_and_above() {
        let bipolar = Normalized(VoltageRange::new(-10.0, 10.0).expect("Valid range"));

        for x in [0.0, -0.001, -1.0, -1e9, f64::NEG_INFINITY] {
            assert_eq!(bipolar.to_voltage(x), -10.0, "x={x}");
        }
        for x in [1.0, 1.001, 2.0, 1e9, f64::INFINITY] {
            assert_eq!(bipolar.to_voltage(x), 10.0, "x={x}");
        }
    }

    #[test]
    fn normalized_is_linear_and_increasing() {
        let range = VoltageRange::new(-2.0, 3.0).expect("Valid range");
        let dac = Normalized(range);

        let mut previous = dac.to_voltage(0.0);
        for step in 1..100 {
            let x = step as f64 / 100.0;
            let volts = dac.to_voltage(x);

            assert!((volts - (x * 5.0 - 2.0)).abs() < 1e-12, "x={x}");
            assert!(volts > previous, "x={x}");
            previous = volts;
        }
    }

    #[test]
    fn normalized_nan_is_lower_bound() {
        assert_eq!(ten_volts().to_voltage(f64::NAN), 0.0);
    }

    #[test]
    fn clamped_truncates_without_rescaling() {
        let dac = Clamped(VoltageRange::UNIPOLAR_5V);
        assert_eq!(dac.to_voltage(5.0), 5.0);
        assert_eq!(dac.to_voltage(5.1), 5.0);
        assert_eq!(dac.to_voltage(-0.1), 0.0);
        assert_eq!(dac.to_voltage(1.25), 1.25);
    }
}
