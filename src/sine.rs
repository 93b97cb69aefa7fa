//! Software-timed sine output for bench testing.

use std::f64::consts::TAU;
use std::future::Future;
use std::time::Duration;

use log::info;

use crate::config::DeviceSelector;
use crate::core::{
    Clamped, Connect, Dac, Emulated, Error, LabJack, LabJackDevice, Tcp, VoltageRange,
};
use crate::output::{AnalogOutput, DeviceSession, WriteFailurePolicy};

pub const MIN_VOLTAGE: f64 = 0.0;
pub const MAX_VOLTAGE: f64 = 5.0;

/// The clamp applied to every generated sample.
pub const OUTPUT_LIMITS: VoltageRange = VoltageRange::UNIPOLAR_5V;

/// `amplitude * sin(2π · frequency · t) + offset`, sampled `sample_rate` times a
/// second for `duration` seconds.
#[derive(Clone, Copy, Debug, PartialEq, clap::Args)]
pub struct SineWave {
    /// Peak amplitude in volts
    #[arg(long, default_value_t = 2.5)]
    pub amplitude: f64,

    /// DC offset in volts
    #[arg(long, default_value_t = 2.5)]
    pub offset: f64,

    /// Frequency of the wave in Hz
    #[arg(long, default_value_t = 1.0)]
    pub frequency: f64,

    /// Samples per second, software timed
    #[arg(long, default_value_t = 1000.0)]
    pub sample_rate: f64,

    /// Duration in seconds
    #[arg(long, default_value_t = 5.0)]
    pub duration: f64,
}

impl Default for SineWave {
    fn default() -> Self {
        SineWave {
            amplitude: 2.5,
            offset: 2.5,
            frequency: 1.0,
            sample_rate: 1000.0,
            duration: 5.0,
        }
    }
}

impl SineWave {
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(Error::InvalidWaveform("sample rate must be positive"));
        }
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(Error::InvalidWaveform("duration must not be negative"));
        }
        if !(self.amplitude.is_finite() && self.offset.is_finite() && self.frequency.is_finite())
        {
            return Err(Error::InvalidWaveform("amplitude, offset and frequency must be finite"));
        }
        if !(self.sample_rate * self.duration).is_finite() {
            return Err(Error::InvalidWaveform("too many samples"));
        }

        self.interval().map(|_| ())
    }

    pub fn sample_count(&self) -> usize {
        (self.sample_rate * self.duration).round() as usize
    }

    /// The pause following each sample.
    pub fn interval(&self) -> Result<Duration, Error> {
        Duration::try_from_secs_f64(1.0 / self.sample_rate)
            .map_err(|_| Error::InvalidWaveform("sample interval out of range"))
    }

    /// Unclamped samples at evenly spaced instants over `[0, duration)`.
    pub fn samples(&self) -> impl Iterator<Item = f64> {
        let wave = *self;
        let count = wave.sample_count();

        (0..count).map(move |i| {
            let t = i as f64 * wave.duration / count as f64;
            wave.amplitude * (TAU * wave.frequency * t).sin() + wave.offset
        })
    }
}

/// Plays a [`SineWave`] on one output channel, open loop.
pub struct SineDriver<S>
where
    S: AnalogOutput,
{
    session: DeviceSession<S>,
    wave: SineWave,
    clamp: Clamped,
    channel: u8,
    policy: WriteFailurePolicy,
    written: usize,
}

impl<S> SineDriver<S>
where
    S: AnalogOutput,
{
    pub fn new(
        session: DeviceSession<S>,
        wave: SineWave,
        channel: u8,
        policy: WriteFailurePolicy,
    ) -> Result<Self, Error> {
        wave.validate()?;

        Ok(SineDriver {
            session,
            wave,
            clamp: Clamped(OUTPUT_LIMITS),
            channel,
            policy,
            written: 0,
        })
    }

    /// Outputs every sample, or stops early once `shutdown` resolves. The device is
    /// released either way. Returns how many samples reached the device.
    pub async fn run<F>(mut self, shutdown: F) -> Result<usize, Error>
    where
        F: Future,
    {
        info!(
            "Outputting sine wave: {} samples at {} Hz",
            self.wave.sample_count(),
            self.wave.sample_rate
        );

        let outcome = tokio::select! {
            biased;

            _ = shutdown => {
                info!("Interrupted by user.");
                Ok(())
            }
            result = self.play() => result,
        };

        if outcome.is_ok() {
            info!("Done.");
        }

        let written = self.written;
        let released = self.session.close();

        outcome?;
        released?;
        Ok(written)
    }

    async fn play(&mut self) -> Result<(), Error> {
        let interval = self.wave.interval()?;

        for value in self.wave.samples() {
            let volts = self.clamp.to_voltage(value);

            match self.session.write(self.channel, volts).await {
                Ok(()) => self.written += 1,
                Err(failure) => self.policy.handle(failure)?,
            }

            tokio::time::sleep(interval).await;
        }

        Ok(())
    }
}

/// Locates a device and plays `wave` on it until done or until `shutdown` resolves.
pub async fn launch<F>(
    selector: &DeviceSelector,
    discovery_timeout: Duration,
    wave: SineWave,
    channel: u8,
    policy: WriteFailurePolicy,
    shutdown: F,
) -> Result<usize, Error>
where
    F: Future,
{
    wave.validate()?;
    let device = LabJack::locate(selector, discovery_timeout).await?;

    if device.serial_number.is_emulated() {
        launch_on::<Emulated, F>(device, wave, channel, policy, shutdown).await
    } else {
        launch_on::<Tcp, F>(device, wave, channel, policy, shutdown).await
    }
}

/// Connects to an already located device through `C` and plays `wave` on it.
pub async fn launch_on<C, F>(
    device: LabJackDevice,
    wave: SineWave,
    channel: u8,
    policy: WriteFailurePolicy,
    shutdown: F,
) -> Result<usize, Error>
where
    C: Connect,
    F: Future,
{
    let session = DeviceSession::establish::<C>(device).await?;
    SineDriver::new(session, wave, channel, policy)?
        .run(shutdown)
        .await
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sample_count_rounds() {
        assert_eq!(SineWave::default().sample_count(), 5000);

        let wave = SineWave {
            sample_rate: 3.0,
            duration: 0.5,
            ..SineWave::default()
        };
        assert_eq!(wave.sample_count(), 2);
    }

    #[test]
    fn samples_follow_the_wave() {
        let wave = SineWave {
            amplitude: 1.0,
            offset: 0.0,
            frequency: 1.0,
            sample_rate: 4.0,
            duration: 1.0,
        };

        let samples = wave.samples().collect::<Vec<_>>();
        let expected = [0.0, 1.0, 0.0, -1.0];

        assert_eq!(samples.len(), 4);
        for (sample, expected) in samples.iter().zip(expected) {
            assert!((sample - expected).abs() < 1e-12, "{samples:?}");
        }
    }

    #[test]
    fn default_wave_spans_the_output_limits() {
        let wave = SineWave::default();
        let max = wave.samples().fold(f64::MIN, f64::max);
        let min = wave.samples().fold(f64::MAX, f64::min);

        assert!((max - MAX_VOLTAGE).abs() < 1e-9);
        assert!((min - MIN_VOLTAGE).abs() < 1e-9);
        assert_eq!(OUTPUT_LIMITS.min(), MIN_VOLTAGE);
        assert_eq!(OUTPUT_LIMITS.max(), MAX_VOLTAGE);
    }

    #[test]
    fn invalid_waves_are_rejected() {
        let zero_rate = SineWave {
            sample_rate: 0.0,
            ..SineWave::default()
        };
        assert!(zero_rate.validate().is_err());

        let negative = SineWave {
            duration: -1.0,
            ..SineWave::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn unrepresentable_interval_is_rejected() {
        let glacial = SineWave {
            sample_rate: 1e-20,
            ..SineWave::default()
        };

        assert!(matches!(glacial.interval(), Err(Error::InvalidWaveform(_))));
        assert!(matches!(glacial.validate(), Err(Error::InvalidWaveform(_))));
    }

    #[test]
    fn overflowing_sample_count_is_rejected() {
        let endless = SineWave {
            sample_rate: 1e300,
            duration: 1e300,
            ..SineWave::default()
        };
        assert!(endless.validate().is_err());
    }

    #[tokio::test]
    async fn driver_refuses_unrepresentable_interval() {
        let session = DeviceSession::establish::<Emulated>(LabJackDevice::emulated())
            .await
            .expect("Must connect");
        let closes = session.sink().transport().close_counter();

        let wave = SineWave {
            sample_rate: 1e-20,
            ..SineWave::default()
        };
        let result = SineDriver::new(session, wave, 0, WriteFailurePolicy::Terminate);

        assert!(matches!(result, Err(Error::InvalidWaveform(_))));
        assert_eq!(closes.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
