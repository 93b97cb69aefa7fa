use std::time::Duration;

use log::{debug, info, warn};

use crate::config::DeviceSelector;
use crate::prelude::*;

/// The entry-point structure for locating and connecting to LabJack devices.
///
/// This structure does not need to be initialised, but is rather a namespace for helper
/// methods. Connecting is *instanced*: every connection is a [`LabJackClient`] owning its
/// transport, rather than a handle into a global device table as with LJM.
///
/// ```rust
/// use labjack_bridge::prelude::*;
///
/// # async fn docs() {
/// let emulated = LabJackSerialNumber::emulated();
/// let mut device = LabJack::connect::<Emulated>(emulated).await.expect("Must connect");
///
/// println!("Connected to device {:?}", device.device);
/// # }
/// ```
///
/// ## Transports
///
/// - [`Tcp`].
///     Used to connect over Ethernet. Wi-Fi is supported over this measure but is not recommended.
///     See the [`MAX_DATA_LENGTH`] for why.
///
/// - [`Emulated`].
///     An in-memory register file. Does not require a device present, and is selected by the
///     emulated serial number `-2`.
pub struct LabJack;

impl LabJack {
    /// Enumerates devices answering on the local segment, filtered by a device type.
    pub async fn discover(
        device_type: DeviceType,
        timeout: Duration,
    ) -> Result<Vec<LabJackDevice>, Error> {
        let devices = Discover::search(timeout).await?;

        Ok(devices
            .into_iter()
            .filter_map(|device| match device {
                Err(error) => {
                    warn!("Failure retrieving device, {:?}", error);
                    None
                }
                Ok(device) if device_type.accepts(device.device_type) => Some(device),
                Ok(device) => {
                    debug!(
                        "Found LabJack with different device type to specified. Expected {}, got {}. Device: {}",
                        device_type, device.device_type, device
                    );
                    None
                }
            })
            .collect())
    }

    /// Discovers the device with a given serial number. The emulated serial number
    /// resolves immediately without touching the network.
    pub async fn discover_with_id(
        serial_number: LabJackSerialNumber,
        timeout: Duration,
    ) -> Result<LabJackDevice, Error> {
        if serial_number.is_emulated() {
            return Ok(LabJackDevice::emulated());
        }

        LabJack::discover(DeviceType::ANY, timeout)
            .await?
            .into_iter()
            .find(|device| device.serial_number == serial_number)
            .ok_or(Error::DeviceNotFound)
    }

    /// Resolves a configured [`DeviceSelector`] into one device.
    ///
    /// A known address skips discovery. Otherwise the first discovered device
    /// matching the type and serial filters is returned, and none at all is
    /// [`Error::DeviceNotFound`].
    pub async fn locate(selector: &DeviceSelector, timeout: Duration) -> Result<LabJackDevice, Error> {
        if let Some(serial) = selector.serial {
            if serial.is_emulated() {
                return Ok(LabJackDevice::emulated());
            }
        }

        if let Some(ip) = selector.ip {
            let serial = selector.serial.unwrap_or(LabJackSerialNumber(0));
            return Ok(LabJackDevice::known(ip, selector.device_type, serial));
        }

        let devices = LabJack::discover(selector.device_type, timeout).await?;
        info!("Discovered {} candidate device(s)", devices.len());

        devices
            .into_iter()
            .find(|device| {
                selector
                    .serial
                    .map_or(true, |serial| device.serial_number == serial)
            })
            .ok_or(Error::DeviceNotFound)
    }

    /// Connects to a device by serial number, discovering it first.
    pub async fn connect<T>(
        id: impl Into<LabJackSerialNumber>,
    ) -> Result<LabJackClient<<T as Connect>::Transport>, Error>
    where
        T: Connect,
    {
        let device = LabJack::discover_with_id(id.into(), DEFAULT_DISCOVERY_TIMEOUT).await?;
        LabJack::connect_with::<T>(device).await
    }

    /// Connects to a device using the specified transport, given a device has already been located.
    ///
    /// ```
    /// use std::net::IpAddr;
    /// use std::str::FromStr;
    /// use labjack_bridge::prelude::*;
    ///
    /// # async fn docs() {
    /// // Can be set on the LabJack as a static IP address.
    /// let known_ip = IpAddr::from_str("192.168.1.25").expect("Must resolve");
    /// let known_device = LabJackDevice::known(known_ip, DeviceType::T7, 470000000);
    ///
    /// let connected = LabJack::connect_with::<Emulated>(known_device).await;
    /// println!("Connected to known device {:?}", connected.map(|client| client.device));
    /// # }
    /// ```
    pub async fn connect_with<T>(
        device: LabJackDevice,
    ) -> Result<LabJackClient<<T as Connect>::Transport>, Error>
    where
        T: Connect,
    {
        let transport = T::connect(device).await?;
        Ok(LabJackClient::new(device, transport))
    }
}

#[cfg(test)]
mod test {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    #[tokio::test]
    async fn emulated_serial_skips_discovery() {
        let selector = DeviceSelector {
            serial: Some(LabJackSerialNumber::emulated()),
            ..DeviceSelector::default()
        };

        let device = LabJack::locate(&selector, Duration::ZERO)
            .await
            .expect("Must locate");
        assert!(device.serial_number.is_emulated());
    }

    #[tokio::test]
    async fn known_address_skips_discovery() {
        let ip = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 25));
        let selector = DeviceSelector {
            ip: Some(ip),
            device_type: DeviceType::T7,
            ..DeviceSelector::default()
        };

        let device = LabJack::locate(&selector, Duration::ZERO)
            .await
            .expect("Must locate");
        assert_eq!(device.ip_address, ip);
        assert_eq!(device.port, MODBUS_COMMUNICATION_PORT);
        assert_eq!(device.device_type, DeviceType::T7);
    }
}
