use crate::error::Result;
use serde::Serialize;

/// An audio capture device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputDevice {
    pub id: String,
    pub label: String,
}

/// Audio input capability check run before every call
#[async_trait::async_trait]
pub trait InputDevices: Send + Sync {
    /// Enumerate capture devices
    async fn input_devices(&self) -> Result<Vec<InputDevice>>;

    /// Ask for permission to capture. Fails with `Error::Capability` on denial.
    async fn request_access(&self) -> Result<()> {
        Ok(())
    }
}

/// Devices reported by the capture client through configuration
pub struct StaticInputDevices {
    devices: Vec<InputDevice>,
}

impl StaticInputDevices {
    pub fn new(labels: &[String]) -> Self {
        let devices = labels
            .iter()
            .enumerate()
            .map(|(i, label)| InputDevice {
                id: format!("configured-{}", i),
                label: label.clone(),
            })
            .collect();

        Self { devices }
    }
}

#[async_trait::async_trait]
impl InputDevices for StaticInputDevices {
    async fn input_devices(&self) -> Result<Vec<InputDevice>> {
        Ok(self.devices.clone())
    }
}

/// Probe the local sound system
///
/// Linux reads the ALSA PCM table; other platforms report the default
/// device since enumeration there needs native bindings.
pub struct SystemInputDevices;

#[async_trait::async_trait]
impl InputDevices for SystemInputDevices {
    #[cfg(target_os = "linux")]
    async fn input_devices(&self) -> Result<Vec<InputDevice>> {
        match tokio::fs::read_to_string("/proc/asound/pcm").await {
            Ok(contents) => Ok(parse_asound_pcm(&contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(crate::error::Error::Capability(format!(
                "cannot enumerate audio devices: {}",
                e
            ))),
        }
    }

    #[cfg(not(target_os = "linux"))]
    async fn input_devices(&self) -> Result<Vec<InputDevice>> {
        Ok(vec![InputDevice {
            id: "default".to_string(),
            label: "Default input".to_string(),
        }])
    }
}

/// Capture-capable entries of `/proc/asound/pcm`
///
/// Lines look like `00-00: ALC3246 Analog : ALC3246 Analog : playback 1 : capture 1`.
pub fn parse_asound_pcm(contents: &str) -> Vec<InputDevice> {
    contents
        .lines()
        .filter_map(|line| {
            let mut parts = line.split(':').map(str::trim);
            let address = parts.next()?;
            let _id = parts.next()?;
            let name = parts.next()?;
            if !parts.any(|p| p.starts_with("capture")) {
                return None;
            }

            let (card, device) = address.split_once('-')?;
            let card: u32 = card.parse().ok()?;
            let device: u32 = device.parse().ok()?;

            Some(InputDevice {
                id: format!("hw:{},{}", card, device),
                label: name.to_string(),
            })
        })
        .collect()
}
