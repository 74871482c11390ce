//! Tool recognition sensor

use crate::config::RecognitionConfig;
use crate::traits::DigitalPorts;

/// Infrared tool presence check
#[derive(Debug, Clone, Copy)]
pub struct PresenceSensor<'a> {
    config: &'a RecognitionConfig,
}

impl<'a> PresenceSensor<'a> {
    pub fn new(config: &'a RecognitionConfig) -> Self {
        Self { config }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Immediate read of the sensor; true when a tool is in the spindle
    pub fn has_tool<P: DigitalPorts>(&self, ports: &mut P) -> bool {
        let present = ports.read_input(self.config.input_port);
        trace!("Tool presence on port {}: {}", self.config.input_port, present);
        present
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Op, SimMachine};

    #[test]
    fn test_reads_configured_port() {
        let mut machine = SimMachine::new();
        machine.presence.extend([true, false]);
        let config = RecognitionConfig {
            enabled: true,
            input_port: 3,
            ..RecognitionConfig::default()
        };
        let sensor = PresenceSensor::new(&config);

        assert!(sensor.enabled());
        assert!(sensor.has_tool(&mut machine));
        assert!(!sensor.has_tool(&mut machine));
        assert_eq!(machine.ops, vec![Op::Input(3), Op::Input(3)]);
    }
}
