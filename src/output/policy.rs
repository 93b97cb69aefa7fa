use log::{error, warn};
use serde::{Deserialize, Serialize};

use crate::core::Error;

/// What an output loop does when a hardware write fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WriteFailurePolicy {
    /// Stop the loop and surface the error. The device is still released.
    #[default]
    Terminate,
    /// Log the failure and carry on with the next value.
    Skip,
}

impl WriteFailurePolicy {
    /// Returns the error back when it must end the loop.
    pub fn handle(&self, failure: Error) -> Result<(), Error> {
        match self {
            WriteFailurePolicy::Terminate => {
                error!("Write failed, terminating: {failure}");
                Err(failure)
            }
            WriteFailurePolicy::Skip => {
                warn!("Write failed, skipping value: {failure}");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn terminate_surfaces_error() {
        let result = WriteFailurePolicy::Terminate.handle(Error::DeviceNotFound);
        assert!(matches!(result, Err(Error::DeviceNotFound)));
    }

    #[test]
    fn skip_swallows_error() {
        assert!(WriteFailurePolicy::Skip.handle(Error::Released).is_ok());
    }
}
