//! Machine tuning parameters.
//!
//! All sizes have workable defaults; hosts embedding an interpreter mostly
//! construct `MachineConfig::default()` and override a field or two.

use karst_util::{KarstError, Result};

use crate::heap::DEFAULT_PAGE_SIZE;

/// Configuration for a [`crate::Machine`].
///
/// # Examples
///
/// ```
/// use kgc::MachineConfig;
///
/// let config = MachineConfig {
///     page_size: 16 * 1024,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct MachineConfig {
    /// Heap page capacity in bytes.
    pub page_size: usize,

    /// Size of each of the two lexer stream buffers, in bytes. A token may
    /// span both buffers but no more, so this bounds the longest lexable
    /// token when reading from a file.
    pub stream_buffer_size: usize,

    /// Initial bucket count of the process symbol table.
    pub symbol_table_capacity: usize,

    /// Initial bucket count of the global environment frame.
    pub global_frame_capacity: usize,

    /// Bucket count of the frame created per lambda application.
    pub lambda_frame_capacity: usize,

    /// Table load factor below which the collector shrinks a table.
    pub table_load_min: f64,

    /// Table load factor above which the collector grows a table.
    pub table_load_max: f64,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            stream_buffer_size: 4096,
            symbol_table_capacity: 512,
            global_frame_capacity: 64,
            lambda_frame_capacity: 4,
            table_load_min: 0.1,
            table_load_max: 0.75,
        }
    }
}

impl MachineConfig {
    /// Checks the parameters for internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.page_size < 256 {
            return Err(KarstError::BadArg(
                "config: page_size must be at least 256 bytes".into(),
            ));
        }
        if self.stream_buffer_size < 16 {
            return Err(KarstError::BadArg(
                "config: stream_buffer_size must be at least 16 bytes".into(),
            ));
        }
        if self.symbol_table_capacity == 0
            || self.global_frame_capacity == 0
            || self.lambda_frame_capacity == 0
        {
            return Err(KarstError::BadArg(
                "config: table capacities must be at least 1".into(),
            ));
        }
        if !(self.table_load_min > 0.0
            && self.table_load_min < self.table_load_max
            && self.table_load_max < 1.0)
        {
            return Err(KarstError::BadArg(
                "config: load factors must satisfy 0 < min < max < 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(MachineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_degenerate_parameters() {
        let mut config = MachineConfig::default();
        config.lambda_frame_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = MachineConfig::default();
        config.table_load_min = 0.8;
        assert!(config.validate().is_err());

        let mut config = MachineConfig::default();
        config.page_size = 32;
        assert!(config.validate().is_err());
    }
}
