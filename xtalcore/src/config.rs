use serde::{Serialize, Deserialize};

use crate::error::{Result, XtalError};

/// Settings for writing reflection files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageParams {
    pub compress: bool,
    pub compression_level: i32,
}

impl Default for StorageParams {
    fn default() -> Self {
        StorageParams { compress: true, compression_level: 3 }
    }
}

impl StorageParams {
    pub fn new(compress: bool, compression_level: i32) -> Result<Self> {
        let params = StorageParams { compress, compression_level };
        params.validate()?;
        Ok(params)
    }

    /// Reads params from JSON; missing keys keep their defaults.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use xtalcore::config::StorageParams;
    /// let params = StorageParams::from_json_str(r#"{"compression_level": 9}"#).unwrap();
    /// assert!(params.compress);
    /// assert_eq!(params.compression_level, 9);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: StorageParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=22).contains(&self.compression_level) {
            return Err(XtalError::Config(format!(
                "compression_level must be within 1..=22, got {}",
                self.compression_level
            )));
        }
        Ok(())
    }
}
