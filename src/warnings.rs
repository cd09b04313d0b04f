//! Collection of non-fatal configuration warnings
//!
//! Config steps record warnings here instead of printing them directly, so a
//! command can show them together once the native files have been written.

use std::fmt;

use crate::utils::terminal::print_warning;

/// Platform a warning applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningPlatform {
    Ios,
    Android,
}

impl fmt::Display for WarningPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningPlatform::Ios => write!(f, "ios"),
            WarningPlatform::Android => write!(f, "android"),
        }
    }
}

/// A single warning tied to a manifest property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub platform: WarningPlatform,
    pub property: String,
    pub message: String,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.platform, self.property, self.message)
    }
}

/// Accumulates warnings for the current invocation
#[derive(Debug, Default)]
pub struct WarningAggregator {
    warnings: Vec<ConfigWarning>,
}

impl WarningAggregator {
    pub fn add_warning(
        &mut self,
        platform: WarningPlatform,
        property: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.warnings.push(ConfigWarning {
            platform,
            property: property.into(),
            message: message.into(),
        });
    }

    pub fn add_warning_ios(&mut self, property: impl Into<String>, message: impl Into<String>) {
        self.add_warning(WarningPlatform::Ios, property, message);
    }

    pub fn add_warning_android(&mut self, property: impl Into<String>, message: impl Into<String>) {
        self.add_warning(WarningPlatform::Android, property, message);
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.warnings.iter()
    }

    /// Print every collected warning and clear the list
    pub fn flush(&mut self) {
        for warning in self.warnings.drain(..) {
            print_warning(&warning.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_and_flush() {
        let mut warnings = WarningAggregator::default();
        assert!(warnings.is_empty());

        warnings.add_warning_ios("ios.usesIcloudStorage", "configure in Xcode");
        warnings.add_warning_android("android.package", "missing");
        assert_eq!(warnings.len(), 2);

        let first = warnings.iter().next().unwrap();
        assert_eq!(first.to_string(), "[ios] ios.usesIcloudStorage: configure in Xcode");

        warnings.flush();
        assert!(warnings.is_empty());
    }
}
