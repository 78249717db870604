// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    use crate::registry::config::{SavingVersion, ServerConfig};
    use std::io::Write;

    #[test]
    fn defaults_are_sane() {
        let config = ServerConfig::default();
        assert_eq!(config.max_path_len, 256);
        assert_eq!(config.saving_version, SavingVersion::V2);
        assert_eq!(config.current_level, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_toml_falls_back_to_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "").unwrap();
        let config = ServerConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.max_path_len, 256);
        assert_eq!(config.saving_version, SavingVersion::V2);
    }

    #[test]
    fn partial_toml_overrides_only_given_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "current_level = 3").unwrap();
        writeln!(file, "saving_version = \"V1\"").unwrap();
        let config = ServerConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.current_level, 3);
        assert_eq!(config.saving_version, SavingVersion::V1);
        assert_eq!(config.max_path_len, 256);
    }

    #[test]
    fn zero_max_path_len_fails_validation() {
        let mut config = ServerConfig::default();
        config.max_path_len = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = ServerConfig::from_toml_file("/nonexistent/reg.toml");
        assert!(result.is_err());
    }
}
