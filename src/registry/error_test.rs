// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    use crate::registry::error::{io_error, not_found, RegError};

    #[test]
    fn not_found_carries_resource_in_message() {
        let err = not_found("HKLM\\Software\\Missing");
        assert!(err.to_string().contains("Missing"));
    }

    #[test]
    fn io_error_carries_all_fields() {
        let err = io_error("open", "/tmp/reg.dat", "permission denied");
        let msg = err.to_string();
        assert!(msg.contains("open"));
        assert!(msg.contains("/tmp/reg.dat"));
        assert!(msg.contains("permission denied"));
    }

    #[test]
    fn std_io_error_converts() {
        let std_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: RegError = std_err.into();
        assert!(matches!(err, RegError::Io { .. }));
    }
}
