use std::error::Error;
use std::fmt::{Display, Formatter};

pub type GainMatchResult<T> = Result<T, GainMatchError>;
pub type ParserResult<T> = GainMatchResult<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    ParseError,
    ConfigurationError,
    FitConvergenceError,
    LookupError,
    InternalError,
}

impl ErrorCategory {
    pub const fn exit_status(self) -> ExitStatus {
        match self {
            Self::ParseError => ExitStatus {
                exit_code: 2,
                rust_category: "ParseError",
                severity: "ERROR",
            },
            Self::ConfigurationError => ExitStatus {
                exit_code: 3,
                rust_category: "ConfigurationError",
                severity: "ERROR",
            },
            Self::FitConvergenceError => ExitStatus {
                exit_code: 4,
                rust_category: "FitConvergenceError",
                severity: "ERROR",
            },
            Self::LookupError => ExitStatus {
                exit_code: 5,
                rust_category: "LookupError",
                severity: "ERROR",
            },
            Self::InternalError => ExitStatus {
                exit_code: 6,
                rust_category: "InternalError",
                severity: "ERROR",
            },
        }
    }

    pub const fn exit_code(self) -> i32 {
        self.exit_status().exit_code
    }

    pub const fn rust_category(self) -> &'static str {
        self.exit_status().rust_category
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    pub exit_code: i32,
    pub rust_category: &'static str,
    pub severity: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GainMatchError {
    category: ErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl GainMatchError {
    pub fn new(category: ErrorCategory, placeholder: &'static str, message: impl Into<String>) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn parse(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::ParseError, placeholder, message)
    }

    pub fn configuration(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::ConfigurationError, placeholder, message)
    }

    pub fn convergence(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::FitConvergenceError, placeholder, message)
    }

    pub fn lookup(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::LookupError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> ErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!(
            "{}: [{}] {}",
            self.category.exit_status().severity,
            self.placeholder,
            self.message
        )
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}

impl Display for GainMatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.rust_category(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for GainMatchError {}

#[cfg(test)]
mod tests {
    use super::{ErrorCategory, GainMatchError};

    #[test]
    fn exit_mapping_is_stable() {
        let cases = [
            (ErrorCategory::ParseError, 2, "ParseError"),
            (ErrorCategory::ConfigurationError, 3, "ConfigurationError"),
            (ErrorCategory::FitConvergenceError, 4, "FitConvergenceError"),
            (ErrorCategory::LookupError, 5, "LookupError"),
            (ErrorCategory::InternalError, 6, "InternalError"),
        ];

        for (category, exit_code, rust_category) in cases {
            assert_eq!(category.exit_code(), exit_code);
            assert_eq!(category.rust_category(), rust_category);
        }
    }

    #[test]
    fn fatal_error_renders_diagnostic_lines() {
        let error = GainMatchError::configuration(
            "CONFIG.SLOPE_FILE",
            "couldn't find file at './run7/det1/outlist.1'",
        );

        assert_eq!(error.exit_code(), 3);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [CONFIG.SLOPE_FILE] couldn't find file at './run7/det1/outlist.1'"
        );
        assert_eq!(error.fatal_exit_line(), "FATAL EXIT CODE: 3");
        assert_eq!(
            error.to_string(),
            "ConfigurationError [CONFIG.SLOPE_FILE] couldn't find file at './run7/det1/outlist.1'"
        );
    }

    #[test]
    fn every_category_exits_nonzero_with_error_severity() {
        let categories = [
            ErrorCategory::ParseError,
            ErrorCategory::ConfigurationError,
            ErrorCategory::FitConvergenceError,
            ErrorCategory::LookupError,
            ErrorCategory::InternalError,
        ];

        for category in categories {
            let error = GainMatchError::new(category, "RUN.FAILED", "stopped");
            assert_ne!(error.exit_code(), 0);
            assert_eq!(error.diagnostic_line(), "ERROR: [RUN.FAILED] stopped");
            assert_eq!(
                error.fatal_exit_line(),
                format!("FATAL EXIT CODE: {}", category.exit_code())
            );
        }
    }
}
