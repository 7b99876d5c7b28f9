use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use log::{error, info};

use crate::cmd::style;
use crate::pds4::{ErrorType, Severity, ValidationError};

/// Renders a readiness check's findings, grouped by `(severity,
/// error_type)`.
pub struct ReadinessReport<'a> {
    errors: &'a [ValidationError],
    no_styles: bool,
}

impl<'a> ReadinessReport<'a> {
    pub fn new(errors: &'a [ValidationError], no_styles: bool) -> Self {
        Self { errors, no_styles }
    }

    fn grouped(&self) -> BTreeMap<(Severity, ErrorType), Vec<&'a ValidationError>> {
        let mut groups: BTreeMap<(Severity, ErrorType), Vec<&'a ValidationError>> = BTreeMap::new();
        for e in self.errors {
            groups.entry((e.severity, e.error_type)).or_default().push(e);
        }
        groups
    }

    /// True if the readiness check found no blocking issues.
    pub fn is_ready(&self) -> bool {
        !self.errors.iter().any(|e| e.severity == Severity::Error)
    }

    /// Emits the same grouped summary to the `log` facade, so it lands in
    /// a `-l/--logfile` sink alongside everything else.
    pub fn log(&self) {
        if self.errors.is_empty() {
            info!("readiness check found no issues");
            return;
        }

        for ((severity, error_type), entries) in self.grouped() {
            let line = format!("{severity} - {error_type}: {}", entries.len());
            match severity {
                Severity::Error => error!("{line}"),
                Severity::Warning => info!("{line}"),
            }
            for entry in entries {
                match severity {
                    Severity::Error => error!("  {}", entry.message),
                    Severity::Warning => info!("  {}", entry.message),
                }
            }
        }
    }
}

impl<'a> Display for ReadinessReport<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            let line = "no issues found";
            return if style::styles_enabled(self.no_styles) {
                write!(f, "{}", style::GREEN.paint(line))
            } else {
                write!(f, "{line}")
            };
        }

        let styled = style::styles_enabled(self.no_styles);

        for ((severity, error_type), entries) in self.grouped() {
            let heading = format!("{severity} - {error_type}: {}", entries.len());
            if styled {
                match severity {
                    Severity::Error => writeln!(f, "{}", style::RED.paint(heading))?,
                    Severity::Warning => writeln!(f, "{}", style::YELLOW.paint(heading))?,
                }
            } else {
                writeln!(f, "{heading}")?;
            }

            for entry in entries {
                writeln!(f, "  {}", entry.message)?;
            }
        }

        write!(f, "total: {}", self.errors.len())
    }
}
