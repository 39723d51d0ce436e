use rustc_hash::FxHashSet;
use tracing::{debug, error, warn};

use crate::{error::Error, gl::GlBackend};

/// Errors drained from the GL queue per check; some drivers never empty it
/// after a lost context.
const MAX_ERRORS_PER_CHECK: usize = 16;

/// Distinct failure messages remembered for deduplication. Messages carry
/// handle ids, which are never reused.
const MAX_DISTINCT_FAILURES: usize = 64;

/// Reports GL errors and failed draws once per distinct cause, so a fault
/// that repeats every frame produces a single log line.
#[derive(Debug, Default)]
pub(crate) struct GlErrorReporter {
    enabled: bool,
    reported: FxHashSet<(&'static str, u32)>,
    failures: FxHashSet<String>,
}

impl GlErrorReporter {
    pub(crate) fn new(enabled: bool) -> Self {
        Self { enabled, ..Self::default() }
    }

    /// Drains the GL error queue, logging each new `(site, error)` pair.
    /// Returns the number of errors drained. No-op unless enabled.
    pub(crate) fn check<G: GlBackend>(&mut self, gl: &G, site: &'static str) -> usize {
        if !self.enabled {
            return 0;
        }

        let mut drained = 0;
        while drained < MAX_ERRORS_PER_CHECK {
            let code = gl.get_error();
            if code == glow::NO_ERROR {
                break;
            }
            drained += 1;

            if self.reported.insert((site, code)) {
                let hex = format!("0x{code:04X}");
                error!(site, code = %hex, name = error_name(code), "GL error");
            }
        }
        drained
    }

    /// Logs a failed renderer call at `warn` the first time its message is
    /// seen, at `debug` afterwards. Once the dedup set is full, unseen
    /// messages are logged at `debug` too.
    pub(crate) fn report(&mut self, site: &'static str, err: &Error) {
        let message = err.to_string();
        if self.failures.len() < MAX_DISTINCT_FAILURES && self.failures.insert(message) {
            warn!(site, error = %err, "renderer call failed");
        } else {
            debug!(site, error = %err, "renderer call failed again");
        }
    }
}

fn error_name(code: u32) -> &'static str {
    match code {
        glow::INVALID_ENUM => "INVALID_ENUM",
        glow::INVALID_VALUE => "INVALID_VALUE",
        glow::INVALID_OPERATION => "INVALID_OPERATION",
        glow::INVALID_FRAMEBUFFER_OPERATION => "INVALID_FRAMEBUFFER_OPERATION",
        glow::OUT_OF_MEMORY => "OUT_OF_MEMORY",
        _ => "UNKNOWN",
    }
}
