// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Console output consumed by the host runner.
//!
//! The per-step pass/fail lines and the disabled-tag notices are part of the
//! contract (live feedback while a long suite runs), not incidental logging;
//! diagnostics go through [`tracing`] instead.

use console::{Style, Term};

use crate::tag;

/// Console writer for the contractual output lines.
#[derive(Clone, Debug)]
pub struct Console {
    terminal: Term,
    ok: Style,
    err: Style,
    warn: Style,
}

impl Default for Console {
    fn default() -> Self {
        Self {
            terminal: Term::stdout(),
            ok: Style::new().green(),
            err: Style::new().red(),
            warn: Style::new().yellow(),
        }
    }
}

impl Console {
    /// Creates a new [`Console`] writing to stdout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Announces a scenario starting its execution.
    pub fn scenario_started(&self, scenario: &str) {
        self.write_line(&format!(" {scenario}"));
    }

    /// Emits the pass line for one executed step.
    pub fn step_passed(&self, scenario: &str, step_text: &str) {
        self.write_line(&format!(
            "\t{}",
            self.ok.apply_to(format!("✔ {scenario} - {step_text}")),
        ));
    }

    /// Emits the fail line for one executed step.
    pub fn step_failed(&self, scenario: &str, step_text: &str) {
        self.write_line(&format!(
            "\t{}",
            self.err.apply_to(format!("✘ {scenario} - {step_text}")),
        ));
    }

    /// Emits the notice for scenarios suppressed by a disabled tag.
    ///
    /// The tag is printed in its `@tag` form whether or not the configured
    /// tag carried the `@` prefix.
    pub fn disabled(&self, tag: &str, reason: Option<&str>) {
        let line = disabled_line(tag, reason);
        self.write_line(&format!("{}", self.warn.apply_to(line)));
    }

    /// A broken stdout must not fail a scenario; the run result is reported
    /// through [`RunSummary`] anyway.
    ///
    /// [`RunSummary`]: crate::RunSummary
    fn write_line(&self, line: &str) {
        if let Err(e) = self.terminal.write_line(line) {
            tracing::warn!("failed to write console line: {e}");
        }
    }
}

fn disabled_line(tag: &str, reason: Option<&str>) -> String {
    let tag = tag::normalize(tag);
    match reason {
        Some(reason) => {
            format!("Ignoring scenarios tagged with @{tag} because {reason}")
        }
        None => format!("Ignoring scenarios tagged with @{tag}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_notice_prints_a_single_at_prefix() {
        assert_eq!(
            disabled_line("@wip", Some("it is unfinished")),
            "Ignoring scenarios tagged with @wip because it is unfinished",
        );
        assert_eq!(
            disabled_line("wip", None),
            "Ignoring scenarios tagged with @wip",
        );
    }
}
