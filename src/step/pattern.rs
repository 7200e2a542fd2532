// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step patterns and their compilation into anchored [`Regex`]es.
//!
//! Two kinds of patterns are supported:
//! - expression templates, where quoted literals and `{param}` placeholders
//!   become capturing slots and everything else must match literally;
//! - plain [`Regex`]es, applied as-is.
//!
//! Both are matched against the whole step text (anchored at start and end),
//! and both yield their capture groups left-to-right as untyped strings.

use std::fmt;

use lazy_regex::regex;
use regex::Regex;

use crate::error::PatternError;

/// Pattern of a registered step definition.
#[derive(Clone, Debug)]
pub enum StepPattern {
    /// Expression template with quoted-literal and `{param}` placeholders.
    Expression(String),

    /// Plain regular expression.
    Regex(Regex),
}

impl StepPattern {
    /// Compiles this [`StepPattern`] into the anchored [`Regex`] it is
    /// matched with.
    ///
    /// # Errors
    ///
    /// If the assembled expression is not a valid [`Regex`] (can only happen
    /// for pathological templates exceeding the regex size limit).
    pub fn compile(&self) -> Result<Regex, PatternError> {
        let source = match self {
            Self::Expression(template) => expression_to_regex(template),
            Self::Regex(re) => format!(r"\A(?:{})\z", re.as_str()),
        };
        Regex::new(&source).map_err(Into::into)
    }
}

impl fmt::Display for StepPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expression(template) => f.write_str(template),
            Self::Regex(re) => f.write_str(re.as_str()),
        }
    }
}

impl From<&str> for StepPattern {
    fn from(template: &str) -> Self {
        Self::Expression(template.to_owned())
    }
}

impl From<String> for StepPattern {
    fn from(template: String) -> Self {
        Self::Expression(template)
    }
}

impl From<Regex> for StepPattern {
    fn from(re: Regex) -> Self {
        Self::Regex(re)
    }
}

/// Translates an expression template into anchored [`Regex`] source.
///
/// Quoted literals (`"..."` or `'...'`) become capturing slots for
/// arbitrarily quoted text, with the quote characters kept outside the
/// capture. `{int}`, `{float}`, `{word}` and `{string}` capture
/// correspondingly shaped text; `{}` and unknown parameters capture any
/// non-empty text. Everything in between is escaped and must match
/// literally.
fn expression_to_regex(template: &str) -> String {
    let placeholder = regex!(r#"("[^"]*")|('[^']*')|\{([^{}]*)\}"#);

    let mut out = String::with_capacity(template.len() + 8);
    out.push_str(r"\A");
    let mut last = 0;
    for caps in placeholder.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&regex::escape(&template[last..whole.start()]));
        out.push_str(if caps.get(1).is_some() {
            r#""([^"]*)""#
        } else if caps.get(2).is_some() {
            r"'([^']*)'"
        } else {
            match caps.get(3).map_or("", |p| p.as_str()) {
                "int" => r"([+-]?\d+)",
                "float" => r"([+-]?\d*\.?\d+)",
                "word" => r"(\S+)",
                "string" => r#""([^"]*)""#,
                _ => r"(.+)",
            }
        });
        last = whole.end();
    }
    out.push_str(&regex::escape(&template[last..]));
    out.push_str(r"\z");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captures(pattern: &StepPattern, text: &str) -> Option<Vec<String>> {
        pattern.compile().expect("pattern should compile").captures(text).map(
            |caps| {
                caps.iter()
                    .skip(1)
                    .map(|c| c.map_or_else(String::new, |m| m.as_str().into()))
                    .collect()
            },
        )
    }

    #[test]
    fn int_parameter_captures_digits() {
        let p = StepPattern::from("I have {int} items");
        assert_eq!(captures(&p, "I have 3 items"), Some(vec!["3".into()]));
        assert_eq!(captures(&p, "I have -12 items"), Some(vec!["-12".into()]));
        assert_eq!(captures(&p, "I have three items"), None);
    }

    #[test]
    fn quoted_literal_becomes_capture_slot() {
        let p = StepPattern::from(r#"I open the "settings" page"#);
        assert_eq!(
            captures(&p, r#"I open the "profile" page"#),
            Some(vec!["profile".into()]),
        );
        // Quotes stay outside the capture and are still required.
        assert_eq!(captures(&p, "I open the profile page"), None);
    }

    #[test]
    fn single_quoted_literal_keeps_quote_kind() {
        let p = StepPattern::from("I click 'save'");
        assert_eq!(captures(&p, "I click 'cancel'"), Some(vec!["cancel".into()]));
        assert_eq!(captures(&p, r#"I click "cancel""#), None);
    }

    #[test]
    fn anonymous_and_unknown_parameters_capture_text() {
        let p = StepPattern::from("I see {} in the {element}");
        assert_eq!(
            captures(&p, "I see errors in the sidebar"),
            Some(vec!["errors".into(), "sidebar".into()]),
        );
    }

    #[test]
    fn matching_is_anchored_at_both_ends() {
        let p = StepPattern::from("I log in");
        assert!(captures(&p, "I log in").is_some());
        assert!(captures(&p, "I log in again").is_none());
        assert!(captures(&p, "then I log in").is_none());

        let re = StepPattern::from(Regex::new(r"I wait (\d+)s").unwrap());
        assert_eq!(captures(&re, "I wait 5s"), Some(vec!["5".into()]));
        assert!(captures(&re, "I wait 5s more").is_none());
    }

    #[test]
    fn literal_text_is_escaped() {
        let p = StepPattern::from("the total (incl. tax) is {float}");
        assert_eq!(
            captures(&p, "the total (incl. tax) is 12.50"),
            Some(vec!["12.50".into()]),
        );
        assert!(captures(&p, "the total Xincl- taxY is 12.50").is_none());
    }

    #[test]
    fn word_parameter_stops_at_whitespace() {
        let p = StepPattern::from("the {word} button");
        assert_eq!(captures(&p, "the save button"), Some(vec!["save".into()]));
        assert!(captures(&p, "the save all button").is_none());
    }
}
