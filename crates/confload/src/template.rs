//! Configuration template preprocessing
//!
//! Templates are host command scripts whose lines may embed
//! `SECRET(title, attribute)` references. Expansion resolves every
//! reference through a [`SecretResolver`] and is all-or-nothing: a single
//! failing reference poisons the whole expansion, so a partially
//! substituted script can never be executed with an empty or garbage value
//! where a secret belonged.

use std::path::Path;

use regex::Regex;

use crate::executor::CommandStream;
use crate::vault::AuthFailure;

const REFERENCE_PATTERN: &str = r"SECRET\(\s*([^,()\s][^,()]*?)\s*,\s*([^,()\s][^,()]*?)\s*\)";

/// A `SECRET(title, attribute)` occurrence in a template.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SecretReference {
    pub title: String,
    pub attribute: String,
}

/// Resolves one secret reference to its decrypted value.
///
/// The production implementation binds the session passphrase to a
/// [`crate::vault::VaultQuery`]; tests substitute their own.
pub trait SecretResolver {
    fn resolve(&self, title: &str, attribute: &str) -> Result<String, AuthFailure>;
}

/// An immutable, ordered sequence of template lines.
#[derive(Debug, Clone)]
pub struct ConfigTemplate {
    lines: Vec<String>,
}

impl ConfigTemplate {
    /// Load a template from disk.
    ///
    /// A missing or unreadable template surfaces as the same opaque
    /// [`AuthFailure`] as a bad passphrase; the distinction would leak
    /// information to anyone probing a running session.
    pub fn load(path: &Path) -> Result<Self, AuthFailure> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            tracing::debug!("template unreadable: {e}");
            AuthFailure
        })?;
        Ok(Self::from_text(&text))
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    /// List every secret reference without resolving any of them.
    pub fn find_references(&self) -> Vec<SecretReference> {
        let re = Regex::new(REFERENCE_PATTERN).unwrap();

        self.lines
            .iter()
            .flat_map(|line| {
                re.captures_iter(line).map(|caps| SecretReference {
                    title: caps[1].to_string(),
                    attribute: caps[2].to_string(),
                })
            })
            .collect()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Expand every secret reference and produce the command stream.
    ///
    /// Each occurrence triggers its own resolver call, even for repeated
    /// references - decrypted values are held no longer than necessary.
    /// Returns either a complete stream or [`AuthFailure`]; never a hybrid.
    pub fn expand(&self, resolver: &dyn SecretResolver) -> Result<CommandStream, AuthFailure> {
        let re = Regex::new(REFERENCE_PATTERN).unwrap();

        let mut expanded = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            expanded.push(expand_line(&re, line, resolver)?);
        }
        Ok(CommandStream::new(expanded))
    }
}

fn expand_line(
    re: &Regex,
    line: &str,
    resolver: &dyn SecretResolver,
) -> Result<String, AuthFailure> {
    let mut out = String::with_capacity(line.len());
    let mut last = 0;
    for caps in re.captures_iter(line) {
        let whole = caps.get(0).unwrap();
        out.push_str(&line[last..whole.start()]);
        out.push_str(&resolver.resolve(&caps[1], &caps[2])?);
        last = whole.end();
    }
    out.push_str(&line[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Resolver backed by a map, optionally failing on one reference.
    struct MapResolver {
        secrets: HashMap<(String, String), String>,
        fail_on: Option<(String, String)>,
        calls: RefCell<usize>,
    }

    impl MapResolver {
        fn new(entries: &[(&str, &str, &str)]) -> Self {
            let secrets = entries
                .iter()
                .map(|(t, a, v)| ((t.to_string(), a.to_string()), v.to_string()))
                .collect();
            Self {
                secrets,
                fail_on: None,
                calls: RefCell::new(0),
            }
        }

        fn failing_on(mut self, title: &str, attribute: &str) -> Self {
            self.fail_on = Some((title.to_string(), attribute.to_string()));
            self
        }
    }

    impl SecretResolver for MapResolver {
        fn resolve(&self, title: &str, attribute: &str) -> Result<String, AuthFailure> {
            *self.calls.borrow_mut() += 1;
            let key = (title.to_string(), attribute.to_string());
            if self.fail_on.as_ref() == Some(&key) {
                return Err(AuthFailure);
            }
            self.secrets.get(&key).cloned().ok_or(AuthFailure)
        }
    }

    #[test]
    fn test_expand_no_references() {
        let template = ConfigTemplate::from_text("connect server1\njoin #rust\n");
        let resolver = MapResolver::new(&[]);

        let stream = template.expand(&resolver).unwrap();
        assert_eq!(stream.commands(), ["connect server1", "join #rust"]);
        assert_eq!(*resolver.calls.borrow(), 0);
    }

    #[test]
    fn test_expand_single_reference() {
        let template =
            ConfigTemplate::from_text("connect server1\n/msg nickserv identify SECRET(irc, password)\n");
        let resolver = MapResolver::new(&[("irc", "password", "s3cr3t")]);

        let stream = template.expand(&resolver).unwrap();
        assert_eq!(
            stream.commands(),
            ["connect server1", "/msg nickserv identify s3cr3t"]
        );
    }

    #[test]
    fn test_expand_three_references_no_macro_syntax_left() {
        let template = ConfigTemplate::from_text(
            "auth SECRET(a, pass)\nset key SECRET(b, token) SECRET(c, pin)\n",
        );
        let resolver =
            MapResolver::new(&[("a", "pass", "p1"), ("b", "token", "t2"), ("c", "pin", "1234")]);

        let stream = template.expand(&resolver).unwrap();
        assert_eq!(stream.commands(), ["auth p1", "set key t2 1234"]);
        for command in stream.commands() {
            assert!(!command.contains("SECRET("));
        }
        assert_eq!(*resolver.calls.borrow(), 3);
    }

    #[test]
    fn test_expand_fails_at_any_position() {
        let template = ConfigTemplate::from_text(
            "auth SECRET(a, pass)\nset key SECRET(b, token)\nlogin SECRET(c, pin)\n",
        );
        let entries: &[(&str, &str, &str)] =
            &[("a", "pass", "p1"), ("b", "token", "t2"), ("c", "pin", "1234")];

        for (title, attribute) in [("a", "pass"), ("b", "token"), ("c", "pin")] {
            let resolver = MapResolver::new(entries).failing_on(title, attribute);
            let result = template.expand(&resolver);
            assert_eq!(result.unwrap_err(), AuthFailure);
        }
    }

    #[test]
    fn test_repeated_reference_resolves_each_occurrence() {
        let template =
            ConfigTemplate::from_text("one SECRET(a, pass)\ntwo SECRET(a, pass)\n");
        let resolver = MapResolver::new(&[("a", "pass", "v")]);

        template.expand(&resolver).unwrap();
        assert_eq!(*resolver.calls.borrow(), 2);
    }

    #[test]
    fn test_find_references() {
        let template = ConfigTemplate::from_text(
            "connect server1\nidentify SECRET(irc, password)\nkey SECRET( api , token )\n",
        );

        let refs = template.find_references();
        assert_eq!(
            refs,
            vec![
                SecretReference {
                    title: "irc".to_string(),
                    attribute: "password".to_string()
                },
                SecretReference {
                    title: "api".to_string(),
                    attribute: "token".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_load_missing_template_is_auth_failure() {
        let result = ConfigTemplate::load(Path::new("/nonexistent/confloadrc"));
        assert_eq!(result.unwrap_err(), AuthFailure);
    }

    #[test]
    fn test_reference_whitespace_trimmed() {
        let template = ConfigTemplate::from_text("x SECRET( irc ,  password )");
        let resolver = MapResolver::new(&[("irc", "password", "v")]);

        let stream = template.expand(&resolver).unwrap();
        assert_eq!(stream.commands(), ["x v"]);
    }
}
