use crate::converter::stdrename::StdRenames;
use crate::error::{Error, Result};
use log::debug;
use regex::Regex;
use std::fmt;

/// A pypi to conda package renaming rule.
///
/// The pattern must match the whole pypi name. The replacement may refer to
/// groups of the pattern either as `\1`/`\g<name>` or with the `$1`/`${name}`
/// shorthand. An empty replacement drops the dependency.
#[derive(Debug, Clone)]
pub struct DependencyRename {
    pattern: String,
    regex: Regex,
    replacement: String,
    template: String,
}

impl DependencyRename {
    /// Compiles a rule, validating both the pattern and the group references
    /// used by the replacement.
    pub fn from_strings(pattern: &str, replacement: &str) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| Error::RenamePattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        let template = compile_replacement(&regex, replacement).map_err(|message| {
            Error::RenameReplacement {
                pattern: pattern.to_string(),
                replacement: replacement.to_string(),
                message,
            }
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            replacement: replacement.to_string(),
            template,
        })
    }

    /// The pattern as written by the user
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The replacement as written by the user
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Renames a pypi package name.
    ///
    /// Returns the conda name and whether the pattern matched.
    pub fn rename(&self, pypi_name: &str) -> (String, bool) {
        match self.regex.captures(pypi_name) {
            Some(captures) => {
                let mut conda_name = String::new();
                captures.expand(&self.template, &mut conda_name);
                (conda_name, true)
            }
            None => (pypi_name.to_string(), false),
        }
    }
}

impl fmt::Display for DependencyRename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.pattern, self.replacement)
    }
}

/// A group reference found in a replacement string
enum GroupRef {
    Index(usize),
    Name(String),
}

/// Translates a user replacement string into a `regex` expansion template,
/// checking that every group it references exists in `regex`.
fn compile_replacement(regex: &Regex, replacement: &str) -> std::result::Result<String, String> {
    let mut template = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();

    while let Some(c) = chars.next() {
        let group = match c {
            '\\' => match chars.peek().copied() {
                Some('0') => {
                    template.push(take_octal_escape(&mut chars));
                    continue;
                }
                Some(d) if d.is_ascii_digit() => GroupRef::Index(take_digits(&mut chars)),
                Some('g') => {
                    chars.next();
                    if chars.next() != Some('<') {
                        return Err("missing < after \\g".to_string());
                    }
                    let name = take_until(&mut chars, '>')
                        .ok_or_else(|| "missing >, unterminated name".to_string())?;
                    parse_group_name(&name)?
                }
                Some('\\') => {
                    chars.next();
                    template.push('\\');
                    continue;
                }
                Some(c) if control_escape(c).is_some() => {
                    chars.next();
                    template.extend(control_escape(c));
                    continue;
                }
                Some(other) if other.is_ascii_alphabetic() => {
                    return Err(format!("bad escape \\{}", other));
                }
                _ => {
                    template.push('\\');
                    continue;
                }
            },
            '$' => match chars.peek().copied() {
                Some(d) if d.is_ascii_digit() => GroupRef::Index(take_digits(&mut chars)),
                Some('{') => {
                    chars.next();
                    match take_until(&mut chars, '}') {
                        Some(name) if is_word(&name) => parse_group_name(&name)?,
                        Some(name) => {
                            template.push_str("$${");
                            template.push_str(&name);
                            template.push('}');
                            continue;
                        }
                        None => return Err("missing }, unterminated name".to_string()),
                    }
                }
                _ => {
                    template.push_str("$$");
                    continue;
                }
            },
            other => {
                template.push(other);
                continue;
            }
        };

        match group {
            GroupRef::Index(index) => {
                if index >= regex.captures_len() {
                    return Err(format!("invalid group reference {}", index));
                }
                template.push_str(&format!("${{{}}}", index));
            }
            GroupRef::Name(name) => {
                if !regex.capture_names().flatten().any(|n| n == name) {
                    return Err(format!("unknown group name '{}'", name));
                }
                template.push_str(&format!("${{{}}}", name));
            }
        }
    }

    Ok(template)
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> usize {
    let mut digits = String::new();
    while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(d);
        chars.next();
    }
    digits.parse().unwrap_or(usize::MAX)
}

/// `\0` followed by up to two more octal digits
fn take_octal_escape(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> char {
    let mut value = 0u32;
    for _ in 0..3 {
        match chars.peek().and_then(|c| c.to_digit(8)) {
            Some(digit) => {
                value = value * 8 + digit;
                chars.next();
            }
            None => break,
        }
    }
    char::from_u32(value).unwrap_or('\0')
}

fn control_escape(c: char) -> Option<char> {
    match c {
        'a' => Some('\x07'),
        'b' => Some('\x08'),
        'f' => Some('\x0c'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        'v' => Some('\x0b'),
        _ => None,
    }
}

fn take_until(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, end: char) -> Option<String> {
    let mut taken = String::new();
    for c in chars.by_ref() {
        if c == end {
            return Some(taken);
        }
        taken.push(c);
    }
    None
}

fn is_word(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn parse_group_name(name: &str) -> std::result::Result<GroupRef, String> {
    if name.is_empty() {
        return Err("missing group name".to_string());
    }
    if name.chars().all(|c| c.is_ascii_digit()) {
        return Ok(GroupRef::Index(name.parse().unwrap_or(usize::MAX)));
    }
    if !is_word(name) || name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(format!("bad character in group name '{}'", name));
    }
    Ok(GroupRef::Name(name.to_string()))
}

/// Resolves pypi names to conda names using an ordered list of rename rules
/// with the standard rename table as fallback.
#[derive(Debug, Clone, Default)]
pub struct DependencyRenamer {
    rules: Vec<DependencyRename>,
    std_renames: StdRenames,
}

impl DependencyRenamer {
    pub fn new(rules: Vec<DependencyRename>, std_renames: StdRenames) -> Self {
        Self { rules, std_renames }
    }

    /// Compiles `(pattern, replacement)` pairs, failing on the first invalid one
    pub fn from_pairs<P, R>(pairs: &[(P, R)], std_renames: StdRenames) -> Result<Self>
    where
        P: AsRef<str>,
        R: AsRef<str>,
    {
        let rules = pairs
            .iter()
            .map(|(pattern, replacement)| {
                DependencyRename::from_strings(pattern.as_ref(), replacement.as_ref())
            })
            .collect::<Result<Vec<_>>>()?;
        debug!("Compiled {} dependency rename rules", rules.len());
        Ok(Self::new(rules, std_renames))
    }

    pub fn rules(&self) -> &[DependencyRename] {
        &self.rules
    }

    pub fn std_renames(&self) -> &StdRenames {
        &self.std_renames
    }

    /// Returns the conda name for `pypi_name` and whether an explicit rule
    /// produced it. The first matching rule wins. An empty name means the
    /// dependency should be dropped.
    pub fn resolve(&self, pypi_name: &str) -> (String, bool) {
        for rule in &self.rules {
            let (conda_name, renamed) = rule.rename(pypi_name);
            if renamed {
                return (conda_name, true);
            }
        }
        let conda_name = self
            .std_renames
            .get(pypi_name)
            .unwrap_or(pypi_name)
            .to_string();
        (conda_name, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(pattern: &str, replacement: &str) -> std::result::Result<String, String> {
        let regex = Regex::new(&format!("^(?:{})$", pattern)).unwrap();
        compile_replacement(&regex, replacement)
    }

    #[test]
    fn test_compile_replacement_syntax() {
        assert_eq!(template("(a)(b)", r"x\1y\2").unwrap(), "x${1}y${2}");
        assert_eq!(template("(a)", "$1b").unwrap(), "${1}b");
        assert_eq!(template("(?P<n>a)", r"\g<n>").unwrap(), "${n}");
        assert_eq!(template("(?P<n>a)", "${n}").unwrap(), "${n}");
        assert_eq!(template("(a)", r"\g<1>").unwrap(), "${1}");
        assert_eq!(template("a", "cost$").unwrap(), "cost$$");
        assert_eq!(template("a", r"a\\b").unwrap(), r"a\b");
    }

    #[test]
    fn test_control_and_octal_escapes() {
        assert_eq!(template("a", r"a\rb").unwrap(), "a\rb");
        assert_eq!(template("a", r"\a\b\f\v").unwrap(), "\x07\x08\x0c\x0b");
        assert_eq!(template("a", r"\0x").unwrap(), "\0x");
        assert_eq!(template("a", r"\0101").unwrap(), "\x081");
        assert_eq!(template("a", r"\09").unwrap(), "\09");

        let rule = DependencyRename::from_strings("a", r"\0x").unwrap();
        assert_eq!(rule.rename("a"), ("\0x".to_string(), true));
    }

    #[test]
    fn test_compile_replacement_errors() {
        assert!(template("a", r"\1").unwrap_err().contains("invalid group reference 1"));
        assert!(template("a(.*)", "$2").unwrap_err().contains("invalid group reference 2"));
        assert!(template("a(.*)", "${name}").unwrap_err().contains("unknown group name"));
        assert!(template("a", r"\g<x").is_err());
        assert!(template("a", r"\q").unwrap_err().contains("bad escape"));
    }

    #[test]
    fn test_group_zero_is_whole_match() {
        let rule = DependencyRename::from_strings("py.*", r"\g<0>-conda").unwrap();
        assert_eq!(rule.rename("pyyaml"), ("pyyaml-conda".to_string(), true));
    }

    #[test]
    fn test_alternation_is_anchored_as_a_whole() {
        let rule = DependencyRename::from_strings("foo|bar", "baz").unwrap();
        assert_eq!(rule.rename("foo"), ("baz".to_string(), true));
        assert_eq!(rule.rename("barn"), ("barn".to_string(), false));
        assert_eq!(rule.rename("xfoo"), ("xfoo".to_string(), false));
    }
}
