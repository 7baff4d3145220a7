use std::{
    borrow::Borrow,
    fmt,
    hash::{Hash, Hasher},
    net::IpAddr,
    ops::Deref,
    str::FromStr,
};

use non_empty_string::NonEmptyString;

const WWW_PREFIX: &str = "www.";

/// Strips a single leading `www.` label, if present.
///
/// This is the only prefix treated as insignificant: `www.example.com` and
/// `example.com` name the same fireproofed site.
#[must_use]
pub fn drop_www(raw: &str) -> &str {
    raw.strip_prefix(WWW_PREFIX).unwrap_or(raw)
}

/// A validated domain name in canonical form.
///
/// Normalization trims surrounding whitespace, drops a trailing `.`,
/// lowercases ASCII letters and strips one leading `www.` label. Every lookup
/// into the index goes through this type, so `WWW.Example.com.` and
/// `example.com` always resolve to the same entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NormalizedDomain(NonEmptyString);

impl NormalizedDomain {
    /// Normalizes and validates a raw domain string.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDomainError`] if the string is empty after
    /// normalization, contains whitespace, or has an empty label (for example
    /// `a..b` or `.example.com`).
    pub fn new(raw: &str) -> Result<Self, InvalidDomainError> {
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
        let lowered = trimmed.to_ascii_lowercase();
        let domain = drop_www(&lowered);

        if domain.chars().any(char::is_whitespace) || domain.split('.').any(str::is_empty) {
            return Err(InvalidDomainError(raw.to_string()));
        }

        NonEmptyString::new(domain.to_string())
            .map(Self)
            .map_err(|_| InvalidDomainError(raw.to_string()))
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Number of dot-separated labels.
    #[must_use]
    pub fn label_count(&self) -> usize {
        self.as_str().split('.').count()
    }

    /// Whether this is an IP address literal rather than a host name.
    ///
    /// IPv6 literals may be bracketed, as they appear in URLs.
    #[must_use]
    pub fn is_ip_address(&self) -> bool {
        let host = self.as_str();
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        host.parse::<IpAddr>().is_ok()
    }

    /// Iterates over every strict superdomain, from the immediate parent up to
    /// and including the second-level domain.
    ///
    /// Domains with two labels or fewer have no superdomains, and neither do
    /// IP addresses. Public suffixes are not consulted: `co.uk` is a
    /// superdomain of `mail.example.co.uk`.
    ///
    /// ```
    /// use fireproof::NormalizedDomain;
    ///
    /// let domain = NormalizedDomain::new("mail.sub.example.com").unwrap();
    /// let superdomains: Vec<_> = domain.superdomains().collect();
    /// assert_eq!(superdomains, ["sub.example.com", "example.com"]);
    /// ```
    #[must_use]
    pub fn superdomains(&self) -> Superdomains<'_> {
        let remaining = if self.is_ip_address() {
            0
        } else {
            self.label_count().saturating_sub(2)
        };
        Superdomains {
            rest: self.as_str(),
            remaining,
        }
    }
}

/// Iterator over the superdomains of a [`NormalizedDomain`].
///
/// Returned by [`NormalizedDomain::superdomains`]. Yields borrowed suffixes of
/// the original string, so no allocation happens until the caller needs an
/// owned domain.
#[derive(Debug, Clone)]
pub struct Superdomains<'a> {
    rest: &'a str,
    remaining: usize,
}

impl<'a> Iterator for Superdomains<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let (_, parent) = self.rest.split_once('.')?;
        self.rest = parent;
        self.remaining -= 1;
        Some(parent)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Superdomains<'_> {}

/// Error returned when a string cannot be normalized into a domain.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
#[error("Invalid domain '{0}': must be a non-empty dot-separated host name")]
pub struct InvalidDomainError(String);

impl InvalidDomainError {
    /// The raw input that failed validation.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NormalizedDomain {
    type Error = InvalidDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl TryFrom<&str> for NormalizedDomain {
    type Error = InvalidDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for NormalizedDomain {
    type Err = InvalidDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for NormalizedDomain {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for NormalizedDomain {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

// Must agree with `str`'s hash for the `Borrow<str>` lookups in the index.
impl Hash for NormalizedDomain {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl Deref for NormalizedDomain {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl fmt::Display for NormalizedDomain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("example.com", "example.com"; "already normal")]
    #[test_case("www.example.com", "example.com"; "www prefix")]
    #[test_case("WWW.Example.COM", "example.com"; "mixed case")]
    #[test_case("  example.com  ", "example.com"; "surrounding whitespace")]
    #[test_case("example.com.", "example.com"; "trailing dot")]
    #[test_case("www.www.example.com", "www.example.com"; "only one www stripped")]
    #[test_case("wwwexample.com", "wwwexample.com"; "www without dot kept")]
    #[test_case("localhost", "localhost"; "single label")]
    fn normalizes(raw: &str, expected: &str) {
        let domain = NormalizedDomain::new(raw).unwrap();
        assert_eq!(domain.as_str(), expected);
    }

    #[test_case(""; "empty")]
    #[test_case("   "; "blank")]
    #[test_case("www.."; "only www")]
    #[test_case("a..b"; "empty label")]
    #[test_case(".example.com"; "leading dot")]
    #[test_case("exa mple.com"; "inner whitespace")]
    fn rejects(raw: &str) {
        let error = NormalizedDomain::new(raw).unwrap_err();
        assert_eq!(error.input(), raw);
    }

    #[test]
    fn www_and_bare_domain_are_equal() {
        let bare = NormalizedDomain::new("example.com").unwrap();
        let www = NormalizedDomain::new("www.example.com").unwrap();
        assert_eq!(bare, www);
    }

    #[test_case("example.com", &[]; "second level has none")]
    #[test_case("localhost", &[]; "single label has none")]
    #[test_case("mail.example.com", &["example.com"]; "third level")]
    #[test_case("a.b.example.co.uk", &["b.example.co.uk", "example.co.uk", "co.uk"]; "deep")]
    fn superdomains(raw: &str, expected: &[&str]) {
        let domain = NormalizedDomain::new(raw).unwrap();
        let actual: Vec<_> = domain.superdomains().collect();
        assert_eq!(actual, expected);
        assert_eq!(domain.superdomains().len(), expected.len());
    }

    #[test_case("192.168.0.1"; "ipv4")]
    #[test_case("::ffff:192.168.0.1"; "ipv4 mapped ipv6")]
    #[test_case("[::ffff:10.0.0.1]"; "bracketed ipv6")]
    fn ip_addresses_have_no_superdomains(raw: &str) {
        let domain = NormalizedDomain::new(raw).unwrap();
        assert!(domain.is_ip_address());
        assert_eq!(domain.superdomains().count(), 0);
        assert_eq!(domain.superdomains().len(), 0);
    }

    #[test_case("example.com"; "host name")]
    #[test_case("1.2.3.example"; "numeric labels")]
    #[test_case("256.1.1.1"; "octet out of range")]
    fn host_names_are_not_ip_addresses(raw: &str) {
        assert!(!NormalizedDomain::new(raw).unwrap().is_ip_address());
    }

    #[test]
    fn label_count_counts_dots() {
        assert_eq!(NormalizedDomain::new("a.b.c").unwrap().label_count(), 3);
        assert_eq!(NormalizedDomain::new("www.a.b").unwrap().label_count(), 2);
    }

    #[test]
    fn drop_www_only_strips_prefix() {
        assert_eq!(drop_www("www.example.com"), "example.com");
        assert_eq!(drop_www("mail.www.example.com"), "mail.www.example.com");
    }
}
