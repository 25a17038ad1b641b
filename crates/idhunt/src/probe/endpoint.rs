use crate::{Candidate, Error, Result};

pub const DEFAULT_HOST: &str = "i.ytimg.com";
pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_PATH_PREFIX: &str = "vi";
pub const DEFAULT_SUFFIX: &str = "default.jpg";
pub const DEFAULT_SHARE_BASE: &str = "https://youtu.be/";

/// The fixed remote service every candidate is checked against.
///
/// A candidate `id` is probed at `/{path_prefix}/{id}/{suffix}` and, when it
/// exists, reported as `{share_base}{id}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
    path_prefix: String,
    suffix: String,
    share_base: String,
}

impl Endpoint {
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `host` is empty or `port` is zero.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        path_prefix: impl Into<String>,
        suffix: impl Into<String>,
        share_base: impl Into<String>,
    ) -> Result<Self> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(Error::config("target host must not be empty"));
        }
        if port == 0 {
            return Err(Error::config("target port must not be zero"));
        }

        Ok(Self {
            host,
            port,
            path_prefix: path_prefix.into().trim_matches('/').to_owned(),
            suffix: suffix.into().trim_matches('/').to_owned(),
            share_base: share_base.into(),
        })
    }

    /// Same defaults with a different host and port.
    ///
    /// # Errors
    ///
    /// See [`Endpoint::new`].
    pub fn with_target(host: impl Into<String>, port: u16) -> Result<Self> {
        Self::new(
            host,
            port,
            DEFAULT_PATH_PREFIX,
            DEFAULT_SUFFIX,
            DEFAULT_SHARE_BASE,
        )
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Request path for `candidate`.
    pub fn path(&self, candidate: &Candidate) -> String {
        let mut path = String::with_capacity(
            self.path_prefix.len() + candidate.as_str().len() + self.suffix.len() + 3,
        );
        path.push('/');
        if !self.path_prefix.is_empty() {
            path.push_str(&self.path_prefix);
            path.push('/');
        }
        path.push_str(candidate.as_str());
        if !self.suffix.is_empty() {
            path.push('/');
            path.push_str(&self.suffix);
        }
        path
    }

    /// Minimal existence check: a `HEAD` request that asks the server to close
    /// the connection after answering.
    pub fn head_request(&self, candidate: &Candidate) -> String {
        format!(
            "HEAD {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
            self.path(candidate),
            self.host
        )
    }

    /// Canonical externally shareable link for `candidate`.
    pub fn share_url(&self, candidate: &Candidate) -> String {
        format!("{}{}", self.share_base, candidate)
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            path_prefix: DEFAULT_PATH_PREFIX.to_owned(),
            suffix: DEFAULT_SUFFIX.to_owned(),
            share_base: DEFAULT_SHARE_BASE.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_request_layout() {
        let endpoint = Endpoint::default();
        let candidate = Candidate::from("dQw4w9WgXcQ");
        assert_eq!(endpoint.path(&candidate), "/vi/dQw4w9WgXcQ/default.jpg");
        assert_eq!(
            endpoint.head_request(&candidate),
            "HEAD /vi/dQw4w9WgXcQ/default.jpg HTTP/1.1\r\n\
             Host: i.ytimg.com\r\n\
             Connection: close\r\n\r\n"
        );
        assert_eq!(
            endpoint.share_url(&candidate),
            "https://youtu.be/dQw4w9WgXcQ"
        );
    }

    #[test]
    fn slashes_are_normalized() {
        let endpoint = Endpoint::new("example.org", 8443, "/img/", "", "https://x/").unwrap();
        assert_eq!(endpoint.path(&"abc".into()), "/img/abc");
    }

    #[test]
    fn rejects_bad_targets() {
        assert!(Endpoint::with_target("", 443).is_err());
        assert!(Endpoint::with_target("example.org", 0).is_err());
    }
}
