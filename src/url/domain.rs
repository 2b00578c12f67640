use crate::UrlError;
use std::fmt;
use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use product_scout::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// The site being crawled: scheme, host and optional port
///
/// A `Domain` is fixed for the lifetime of a crawl and is the base against
/// which relative sitemap locations are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Domain {
    origin: Url,
}

impl Domain {
    /// Parses a domain from user input
    ///
    /// Bare hosts (`shop.example.com`) are given the `https` scheme. Any path,
    /// query or fragment on the input is discarded.
    ///
    /// # Examples
    ///
    /// ```
    /// use product_scout::url::Domain;
    ///
    /// let domain = Domain::parse("Shop.Example.com").unwrap();
    /// assert_eq!(domain.to_string(), "https://shop.example.com");
    /// assert_eq!(domain.robots_url(), "https://shop.example.com/robots.txt");
    /// ```
    pub fn parse(input: &str) -> Result<Self, UrlError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(UrlError::MissingDomain);
        }

        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };

        let mut origin = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(e.to_string()))?;

        if origin.scheme() != "http" && origin.scheme() != "https" {
            return Err(UrlError::InvalidScheme(origin.scheme().to_string()));
        }

        let host = extract_domain(&origin).ok_or(UrlError::MissingDomain)?;
        origin
            .set_host(Some(&host))
            .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
        origin.set_path("/");
        origin.set_query(None);
        origin.set_fragment(None);

        Ok(Self { origin })
    }

    /// The lowercase host name
    pub fn host(&self) -> &str {
        self.origin.host_str().unwrap_or_default()
    }

    /// The origin as a URL with root path
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Location of the site's robots.txt
    pub fn robots_url(&self) -> String {
        format!("{}/robots.txt", self)
    }

    /// Conventional default sitemap location
    pub fn default_sitemap_url(&self) -> String {
        format!("{}/sitemap.xml", self)
    }

    /// Resolves a possibly relative location against this domain
    ///
    /// Absolute locations are returned as-is; relative ones are joined onto the
    /// origin.
    pub fn resolve(&self, location: &str) -> Result<Url, UrlError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(UrlError::Malformed("empty location".to_string()));
        }
        self.origin
            .join(location)
            .map_err(|e| UrlError::Parse(format!("{}: {}", location, e)))
    }

    /// Returns true if the URL points at this site
    ///
    /// A leading `www.` is ignored on both sides.
    pub fn is_same_site(&self, url: &Url) -> bool {
        match extract_domain(url) {
            Some(host) => strip_www(&host) == strip_www(self.host()),
            None => false,
        }
    }

    /// Filesystem-safe name used for this site's output folder
    pub fn folder_name(&self) -> String {
        match self.origin.port() {
            Some(port) => format!("{}_{}", self.host(), port),
            None => self.host().to_string(),
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.origin.origin().ascii_serialization())
    }
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}
