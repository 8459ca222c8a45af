//! External portal link opened from the home screen.

use url::Url;

/// SGPO management portal (DECEA).
pub const SGPO_PORTAL_URL: &str = "https://servicos.decea.mil.br/sgpo/gerencial/index.cfm";

/// Parsed SGPO portal URL.
pub fn sgpo_portal() -> Result<Url, url::ParseError> {
    Url::parse(SGPO_PORTAL_URL)
}

#[cfg(test)]
mod tests {
    use super::sgpo_portal;

    #[test]
    fn portal_link_is_an_https_url() {
        let url = sgpo_portal().expect("portal link should parse");
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("servicos.decea.mil.br"));
    }
}
