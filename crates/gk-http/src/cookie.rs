//! Refresh token cookie

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use gk_common::non_blank;
use gk_config::RefreshCookieConfig;

/// Writes, clears and reads the refresh token cookie.
#[derive(Debug, Clone)]
pub struct RefreshCookie {
    config: RefreshCookieConfig,
    max_age_secs: i64,
}

impl RefreshCookie {
    /// `max_age_secs` should match the refresh token lifetime.
    pub fn new(config: RefreshCookieConfig, max_age_secs: i64) -> Self {
        Self {
            config,
            max_age_secs,
        }
    }

    /// When disabled the refresh token travels in response bodies instead.
    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn write(&self, jar: CookieJar, token: String) -> CookieJar {
        if !self.enabled() {
            return jar;
        }
        jar.add(self.build(token, self.max_age_secs))
    }

    /// Expire the cookie immediately (`Max-Age=0`).
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        if !self.enabled() {
            return jar;
        }
        jar.add(self.build(String::new(), 0))
    }

    pub fn read(&self, jar: &CookieJar) -> Option<String> {
        if !self.enabled() {
            return None;
        }
        jar.get(&self.config.name)
            .and_then(|cookie| non_blank(Some(cookie.value())).map(str::to_string))
    }

    fn build(&self, value: String, max_age_secs: i64) -> Cookie<'static> {
        Cookie::build((self.config.name.clone(), value))
            .path(self.config.path.clone())
            .http_only(self.config.http_only)
            .secure(self.config.secure)
            .same_site(self.same_site())
            .max_age(time::Duration::seconds(max_age_secs))
            .build()
    }

    fn same_site(&self) -> SameSite {
        match self.config.same_site.to_lowercase().as_str() {
            "strict" => SameSite::Strict,
            "none" => SameSite::None,
            _ => SameSite::Lax,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_cookie_header(jar: CookieJar) -> String {
        jar.iter()
            .next()
            .map(|cookie| cookie.to_string())
            .unwrap_or_default()
    }

    #[test]
    fn test_write_uses_config_attributes() {
        let cookie = RefreshCookie::new(RefreshCookieConfig::default(), 600);
        let header = set_cookie_header(cookie.write(CookieJar::new(), "tok".to_string()));

        assert!(header.starts_with("refresh_token=tok"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Secure"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Max-Age=600"));
    }

    #[test]
    fn test_clear_expires_immediately() {
        let cookie = RefreshCookie::new(RefreshCookieConfig::default(), 600);
        let header = set_cookie_header(cookie.clear(CookieJar::new()));
        assert!(header.starts_with("refresh_token=;"));
        assert!(header.contains("Max-Age=0"));
    }

    #[test]
    fn test_disabled_cookie_is_inert() {
        let config = RefreshCookieConfig {
            enabled: false,
            ..RefreshCookieConfig::default()
        };
        let cookie = RefreshCookie::new(config, 600);

        let jar = cookie.write(CookieJar::new(), "tok".to_string());
        assert_eq!(jar.iter().count(), 0);

        let jar = CookieJar::new().add(Cookie::new("refresh_token", "tok"));
        assert_eq!(cookie.read(&jar), None);
    }

    #[test]
    fn test_read_ignores_blank_value() {
        let cookie = RefreshCookie::new(RefreshCookieConfig::default(), 600);

        let jar = CookieJar::new().add(Cookie::new("refresh_token", "tok"));
        assert_eq!(cookie.read(&jar).as_deref(), Some("tok"));

        let jar = CookieJar::new().add(Cookie::new("refresh_token", ""));
        assert_eq!(cookie.read(&jar), None);
    }

    #[test]
    fn test_same_site_parsing() {
        let strict = RefreshCookieConfig {
            same_site: "STRICT".to_string(),
            ..RefreshCookieConfig::default()
        };
        assert_eq!(RefreshCookie::new(strict, 1).same_site(), SameSite::Strict);
        assert_eq!(
            RefreshCookie::new(RefreshCookieConfig::default(), 1).same_site(),
            SameSite::Lax
        );
    }
}
