//! HTML minification for composed pages.

use crate::config::SiteConfig;
use std::borrow::Cow;

/// Minify a composed page when `build.minify` is on.
///
/// Returns `Cow::Borrowed` if minify is disabled.
pub fn minify_page<'a>(html: &'a [u8], config: &SiteConfig) -> Cow<'a, [u8]> {
    if config.build.minify {
        Cow::Owned(minify_html::minify(html, &html_cfg()))
    } else {
        Cow::Borrowed(html)
    }
}

fn html_cfg() -> minify_html::Cfg {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_minify(enabled: bool) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.build.minify = enabled;
        config
    }

    #[test]
    fn test_minify_composed_page() {
        let html = b"<html>\n  <body>\n    <div id=\"header\">\n      <p>Hostels</p>\n    </div>\n    <!-- shared -->\n  </body>\n</html>";
        let result = minify_page(html, &config_with_minify(true));
        let result = String::from_utf8_lossy(&result);

        assert!(!result.contains("\n  "));
        assert!(!result.contains("shared"));
        assert!(result.contains("<p>Hostels</p>"));
        assert!(result.contains("</div>"));
    }

    #[test]
    fn test_minify_disabled_borrows() {
        let html = b"<html>\n  <body>\n  </body>\n</html>";
        let result = minify_page(html, &config_with_minify(false));
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(&*result, html);
    }
}
