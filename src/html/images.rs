//! Image path resolution for header and footer fragments.
//!
//! Each configured slot names an `<img id=...>` and an image under `images/`.
//! The image gets `src = prefix + "images/<name>.png"` and a one-shot fallback
//! to a fixed deeper path, written as an `onerror` handler that disarms itself
//! before switching `src`, so a missing fallback cannot loop.

use crate::{config::ImageSlot, path::PathContext};

use super::markup::rewrite_tags;

/// Primary image path plus a fallback that can be used once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    src: String,
    fallback: Option<String>,
}

impl ImageSource {
    pub fn new(image: &str, ctx: &PathContext, fallback_base: &str) -> Self {
        let file = format!("images/{image}.png");
        Self {
            src: ctx.to_root(&file),
            fallback: Some(format!("{fallback_base}{file}")),
        }
    }

    #[inline]
    pub fn src(&self) -> &str {
        &self.src
    }

    /// The current source failed to load: switch to the fallback.
    ///
    /// Returns the new source the first time, `None` afterwards.
    pub fn fail(&mut self) -> Option<&str> {
        self.src = self.fallback.take()?;
        Some(&self.src)
    }

    /// `onerror` handler equivalent to [`ImageSource::fail`], if still armed.
    pub fn onerror(&self) -> Option<String> {
        self.fallback
            .as_ref()
            .map(|fallback| format!("this.onerror=null;this.src='{fallback}';"))
    }
}

/// Result of resolving the image slots of one fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImages {
    pub markup: String,
    /// Slot ids with no matching `<img>` in the fragment.
    pub missing: Vec<String>,
}

/// Resolves a fixed set of image slots against a page's root prefix.
#[derive(Debug, Clone)]
pub struct ImageResolver {
    slots: Vec<ImageSlot>,
    fallback_base: String,
}

impl ImageResolver {
    pub fn new(slots: Vec<ImageSlot>, fallback_base: impl Into<String>) -> Self {
        Self {
            slots,
            fallback_base: fallback_base.into(),
        }
    }

    pub fn resolve(&self, markup: &str, ctx: &PathContext) -> ResolvedImages {
        let mut found = vec![false; self.slots.len()];

        let markup = rewrite_tags(markup, |tag| {
            if !tag.is("img") {
                return None;
            }
            let id = tag.attr("id")?;
            let index = self.slots.iter().position(|slot| slot.id == id.trim())?;
            found[index] = true;

            let source = ImageSource::new(&self.slots[index].image, ctx, &self.fallback_base);
            let onerror = source.onerror().unwrap_or_default();
            let keep = |key: &str, value: &str| {
                let replaced = key.eq_ignore_ascii_case("src") || key.eq_ignore_ascii_case("onerror");
                (!replaced).then(|| value.to_owned())
            };
            Some(tag.rebuild(keep, &[("src", source.src()), ("onerror", onerror.as_str())]))
        });

        let missing = self
            .slots
            .iter()
            .zip(found)
            .filter(|(_, found)| !found)
            .map(|(slot, _)| slot.id.clone())
            .collect();

        ResolvedImages { markup, missing }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults;

    #[test]
    fn test_image_source_paths() {
        let source = ImageSource::new("dtu-logo", &PathContext::from_depth(1), "../../");
        assert_eq!(source.src(), "../images/dtu-logo.png");
        assert_eq!(
            source.onerror().as_deref(),
            Some("this.onerror=null;this.src='../../images/dtu-logo.png';")
        );
    }

    #[test]
    fn test_fallback_is_one_shot() {
        let mut source = ImageSource::new("x-icon", &PathContext::from_depth(0), "../../");
        assert_eq!(source.src(), "./images/x-icon.png");
        assert_eq!(source.fail(), Some("../../images/x-icon.png"));
        assert_eq!(source.fail(), None);
        assert_eq!(source.src(), "../../images/x-icon.png");
        assert_eq!(source.onerror(), None);
    }

    #[test]
    fn test_resolve_header_images() {
        let resolver = ImageResolver::new(defaults::images::header(), "../../");
        let header = r#"<div class="top"><img id="dtu-logo" src="images/dtu-logo.png" alt="DTU"><a href="https://instagram.com"><img id="instagram-icon" alt="Instagram"/></a></div>"#;

        let resolved = resolver.resolve(header, &PathContext::from_depth(2));
        assert!(resolved.markup.contains(
            r#"<img id="dtu-logo" alt="DTU" src="../../images/dtu-logo.png" onerror="this.onerror=null;this.src='../../images/dtu-logo.png';">"#
        ));
        assert!(resolved.markup.contains(r#"<img id="instagram-icon" alt="Instagram" src="../../images/instagram-icon.png""#));
        assert!(resolved.markup.contains("/></a>"));
        assert_eq!(resolved.missing, ["facebook-icon", "linkedin-icon", "x-icon"]);
    }

    #[test]
    fn test_resolve_twice_is_stable() {
        let resolver = ImageResolver::new(defaults::images::footer(), "../../");
        let footer = r#"<img id="footer-dtu-logo">"#;
        let ctx = PathContext::from_depth(1);
        let once = resolver.resolve(footer, &ctx).markup;
        let twice = resolver.resolve(&once, &ctx).markup;
        assert_eq!(once, twice);
        assert!(once.contains(r#"src="../images/dtu-logo.png""#));
    }
}
