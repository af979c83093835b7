//! User-visible texts.
//!
//! Loading translation files is the host's job; the applicator only names its
//! text domain and passes every label through a [`Translator`].

use std::borrow::Cow;
use std::collections::HashMap;

/// Text domain of all applicator strings.
pub const TEXT_DOMAIN: &str = "auto-coupon-for-woocommerce";

/// Directory, relative to the plugin root, holding translation files.
pub const LANGUAGES_DIR: &str = "languages/";

/// Translates a source string into the shop's language.
pub trait Translator {
    fn translate<'a>(&'a self, text: &'a str) -> Cow<'a, str>;
}

/// Returns every string unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Untranslated;

impl Translator for Untranslated {
    fn translate<'a>(&'a self, text: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(text)
    }
}

/// A loaded catalog: source string to translation. Missing entries fall back
/// to the source string.
impl Translator for HashMap<String, String> {
    fn translate<'a>(&'a self, text: &'a str) -> Cow<'a, str> {
        self.get(text)
            .map_or(Cow::Borrowed(text), |t| Cow::Borrowed(t.as_str()))
    }
}

/// Host facility that loads a text domain's translation files.
pub trait TextLoader {
    /// Load translations for `domain` from `relative_dir`. Returns whether a
    /// translation file was found.
    fn load_text_domain(&mut self, domain: &str, relative_dir: &str) -> bool;
}
