//! Target platforms and their built-in markup vocabulary.

use std::fmt;
use std::str::FromStr;

/// A Mini-Program platform the markup is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Platform {
    /// WeChat.
    #[default]
    Weapp,
    /// Alipay.
    Alipay,
    /// Douyin / Toutiao.
    Tt,
    /// Baidu.
    Swan,
    /// JD.
    Jd,
    /// QQ.
    Qq,
    /// Xiaohongshu.
    Xhs,
}

impl Platform {
    /// All supported platforms.
    pub const ALL: [Platform; 7] = [
        Platform::Weapp,
        Platform::Alipay,
        Platform::Tt,
        Platform::Swan,
        Platform::Jd,
        Platform::Qq,
        Platform::Xhs,
    ];

    /// Get the platform name as used in `#ifdef` lists and config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weapp => "weapp",
            Self::Alipay => "alipay",
            Self::Tt => "tt",
            Self::Swan => "swan",
            Self::Jd => "jd",
            Self::Qq => "qq",
            Self::Xhs => "xhs",
        }
    }

    /// Extension of template files, without the dot.
    pub fn template_ext(&self) -> &'static str {
        match self {
            Self::Weapp => "wxml",
            Self::Alipay => "axml",
            Self::Tt => "ttml",
            Self::Swan => "swan",
            Self::Jd => "jxml",
            Self::Qq => "qml",
            Self::Xhs => "xhsml",
        }
    }

    /// Extension of template script modules, without the dot.
    pub fn script_module_ext(&self) -> &'static str {
        match self {
            Self::Weapp | Self::Jd => "wxs",
            Self::Qq => "qs",
            Self::Alipay | Self::Tt | Self::Swan | Self::Xhs => "sjs",
        }
    }

    /// Check whether `tag` declares a template script module on this
    /// platform. The generic `wxs` tag is accepted everywhere.
    pub fn is_script_module_tag(&self, tag: &str) -> bool {
        tag == "wxs" || tag == self.script_module_ext() || self.is_script_import_tag(tag)
    }

    /// Alipay imports script modules with `<import-sjs from="...">`.
    pub fn is_script_import_tag(&self, tag: &str) -> bool {
        matches!(self, Self::Alipay) && tag == "import-sjs"
    }

    /// Name of the attribute carrying a script module path for `tag`.
    pub fn script_src_attr(&self, tag: &str) -> &'static str {
        if self.is_script_import_tag(tag) {
            "from"
        } else {
            "src"
        }
    }

    /// Check whether `tag` is provided by the platform runtime.
    pub fn is_builtin_tag(&self, tag: &str) -> bool {
        is_common_tag(tag)
            || self.is_script_module_tag(tag)
            || match self {
                Self::Weapp => is_weapp_tag(tag),
                Self::Alipay => is_alipay_tag(tag),
                Self::Tt => matches!(tag, "lottie" | "aweme-data" | "consume-card" | "pay-button"),
                Self::Swan => matches!(tag, "animation-view" | "rtc-room" | "rtc-room-item" | "inline-payment-panel"),
                Self::Jd => false,
                Self::Qq => matches!(tag, "ad-custom"),
                Self::Xhs => false,
            }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == lower)
            .ok_or_else(|| format!("Unknown platform: {}", s))
    }
}

/// Tags every supported platform ships.
fn is_common_tag(tag: &str) -> bool {
    matches!(
        tag,
        "block"
            | "template"
            | "import"
            | "include"
            | "slot"
            | "view"
            | "scroll-view"
            | "swiper"
            | "swiper-item"
            | "movable-area"
            | "movable-view"
            | "cover-view"
            | "cover-image"
            | "icon"
            | "text"
            | "rich-text"
            | "progress"
            | "button"
            | "checkbox"
            | "checkbox-group"
            | "form"
            | "input"
            | "label"
            | "picker"
            | "picker-view"
            | "picker-view-column"
            | "radio"
            | "radio-group"
            | "slider"
            | "switch"
            | "textarea"
            | "navigator"
            | "audio"
            | "image"
            | "video"
            | "camera"
            | "live-player"
            | "live-pusher"
            | "map"
            | "canvas"
            | "web-view"
            | "ad"
            | "editor"
    )
}

fn is_weapp_tag(tag: &str) -> bool {
    matches!(
        tag,
        "functional-page-navigator"
            | "open-data"
            | "official-account"
            | "page-meta"
            | "navigation-bar"
            | "match-media"
            | "page-container"
            | "share-element"
            | "keyboard-accessory"
            | "root-portal"
            | "channel-live"
            | "channel-video"
            | "voip-room"
            | "grid-view"
            | "list-view"
            | "sticky-header"
            | "sticky-section"
            | "ad-custom"
            | "store-product"
    )
}

fn is_alipay_tag(tag: &str) -> bool {
    matches!(
        tag,
        "lifestyle" | "contact-button" | "lottie" | "page-meta" | "root-portal" | "page-container"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_from_str() {
        assert_eq!("weapp".parse::<Platform>(), Ok(Platform::Weapp));
        assert_eq!(" Alipay ".parse::<Platform>(), Ok(Platform::Alipay));
        assert!("web".parse::<Platform>().is_err());
    }

    #[test]
    fn test_builtin_tags() {
        assert!(Platform::Weapp.is_builtin_tag("view"));
        assert!(Platform::Weapp.is_builtin_tag("wxs"));
        assert!(Platform::Weapp.is_builtin_tag("page-meta"));
        assert!(!Platform::Weapp.is_builtin_tag("t-button"));
        assert!(Platform::Alipay.is_builtin_tag("import-sjs"));
        assert!(!Platform::Weapp.is_builtin_tag("import-sjs"));
    }

    #[test]
    fn test_script_module_tags() {
        assert!(Platform::Alipay.is_script_module_tag("sjs"));
        assert!(Platform::Alipay.is_script_module_tag("wxs"));
        assert_eq!(Platform::Alipay.script_src_attr("import-sjs"), "from");
        assert_eq!(Platform::Qq.script_module_ext(), "qs");
    }
}
