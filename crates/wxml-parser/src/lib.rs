//! Mini-Program markup scanner.
//!
//! This crate scans WXML-family templates in one left-to-right pass and
//! records, as byte spans into the source, everything later stages need:
//! - dependency edges (`import`, `include`, external and inline script modules)
//! - custom component usage
//! - `@event.modifier` binding sites
//! - ranges compiled out by `#ifdef` / `#ifndef` guards
//!
//! No tree is built. The resulting [`TokenRecord`] owns its source and is
//! consumed by `wxml-transform`.

pub mod directive;
pub mod event;
pub mod lexer;
pub mod platform;
pub mod scanner;
pub mod token;

pub use event::{BindingPrefix, EventDirective, EventModifiers};
pub use platform::Platform;
pub use scanner::{normalize_script_module_path, scan, ExcludeComponent, ScanOptions};
pub use token::{Dependency, DependencyKind, EventBindingSite, TokenRecord};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_page_template() {
        let source = r#"<import src="/templates/item.wxml"/>
<wxs src="./format.wxs.ts" module="fmt"/>
<view class="page" @tap.catch="onTap">
  <!-- #ifdef alipay -->
  <ali-only/>
  <!-- #endif -->
  <product-card wx:for="{{ list }}" item="{{ item }}"/>
</view>
"#;
        let record = scan(source, &ScanOptions::new(Platform::Weapp));
        assert_eq!(record.template_dependencies().count(), 1);
        assert_eq!(record.script_module_dependencies().count(), 1);
        assert_eq!(record.events.len(), 1);
        assert_eq!(record.removals.len(), 1);
        assert_eq!(
            record.components.keys().map(|k| k.as_str()).collect::<Vec<_>>(),
            vec!["product-card"]
        );
    }

    #[test]
    fn test_scan_is_deterministic() {
        let source = "<a-b @tap=\"x\"/><!-- #ifdef tt --><c-d/><!-- #endif -->";
        let options = ScanOptions::new(Platform::Tt);
        let first = scan(source, &options);
        let second = scan(source, &options);
        assert_eq!(first.components, second.components);
        assert_eq!(first.events, second.events);
        assert_eq!(first.removals, second.removals);
        assert_eq!(first.components.len(), 2);
    }
}
