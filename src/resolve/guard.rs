//! Importance guard: nodes that look like primary page content are never removed directly.

use crate::dom::{ContentSummary, NodeId, RenderedTree};

const PROTECTED_ROLES: [&str; 5] = ["navigation", "banner", "main", "search", "dialog"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    Role,
    SiteNavigation,
    SearchForm,
    LoginForm,
    ArticleBody,
    FormControls,
    Video,
    ResultEntry,
    ResultListing,
}

/// The first protection signal the node shows, if any.
pub fn protection<T: RenderedTree + ?Sized>(tree: &T, node: NodeId) -> Option<Protection> {
    if tree.role(node).is_some_and(|role| PROTECTED_ROLES.contains(&role)) {
        return Some(Protection::Role);
    }

    let summary = ContentSummary::of(tree, node);

    if summary.links > 3 && summary.internal_link_ratio() > 0.7 {
        return Some(Protection::SiteNavigation);
    }
    if summary.has_search_input || (summary.has_text_input && summary.has_button) {
        return Some(Protection::SearchForm);
    }
    if summary.has_password_input {
        return Some(Protection::LoginForm);
    }
    if summary.paragraphs > 2 && summary.headings > 0 {
        return Some(Protection::ArticleBody);
    }
    if summary.form_controls > 2 {
        return Some(Protection::FormControls);
    }
    if summary.has_video {
        return Some(Protection::Video);
    }
    if summary.has_h3 && (summary.links > 0 || summary.has_cite) {
        return Some(Protection::ResultEntry);
    }
    if summary.has_h2_or_h3 && summary.blocks > 1 && summary.has_href_link {
        return Some(Protection::ResultListing);
    }

    None
}

pub fn is_protected<T: RenderedTree + ?Sized>(tree: &T, node: NodeId) -> bool {
    protection(tree, node).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::ScrollOffset;
    use crate::dom::{PageSnapshot, SnapshotNode, Viewport};
    use pretty_assertions::assert_eq;

    fn guard(node: SnapshotNode) -> Option<Protection> {
        let tree = PageSnapshot::new(
            Some("https://news.example.com/"),
            Viewport {
                width: 1280.0,
                height: 800.0,
                scroll: ScrollOffset::default(),
            },
            SnapshotNode::new("body").child(node),
        );
        protection(&tree, NodeId(1))
    }

    fn link(href: &str) -> SnapshotNode {
        SnapshotNode::new("a").href(href)
    }

    #[test]
    fn roles_are_protected() {
        for role in PROTECTED_ROLES {
            assert_eq!(guard(SnapshotNode::new("div").role(role)), Some(Protection::Role));
        }
        assert_eq!(guard(SnapshotNode::new("div").role("complementary")), None);
    }

    #[test]
    fn mostly_internal_links_are_navigation() {
        let nav = SnapshotNode::new("ul").children(vec![
            link("/world"),
            link("/sport"),
            link("https://news.example.com/tech"),
            link("/weather"),
        ]);
        assert_eq!(guard(nav), Some(Protection::SiteNavigation));

        let redirects = SnapshotNode::new("ul").children(vec![
            link("https://ads.example.net/1"),
            link("https://ads.example.net/2"),
            link("https://ads.example.net/3"),
            link("/home"),
        ]);
        assert_eq!(guard(redirects), None);
    }

    #[test]
    fn forms_are_protected() {
        let search = SnapshotNode::new("form").child(SnapshotNode::new("input").input_type("search"));
        assert_eq!(guard(search), Some(Protection::SearchForm));

        let text_and_button = SnapshotNode::new("div")
            .child(SnapshotNode::new("input"))
            .child(SnapshotNode::new("button"));
        assert_eq!(guard(text_and_button), Some(Protection::SearchForm));

        let login = SnapshotNode::new("form").child(SnapshotNode::new("input").input_type("password"));
        assert_eq!(guard(login), Some(Protection::LoginForm));

        let survey = SnapshotNode::new("form").children(vec![
            SnapshotNode::new("select"),
            SnapshotNode::new("textarea"),
            SnapshotNode::new("input").input_type("checkbox"),
        ]);
        assert_eq!(guard(survey), Some(Protection::FormControls));
    }

    #[test]
    fn article_structure_is_protected() {
        let article = SnapshotNode::new("div").children(vec![
            SnapshotNode::new("h1"),
            SnapshotNode::new("p"),
            SnapshotNode::new("p"),
            SnapshotNode::new("p"),
        ]);
        assert_eq!(guard(article), Some(Protection::ArticleBody));

        let two_paragraphs = SnapshotNode::new("div").children(vec![
            SnapshotNode::new("h4"),
            SnapshotNode::new("p"),
            SnapshotNode::new("p"),
        ]);
        assert_eq!(guard(two_paragraphs), None);
    }

    #[test]
    fn media_and_results_are_protected() {
        assert_eq!(
            guard(SnapshotNode::new("div").child(SnapshotNode::new("video"))),
            Some(Protection::Video)
        );
        assert_eq!(
            guard(SnapshotNode::new("div").child(SnapshotNode::new("h3")).child(SnapshotNode::new("cite"))),
            Some(Protection::ResultEntry)
        );
        let listing = SnapshotNode::new("li").children(vec![
            SnapshotNode::new("h2"),
            SnapshotNode::new("div"),
            SnapshotNode::new("div").child(link("https://elsewhere.org/")),
        ]);
        assert_eq!(guard(listing), Some(Protection::ResultListing));
    }

    #[test]
    fn plain_ad_wrapper_is_not_protected() {
        let wrapper = SnapshotNode::new("div")
            .child(link("https://ads.example.net/click").child(SnapshotNode::new("img")));
        assert_eq!(guard(wrapper), None);
    }
}
