use url::Url;

use crate::dom::{is_heading, NodeId, RenderedTree};

/// Counts over a node's descendants (the node itself excluded), plus the
/// trimmed text length of the whole subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentSummary {
    pub links: usize,
    pub internal_links: usize,
    pub has_href_link: bool,
    pub images: usize,
    pub interactive: usize,
    pub form_controls: usize,
    pub paragraphs: usize,
    pub headings: usize,
    pub blocks: usize,
    pub has_h3: bool,
    pub has_h2_or_h3: bool,
    pub has_cite: bool,
    pub has_video: bool,
    pub has_search_input: bool,
    pub has_text_input: bool,
    pub has_password_input: bool,
    pub has_button: bool,
    pub text_len: usize,
}

impl ContentSummary {
    pub fn of<T: RenderedTree + ?Sized>(tree: &T, node: NodeId) -> Self {
        let page = tree.page_url().and_then(|url| Url::parse(url).ok());
        let mut summary = ContentSummary {
            text_len: tree.own_text(node).trim().len(),
            ..Default::default()
        };

        for child in tree.descendants(node) {
            let tag = tree.tag(child);
            summary.text_len += tree.own_text(child).trim().len();

            match tag {
                "a" => {
                    summary.links += 1;
                    if let Some(href) = tree.href(child) {
                        summary.has_href_link = true;
                        if is_internal(href, page.as_ref()) {
                            summary.internal_links += 1;
                        }
                    }
                }
                "img" => summary.images += 1,
                "button" => {
                    summary.interactive += 1;
                    summary.has_button = true;
                }
                "input" => {
                    summary.interactive += 1;
                    summary.form_controls += 1;
                    match tree.input_type(child).unwrap_or("text") {
                        "search" => summary.has_search_input = true,
                        "text" => summary.has_text_input = true,
                        "password" => summary.has_password_input = true,
                        _ => {}
                    }
                }
                "select" | "textarea" => {
                    summary.interactive += 1;
                    summary.form_controls += 1;
                }
                "p" => {
                    summary.paragraphs += 1;
                    summary.blocks += 1;
                }
                "div" => summary.blocks += 1,
                "cite" => summary.has_cite = true,
                "video" => summary.has_video = true,
                _ => {}
            }

            if is_heading(tag) {
                summary.headings += 1;
                if tag == "h3" {
                    summary.has_h3 = true;
                }
                if tag == "h2" || tag == "h3" {
                    summary.has_h2_or_h3 = true;
                }
            }
        }

        summary
    }

    pub fn internal_link_ratio(&self) -> f32 {
        if self.links == 0 {
            0.0
        } else {
            self.internal_links as f32 / self.links as f32
        }
    }
}

/// Relative links resolve against the page; absolute links count when they
/// stay on the page host or one of its subdomains.
fn is_internal(href: &str, page: Option<&Url>) -> bool {
    let Some(page) = page else {
        return false;
    };
    let Some(page_host) = page.host_str() else {
        return false;
    };
    let Ok(target) = page.join(href) else {
        return false;
    };
    match target.host_str() {
        Some(host) => host == page_host || host.ends_with(&format!(".{page_host}")),
        None => false,
    }
}
