//! Result extraction from search-page markup.
//!
//! A search hit is a `div` whose class list contains `search-title`; its
//! first descendant anchor carries the relative link of the hit. The walk
//! is written against [`MarkupElement`] rather than a parser API so the rule
//! can be checked on hand-built trees.

use scraper::{ElementRef, Html};

use crate::result::{ResultBatch, ResultRecord};
use crate::Result;

/// Tag of a result container.
pub const CONTAINER_TAG: &str = "div";
/// Class token marking a result container.
pub const CONTAINER_CLASS: &str = "search-title";

const ANCHOR_TAG: &str = "a";
const LINK_ATTR: &str = "href";

/// Minimal view of an element tree needed by the extraction walk.
pub trait MarkupElement: Sized {
    /// Lowercase tag name.
    fn tag_name(&self) -> &str;

    /// Whether the class list contains `token` as a whole word.
    fn has_class(&self, token: &str) -> bool;

    /// Attribute value, if present.
    fn attr(&self, name: &str) -> Option<&str>;

    /// Child elements in document order.
    fn child_elements(&self) -> Vec<Self>;
}

impl<'a> MarkupElement for ElementRef<'a> {
    fn tag_name(&self) -> &str {
        self.value().name()
    }

    fn has_class(&self, token: &str) -> bool {
        self.value().classes().any(|class| class == token)
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.value().attr(name)
    }

    fn child_elements(&self) -> Vec<Self> {
        self.children().filter_map(ElementRef::wrap).collect()
    }
}

/// Whether `element` is a search-result container.
pub fn is_result_container<E: MarkupElement>(element: &E) -> bool {
    element.tag_name() == CONTAINER_TAG && element.has_class(CONTAINER_CLASS)
}

/// Visits `root` and all its descendants in document order.
fn walk<E: MarkupElement>(root: E, mut visit: impl FnMut(&E)) {
    let mut stack = vec![root];
    while let Some(element) = stack.pop() {
        visit(&element);
        let mut children = element.child_elements();
        children.reverse();
        stack.extend(children);
    }
}

/// First descendant of `element` (excluding itself) with tag `tag`.
fn first_descendant<E: MarkupElement>(element: &E, tag: &str) -> Option<E> {
    let mut stack: Vec<E> = element.child_elements().into_iter().rev().collect();
    while let Some(candidate) = stack.pop() {
        if candidate.tag_name() == tag {
            return Some(candidate);
        }
        stack.extend(candidate.child_elements().into_iter().rev());
    }
    None
}

/// Collects the result records below `root`.
///
/// A container without an anchor, or whose first anchor has no link,
/// contributes nothing. Links are kept verbatim, whatever their shape.
/// Nested containers each contribute their own record.
pub fn collect_results<E: MarkupElement>(root: E) -> ResultBatch {
    let mut batch = ResultBatch::new();
    walk(root, |element| {
        if is_result_container(element) {
            if let Some(href) = first_descendant(element, ANCHOR_TAG)
                .as_ref()
                .and_then(|anchor| anchor.attr(LINK_ATTR))
            {
                batch.push(ResultRecord::from_href(href));
            }
        }
    });
    batch
}

/// Parses `html` and extracts its search hits.
///
/// The HTML5 parser recovers from malformed markup, so any input yields a
/// batch, possibly empty.
pub fn extract(html: &str) -> Result<ResultBatch> {
    let document = Html::parse_document(html);
    Ok(collect_results(document.root_element()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hand-built element for exercising the walk without a parser.
    #[derive(Debug, Clone, Default)]
    struct Node {
        tag: String,
        classes: Vec<String>,
        attrs: Vec<(String, String)>,
        children: Vec<Node>,
    }

    impl Node {
        fn new(tag: &str) -> Self {
            Self {
                tag: tag.to_string(),
                ..Default::default()
            }
        }

        fn class(mut self, class: &str) -> Self {
            self.classes.push(class.to_string());
            self
        }

        fn with_attr(mut self, name: &str, value: &str) -> Self {
            self.attrs.push((name.to_string(), value.to_string()));
            self
        }

        fn child(mut self, child: Node) -> Self {
            self.children.push(child);
            self
        }
    }

    impl MarkupElement for Node {
        fn tag_name(&self) -> &str {
            &self.tag
        }

        fn has_class(&self, token: &str) -> bool {
            self.classes.iter().any(|c| c == token)
        }

        fn attr(&self, name: &str) -> Option<&str> {
            self.attrs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str())
        }

        fn child_elements(&self) -> Vec<Self> {
            self.children.clone()
        }
    }

    fn anchor(href: &str) -> Node {
        Node::new("a").with_attr("href", href)
    }

    fn container() -> Node {
        Node::new("div").class("Box-sc-g0xbh4-0").class("search-title")
    }

    fn page(html_body: &str) -> String {
        format!("<html><body>{}</body></html>", html_body)
    }

    #[test]
    fn test_predicate_requires_tag_and_class() {
        assert!(is_result_container(&container()));
        assert!(is_result_container(&Node::new("div").class("search-title")));
        assert!(!is_result_container(&Node::new("span").class("search-title")));
        assert!(!is_result_container(&Node::new("div").class("search-title-x")));
        assert!(!is_result_container(&Node::new("div")));
    }

    #[test]
    fn test_tree_container_with_anchor() {
        let root = Node::new("html").child(container().child(anchor("/author/repo")));
        let batch = collect_results(root);
        assert_eq!(batch, vec![ResultRecord::new("https://github.com/author/repo")]);
    }

    #[test]
    fn test_tree_container_without_anchor() {
        let root = Node::new("html").child(container().child(Node::new("span")));
        assert!(collect_results(root).is_empty());
    }

    #[test]
    fn test_tree_anchor_outside_container_ignored() {
        let root = Node::new("html")
            .child(Node::new("div").class("other").child(anchor("/a/b")))
            .child(anchor("/c/d"));
        assert!(collect_results(root).is_empty());
    }

    #[test]
    fn test_tree_takes_first_anchor_in_document_order() {
        let root = Node::new("html").child(
            container()
                .child(Node::new("h3").child(anchor("/first/one")))
                .child(anchor("/second/one")),
        );
        let batch = collect_results(root);
        assert_eq!(batch, vec![ResultRecord::new("https://github.com/first/one")]);
    }

    #[test]
    fn test_tree_anchor_without_href_contributes_nothing() {
        let root = Node::new("html").child(container().child(Node::new("a")));
        assert!(collect_results(root).is_empty());
    }

    #[test]
    fn test_tree_nested_containers_each_contribute() {
        let inner = container().child(anchor("/inner/repo"));
        let outer = container().child(inner);
        let batch = collect_results(Node::new("html").child(outer));
        assert_eq!(
            batch,
            vec![
                ResultRecord::new("https://github.com/inner/repo"),
                ResultRecord::new("https://github.com/inner/repo"),
            ]
        );
    }

    #[test]
    fn test_extract_repositories() {
        let html = r#"
            <html>
                <body>
                    <div class="Box-sc-g0xbh4-0 bBwPjs search-title">
                        <a href="/author/repo">Text</a>
                    </div>
                </body>
            </html>
        "#;
        assert_eq!(
            extract(html).unwrap(),
            vec![ResultRecord::new("https://github.com/author/repo")]
        );
    }

    #[test]
    fn test_extract_issues_and_wikis() {
        let html = page(
            r#"<div class="search-title"><a href="/author/repo/issues/1">Issue</a></div>
               <div class="search-title"><a href="/author/repo/wiki">Wiki</a></div>"#,
        );
        assert_eq!(
            extract(&html).unwrap(),
            vec![
                ResultRecord::new("https://github.com/author/repo/issues/1"),
                ResultRecord::new("https://github.com/author/repo/wiki"),
            ]
        );
    }

    #[test]
    fn test_extract_keeps_document_order_and_duplicates() {
        let html = page(
            r#"<div class="search-title"><a href="/b/two">2</a></div>
               <div class="search-title"><a href="/a/one">1</a></div>
               <div class="search-title"><a href="/b/two">2 again</a></div>"#,
        );
        let urls: Vec<String> = extract(&html).unwrap().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec![
                "https://github.com/b/two",
                "https://github.com/a/one",
                "https://github.com/b/two",
            ]
        );
    }

    #[test]
    fn test_extract_non_matching_container() {
        let html = page(r#"<span class="search-title"><a href="/a/b">x</a></span>"#);
        assert!(extract(&html).unwrap().is_empty());
    }

    #[test]
    fn test_extract_empty_and_unrelated_markup() {
        assert!(extract("").unwrap().is_empty());
        assert!(extract("<html><body><p>nothing here</p></body></html>").unwrap().is_empty());
        assert!(extract("plain text, not markup at all").unwrap().is_empty());
    }

    #[test]
    fn test_extract_is_idempotent() {
        let html = page(
            r#"<div class="x search-title y"><p><a href="/author/repo">r</a></p></div>"#,
        );
        assert_eq!(extract(&html).unwrap(), extract(&html).unwrap());
    }

    #[test]
    fn test_extract_broken_markup_recovers() {
        let html = r#"<div class="search-title"><a href="/author/repo">unclosed"#;
        assert_eq!(
            extract(html).unwrap(),
            vec![ResultRecord::new("https://github.com/author/repo")]
        );
    }

    #[test]
    fn test_extract_odd_link_does_not_drop_batch() {
        let html = page(
            r#"<div class="search-title"><a href="/good/one">1</a></div>
               <div class="search-title"><a href=":odd">?</a></div>
               <div class="search-title"><a href="/good/two">2</a></div>"#,
        );
        assert_eq!(
            extract(&html).unwrap(),
            vec![
                ResultRecord::new("https://github.com/good/one"),
                ResultRecord::new("https://github.com:odd"),
                ResultRecord::new("https://github.com/good/two"),
            ]
        );
    }
}
