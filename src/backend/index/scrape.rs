//! Extraction of package data from pkg.go.dev pages.
//!
//! The markup is presentation, not an API. Each function here turns one
//! page into owned values right away so that nothing DOM-related outlives
//! the call (the DOM is reference counted and not `Send`).

use anyhow::{Context, Result, bail};
use html5ever::Attribute;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::cell::RefCell;

use crate::package::Pkg;

/// What one search result block says about the packages it lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SearchSnippet {
    /// The heading package, when it is an installable command.
    pub command: Option<Pkg>,
    /// Grouped sub-results whose path matches the query. These carry no
    /// version and no command marker and need their own lookup.
    pub subs: Vec<String>,
}

/// What a package detail page says about the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Detail {
    /// A library: not installable.
    Library,
    Command { version: String },
}

/// Parse a search results page. The outer error covers the page as a
/// whole; each inner result covers one snippet.
pub(super) fn search_page(html: &[u8], query: &str) -> Result<Vec<Result<SearchSnippet>>> {
    let dom = parse(html)?;
    Ok(query_all(&dom.document, "div", "SearchSnippet")
        .iter()
        .enumerate()
        .map(|(i, snippet)| {
            search_snippet(snippet, query).with_context(|| format!("Unreadable search result #{}", i + 1))
        })
        .collect())
}

/// Parse a package detail page.
pub(super) fn detail_page(html: &[u8]) -> Result<Detail> {
    let dom = parse(html)?;
    let header = query(&dom.document, "div", "go-Main-headerContent").context("No package header")?;
    let is_command = query(&header, "div", "go-Main-headerTitle")
        .is_some_and(|title| has_command_chip(&title));
    if !is_command {
        return Ok(Detail::Library);
    }

    let item = query(&header, "span", "go-Main-headerDetailItem").context("No version in header")?;
    let link = first_element_child(&item).context("Empty version item")?;
    let version = last_text(&link).context("No version text")?;
    Ok(Detail::Command {
        version: version.trim().to_string(),
    })
}

fn parse(html: &[u8]) -> Result<RcDom> {
    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut &html[..])
        .context("Failed to parse HTML")
}

fn search_snippet(snippet: &Handle, query: &str) -> Result<SearchSnippet> {
    let mut subs = Vec::new();
    if let Some(group) = self::query(snippet, "div", "SearchSnippet-sub") {
        for anchor in elements(&group, "a") {
            let path = package_href(&anchor)?;
            if path.ends_with(query) {
                subs.push(path);
            }
        }
    }

    let mut command = None;
    let header = self::query(snippet, "div", "SearchSnippet-headerContainer");
    if let Some(header) = header.filter(has_command_chip) {
        let anchor = elements(&header, "a")
            .into_iter()
            .next()
            .context("Heading has no link")?;
        let path = package_href(&anchor)?;
        if path.ends_with(query) {
            // The info label lists dependents, version and publish date in
            // that order.
            let info = self::query(snippet, "div", "SearchSnippet-infoLabel").context("No info label")?;
            let strong = elements(&info, "strong");
            let version = strong
                .get(1)
                .and_then(first_text)
                .context("No version in info label")?;
            command = Some(Pkg::new(path, version.trim()));
        }
    }

    Ok(SearchSnippet { command, subs })
}

/// Package links look like `/golang.org/x/tools/gopls`.
fn package_href(anchor: &Handle) -> Result<String> {
    let NodeData::Element { attrs, .. } = &anchor.data else {
        bail!("Not an element");
    };
    let href = get_attr(attrs, "href").context("Link without href")?;
    let path = href.strip_prefix('/').unwrap_or(&href);
    let path = path.split(['?', '#']).next().unwrap_or_default();
    if path.is_empty() {
        bail!("Link {:?} names no package", href);
    }
    Ok(path.to_string())
}

fn has_command_chip(node: &Handle) -> bool {
    elements(node, "span")
        .iter()
        .any(|span| first_text(span).is_some_and(|t| t.trim() == "command"))
}

fn get_attr(attrs: &RefCell<Vec<Attribute>>, name: &str) -> Option<String> {
    attrs
        .borrow()
        .iter()
        .find(|attr| attr.name.local.as_ref() == name)
        .map(|attr| attr.value.to_string())
}

fn has_class(node: &Handle, tag: &str, class: Option<&str>) -> bool {
    let NodeData::Element { name, attrs, .. } = &node.data else {
        return false;
    };
    if name.local.as_ref() != tag {
        return false;
    }
    match class {
        None => true,
        Some(class) => get_attr(attrs, "class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class)),
    }
}

/// Descendants of `node` (not `node` itself) in document order.
fn descendants(node: &Handle, tag: &str, class: Option<&str>, first_only: bool, out: &mut Vec<Handle>) {
    for child in node.children.borrow().iter() {
        if first_only && !out.is_empty() {
            return;
        }
        if has_class(child, tag, class) {
            out.push(child.clone());
        }
        descendants(child, tag, class, first_only, out);
    }
}

fn query(node: &Handle, tag: &str, class: &str) -> Option<Handle> {
    let mut out = Vec::new();
    descendants(node, tag, Some(class), true, &mut out);
    out.into_iter().next()
}

fn query_all(node: &Handle, tag: &str, class: &str) -> Vec<Handle> {
    let mut out = Vec::new();
    descendants(node, tag, Some(class), false, &mut out);
    out
}

fn elements(node: &Handle, tag: &str) -> Vec<Handle> {
    let mut out = Vec::new();
    descendants(node, tag, None, false, &mut out);
    out
}

fn first_element_child(node: &Handle) -> Option<Handle> {
    node.children
        .borrow()
        .iter()
        .find(|c| matches!(c.data, NodeData::Element { .. }))
        .cloned()
}

fn first_text(node: &Handle) -> Option<String> {
    match &node.children.borrow().first()?.data {
        NodeData::Text { contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

fn last_text(node: &Handle) -> Option<String> {
    node.children.borrow().iter().rev().find_map(|c| match &c.data {
        NodeData::Text { contents } if !contents.borrow().trim().is_empty() => {
            Some(contents.borrow().to_string())
        }
        _ => None,
    })
}


#[cfg(test)]
mod tests {
    use super::fixtures::{command_snippet, detail_page, grouped_snippet, search_page};
    use super::*;

    #[test]
    fn test_detail_page_command_version() {
        let html = detail_page(true, "v0.16.1");
        assert_eq!(
            super::detail_page(html.as_bytes()).unwrap(),
            Detail::Command {
                version: "v0.16.1".into()
            }
        );
    }

    #[test]
    fn test_detail_page_library() {
        let html = detail_page(false, "v1.0.0");
        assert_eq!(super::detail_page(html.as_bytes()).unwrap(), Detail::Library);
    }

    #[test]
    fn test_detail_page_without_header_is_an_error() {
        assert!(super::detail_page(b"<html><body><p>hi</p></body></html>").is_err());
    }

    #[test]
    fn test_search_page_command_and_group() {
        let html = search_page(&[
            command_snippet("golang.org/x/tools/gopls", "v0.16.1"),
            grouped_snippet(
                "github.com/foo/lib",
                &["github.com/foo/lib/cmd/gopls", "github.com/foo/lib/internal/x"],
            ),
        ]);

        let snippets = super::search_page(html.as_bytes(), "gopls").unwrap();
        assert_eq!(snippets.len(), 2);
        assert_eq!(
            snippets[0].as_ref().unwrap(),
            &SearchSnippet {
                command: Some(Pkg::new("golang.org/x/tools/gopls", "v0.16.1")),
                subs: vec![],
            }
        );
        assert_eq!(
            snippets[1].as_ref().unwrap(),
            &SearchSnippet {
                command: None,
                subs: vec!["github.com/foo/lib/cmd/gopls".to_string()],
            }
        );
    }

    #[test]
    fn test_command_not_matching_query_is_dropped() {
        let html = search_page(&[command_snippet("example.com/other", "v1.0.0")]);
        let snippets = super::search_page(html.as_bytes(), "gopls").unwrap();
        assert_eq!(snippets[0].as_ref().unwrap().command, None);
    }

    #[test]
    fn test_broken_snippet_is_isolated() {
        let broken = r#"<div class="SearchSnippet">
  <div class="SearchSnippet-headerContainer">
    <a href="/example.com/broken">broken</a><span>command</span>
  </div>
</div>"#
            .to_string();
        let html = search_page(&[
            command_snippet("example.com/a", "v1.0.0"),
            broken,
            command_snippet("example.com/b", "v2.0.0"),
        ]);

        let snippets = super::search_page(html.as_bytes(), "").unwrap();
        assert_eq!(snippets.len(), 3);
        assert!(snippets[0].is_ok());
        assert!(snippets[1].is_err());
        assert!(snippets[2].is_ok());
    }

    #[test]
    fn test_package_href_strips_slash_and_query() {
        let html = search_page(&[grouped_snippet("x", &["example.com/a?tab=doc"])]);
        let snippets = super::search_page(html.as_bytes(), "").unwrap();
        assert_eq!(snippets[0].as_ref().unwrap().subs, vec!["example.com/a"]);
    }
}
