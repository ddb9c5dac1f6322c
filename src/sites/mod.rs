//! Site-specific page parsers
//!
//! Each supported directory site gets one `PageParser` implementation,
//! chosen at startup by its `SiteId`. Parsers only read markup; every field
//! extractor returns an absent value instead of failing, so a partially
//! rendered listing still yields a record.

mod capterra;
mod g2;
mod getapp;
mod shi;

pub use capterra::CapterraParser;
pub use g2::G2Parser;
pub use getapp::GetAppParser;
pub use shi::ShiParser;

use crate::category::{CategoryNode, LeafCategory};
use crate::harvest::RenderedPage;
use scraper::{ElementRef, Selector};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Expected page structure is missing
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Expected structure missing on {url}: {what}")]
    MissingStructure { url: String, what: String },
}

/// Supported directory sites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteId {
    GetApp,
    G2,
    Capterra,
    Shi,
}

impl SiteId {
    /// Parses a configuration identifier
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "getapp" => Some(Self::GetApp),
            "g2" => Some(Self::G2),
            "capterra" => Some(Self::Capterra),
            "shi" => Some(Self::Shi),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetApp => "getapp",
            Self::G2 => "g2",
            Self::Capterra => "capterra",
            Self::Shi => "shi",
        }
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Field that receives the resolved vendor website of a listing
pub const VENDOR_LINK_FIELD: &str = "Website URL";

/// One product listing as read from a page, before category context is attached
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFragment {
    /// Site-specific fields, in column order
    pub fields: Vec<(String, Option<String>)>,

    /// Secondary navigation that lands on the vendor's own site
    pub vendor_target: Option<String>,
}

/// Site-specific markup reading
pub trait PageParser: Send + Sync {
    fn site(&self) -> SiteId;

    /// URL of the category index page
    fn root_url(&self) -> &str;

    /// Reads the category nodes published on the index page
    fn extract_category_nodes(
        &self,
        page: &RenderedPage,
        max_depth: usize,
    ) -> crate::Result<Vec<CategoryNode>>;

    /// Whether `node`'s own page must be visited to discover its children
    fn expands(&self, _node: &CategoryNode) -> bool {
        false
    }

    /// Reads the children of `parent` from `parent`'s own page
    fn extract_child_nodes(&self, _page: &RenderedPage, _parent: &CategoryNode) -> Vec<CategoryNode> {
        Vec::new()
    }

    /// First listing page of a leaf category
    fn listing_url(&self, leaf: &LeafCategory) -> Option<String> {
        leaf.canonical_link().map(str::to_string)
    }

    /// URL of page `page` (>= 2) of a listing
    fn page_url(&self, listing_url: &str, page: u32) -> String;

    fn extract_pagination_indicator(&self, page: &RenderedPage) -> Option<String>;

    fn extract_listings(&self, page: &RenderedPage) -> Vec<ListingFragment>;
}

/// Builds the parser for `site`, optionally overriding its index URL
pub fn build_parser(site: SiteId, root_url: Option<&str>) -> Arc<dyn PageParser> {
    match site {
        SiteId::GetApp => Arc::new(GetAppParser::new(root_url)),
        SiteId::G2 => Arc::new(G2Parser::new(root_url)),
        SiteId::Capterra => Arc::new(CapterraParser::new(root_url)),
        SiteId::Shi => Arc::new(ShiParser::new(root_url)),
    }
}

/// Parses a CSS selector literal
pub(crate) fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// First element under `element` matching `css`
pub(crate) fn select_first<'a>(element: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = selector(css)?;
    let first = element.select(&selector).next();
    first
}

/// All elements under `element` matching `css`
pub(crate) fn select_all<'a>(element: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    let Some(selector) = selector(css) else {
        return Vec::new();
    };
    let all = element.select(&selector).collect();
    all
}

/// Direct element children named `tag`
pub(crate) fn child_elements<'a>(element: ElementRef<'a>, tag: &str) -> Vec<ElementRef<'a>> {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == tag)
        .collect()
}

/// Text content with every text node stripped and concatenated
pub(crate) fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stripped text of the first match, absent when nothing matches or it is empty
pub(crate) fn text_at(element: ElementRef<'_>, css: &str) -> Option<String> {
    select_first(element, css)
        .map(stripped_text)
        .filter(|text| !text.is_empty())
}

/// Stripped text of the element's own text nodes, ignoring nested elements
pub(crate) fn own_text(element: ElementRef<'_>) -> Option<String> {
    element
        .children()
        .filter_map(|node| node.value().as_text().map(|text| text.trim().to_string()))
        .find(|text| !text.is_empty())
}

/// Resolves `href` against `base`
pub(crate) fn absolute_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with("javascript:") || href.starts_with('#') {
        return None;
    }

    let base = Url::parse(base).ok()?;
    base.join(href).ok().map(|url| url.to_string())
}

/// Builds a named field
pub(crate) fn field(name: &str, value: Option<String>) -> (String, Option<String>) {
    (name.to_string(), value)
}
