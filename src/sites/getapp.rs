//! GetApp parser
//!
//! The browse page lists category groups (level 1, unlinked) each holding
//! linked categories (level 2). Listings are read from the web-based
//! deployment view of each category. A listing's vendor website is only
//! known after following its "visit" button.

use crate::category::{CategoryNode, LeafCategory};
use crate::harvest::RenderedPage;
use crate::sites::{
    absolute_url, child_elements, field, select_all, select_first, stripped_text, text_at,
    ListingFragment, PageParser, ParseError, SiteId, VENDOR_LINK_FIELD,
};
use scraper::Html;

const DEFAULT_ROOT: &str = "https://www.getapp.com/browse/";

pub struct GetAppParser {
    root_url: String,
}

impl GetAppParser {
    pub fn new(root_url: Option<&str>) -> Self {
        Self {
            root_url: root_url.unwrap_or(DEFAULT_ROOT).to_string(),
        }
    }
}

impl PageParser for GetAppParser {
    fn site(&self) -> SiteId {
        SiteId::GetApp
    }

    fn root_url(&self) -> &str {
        &self.root_url
    }

    fn extract_category_nodes(
        &self,
        page: &RenderedPage,
        _max_depth: usize,
    ) -> crate::Result<Vec<CategoryNode>> {
        let document = Html::parse_document(&page.body);
        let container = select_first(document.root_element(), r#"div[class*="Categories"]"#)
            .ok_or_else(|| ParseError::MissingStructure {
                url: page.url.clone(),
                what: "category groups".to_string(),
            })?;

        let mut nodes = Vec::new();
        // The first child block is the page heading, not a group
        for group in child_elements(container, "div").into_iter().skip(1) {
            let blocks = child_elements(group, "div");
            let Some(heading) = blocks.first().map(|block| stripped_text(*block)) else {
                continue;
            };
            if heading.is_empty() {
                continue;
            }

            let parent = CategoryNode::root(heading, None);
            let children: Vec<CategoryNode> = blocks
                .get(1)
                .map(|list| select_all(*list, "a[href]"))
                .unwrap_or_default()
                .into_iter()
                .filter_map(|anchor| {
                    let name = text_at(anchor, "span")?;
                    let link = anchor
                        .value()
                        .attr("href")
                        .and_then(|href| absolute_url(&page.url, href));
                    Some(CategoryNode::child_of(&parent, name, link))
                })
                .collect();

            nodes.push(parent);
            nodes.extend(children);
        }

        Ok(nodes)
    }

    fn listing_url(&self, leaf: &LeafCategory) -> Option<String> {
        let mut link = leaf.canonical_link()?.to_string();
        if !link.ends_with('/') {
            link.push('/');
        }
        link.push_str("os/web-based");
        Some(link)
    }

    fn page_url(&self, listing_url: &str, page: u32) -> String {
        format!("{}?page={}", listing_url, page)
    }

    fn extract_pagination_indicator(&self, page: &RenderedPage) -> Option<String> {
        let document = Html::parse_document(&page.body);
        let pagination = select_first(document.root_element(), r#"div[class*="Pagination"]"#)?;
        text_at(pagination, "p")
    }

    fn extract_listings(&self, page: &RenderedPage) -> Vec<ListingFragment> {
        let document = Html::parse_document(&page.body);

        select_all(document.root_element(), r#"div[data-evt-name*="product"]"#)
            .into_iter()
            .map(|product| {
                let header = select_first(product, r#"div[data-testid*="header"]"#);

                let name = header.and_then(|h| text_at(h, "h2"));

                // The last header button is the vendor "visit" action when present
                let vendor_target = header
                    .and_then(|h| select_all(h, r#"span[role="button"]"#).last().copied())
                    .filter(|button| stripped_text(*button).to_lowercase().contains("visit"))
                    .and_then(|button| button.value().attr("data-href"))
                    .and_then(|href| absolute_url(&page.url, href));

                let description = text_at(product, r#"div[data-testid*="description"]"#);

                ListingFragment {
                    fields: vec![
                        field("Application Name", name),
                        // Filled in only when the vendor navigation is resolved
                        field(VENDOR_LINK_FIELD, None),
                        field("Description", description),
                    ],
                    vendor_target,
                }
            })
            .collect()
    }
}
