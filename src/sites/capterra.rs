//! Capterra parser

use crate::category::{CategoryNode, LeafCategory};
use crate::harvest::RenderedPage;
use crate::sites::{
    absolute_url, field, select_all, select_first, stripped_text, text_at, ListingFragment,
    PageParser, ParseError, SiteId,
};
use scraper::Html;

const DEFAULT_ROOT: &str = "https://www.capterra.com/categories/";

/// Restricts listings to cloud-hosted products
const DEPLOYMENT_FILTER: &str = "?deployment=CLOUD_SAAS_WEB_BASED";

pub struct CapterraParser {
    root_url: String,
}

impl CapterraParser {
    pub fn new(root_url: Option<&str>) -> Self {
        Self {
            root_url: root_url.unwrap_or(DEFAULT_ROOT).to_string(),
        }
    }
}

impl PageParser for CapterraParser {
    fn site(&self) -> SiteId {
        SiteId::Capterra
    }

    fn root_url(&self) -> &str {
        &self.root_url
    }

    /// Capterra publishes a flat alphabetical list, so every node is level 1
    fn extract_category_nodes(
        &self,
        page: &RenderedPage,
        _max_depth: usize,
    ) -> crate::Result<Vec<CategoryNode>> {
        let document = Html::parse_document(&page.body);
        let list = select_first(document.root_element(), r#"div[data-testid*="alphabetical-list"]"#)
            .ok_or_else(|| ParseError::MissingStructure {
                url: page.url.clone(),
                what: "alphabetical category list".to_string(),
            })?;

        let nodes = select_all(list, r#"li[data-testid*="group-list-item"]"#)
            .into_iter()
            .filter_map(|item| {
                let anchor = select_first(item, "a")?;
                let name = stripped_text(anchor);
                if name.is_empty() {
                    return None;
                }
                let link = anchor
                    .value()
                    .attr("href")
                    .and_then(|href| absolute_url(&page.url, href));
                Some(CategoryNode::root(name, link))
            })
            .collect();

        Ok(nodes)
    }

    fn listing_url(&self, leaf: &LeafCategory) -> Option<String> {
        leaf.canonical_link()
            .map(|link| format!("{}{}", link, DEPLOYMENT_FILTER))
    }

    fn page_url(&self, listing_url: &str, page: u32) -> String {
        format!("{}&page={}", listing_url, page)
    }

    fn extract_pagination_indicator(&self, page: &RenderedPage) -> Option<String> {
        let document = Html::parse_document(&page.body);
        text_at(
            document.root_element(),
            r#"div[data-test-id="current-page-display"]"#,
        )
    }

    fn extract_listings(&self, page: &RenderedPage) -> Vec<ListingFragment> {
        let document = Html::parse_document(&page.body);

        select_all(document.root_element(), r#"div[id*="product-card-container"]"#)
            .into_iter()
            .map(|card| {
                let description = text_at(card, "p")
                    .and_then(|text| text.split("Learn More").next().map(|s| s.trim().to_string()))
                    .filter(|text| !text.is_empty());

                ListingFragment {
                    fields: vec![
                        field("Product Name", text_at(card, "h2")),
                        field(
                            "Product Link",
                            select_first(card, "a[href]")
                                .and_then(|a| a.value().attr("href"))
                                .and_then(|href| absolute_url(&page.url, href)),
                        ),
                        field("Product Description", description),
                    ],
                    vendor_target: None,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::resolve;
    use crate::harvest::detect_page_count;

    fn page(body: &str) -> RenderedPage {
        RenderedPage {
            url: "https://www.capterra.com/categories/".to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_extract_category_nodes() {
        let body = r#"
<div data-testid="alphabetical-list">
  <ul>
    <li data-testid="group-list-item-a"><a href="/accounting-software/">Accounting Software</a></li>
    <li data-testid="group-list-item-b"><a href="/crm-software/">CRM Software</a></li>
    <li data-testid="group-list-item-c"><span>No link here</span></li>
  </ul>
</div>"#;

        let parser = CapterraParser::new(None);
        let nodes = parser.extract_category_nodes(&page(body), 1).unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|node| node.level == 1));

        let resolution = resolve(&nodes, 1).unwrap();
        assert_eq!(resolution.leaves.len(), 2);
        assert_eq!(
            parser.listing_url(&resolution.leaves[1]).as_deref(),
            Some("https://www.capterra.com/crm-software/?deployment=CLOUD_SAAS_WEB_BASED")
        );
        assert_eq!(
            parser.page_url("https://www.capterra.com/crm-software/?deployment=CLOUD_SAAS_WEB_BASED", 2),
            "https://www.capterra.com/crm-software/?deployment=CLOUD_SAAS_WEB_BASED&page=2"
        );
    }

    #[test]
    fn test_missing_list_is_parse_error() {
        let parser = CapterraParser::new(None);
        assert!(parser.extract_category_nodes(&page("<div></div>"), 1).is_err());
    }

    #[test]
    fn test_extract_listings_and_pagination() {
        let body = r#"
<div id="product-card-container-1">
  <a href="/p/1/acme/"><h2>Acme Books</h2></a>
  <p>Bookkeeping for small teams Learn More about Acme</p>
</div>
<div id="product-card-container-2">
  <a href="/p/2/ledger/"><h2>Ledger</h2></a>
</div>
<div data-test-id="current-page-display">Page 1 of 14</div>"#;

        let parser = CapterraParser::new(None);
        let listings = parser.extract_listings(&page(body));
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].fields[0].1.as_deref(), Some("Acme Books"));
        assert_eq!(
            listings[0].fields[1].1.as_deref(),
            Some("https://www.capterra.com/p/1/acme/")
        );
        assert_eq!(
            listings[0].fields[2].1.as_deref(),
            Some("Bookkeeping for small teams")
        );
        assert_eq!(listings[1].fields[2].1, None);

        let indicator = parser.extract_pagination_indicator(&page(body));
        assert_eq!(detect_page_count(indicator.as_deref()), 14);
    }
}
