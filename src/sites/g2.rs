//! G2 parser
//!
//! The categories page renders one table per top-level category. Rows name
//! a category and its parent by display name only, so the tree is rebuilt
//! with `assemble_from_parent_names`.

use crate::category::{assemble_from_parent_names, CategoryLevel, CategoryNode, FlatCategory};
use crate::harvest::RenderedPage;
use crate::sites::{
    absolute_url, field, select_all, select_first, stripped_text, text_at, ListingFragment,
    PageParser, ParseError, SiteId,
};
use scraper::Html;

const DEFAULT_ROOT: &str = "https://www.g2.com/categories/";

pub struct G2Parser {
    root_url: String,
}

impl G2Parser {
    pub fn new(root_url: Option<&str>) -> Self {
        Self {
            root_url: root_url.unwrap_or(DEFAULT_ROOT).to_string(),
        }
    }
}

impl PageParser for G2Parser {
    fn site(&self) -> SiteId {
        SiteId::G2
    }

    fn root_url(&self) -> &str {
        &self.root_url
    }

    fn extract_category_nodes(
        &self,
        page: &RenderedPage,
        max_depth: usize,
    ) -> crate::Result<Vec<CategoryNode>> {
        let document = Html::parse_document(&page.body);
        let tables = select_all(document.root_element(), "table");
        if tables.is_empty() {
            return Err(ParseError::MissingStructure {
                url: page.url.clone(),
                what: "category tables".to_string(),
            }
            .into());
        }

        let mut nodes = Vec::new();
        for table in tables {
            let root = text_at(table, "thead tr td.l3").map(|name| CategoryLevel { name, link: None });

            let rows: Vec<FlatCategory> = select_all(table, "tbody tr")
                .into_iter()
                .filter_map(|row| {
                    let anchor = select_first(row, ".categories__name a")?;
                    let name = stripped_text(anchor);
                    if name.is_empty() {
                        return None;
                    }
                    Some(FlatCategory {
                        name,
                        link: anchor
                            .value()
                            .attr("href")
                            .and_then(|href| absolute_url(&page.url, href)),
                        parent: text_at(row, ".categories__parent"),
                    })
                })
                .collect();

            nodes.extend(assemble_from_parent_names(root.as_ref(), &rows, max_depth)?);
        }

        Ok(nodes)
    }

    fn page_url(&self, listing_url: &str, page: u32) -> String {
        format!("{}?order=g2_score&page={}", listing_url, page)
    }

    fn extract_pagination_indicator(&self, page: &RenderedPage) -> Option<String> {
        let document = Html::parse_document(&page.body);
        let pagination = select_first(document.root_element(), r#"ul[aria-label*="Pagination"]"#)?;
        let last = select_all(pagination, "li").last().copied()?;
        select_first(last, "a[href]")
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string)
    }

    fn extract_listings(&self, page: &RenderedPage) -> Vec<ListingFragment> {
        let document = Html::parse_document(&page.body);

        select_all(
            document.root_element(),
            r#"div[data-ordered-events-item*="product"]"#,
        )
        .into_iter()
        .map(|product| {
            let description = text_at(product, "p")
                .map(|text| text.replace("...", "").replace("Show More", "").trim().to_string())
                .filter(|text| !text.is_empty());

            ListingFragment {
                fields: vec![
                    field("Product Name", text_at(product, r#"div[class*="product-name"]"#)),
                    field(
                        "Product Link",
                        select_first(product, "a[href]")
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
