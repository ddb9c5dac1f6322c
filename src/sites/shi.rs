//! SHI parser
//!
//! The software search page shows the top-level category and its direct
//! subcategories. Third-level categories only appear once a subcategory page
//! is opened, so level-2 nodes are expanded during discovery.

use crate::category::CategoryNode;
use crate::harvest::RenderedPage;
use crate::sites::{
    absolute_url, child_elements, field, own_text, select_all, select_first, stripped_text,
    ListingFragment, PageParser, ParseError, SiteId,
};
use scraper::{ElementRef, Html};

const DEFAULT_ROOT: &str = "https://www.shi.com/shop/search/software";

/// Products per search results page
const PAGE_SIZE: u32 = 20;

const CATEGORY_LIST: &str = r#"div[class*="categoryList"]"#;
const SUBCATEGORY_LIST: &str = r#"ol[id*="ctgy1software"]"#;

pub struct ShiParser {
    root_url: String,
}

impl ShiParser {
    pub fn new(root_url: Option<&str>) -> Self {
        Self {
            root_url: root_url.unwrap_or(DEFAULT_ROOT).to_string(),
        }
    }
}

/// The top-level `li` of the category sidebar
fn top_category<'a>(document: &'a Html) -> Option<ElementRef<'a>> {
    let list = select_first(document.root_element(), CATEGORY_LIST)?;
    let ordered = select_first(list, "ol")?;
    select_first(ordered, "li")
}

/// Direct subcategory items of a category `li`
fn subcategory_items(item: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let Some(list) = select_first(item, SUBCATEGORY_LIST) else {
        return Vec::new();
    };
    child_elements(list, "li")
        .into_iter()
        .filter(|li| li.value().attr("class").is_some_and(|c| c.contains("srCat")))
        .collect()
}

/// Name and absolute link of a category item's anchor
fn category_anchor(item: ElementRef<'_>, base: &str) -> Option<(String, Option<String>)> {
    let anchor = select_first(item, "a")?;
    let name = own_text(anchor).or_else(|| Some(stripped_text(anchor)).filter(|s| !s.is_empty()))?;
    let link = anchor
        .value()
        .attr("href")
        .and_then(|href| absolute_url(base, href));
    Some((name, link))
}

/// Stripped text of `element` with every `tag` subtree removed
fn text_excluding(element: ElementRef<'_>, tag: &str) -> Option<String> {
    fn collect<'a>(element: ElementRef<'a>, tag: &str, pieces: &mut Vec<&'a str>) {
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                let text = text.trim();
                if !text.is_empty() {
                    pieces.push(text);
                }
            } else if let Some(el) = ElementRef::wrap(child) {
                if el.value().name() != tag {
                    collect(el, tag, pieces);
                }
            }
        }
    }

    let mut pieces = Vec::new();
    collect(element, tag, &mut pieces);
    Some(pieces.join(" ")).filter(|text| !text.is_empty())
}

impl PageParser for ShiParser {
    fn site(&self) -> SiteId {
        SiteId::Shi
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
        let missing = || ParseError::MissingStructure {
            url: page.url.clone(),
            what: "software category sidebar".to_string(),
        };

        let top = top_category(&document).ok_or_else(missing)?;
        let (name, link) = category_anchor(top, &page.url).ok_or_else(missing)?;
        let root = CategoryNode::root(name, link);

        let children: Vec<CategoryNode> = subcategory_items(top)
            .into_iter()
            .filter_map(|item| category_anchor(item, &page.url))
            .map(|(name, link)| CategoryNode::child_of(&root, name, link))
            .collect();

        let mut nodes = Vec::with_capacity(children.len() + 1);
        nodes.push(root);
        nodes.extend(children);
        Ok(nodes)
    }

    fn expands(&self, node: &CategoryNode) -> bool {
        node.level == 2 && node.link.is_some()
    }

    /// On a subcategory page the sidebar nests the opened subcategory's own
    /// children one list deeper
    fn extract_child_nodes(&self, page: &RenderedPage, parent: &CategoryNode) -> Vec<CategoryNode> {
        let document = Html::parse_document(&page.body);
        let Some(top) = top_category(&document) else {
            return Vec::new();
        };
        let Some(opened) = subcategory_items(top).into_iter().next() else {
            return Vec::new();
        };

        subcategory_items(opened)
            .into_iter()
            .filter_map(|item| category_anchor(item, &page.url))
            .map(|(name, link)| CategoryNode::child_of(parent, name, link))
            .collect()
    }

    fn page_url(&self, listing_url: &str, page: u32) -> String {
        format!(
            "{}?p={}, {}",
            listing_url,
            PAGE_SIZE * page.saturating_sub(1),
            PAGE_SIZE
        )
    }

    fn extract_pagination_indicator(&self, page: &RenderedPage) -> Option<String> {
        let document = Html::parse_document(&page.body);
        let pages = select_all(document.root_element(), r#"div[class*="searchPages"]"#)
            .last()
            .copied()?;
        let last = select_all(pages, "a").last().copied()?;
        Some(stripped_text(last)).filter(|text| !text.is_empty())
    }

    fn extract_listings(&self, page: &RenderedPage) -> Vec<ListingFragment> {
        let document = Html::parse_document(&page.body);

        select_all(
            document.root_element(),
            r#"div[id="srResultsDiv"] div.row.srProduct"#,
        )
        .into_iter()
        .map(|product| {
            let info = select_first(product, "div");
            let attr = |name: &str| {
                info.and_then(|div| div.value().attr(name))
                    .map(str::to_string)
            };
            let body = info.and_then(|div| select_first(div, "div"));

            let link = body
                .and_then(|div| select_first(div, "a"))
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| absolute_url(&page.url, href));

            let short_description = body
                .and_then(|div| select_first(div, "ul"))
                .map(|ul| {
                    select_all(ul, "li")
                        .into_iter()
                        .map(stripped_text)
                        .collect::<Vec<_>>()
                        .join(", ")
                });

            let part_numbers = select_first(product, r#"div[class*="partNumWrapper"]"#);
            let part = |css: &str| {
                part_numbers
                    .and_then(|wrapper| select_first(wrapper, css))
                    .and_then(|small| text_excluding(small, "strong"))
            };

            ListingFragment {
                fields: vec![
                    field("Product ID", attr("data-prodid")),
                    field("Product Name", attr("data-prodname")),
                    field("Product Price", attr("data-price")),
                    field("Product Link", link),
                    field("Product Short Description", short_description),
                    field(
                        "Product Manufacturer Part",
                        part(r#"small[class*="srh_pr.mfrn"]"#),
                    ),
                    field("Product SHI Part", part(r#"small[class*="srh_pr.shin"]"#)),
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

    fn page(url: &str, body: &str) -> RenderedPage {
        RenderedPage {
            url: url.to_string(),
            body: body.to_string(),
        }
    }

    const ROOT: &str = r#"
<div class="categoryList">
  <ol>
    <li><a href="/shop/search/software">Software</a>
      <ol id="ctgy1software">
        <li class="srCat"><a href="/shop/search/software/security">Security <span>(120)</span></a></li>
        <li class="srCat"><a href="/shop/search/software/office">Office <span>(40)</span></a></li>
      </ol>
    </li>
  </ol>
</div>"#;

    const SECURITY: &str = r#"
<div class="categoryList">
  <ol>
    <li><a href="/shop/search/software">Software</a>
      <ol id="ctgy1software">
        <li class="srCat selected"><a href="/shop/search/software/security">Security</a>
          <ol id="ctgy1software-security">
            <li class="srCat"><a href="/shop/search/software/security/antivirus">Antivirus <span>(30)</span></a></li>
            <li class="srCat"><a href="/shop/search/software/security/firewall">Firewall</a></li>
          </ol>
        </li>
      </ol>
    </li>
  </ol>
</div>"#;

    #[test]
    fn test_extract_category_nodes() {
        let parser = ShiParser::new(None);
        let nodes = parser
            .extract_category_nodes(&page("https://www.shi.com/shop/search/software", ROOT), 3)
            .unwrap();

        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].name, "Software");
        assert_eq!(nodes[1].name, "Security");
        assert_eq!(
            nodes[1].link.as_deref(),
            Some("https://www.shi.com/shop/search/software/security")
        );
        assert!(parser.expands(&nodes[1]));
        assert!(!parser.expands(&nodes[0]));
    }

    #[test]
    fn test_extract_child_nodes_from_subcategory_page() {
        let parser = ShiParser::new(None);
        let nodes = parser
            .extract_category_nodes(&page("https://www.shi.com/shop/search/software", ROOT), 3)
            .unwrap();
        let security = &nodes[1];

        let children = parser.extract_child_nodes(
            &page("https://www.shi.com/shop/search/software/security", SECURITY),
            security,
        );
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name, "Antivirus");
        assert_eq!(children[0].level, 3);
        assert_eq!(children[0].parent_path, vec!["Software", "Security"]);

        let mut all = nodes.clone();
        all.extend(children);
        let resolution = resolve(&all, 3).unwrap();
        let names: Vec<String> = resolution
            .leaves
            .iter()
            .filter_map(|leaf| leaf.canonical_name().map(str::to_string))
            .collect();
        assert_eq!(names, vec!["Office", "Antivirus", "Firewall"]);
    }

    #[test]
    fn test_child_nodes_absent_without_nested_list() {
        let parser = ShiParser::new(None);
        let office = CategoryNode::child_of(&CategoryNode::root("Software", None), "Office", None);
        let children = parser.extract_child_nodes(
            &page("https://www.shi.com/shop/search/software/office", ROOT),
            &office,
        );
        assert!(children.is_empty());
    }

    #[test]
    fn test_page_url() {
        let parser = ShiParser::new(None);
        assert_eq!(
            parser.page_url("https://www.shi.com/shop/search/software/security", 3),
            "https://www.shi.com/shop/search/software/security?p=40, 20"
        );
    }

    #[test]
    fn test_extract_listings_and_pagination() {
        let body = r#"
<div id="srResultsDiv">
  <div class="row srProduct">
    <div data-prodid="123" data-prodname="Acme Antivirus" data-price="19.99">
      <div>
        <a href="/product/123">Acme Antivirus</a>
        <ul><li>1 year</li><li>5 devices</li></ul>
      </div>
    </div>
    <div class="partNumWrapper">
      <small class="srh_pr.mfrn"><strong>Mfr. Part#:</strong> AV-5</small>
      <small class="srh_pr.shin"><strong>SHI Part#:</strong> 998877</small>
    </div>
  </div>
</div>
<div class="searchPages"><a>1</a><a>2</a><a>6</a></div>"#;

        let parser = ShiParser::new(None);
        let listings =
            parser.extract_listings(&page("https://www.shi.com/shop/search/software/security", body));
        assert_eq!(listings.len(), 1);

        let fields = &listings[0].fields;
        assert_eq!(fields[0].1.as_deref(), Some("123"));
        assert_eq!(fields[1].1.as_deref(), Some("Acme Antivirus"));
        assert_eq!(fields[2].1.as_deref(), Some("19.99"));
        assert_eq!(fields[3].1.as_deref(), Some("https://www.shi.com/product/123"));
        assert_eq!(fields[4].1.as_deref(), Some("1 year, 5 devices"));
        assert_eq!(fields[5].1.as_deref(), Some("AV-5"));
        assert_eq!(fields[6].1.as_deref(), Some("998877"));

        let indicator = parser.extract_pagination_indicator(&page("https://www.shi.com/", body));
        assert_eq!(detect_page_count(indicator.as_deref()), 6);
    }
}
