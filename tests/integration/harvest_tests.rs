//! End-to-end harvest runs against mock directory sites

use catalog_harvest::config::{parse_config, Config};
use catalog_harvest::harvest::{run_harvest, Fetcher, HttpFetcher, SessionConfig};
use catalog_harvest::output::{generate_markdown_summary, load_statistics};
use catalog_harvest::storage::SqliteSink;
use catalog_harvest::JobStatus;
use std::path::Path;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

fn create_test_config(site: &str, root_url: &str, dir: &Path, shards: usize) -> Config {
    parse_config(&format!(
        r#"
[site]
id = "{site}"
max-depth = 3
root-url = "{root_url}"

[harvest]
max-attempts = 2
retry-delay-ms = 1
fetch-timeout-ms = 5000
settle-ms = 0

[pool]
shards = {shards}
workers = 2

[session]
user-agent = "CatalogHarvestTest/1.0"
require-proxy = false

[output]
database-path = "{db}"
summary-path = "{summary}"
"#,
        db = dir.join("harvest.db").display(),
        summary = dir.join("summary.md").display(),
    ))
    .expect("test config should be valid")
}

fn create_fetcher(config: &Config) -> Arc<dyn Fetcher> {
    Arc::new(HttpFetcher::new(SessionConfig::from_config(config, None)).unwrap())
}

fn g2_product(name: &str) -> String {
    format!(
        r#"<div data-ordered-events-item="product-{name}">
             <a href="/products/{name}/reviews"><div class="product-name">{name}</div></a>
             <p>{name} does things...Show More</p>
           </div>"#
    )
}

const G2_CATEGORIES: &str = r#"
<html><body>
<table>
  <thead><tr><td class="l3">Sales Tools</td></tr></thead>
  <tbody>
    <tr><td class="categories__name"><a href="/categories/crm">CRM Software</a></td>
        <td><div class="categories__parent">Sales Tools</div></td></tr>
    <tr><td class="categories__name"><a href="/categories/crm-all-in-one">CRM All-in-One</a></td>
        <td><div class="categories__parent">CRM Software</div></td></tr>
    <tr><td class="categories__name"><a href="/categories/sales-intelligence">Sales Intelligence</a></td>
        <td><div class="categories__parent">Sales Tools</div></td></tr>
  </tbody>
</table>
<table>
  <thead><tr><td class="l3">Marketing</td></tr></thead>
  <tbody>
    <tr><td class="categories__name"><a href="/categories/seo">SEO Tools</a></td>
        <td><div class="categories__parent">Marketing</div></td></tr>
  </tbody>
</table>
</body></html>"#;

async fn mount_g2_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/categories/"))
        .respond_with(html(G2_CATEGORIES.to_string()))
        .mount(server)
        .await;

    // Page 2 is mounted before page 1 so the query-specific mock wins
    Mock::given(method("GET"))
        .and(path("/categories/crm-all-in-one"))
        .and(query_param("page", "2"))
        .respond_with(html(format!("<html><body>{}</body></html>", g2_product("Gamma"))))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/categories/crm-all-in-one"))
        .respond_with(html(format!(
            r#"<html><body>{}{}
               <ul aria-label="Pagination">
                 <li><a href="/categories/crm-all-in-one?order=g2_score&page=2">Last</a></li>
               </ul></body></html>"#,
            g2_product("Alpha"),
            g2_product("Beta")
        )))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/categories/sales-intelligence"))
        .respond_with(html(format!(
            "<html><body>{}</body></html>",
            g2_product("Delta\u{7}")
        )))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/categories/seo"))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_harvest_g2() {
    let server = MockServer::start().await;
    mount_g2_site(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let root_url = format!("{}/categories/", server.uri());
    let config = create_test_config("g2", &root_url, dir.path(), 2);
    let mut sink = SqliteSink::new(Path::new(&config.output.database_path)).unwrap();

    let (table, report) = run_harvest(&config, "testhash", create_fetcher(&config), &mut sink)
        .await
        .unwrap();

    assert_eq!(report.summary.complete, 2);
    assert_eq!(report.summary.partial, 0);
    assert_eq!(report.summary.skipped, 1);
    assert_eq!(report.summary.records, 4);
    assert_eq!(report.summary.failures.len(), 1);
    assert_eq!(report.summary.failures[0].category, "Marketing > SEO Tools");
    assert_eq!(report.summary.failures[0].status, JobStatus::Skipped);

    assert_eq!(
        table.columns,
        vec![
            "Category 1",
            "Category 2",
            "Category 3",
            "Category Link",
            "Product Name",
            "Product Link",
            "Product Description",
        ]
    );

    let names: Vec<_> = (0..table.rows.len())
        .filter_map(|row| table.cell(row, "Product Name"))
        .collect();
    assert_eq!(names, vec!["Alpha", "Beta", "Gamma", "Delta"]);

    assert_eq!(table.cell(0, "Category 2"), Some("CRM Software"));
    assert_eq!(table.cell(0, "Category 3"), Some("CRM All-in-One"));
    assert_eq!(table.cell(3, "Category 3"), None);
    assert_eq!(
        table.cell(3, "Category Link"),
        Some(format!("{}/categories/sales-intelligence", server.uri()).as_str())
    );
    assert_eq!(table.cell(0, "Product Description"), Some("Alpha does things"));

    let stats = load_statistics(&sink).unwrap();
    assert_eq!(stats.checkpointed_shards, vec![0, 1]);
    assert_eq!(stats.checkpointed_records, 4);
    assert_eq!(stats.listing_rows, 4);
    let run = stats.last_run.unwrap();
    assert_eq!(run.config_hash, "testhash");
    assert_eq!(run.skipped, 1);
}

#[tokio::test]
async fn test_harvest_keeps_pages_before_a_failed_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/categories/"))
        .respond_with(html(
            r#"<div data-testid="alphabetical-list"><ul>
                 <li data-testid="group-list-item"><a href="/crm-software/">CRM Software</a></li>
               </ul></div>"#
                .to_string(),
        ))
        .mount(&server)
        .await;

    let card = |name: &str| {
        format!(
            r#"<div id="product-card-container-{name}"><a href="/p/{name}/"><h2>{name}</h2></a>
               <p>About {name} Learn More</p></div>"#
        )
    };

    Mock::given(method("GET"))
        .and(path("/crm-software/"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/crm-software/"))
        .and(query_param("page", "2"))
        .respond_with(html(card("Two")))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/crm-software/"))
        .and(query_param("deployment", "CLOUD_SAAS_WEB_BASED"))
        .respond_with(html(format!(
            r#"{}<div data-test-id="current-page-display">Page 1 of 3</div>"#,
            card("One")
        )))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let root_url = format!("{}/categories/", server.uri());
    let config = create_test_config("capterra", &root_url, dir.path(), 1);
    let mut sink = SqliteSink::new(Path::new(&config.output.database_path)).unwrap();

    let (table, report) = run_harvest(&config, "testhash", create_fetcher(&config), &mut sink)
        .await
        .unwrap();

    assert_eq!(report.summary.partial, 1);
    assert_eq!(report.summary.records, 2);
    assert!(report.summary.failures[0].error.starts_with("page 3"));

    let names: Vec<_> = (0..table.rows.len())
        .filter_map(|row| table.cell(row, "Product Name"))
        .collect();
    assert_eq!(names, vec!["One", "Two"]);
    assert_eq!(table.cell(0, "Product Description"), Some("About One"));

    let summary_path = Path::new(&config.output.summary_path);
    generate_markdown_summary(&report, summary_path).unwrap();
    let summary = std::fs::read_to_string(summary_path).unwrap();
    assert!(summary.contains("| Partial | 1 |"));
    assert!(summary.contains("| CRM Software | partial | page 3"));
}

#[tokio::test]
async fn test_unreachable_index_fails_the_run() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let root_url = format!("{}/categories/", server.uri());
    let config = create_test_config("g2", &root_url, dir.path(), 1);
    let mut sink = SqliteSink::new(Path::new(&config.output.database_path)).unwrap();

    let result = run_harvest(&config, "testhash", create_fetcher(&config), &mut sink).await;
    assert!(matches!(
        result,
        Err(catalog_harvest::HarvestError::Fetch(
            catalog_harvest::FetchError::Blocked { status: 429, .. }
        ))
    ));
    assert!(sink.checkpointed_shards().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_tree_fails_before_harvesting() {
    let server = MockServer::start().await;

    // Each category names the other as its parent
    Mock::given(method("GET"))
        .and(path("/categories/"))
        .respond_with(html(
            r#"<table><thead><tr><td class="l3">Root</td></tr></thead><tbody>
                 <tr><td class="categories__name"><a href="/categories/a">A</a></td>
                     <td><div class="categories__parent">B</div></td></tr>
                 <tr><td class="categories__name"><a href="/categories/b">B</a></td>
                     <td><div class="categories__parent">A</div></td></tr>
               </tbody></table>"#
                .to_string(),
        ))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let root_url = format!("{}/categories/", server.uri());
    let config = create_test_config("g2", &root_url, dir.path(), 1);
    let mut sink = SqliteSink::new(Path::new(&config.output.database_path)).unwrap();

    let result = run_harvest(&config, "testhash", create_fetcher(&config), &mut sink).await;
    assert!(matches!(
        result,
        Err(catalog_harvest::HarvestError::Resolution(
            catalog_harvest::ResolutionError::Cycle { .. }
        ))
    ));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}
