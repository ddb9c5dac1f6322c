//! Live category discovery
//!
//! Fetches a site's category index, reads its nodes, and visits the pages of
//! nodes the parser marks as expandable to read their children.

use crate::category::CategoryNode;
use crate::harvest::{open_with_retry, Fetcher, RetryPolicy};
use crate::sites::PageParser;
use crate::HarvestError;

/// Discovers the category nodes of the parser's site
///
/// # Arguments
///
/// * `fetcher` - Opens the session used for discovery
/// * `parser` - Site parser
/// * `policy` - Retry policy for every page visited
/// * `max_depth` - Maximum taxonomy depth of the site
///
/// # Returns
///
/// * `Ok(Vec<CategoryNode>)` - Every discovered node, parents before children
/// * `Err(HarvestError)` - The index page could not be loaded or read
pub async fn discover_categories(
    fetcher: &dyn Fetcher,
    parser: &dyn PageParser,
    policy: &RetryPolicy,
    max_depth: usize,
) -> crate::Result<Vec<CategoryNode>> {
    let mut session = fetcher.open_session()?;

    tracing::info!("Discovering {} categories from {}", parser.site(), parser.root_url());
    let (index, _) = open_with_retry(session.as_mut(), parser.root_url(), policy)
        .await
        .map_err(|failure| HarvestError::Fetch(failure.error))?;

    let mut nodes = Vec::new();
    for node in parser.extract_category_nodes(&index, max_depth)? {
        let children = if parser.expands(&node) && node.level < max_depth {
            expand(session.as_mut(), parser, policy, &node).await
        } else {
            Vec::new()
        };
        nodes.push(node);
        nodes.extend(children);
    }

    tracing::info!("Discovered {} category nodes", nodes.len());
    Ok(nodes)
}

/// Reads the children of `node`; a failed visit leaves `node` without children
async fn expand(
    session: &mut dyn crate::harvest::Session,
    parser: &dyn PageParser,
    policy: &RetryPolicy,
    node: &CategoryNode,
) -> Vec<CategoryNode> {
    let Some(link) = node.link.as_deref() else {
        return Vec::new();
    };

    match open_with_retry(session, link, policy).await {
        Ok((page, _)) => {
            let children = parser.extract_child_nodes(&page, node);
            tracing::debug!("{} has {} child categories", node.name, children.len());
            children
        }
        Err(failure) => {
            tracing::warn!(
                "Could not expand category {} after {} attempts: {}",
                node.path().join(" > "),
                failure.attempts,
                failure.error
            );
            Vec::new()
        }
    }
}
