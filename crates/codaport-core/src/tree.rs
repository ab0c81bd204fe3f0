// ── Page tree search ──
//
// Resolves a URL page slug against one batch of the page listing.
// Depth-first pre-order over an explicit stack; subtrees deeper than
// `MAX_TREE_DEPTH` are skipped.

use codaport_api::PageNode;
use tracing::{trace, warn};

/// Deepest nesting level the search descends into (roots are level 0).
pub const MAX_TREE_DEPTH: usize = 64;

/// Whether a page's browser link points at `slug`.
///
/// Matches when the link contains `_<slug>`, or when its last path
/// segment equals `<slug>`, `_<slug>`, or `s<slug>`.
pub fn link_matches_slug(browser_link: &str, slug: &str) -> bool {
    if slug.is_empty() {
        return false;
    }

    let underscored = format!("_{slug}");
    if browser_link.contains(&underscored) {
        return true;
    }

    let last = browser_link.rsplit('/').next().unwrap_or(browser_link);
    last == slug
        || last == underscored
        || last.strip_prefix('s').is_some_and(|rest| rest == slug)
}

/// Find the first node (pre-order) whose link matches `slug`.
pub fn find_page<'a>(roots: &'a [PageNode], slug: &str) -> Option<&'a PageNode> {
    let mut stack: Vec<(&PageNode, usize)> = roots.iter().rev().map(|n| (n, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        if let Some(link) = node.browser_link.as_deref() {
            trace!(page = %node.id, link, slug, "checking page");
            if link_matches_slug(link, slug) {
                return Some(node);
            }
        }

        if node.children.is_empty() {
            continue;
        }
        if depth + 1 > MAX_TREE_DEPTH {
            warn!(page = %node.id, depth, "page tree too deep, skipping children");
            continue;
        }
        stack.extend(node.children.iter().rev().map(|c| (c, depth + 1)));
    }

    None
}
