//! Tool discovery across paginated `tools/list` responses.

use crate::error::{AgentError, Result};
use async_trait::async_trait;
use futures::stream::{self, Stream, TryStreamExt as _};
use rmcp::model::Tool;
use std::collections::HashSet;
use tracing::{debug, warn};

/// One `tools/list` response.
#[derive(Debug, Clone)]
pub struct ToolPage {
    pub tools: Vec<Tool>,
    /// Absent (or empty) on the last page.
    pub next_cursor: Option<String>,
}

#[async_trait]
pub trait ToolSource: Send + Sync {
    async fn list_tools_page(&self, cursor: Option<String>) -> Result<ToolPage>;
}

enum Cursor {
    First,
    Next(String),
}

/// Lazily yield every tool, requesting the next page only once the current one is drained.
///
/// The stream ends after the first page without a continuation cursor and stops at the first
/// error.
pub fn tool_stream<S>(source: &S) -> impl Stream<Item = Result<Tool>> + Send + '_
where
    S: ToolSource + ?Sized,
{
    stream::try_unfold(
        (Some(Cursor::First), 0_usize),
        move |(cursor, page_no)| async move {
            let cursor = match cursor {
                None => return Ok::<_, AgentError>(None),
                Some(Cursor::First) => None,
                Some(Cursor::Next(c)) => Some(c),
            };
            let page = source.list_tools_page(cursor).await?;
            debug!(page = page_no + 1, tools = page.tools.len(), "tools/list page received");
            let next = page
                .next_cursor
                .filter(|c| !c.is_empty())
                .map(Cursor::Next);
            let tools = stream::iter(page.tools.into_iter().map(Ok::<Tool, AgentError>));
            Ok(Some((tools, (next, page_no + 1))))
        },
    )
    .try_flatten()
}

/// Drain [`tool_stream`] into a list, in gateway order.
pub async fn list_all_tools<S>(source: &S) -> Result<Vec<Tool>>
where
    S: ToolSource + ?Sized,
{
    let tools: Vec<Tool> = tool_stream(source).try_collect().await?;
    let mut seen = HashSet::new();
    for tool in &tools {
        if !seen.insert(&*tool.name) {
            warn!(tool = %tool.name, "gateway listed the same tool name twice");
        }
    }
    Ok(tools)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt as _;
    use parking_lot::Mutex;
    use serde_json::json;

    fn tool(name: &str) -> Tool {
        serde_json::from_value(json!({
            "name": name,
            "description": format!("{name} tool"),
            "inputSchema": { "type": "object" }
        }))
        .expect("tool")
    }

    struct Pages {
        pages: Vec<ToolPage>,
        requests: Mutex<Vec<Option<String>>>,
    }

    impl Pages {
        fn new(pages: Vec<ToolPage>) -> Self {
            Self {
                pages,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ToolSource for Pages {
        async fn list_tools_page(&self, cursor: Option<String>) -> Result<ToolPage> {
            let mut requests = self.requests.lock();
            let index = requests.len();
            requests.push(cursor);
            self.pages
                .get(index)
                .cloned()
                .ok_or_else(|| AgentError::Protocol("no more pages".into()))
        }
    }

    fn names(tools: &[Tool]) -> Vec<String> {
        tools.iter().map(|t| t.name.to_string()).collect()
    }

    #[tokio::test]
    async fn follows_cursor_until_exhausted() {
        let source = Pages::new(vec![
            ToolPage {
                tools: vec![tool("a"), tool("b")],
                next_cursor: Some("x".to_string()),
            },
            ToolPage {
                tools: vec![tool("c")],
                next_cursor: None,
            },
        ]);

        let tools = list_all_tools(&source).await.expect("tools");

        assert_eq!(names(&tools), ["a", "b", "c"]);
        assert_eq!(*source.requests.lock(), [None, Some("x".to_string())]);
    }

    #[tokio::test]
    async fn single_page_makes_one_request() {
        let source = Pages::new(vec![ToolPage {
            tools: vec![tool("only")],
            next_cursor: None,
        }]);

        let tools = list_all_tools(&source).await.expect("tools");

        assert_eq!(names(&tools), ["only"]);
        assert_eq!(source.requests.lock().len(), 1);
    }

    #[tokio::test]
    async fn empty_cursor_ends_the_listing() {
        let source = Pages::new(vec![ToolPage {
            tools: vec![tool("a")],
            next_cursor: Some(String::new()),
        }]);

        list_all_tools(&source).await.expect("tools");

        assert_eq!(source.requests.lock().len(), 1);
    }

    #[tokio::test]
    async fn pages_are_fetched_on_demand() {
        let source = Pages::new(vec![
            ToolPage {
                tools: vec![tool("a"), tool("b")],
                next_cursor: Some("x".to_string()),
            },
            ToolPage {
                tools: vec![tool("c")],
                next_cursor: None,
            },
        ]);

        let first_two: Vec<_> = tool_stream(&source).take(2).collect().await;

        assert_eq!(first_two.len(), 2);
        assert_eq!(source.requests.lock().len(), 1);
    }

    #[tokio::test]
    async fn page_error_stops_the_stream() {
        let source = Pages::new(vec![ToolPage {
            tools: vec![tool("a")],
            next_cursor: Some("missing".to_string()),
        }]);

        let err = list_all_tools(&source).await.expect_err("second page fails");

        assert!(matches!(err, AgentError::Protocol(_)));
    }
}
