use serde::{Deserialize, Serialize};

/// What the global search input means on the current screen.
///
/// Always derived from the location via [`resolve_context`]; never stored,
/// so the bar cannot keep a previous screen's behaviour after navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchContext {
    /// Dashboard feed: project lookup, selection filters the feed.
    Feed,
    /// Strategist directory: paged user lookup.
    Strategists,
    /// Project directory: project lookup.
    Projects,
    /// The user's own reports: text handed to the list via the bus.
    MyReports,
    /// Profile screens: search is inert.
    Profile,
    /// Any other screen: search is inert.
    Disabled,
}

impl SearchContext {
    /// Whether typing in the bar can do anything on this screen.
    pub fn is_searchable(&self) -> bool {
        !matches!(self, SearchContext::Profile | SearchContext::Disabled)
    }

    /// Placeholder text for the input.
    pub fn placeholder(&self) -> &'static str {
        match self {
            SearchContext::Feed | SearchContext::Projects => "Search projects...",
            SearchContext::Strategists => "Search strategists...",
            SearchContext::MyReports => "Search my reports...",
            SearchContext::Profile | SearchContext::Disabled => "",
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchContext::Feed => "feed",
            SearchContext::Strategists => "strategists",
            SearchContext::Projects => "projects",
            SearchContext::MyReports => "my_reports",
            SearchContext::Profile => "profile",
            SearchContext::Disabled => "disabled",
        }
    }
}

impl std::fmt::Display for SearchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

enum Rule {
    Exact(&'static str),
    Subtree(&'static str),
}

/// Ordered routing rules; first match wins.
const RULES: &[(Rule, SearchContext)] = &[
    (Rule::Exact("/dashboard"), SearchContext::Feed),
    (Rule::Exact("/dashboard/strategists"), SearchContext::Strategists),
    (Rule::Exact("/dashboard/projects"), SearchContext::Projects),
    (Rule::Exact("/dashboard/my-reports"), SearchContext::MyReports),
    (Rule::Subtree("/dashboard/profile"), SearchContext::Profile),
];

/// Map a navigation path to its search context.
///
/// Query string, fragment and trailing slashes are ignored. Detail views
/// under the listing pages (e.g. `/dashboard/projects/42`) are `Disabled`.
pub fn resolve_context(pathname: &str) -> SearchContext {
    let path = pathname
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');

    RULES
        .iter()
        .find(|(rule, _)| match rule {
            Rule::Exact(p) => path == *p,
            Rule::Subtree(p) => {
                path == *p || path.strip_prefix(*p).is_some_and(|rest| rest.starts_with('/'))
            }
        })
        .map(|(_, context)| *context)
        .unwrap_or(SearchContext::Disabled)
}
