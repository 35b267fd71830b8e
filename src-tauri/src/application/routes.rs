use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Home,
    Dashboard,
    Habits,
    Tasks,
    Goals,
    Calendar,
    Progress,
    Settings,
    NotFound,
}

const ROUTE_TABLE: [(&str, Page); 8] = [
    ("/", Page::Home),
    ("/dashboard", Page::Dashboard),
    ("/habits", Page::Habits),
    ("/tasks", Page::Tasks),
    ("/goals", Page::Goals),
    ("/calendar", Page::Calendar),
    ("/progress", Page::Progress),
    ("/settings", Page::Settings),
];

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub path: String,
    pub page: Page,
}

fn normalize_path(path: &str) -> String {
    let without_query = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim();
    let trimmed = without_query.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

pub fn resolve_route(path: &str) -> ResolvedRoute {
    let path = normalize_path(path);
    let page = ROUTE_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == path)
        .map(|(_, page)| *page)
        .unwrap_or(Page::NotFound);
    ResolvedRoute { path, page }
}
