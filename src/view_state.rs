//! Typed view states.
//!
//! Every successful route match produces exactly one [`ViewState`]: a
//! tagged union with one variant per top-level section of the review UI.
//! View states are plain data. They are built fresh per navigation and
//! replaced, never mutated, on the next one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Patch sets
// ============================================================================

/// A patch set reference as it appears in change and diff URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatchSetNum {
    /// The parent commit (only valid as a diff base).
    Parent,
    /// The change edit.
    Edit,
    /// A numbered patch set. Negative numbers address merge parents.
    Number(i32),
}

impl PatchSetNum {
    /// Parse an optional URL token, ignoring anything unrecognized.
    pub fn parse_opt(token: Option<&str>) -> Option<Self> {
        token.and_then(|t| t.parse().ok())
    }
}

impl fmt::Display for PatchSetNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchSetNum::Parent => write!(f, "PARENT"),
            PatchSetNum::Edit => write!(f, "edit"),
            PatchSetNum::Number(n) => write!(f, "{}", n),
        }
    }
}

impl FromStr for PatchSetNum {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PARENT" => Ok(PatchSetNum::Parent),
            "edit" => Ok(PatchSetNum::Edit),
            _ => s.parse().map(PatchSetNum::Number),
        }
    }
}

/// A line in a diff, addressed from the URL hash (`"b12"`, `"7"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAddress {
    /// Whether the line is on the base (left) side.
    pub left_side: bool,
    /// One-based line number.
    pub line: u32,
}

impl LineAddress {
    /// Parse `[ab]?<digits>`. Anything else is not a line address.
    pub fn parse(hash: &str) -> Option<Self> {
        let (left_side, digits) = match hash.as_bytes().first()? {
            b'a' | b'b' => (true, &hash[1..]),
            _ => (false, hash),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self {
            left_side,
            line: digits.parse().ok()?,
        })
    }
}

// ============================================================================
// Per-domain states
// ============================================================================

/// Which admin list is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdminSection {
    Repos,
    Groups,
    Plugins,
}

/// An admin list page: repos, groups or plugins.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdminViewState {
    pub section: Option<AdminSection>,
    pub offset: Option<u32>,
    pub filter: Option<String>,
    /// The list was opened with `#create`.
    pub open_create_modal: bool,
}

impl AdminViewState {
    /// The first page of `section`.
    pub fn list(section: AdminSection) -> Self {
        Self {
            section: Some(section),
            ..Self::default()
        }
    }
}

/// Tab of a repository's admin page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepoDetailView {
    General,
    Access,
    Branches,
    Tags,
    Commands,
    Dashboards,
}

impl RepoDetailView {
    /// URL suffix after the repo name.
    pub fn suffix(self) -> &'static str {
        match self {
            RepoDetailView::General => ",general",
            RepoDetailView::Access => ",access",
            RepoDetailView::Branches => ",branches",
            RepoDetailView::Tags => ",tags",
            RepoDetailView::Commands => ",commands",
            RepoDetailView::Dashboards => ",dashboards",
        }
    }
}

/// A repository admin page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoViewState {
    pub repo: String,
    pub detail: Option<RepoDetailView>,
    pub offset: Option<u32>,
    pub filter: Option<String>,
}

impl RepoViewState {
    pub fn new(repo: impl Into<String>, detail: RepoDetailView) -> Self {
        Self {
            repo: repo.into(),
            detail: Some(detail),
            offset: None,
            filter: None,
        }
    }
}

/// Tab of a group's admin page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupDetailView {
    Members,
    Log,
}

/// A group admin page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupViewState {
    pub group_id: String,
    pub detail: Option<GroupDetailView>,
}

/// Which part of a change is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeChildView {
    #[default]
    Overview,
    Diff,
    Edit,
}

/// A change: its overview, a file diff, or a file in the change edit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeViewState {
    pub child_view: ChangeChildView,
    pub repo: String,
    pub change_num: u32,
    pub base_patch_num: Option<PatchSetNum>,
    pub patch_num: Option<PatchSetNum>,
    /// File path for the diff and edit views.
    pub diff_path: Option<String>,
    pub line: Option<LineAddress>,
    pub comment_id: Option<String>,
    /// Opened from a `/comment/<id>` link rather than a plain diff link.
    pub comment_link: bool,
    /// Overview opened in edit mode (`,edit`).
    pub edit: bool,
    pub force_reload: bool,
    pub tab: Option<String>,
    pub filter: Option<String>,
    pub select: Option<String>,
    pub attempt: Option<u32>,
}

impl ChangeViewState {
    /// The overview of `change_num` in `repo`.
    pub fn overview(repo: impl Into<String>, change_num: u32) -> Self {
        Self {
            repo: repo.into(),
            change_num,
            ..Self::default()
        }
    }
}

/// One section of a custom dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSection {
    pub name: String,
    pub query: String,
}

/// A user, project or custom dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardViewState {
    pub user: Option<String>,
    pub repo: Option<String>,
    pub dashboard: Option<String>,
    pub sections: Vec<DashboardSection>,
    pub title: Option<String>,
}

/// The settings page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SettingsViewState {
    /// Email verification token from a legacy `/settings/VE/<token>` link.
    pub email_token: Option<String>,
}

/// A change search.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchViewState {
    pub query: String,
    pub offset: Option<u32>,
}

/// A plugin-provided screen, `/x/<plugin>/<screen>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginViewState {
    pub plugin: String,
    pub screen: String,
}

/// Documentation search.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentationViewState {
    pub filter: Option<String>,
}

// ============================================================================
// ViewState
// ============================================================================

/// Discriminant of the active view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    Admin,
    Repo,
    Group,
    Change,
    Dashboard,
    Settings,
    Search,
    Plugin,
    Documentation,
    Agreement,
}

/// State of the active view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "kebab-case")]
pub enum ViewState {
    Admin(AdminViewState),
    Repo(RepoViewState),
    Group(GroupViewState),
    Change(ChangeViewState),
    Dashboard(DashboardViewState),
    Settings(SettingsViewState),
    Search(SearchViewState),
    Plugin(PluginViewState),
    Documentation(DocumentationViewState),
    Agreement,
}

impl ViewState {
    /// The discriminant.
    pub fn view(&self) -> View {
        match self {
            ViewState::Admin(_) => View::Admin,
            ViewState::Repo(_) => View::Repo,
            ViewState::Group(_) => View::Group,
            ViewState::Change(_) => View::Change,
            ViewState::Dashboard(_) => View::Dashboard,
            ViewState::Settings(_) => View::Settings,
            ViewState::Search(_) => View::Search,
            ViewState::Plugin(_) => View::Plugin,
            ViewState::Documentation(_) => View::Documentation,
            ViewState::Agreement => View::Agreement,
        }
    }

    /// The change state, if this is a change view.
    pub fn as_change(&self) -> Option<&ChangeViewState> {
        match self {
            ViewState::Change(state) => Some(state),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_set_num_parse() {
        assert_eq!("3".parse::<PatchSetNum>(), Ok(PatchSetNum::Number(3)));
        assert_eq!("-1".parse::<PatchSetNum>(), Ok(PatchSetNum::Number(-1)));
        assert_eq!("edit".parse::<PatchSetNum>(), Ok(PatchSetNum::Edit));
        assert_eq!("PARENT".parse::<PatchSetNum>(), Ok(PatchSetNum::Parent));
        assert!("x".parse::<PatchSetNum>().is_err());
        assert_eq!(PatchSetNum::parse_opt(None), None);
        assert_eq!(PatchSetNum::Number(7).to_string(), "7");
    }

    #[test]
    fn test_line_address() {
        assert_eq!(
            LineAddress::parse("b12"),
            Some(LineAddress { left_side: true, line: 12 })
        );
        assert_eq!(
            LineAddress::parse("40"),
            Some(LineAddress { left_side: false, line: 40 })
        );
        assert_eq!(LineAddress::parse("c3"), None);
        assert_eq!(LineAddress::parse("b"), None);
        assert_eq!(LineAddress::parse(""), None);
    }

    #[test]
    fn test_view_discriminant() {
        let state = ViewState::Change(ChangeViewState::overview("repo", 42));
        assert_eq!(state.view(), View::Change);
        assert_eq!(state.as_change().map(|c| c.change_num), Some(42));
        assert_eq!(ViewState::Agreement.view(), View::Agreement);
        assert!(ViewState::Agreement.as_change().is_none());
    }

    #[test]
    fn test_serde_tagging() {
        let state = ViewState::Admin(AdminViewState::list(AdminSection::Repos));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["view"], "admin");
        assert_eq!(json["section"], "repos");

        let json = serde_json::to_value(ViewState::Agreement).unwrap();
        assert_eq!(json, serde_json::json!({ "view": "agreement" }));
    }
}
