//! URL generation.
//!
//! The inverse of routing: turn a [`ViewState`] back into the canonical URL
//! that would route to it. Used for redirects after patch-range
//! normalization and by the change URL back-sync.

use crate::params::encode_component;
use crate::view_state::{
    AdminSection, AdminViewState, ChangeChildView, ChangeViewState, DashboardSection,
    DashboardViewState, GroupDetailView, PatchSetNum, SearchViewState, ViewState,
};

/// Encode a URL component the way canonical review URLs expect.
///
/// The value is encoded twice so that `/` and `%` survive the server's own
/// decoding, then `:` and spaces are made readable again. With
/// `replace_slash`, slashes are kept too (repo names like `a/b`).
pub fn encode_url(value: &str, replace_slash: bool) -> String {
    let output = encode_component(&encode_component(value))
        .replace("%253A", ":")
        .replace("%2520", "+");
    if replace_slash {
        output.replace("%252F", "/")
    } else {
        output
    }
}

// ============================================================================
// Patch ranges
// ============================================================================

/// `"<base>..<patch>"`, `"<patch>"`, or empty when neither is set. A
/// `PARENT` base is implied and omitted.
pub fn patch_range_expression(base: Option<PatchSetNum>, patch: Option<PatchSetNum>) -> String {
    let mut range = patch.map(|p| p.to_string()).unwrap_or_default();
    if let Some(base) = base.filter(|b| *b != PatchSetNum::Parent) {
        range = format!("{}..{}", base, range);
    }
    range
}

/// Normalize the patch range parsed from a change or diff URL.
///
/// The route patterns capture a lone number as the *base*; it is really the
/// revision, so it moves over and the base becomes `PARENT`. A base equal to
/// the revision is also reset to `PARENT`. Returns `true` when the URL was
/// not in canonical form and the caller should redirect.
pub fn normalize_patch_range(
    base: &mut Option<PatchSetNum>,
    patch: &mut Option<PatchSetNum>,
) -> bool {
    let Some(base_num) = *base else {
        return false;
    };
    match *patch {
        Some(patch_num) if patch_num == base_num => {
            *base = Some(PatchSetNum::Parent);
            true
        }
        Some(_) => false,
        None => {
            *patch = Some(base_num);
            *base = Some(PatchSetNum::Parent);
            false
        }
    }
}

// ============================================================================
// generate_url
// ============================================================================

/// Canonical URL for `state`, prefixed with `base`.
pub fn generate_url(state: &ViewState, base: &str) -> String {
    let url = match state {
        ViewState::Search(search) => search_url(search),
        ViewState::Change(change) => match change.child_view {
            ChangeChildView::Overview => change_url(change),
            ChangeChildView::Diff | ChangeChildView::Edit => diff_or_edit_url(change),
        },
        ViewState::Dashboard(dashboard) => dashboard_url(dashboard),
        ViewState::Group(group) => {
            let mut url = format!("/admin/groups/{}", encode_url(&group.group_id, true));
            match group.detail {
                Some(GroupDetailView::Members) => url.push_str(",members"),
                Some(GroupDetailView::Log) => url.push_str(",audit-log"),
                None => {}
            }
            url
        }
        ViewState::Repo(repo) => {
            let mut url = format!("/admin/repos/{}", encode_url(&repo.repo, true));
            if let Some(detail) = repo.detail {
                url.push_str(detail.suffix());
            }
            url
        }
        ViewState::Admin(admin) => admin_url(admin),
        ViewState::Settings(_) => "/settings".to_string(),
        ViewState::Plugin(plugin) => format!("/x/{}/{}", plugin.plugin, plugin.screen),
        ViewState::Documentation(docs) => match &docs.filter {
            Some(filter) => format!("/Documentation/q/filter:{}", encode_component(filter)),
            None => "/Documentation/index.html".to_string(),
        },
        ViewState::Agreement => "/settings/new-agreement".to_string(),
    };
    format!("{}{}", base, url)
}

/// URL of the root page.
pub fn root_url(base: &str) -> String {
    format!("{}/", base)
}

fn search_url(search: &SearchViewState) -> String {
    let offset = match search.offset {
        Some(offset) if offset > 0 => format!(",{}", offset),
        _ => String::new(),
    };
    format!("/q/{}{}", encode_url(&search.query, true), offset)
}

fn change_url(change: &ChangeViewState) -> String {
    let range = patch_range_expression(change.base_patch_num, change.patch_num);
    let mut suffix = if range.is_empty() {
        String::new()
    } else {
        format!("/{}", range)
    };
    if change.edit {
        suffix.push_str(",edit");
    }
    if let Some(comment_id) = &change.comment_id {
        suffix.push_str("/comments/");
        suffix.push_str(comment_id);
    }
    if change.force_reload {
        suffix.push_str("?forceReload=true");
    }
    change_prefix(change) + &suffix
}

fn diff_or_edit_url(change: &ChangeViewState) -> String {
    let range = patch_range_expression(change.base_patch_num, change.patch_num);
    let mut suffix = if range.is_empty() {
        String::new()
    } else {
        format!("/{}", range)
    };
    suffix.push('/');
    suffix.push_str(&encode_url(change.diff_path.as_deref().unwrap_or_default(), true));

    if change.child_view == ChangeChildView::Edit {
        suffix.push_str(",edit");
    }
    if let Some(line) = change.line {
        suffix.push('#');
        if line.left_side && change.child_view == ChangeChildView::Diff {
            suffix.push('b');
        }
        suffix.push_str(&line.line.to_string());
    }
    if change.child_view == ChangeChildView::Diff {
        if let Some(comment_id) = &change.comment_id {
            suffix = format!("/comment/{}{}", comment_id, suffix);
        }
    }
    change_prefix(change) + &suffix
}

fn change_prefix(change: &ChangeViewState) -> String {
    if change.repo.is_empty() {
        format!("/c/{}", change.change_num)
    } else {
        format!("/c/{}/+/{}", encode_url(&change.repo, true), change.change_num)
    }
}

fn dashboard_url(dashboard: &DashboardViewState) -> String {
    if !dashboard.sections.is_empty() {
        let mut params = sections_to_params(&dashboard.sections, dashboard.repo.as_deref());
        if let Some(title) = &dashboard.title {
            params.push(format!("title={}", encode_component(title)));
        }
        let user = dashboard.user.as_deref().unwrap_or_default();
        format!("/dashboard/{}?{}", user, params.join("&"))
    } else if let Some(repo) = &dashboard.repo {
        format!(
            "/p/{}/+/dashboard/{}",
            encode_url(repo, true),
            dashboard.dashboard.as_deref().unwrap_or_default()
        )
    } else {
        format!("/dashboard/{}", dashboard.user.as_deref().unwrap_or("self"))
    }
}

fn sections_to_params(sections: &[DashboardSection], repo: Option<&str>) -> Vec<String> {
    sections
        .iter()
        .map(|section| {
            let query = match repo {
                Some(repo) => section
                    .query
                    .replace("${repo}", repo)
                    .replace("${project}", repo),
                None => section.query.clone(),
            };
            format!("{}={}", encode_component(&section.name), encode_component(&query))
        })
        .collect()
}

fn admin_url(admin: &AdminViewState) -> String {
    let list = match admin.section {
        Some(AdminSection::Groups) => "/admin/groups",
        Some(AdminSection::Plugins) => "/admin/plugins",
        Some(AdminSection::Repos) | None => "/admin/repos",
    };
    match (&admin.filter, admin.offset) {
        (Some(filter), Some(offset)) if offset > 0 => {
            format!("{}/q/filter:{},{}", list, encode_url(filter, false), offset)
        }
        (Some(filter), _) => format!("{}/q/filter:{}", list, encode_url(filter, false)),
        (None, Some(offset)) if offset > 0 => format!("{},{}", list, offset),
        _ => list.to_string(),
    }
}

// ============================================================================
// Search terms
// ============================================================================

/// Structured search terms, rendered into a query string for
/// [`SearchViewState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTerms {
    /// `owner:` operator.
    pub owner: Option<String>,
    /// `project:` operator.
    pub repo: Option<String>,
    /// `branch:` operator.
    pub branch: Option<String>,
    /// `topic:` operator, quoted when it contains spaces or `:`.
    pub topic: Option<String>,
    /// `hashtag:` operator, lowercased and quoted like `topic`.
    pub hashtag: Option<String>,
    /// `status:` operators, OR-ed together.
    pub statuses: Vec<String>,
}

impl SearchTerms {
    /// Restrict to changes owned by `owner`.
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Restrict to one repository.
    pub fn repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = Some(repo.into());
        self
    }

    /// Restrict to one branch.
    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Restrict to one topic.
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Restrict to one hashtag.
    pub fn hashtag(mut self, hashtag: impl Into<String>) -> Self {
        self.hashtag = Some(hashtag.into());
        self
    }

    /// Add an accepted status. Repeatable.
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.statuses.push(status.into());
        self
    }

    /// Path of the search page for these terms, `/q/<operators>`.
    pub fn to_path(&self) -> String {
        let mut operators = Vec::new();
        if let Some(owner) = &self.owner {
            operators.push(format!("owner:{}", encode_url(owner, false)));
        }
        if let Some(repo) = &self.repo {
            operators.push(format!("project:{}", encode_url(repo, false)));
        }
        if let Some(branch) = &self.branch {
            operators.push(format!("branch:{}", encode_url(branch, false)));
        }
        if let Some(topic) = &self.topic {
            operators.push(format!("topic:{}", quote_if_needed(topic, &encode_url(topic, false))));
        }
        if let Some(hashtag) = &self.hashtag {
            let encoded = encode_url(&hashtag.to_lowercase(), false);
            operators.push(format!("hashtag:{}", quote_if_needed(hashtag, &encoded)));
        }
        match self.statuses.as_slice() {
            [] => {}
            [status] => operators.push(format!("status:{}", encode_url(status, false))),
            statuses => {
                let alternatives: Vec<_> = statuses
                    .iter()
                    .map(|s| format!("status:{}", encode_url(s, false)))
                    .collect();
                operators.push(format!("({})", alternatives.join(" OR ")));
            }
        }
        format!("/q/{}", operators.join("+"))
    }
}

fn quote_if_needed(raw: &str, encoded: &str) -> String {
    if raw.chars().any(|c| c.is_whitespace() || c == ':') {
        format!("\"{}\"", encoded)
    } else {
        encoded.to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
