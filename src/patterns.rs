//! Route patterns of the review UI.
//!
//! Patterns are matched against the context path with the base prefix and
//! query stripped, after percent-decoding. Parameters are positional: group
//! `n` of a pattern is `params.get(n - 1)`. Patterns for the filter and
//! filter+offset list pages are anchored and case-insensitive.

pub const ROOT: &str = r"^/$";

pub const DASHBOARD: &str = r"^/dashboard/(.+)$";
pub const CUSTOM_DASHBOARD: &str = r"^/dashboard/?$";
pub const PROJECT_DASHBOARD: &str = r"^/p/(.+)/\+/dashboard/(.+)";
pub const LEGACY_PROJECT_DASHBOARD: &str = r"^/projects/(.+),dashboards/(.+)";

pub const AGREEMENTS: &str = r"^/settings/agreements/?";
pub const NEW_AGREEMENTS: &str = r"^/settings/new-agreement/?";
pub const REGISTER: &str = r"^/register(/.*)?$";

/// Login and logout, optionally with a return URL. Passed to the server.
pub const LOG_IN_OR_OUT: &str = r"/log(in|out)(/(.+))?$";

/// Catch-all, registered last.
pub const DEFAULT: &str = r".*";

// Groups: /admin/groups/[uuid-]<group>[,<detail>]
pub const GROUP: &str = r"^/admin/groups/(?:uuid-)?([^,]+)$";
pub const GROUP_SELF: &str = r"^/groups/self";
pub const GROUP_INFO: &str = r"^/admin/groups/(?:uuid-)?(.+),info$";
pub const GROUP_AUDIT_LOG: &str = r"^/admin/groups/(?:uuid-)?(.+),audit-log$";
pub const GROUP_MEMBERS: &str = r"^/admin/groups/(?:uuid-)?(.+),members$";
pub const GROUP_LIST_OFFSET: &str = r"^/admin/groups(,(\d+))?(/)?$";
pub const GROUP_LIST_FILTER: &str = r"(?i)^/admin/groups/q/filter:([^/]+?)/?$";
pub const GROUP_LIST_FILTER_OFFSET: &str = r"(?i)^/admin/groups/q/filter:([^/]+?),([^/]+?)/?$";

pub const LEGACY_CREATE_PROJECT: &str = r"^/admin/create-project/?$";
pub const LEGACY_CREATE_GROUP: &str = r"^/admin/create-group/?$";
pub const PROJECT_OLD: &str = r"^/admin/(projects)/?(.+)?$";

// Repos: /admin/repos/<repo>[,<detail>]
pub const REPO: &str = r"^/admin/repos/([^,]+)$";
pub const REPO_COMMANDS: &str = r"^/admin/repos/(.+),commands$";
pub const REPO_GENERAL: &str = r"^/admin/repos/(.+),general$";
pub const REPO_ACCESS: &str = r"^/admin/repos/(.+),access$";
pub const REPO_DASHBOARDS: &str = r"^/admin/repos/(.+),dashboards$";
pub const REPO_LIST_OFFSET: &str = r"^/admin/repos(,(\d+))?(/)?$";
pub const REPO_LIST_FILTER: &str = r"(?i)^/admin/repos/q/filter:([^/]+?)/?$";
pub const REPO_LIST_FILTER_OFFSET: &str = r"(?i)^/admin/repos/q/filter:([^/]+?),([^/]+?)/?$";

pub const BRANCH_LIST_OFFSET: &str = r"^/admin/repos/(.+),branches(,(.+))?$";
pub const BRANCH_LIST_FILTER: &str = r"(?i)^/admin/repos/([^/]+?),branches/q/filter:([^/]+?)/?$";
pub const BRANCH_LIST_FILTER_OFFSET: &str =
    r"(?i)^/admin/repos/([^/]+?),branches/q/filter:([^/]+?),([^/]+?)/?$";

pub const TAG_LIST_OFFSET: &str = r"^/admin/repos/(.+),tags(,(.+))?$";
pub const TAG_LIST_FILTER: &str = r"(?i)^/admin/repos/([^/]+?),tags/q/filter:([^/]+?)/?$";
pub const TAG_LIST_FILTER_OFFSET: &str =
    r"(?i)^/admin/repos/([^/]+?),tags/q/filter:([^/]+?),([^/]+?)/?$";

// Plugins
pub const PLUGINS: &str = r"^/plugins/(.+)$";
pub const PLUGIN_LIST: &str = r"^/admin/plugins(/)?$";
pub const PLUGIN_LIST_OFFSET: &str = r"^/admin/plugins(,(\d+))?(/)?$";
pub const PLUGIN_LIST_FILTER: &str = r"(?i)^/admin/plugins/q/filter:([^/]+?)/?$";
pub const PLUGIN_LIST_FILTER_OFFSET: &str = r"(?i)^/admin/plugins/q/filter:([^/]+?),([^/]+?)/?$";

// Search
pub const QUERY: &str = r"^/q/([^,]+)(,(\d+))?$";
/// Vestigial `,n,z` suffix of old search links.
pub const QUERY_LEGACY_SUFFIX: &str = r"^/q/.+,n,z$";
pub const CHANGE_ID_QUERY: &str = r"^/id/(I[0-9a-f]{40})$";

// Changes
/// `/c/<changeNum>[/<tail>]`, without a repo.
pub const CHANGE_LEGACY: &str = r"^/c/(\d+)/?(.*)$";
/// `/<changeNum>`.
pub const CHANGE_NUMBER_LEGACY: &str = r"^/(\d+)/?";
/// `/c/<repo>/+/<changeNum>[/[<base>..]<patch>]`. A lone number lands in
/// group 5 (the base) and is moved to the revision by normalization.
pub const CHANGE: &str = r"^/c/(.+)/\+/(\d+)(/?((-?\d+|edit)(\.\.(\d+|edit))?))?/?$";
/// `/c/<repo>/+/<changeNum>[/<patch>],edit`.
pub const CHANGE_EDIT: &str = r"^/c/(.+)/\+/(\d+)(/(\d+))?,edit/?$";
/// `/c/<repo>/+/<changeNum>/comment/<commentId>`, opens the diff.
pub const COMMENT: &str = r"^/c/(.+)/\+/(\d+)/comment/(\w+)/?$";
/// `/c/<repo>/+/<changeNum>/comments[/<commentId>]`, opens the comments tab.
pub const COMMENTS_TAB: &str = r"^/c/(.+)/\+/(\d+)/comments(?:/)?(\w+)?/?$";
/// `/c/<repo>/+/<changeNum>/[<base>..]<patch>/<path>`.
pub const DIFF: &str = r"^/c/(.+)/\+/(\d+)(/((-?\d+|edit)(\.\.(\d+|edit))?(/(.+))))/?$";
/// `/c/<repo>/+/<changeNum>/<patch>/<path>,edit[#<line>]`.
pub const DIFF_EDIT: &str = r"^/c/(.+)/\+/(\d+)/(\d+|edit)/(.+),edit(#\d+)?$";
/// Diff links with an `@<line>` suffix instead of a hash.
pub const DIFF_LEGACY_LINENUM: &str =
    r"^/c/((.+)/\+/)?(\d+)(/?((-?\d+|edit)(\.\.(\d+|edit))?/(.+))?)@[ab]?\d+$";

// Settings
pub const SETTINGS: &str = r"^/settings/?";
pub const SETTINGS_LEGACY: &str = r"^/settings/VE/(\S+)";

/// `/c/<repo>/ /<tail>`: a `+` that was decoded to a space.
pub const IMPROPERLY_ENCODED_PLUS: &str = r"^/c/(.+)/ /(.+)$";

pub const PLUGIN_SCREEN: &str = r"^/x/([\w-]+)/([\w-]+)/?";

// Documentation
pub const DOCUMENTATION_SEARCH_FILTER: &str = r"(?i)^/Documentation/q/filter:([^/]+?)/?$";
pub const DOCUMENTATION_SEARCH: &str = r"^/Documentation/q/(.*)$";
pub const DOCUMENTATION: &str = r"^/Documentation(/)?(.+)?";
