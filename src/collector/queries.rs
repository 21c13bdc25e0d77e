//! SQL issued against the Drone schema on every scrape.

/// Active repositories, ordered by name so emission order is stable.
pub const ACTIVE_REPOS_SQL: &str =
    "SELECT repo_name, repo_id FROM repos WHERE repo_active = true ORDER BY repo_name";

/// Drone stores `0` in `build_finished` while a build is running.
const FINISHED_ONLY: &str = " AND build_finished IS NOT NULL AND build_finished > 0";

/// NULL for running builds, so they never report a duration.
const DURATION: &str = "CASE WHEN build_finished > 0 THEN build_finished - build_started END";

/// The four per-repository lookups. "Last" always means highest build number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildQuery {
    LastSuccessfulBuildId,
    LastBuildId,
    LastSuccessfulBuildTime,
    LastBuildTime,
}

impl BuildQuery {
    pub const ALL: [BuildQuery; 4] = [
        BuildQuery::LastSuccessfulBuildId,
        BuildQuery::LastBuildId,
        BuildQuery::LastSuccessfulBuildTime,
        BuildQuery::LastBuildTime,
    ];

    /// Stable identifier used in logs and the `query` label.
    pub fn name(self) -> &'static str {
        match self {
            BuildQuery::LastSuccessfulBuildId => "last_successful_build_id",
            BuildQuery::LastBuildId => "last_build_id",
            BuildQuery::LastSuccessfulBuildTime => "last_successful_build_time",
            BuildQuery::LastBuildTime => "last_build_time",
        }
    }

    fn selection(self) -> &'static str {
        match self {
            BuildQuery::LastSuccessfulBuildId | BuildQuery::LastBuildId => "build_number",
            BuildQuery::LastSuccessfulBuildTime | BuildQuery::LastBuildTime => DURATION,
        }
    }

    fn successful_only(self) -> bool {
        matches!(
            self,
            BuildQuery::LastSuccessfulBuildId | BuildQuery::LastSuccessfulBuildTime
        )
    }

    /// Statement text; `$1` is the repository id.
    pub fn sql(self, include_unfinished: bool) -> String {
        let mut sql = format!(
            "SELECT {} FROM builds WHERE build_repo_id = $1",
            self.selection()
        );
        if self.successful_only() {
            sql.push_str(" AND build_status = 'success'");
        }
        if !include_unfinished {
            sql.push_str(FINISHED_ONLY);
        }
        sql.push_str(" ORDER BY build_number DESC LIMIT 1");
        sql
    }
}
