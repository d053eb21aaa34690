//! View state behind the outline table.
//!
//! Everything here is local: row order after a drag, selection, column
//! visibility and the active tab never reach the server. The only network
//! traffic is the single-field update sent when an inline edit is committed.

use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;

use super::api::{ApiClient, ClientError};
use crate::database::models::{Outline, OutlinePatch, OutlineStatus, Reviewer, SectionType, WireEnum};

/// Server calls the table needs
#[async_trait]
pub trait OutlineApi: Send + Sync {
    async fn update_outline(&self, id: Uuid, patch: &OutlinePatch) -> Result<Outline, ClientError>;
}

#[async_trait]
impl OutlineApi for ApiClient {
    async fn update_outline(&self, id: Uuid, patch: &OutlinePatch) -> Result<Outline, ClientError> {
        ApiClient::update_outline(self, id, patch).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Header,
    SectionType,
    Status,
    Target,
    Limit,
    Reviewer,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Header,
        Column::SectionType,
        Column::Status,
        Column::Target,
        Column::Limit,
        Column::Reviewer,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Column::Header => "header",
            Column::SectionType => "sectionType",
            Column::Status => "status",
            Column::Target => "target",
            Column::Limit => "limit",
            Column::Reviewer => "reviewer",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Column::Header => "Header",
            Column::SectionType => "Section Type",
            Column::Status => "Status",
            Column::Target => "Target",
            Column::Limit => "Limit",
            Column::Reviewer => "Reviewer",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key().eq_ignore_ascii_case(key))
    }

    /// Display text for one cell
    pub fn cell(&self, outline: &Outline) -> String {
        match self {
            Column::Header => outline.header.clone(),
            Column::SectionType => outline.section_type.as_str().replace('_', " "),
            Column::Status => outline.status.as_str().replace('_', " "),
            Column::Target => outline.target.to_string(),
            Column::Limit => outline.limit.to_string(),
            Column::Reviewer => outline.reviewer.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Outline,
    PastPerformance,
    ManagementPlan,
    RelevantExperience,
}

impl Tab {
    pub const ALL: [Tab; 4] = [
        Tab::Outline,
        Tab::PastPerformance,
        Tab::ManagementPlan,
        Tab::RelevantExperience,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Tab::Outline => "outline",
            Tab::PastPerformance => "past-performance",
            Tab::ManagementPlan => "management-plan",
            Tab::RelevantExperience => "relevant-experience",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Outline => "Outline",
            Tab::PastPerformance => "Past Performance",
            Tab::ManagementPlan => "Management Plan",
            Tab::RelevantExperience => "Relevant Experience",
        }
    }

    /// Only the outline tab has a table behind it
    pub fn shows_table(&self) -> bool {
        *self == Tab::Outline
    }
}

/// Outline field that can be edited in place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Header,
    SectionType,
    Status,
    Target,
    Limit,
    Reviewer,
}

impl EditField {
    pub fn parse(key: &str) -> Option<Self> {
        Column::parse(key).map(|column| match column {
            Column::Header => EditField::Header,
            Column::SectionType => EditField::SectionType,
            Column::Status => EditField::Status,
            Column::Target => EditField::Target,
            Column::Limit => EditField::Limit,
            Column::Reviewer => EditField::Reviewer,
        })
    }

    pub fn key(&self) -> &'static str {
        match self {
            EditField::Header => "header",
            EditField::SectionType => "sectionType",
            EditField::Status => "status",
            EditField::Target => "target",
            EditField::Limit => "limit",
            EditField::Reviewer => "reviewer",
        }
    }

    /// Current stored value in the same text form a draft uses
    pub fn value_of(&self, outline: &Outline) -> String {
        match self {
            EditField::Header => outline.header.clone(),
            EditField::SectionType => outline.section_type.as_str().to_string(),
            EditField::Status => outline.status.as_str().to_string(),
            EditField::Target => outline.target.to_string(),
            EditField::Limit => outline.limit.to_string(),
            EditField::Reviewer => outline.reviewer.as_str().to_string(),
        }
    }

    /// Single-field partial update from a draft value
    pub fn patch(&self, raw: &str) -> Result<OutlinePatch, String> {
        let raw = raw.trim();
        let mut patch = OutlinePatch::default();
        match self {
            EditField::Header => {
                if raw.is_empty() {
                    return Err("Header is required".to_string());
                }
                patch.header = Some(raw.to_string());
            }
            EditField::SectionType => patch.section_type = Some(parse_choice::<SectionType>(raw)?),
            EditField::Status => patch.status = Some(parse_choice::<OutlineStatus>(raw)?),
            EditField::Target => patch.target = Some(parse_count(raw)?),
            EditField::Limit => patch.limit = Some(parse_count(raw)?),
            EditField::Reviewer => patch.reviewer = Some(parse_choice::<Reviewer>(raw)?),
        }
        Ok(patch)
    }
}

fn parse_choice<T: WireEnum>(raw: &str) -> Result<T, String> {
    let normalized = raw.to_uppercase().replace(' ', "_").replace('-', "_");
    T::parse(&normalized).ok_or_else(|| format!("Expected one of: {}", T::allowed()))
}

fn parse_count(raw: &str) -> Result<i32, String> {
    match raw.parse::<i32>() {
        Ok(n) if n >= 0 => Ok(n),
        Ok(_) => Err("Must be at least 0".to_string()),
        Err(_) => Err("Expected a whole number".to_string()),
    }
}

/// An inline edit in progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub row: Uuid,
    pub field: EditField,
    pub original: String,
    pub draft: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Draft equal to the stored value; nothing was sent
    Unchanged,
    Saved,
    /// The update failed and the row kept its last good value
    Reverted,
    /// No edit was open
    Idle,
}

#[derive(Debug, Default, Clone)]
pub struct OutlineTable {
    rows: Vec<Outline>,
    selected: HashSet<Uuid>,
    hidden: HashSet<Column>,
    tab: Tab,
    editing: Option<Edit>,
}

impl OutlineTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace rows with a fresh server listing. Any local ordering is lost.
    pub fn load(&mut self, rows: Vec<Outline>) {
        self.selected.retain(|id| rows.iter().any(|r| r.id == *id));
        if let Some(edit) = &self.editing {
            if !rows.iter().any(|r| r.id == edit.row) {
                self.editing = None;
            }
        }
        self.rows = rows;
    }

    pub fn rows(&self) -> &[Outline] {
        &self.rows
    }

    pub fn row(&self, id: Uuid) -> Option<&Outline> {
        self.rows.iter().find(|r| r.id == id)
    }

    fn index_of(&self, id: Uuid) -> Option<usize> {
        self.rows.iter().position(|r| r.id == id)
    }

    /// Drop `active` at the position of `over`. Returns whether anything moved.
    pub fn move_row(&mut self, active: Uuid, over: Uuid) -> bool {
        if active == over {
            return false;
        }
        let (Some(from), Some(to)) = (self.index_of(active), self.index_of(over)) else {
            return false;
        };
        let row = self.rows.remove(from);
        self.rows.insert(to, row);
        true
    }

    // Selection

    pub fn select(&mut self, id: Uuid, checked: bool) {
        if checked {
            if self.index_of(id).is_some() {
                self.selected.insert(id);
            }
        } else {
            self.selected.remove(&id);
        }
    }

    pub fn select_all(&mut self, checked: bool) {
        if checked {
            self.selected = self.rows.iter().map(|r| r.id).collect();
        } else {
            self.selected.clear();
        }
    }

    pub fn is_selected(&self, id: Uuid) -> bool {
        self.selected.contains(&id)
    }

    pub fn all_selected(&self) -> bool {
        !self.rows.is_empty() && self.selected.len() == self.rows.len()
    }

    /// Selected ids in display order
    pub fn selected_ids(&self) -> Vec<Uuid> {
        self.rows
            .iter()
            .filter(|r| self.selected.contains(&r.id))
            .map(|r| r.id)
            .collect()
    }

    // Columns and tabs

    pub fn toggle_column(&mut self, column: Column) {
        if !self.hidden.remove(&column) {
            self.hidden.insert(column);
        }
    }

    pub fn is_visible(&self, column: Column) -> bool {
        !self.hidden.contains(&column)
    }

    pub fn visible_columns(&self) -> Vec<Column> {
        Column::ALL.into_iter().filter(|c| self.is_visible(*c)).collect()
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    // Inline edit

    pub fn editing(&self) -> Option<&Edit> {
        self.editing.as_ref()
    }

    /// Open an edit on one cell. Returns false for an unknown row.
    pub fn begin_edit(&mut self, row: Uuid, field: EditField) -> bool {
        let Some(outline) = self.row(row) else {
            return false;
        };
        let original = field.value_of(outline);
        self.editing = Some(Edit {
            row,
            field,
            draft: original.clone(),
            original,
        });
        true
    }

    pub fn set_draft(&mut self, value: impl Into<String>) {
        if let Some(edit) = self.editing.as_mut() {
            edit.draft = value.into();
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Send the open edit as a single-field update.
    ///
    /// Failures are logged and the row keeps its last good value; they are
    /// not returned to the caller.
    pub async fn commit_edit(&mut self, api: &dyn OutlineApi) -> CommitOutcome {
        let Some(edit) = self.editing.take() else {
            return CommitOutcome::Idle;
        };

        if edit.draft.trim() == edit.original {
            return CommitOutcome::Unchanged;
        }

        let patch = match edit.field.patch(&edit.draft) {
            Ok(patch) => patch,
            Err(message) => {
                tracing::warn!("Discarded invalid {} for outline {}: {}", edit.field.key(), edit.row, message);
                return CommitOutcome::Reverted;
            }
        };

        match api.update_outline(edit.row, &patch).await {
            Ok(updated) => {
                if let Some(index) = self.index_of(edit.row) {
                    self.rows[index] = updated;
                }
                CommitOutcome::Saved
            }
            Err(e) => {
                tracing::error!("Failed to update outline {}: {}", edit.row, e);
                CommitOutcome::Reverted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::sync::Mutex;

    fn outline(header: &str, minutes_ago: i64) -> Outline {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        Outline {
            id: Uuid::new_v4(),
            header: header.to_string(),
            section_type: SectionType::ExecutiveSummary,
            status: OutlineStatus::Pending,
            target: 10,
            limit: 20,
            reviewer: Reviewer::Assim,
            organization_id: Uuid::nil(),
            created_at: at,
            updated_at: at,
        }
    }

    fn headers(table: &OutlineTable) -> Vec<&str> {
        table.rows().iter().map(|r| r.header.as_str()).collect()
    }

    /// Records every patch; fails when `fail` is set
    #[derive(Default)]
    struct FakeApi {
        rows: Mutex<Vec<Outline>>,
        sent: Mutex<Vec<OutlinePatch>>,
        fail: bool,
    }

    #[async_trait]
    impl OutlineApi for FakeApi {
        async fn update_outline(&self, id: Uuid, patch: &OutlinePatch) -> Result<Outline, ClientError> {
            self.sent.lock().unwrap().push(patch.clone());
            if self.fail {
                return Err(ClientError::Api {
                    status: 500,
                    code: Some("INTERNAL_SERVER_ERROR".into()),
                    message: "Internal server error".into(),
                    details: Vec::new(),
                });
            }
            let mut rows = self.rows.lock().unwrap();
            let row = rows.iter_mut().find(|r| r.id == id).unwrap();
            row.apply(patch);
            Ok(row.clone())
        }
    }

    fn table_with(rows: &[Outline]) -> OutlineTable {
        let mut table = OutlineTable::new();
        table.load(rows.to_vec());
        table
    }

    #[test]
    fn move_row_is_an_array_move() {
        let rows = [outline("a", 0), outline("b", 1), outline("c", 2), outline("d", 3)];
        let mut table = table_with(&rows);

        assert!(table.move_row(rows[0].id, rows[2].id));
        assert_eq!(headers(&table), ["b", "c", "a", "d"]);

        assert!(table.move_row(rows[3].id, rows[1].id));
        assert_eq!(headers(&table), ["d", "b", "c", "a"]);

        assert!(!table.move_row(rows[1].id, rows[1].id));
        assert!(!table.move_row(Uuid::new_v4(), rows[1].id));

        // A reload restores server order
        table.load(rows.to_vec());
        assert_eq!(headers(&table), ["a", "b", "c", "d"]);
    }

    #[test]
    fn selection_and_columns_are_local() {
        let rows = [outline("a", 0), outline("b", 1)];
        let mut table = table_with(&rows);

        table.select(rows[1].id, true);
        table.select(Uuid::new_v4(), true);
        assert_eq!(table.selected_ids(), vec![rows[1].id]);
        assert!(!table.all_selected());

        table.select_all(true);
        assert!(table.all_selected());
        table.select(rows[0].id, false);
        assert!(!table.is_selected(rows[0].id));
        table.select_all(false);
        assert!(table.selected_ids().is_empty());

        table.toggle_column(Column::Reviewer);
        assert!(!table.is_visible(Column::Reviewer));
        assert_eq!(table.visible_columns().len(), 5);
        table.toggle_column(Column::Reviewer);
        assert!(table.is_visible(Column::Reviewer));

        table.set_tab(Tab::ManagementPlan);
        assert_eq!(table.tab().label(), "Management Plan");
        assert!(!table.tab().shows_table());
    }

    #[test]
    fn empty_table_is_never_all_selected() {
        let mut table = OutlineTable::new();
        table.select_all(true);
        assert!(!table.all_selected());
    }

    #[tokio::test]
    async fn commit_sends_single_field_patch() {
        let row = outline("Intro", 0);
        let api = FakeApi {
            rows: Mutex::new(vec![row.clone()]),
            ..Default::default()
        };
        let mut table = table_with(&[row.clone()]);

        assert!(table.begin_edit(row.id, EditField::Target));
        table.set_draft("15");
        assert_eq!(table.commit_edit(&api).await, CommitOutcome::Saved);

        let sent = api.sent.lock().unwrap().clone();
        assert_eq!(
            sent,
            vec![OutlinePatch {
                target: Some(15),
                ..Default::default()
            }]
        );
        assert_eq!(table.row(row.id).unwrap().target, 15);
        assert_eq!(table.row(row.id).unwrap().header, "Intro");
        assert!(table.editing().is_none());
    }

    #[tokio::test]
    async fn unchanged_draft_sends_nothing() {
        let row = outline("Intro", 0);
        let api = FakeApi::default();
        let mut table = table_with(&[row.clone()]);

        table.begin_edit(row.id, EditField::Reviewer);
        assert_eq!(table.commit_edit(&api).await, CommitOutcome::Unchanged);
        assert!(api.sent.lock().unwrap().is_empty());

        assert_eq!(table.commit_edit(&api).await, CommitOutcome::Idle);
    }

    #[tokio::test]
    async fn failed_commit_reverts() {
        let row = outline("Intro", 0);
        let api = FakeApi {
            fail: true,
            ..Default::default()
        };
        let mut table = table_with(&[row.clone()]);

        table.begin_edit(row.id, EditField::Reviewer);
        table.set_draft("BINI");
        assert_eq!(table.commit_edit(&api).await, CommitOutcome::Reverted);
        assert_eq!(api.sent.lock().unwrap().len(), 1);
        assert_eq!(table.row(row.id).unwrap().reviewer, Reviewer::Assim);

        // Invalid drafts never reach the server
        table.begin_edit(row.id, EditField::Limit);
        table.set_draft("-3");
        assert_eq!(table.commit_edit(&api).await, CommitOutcome::Reverted);
        assert_eq!(api.sent.lock().unwrap().len(), 1);
        assert_eq!(table.row(row.id).unwrap().limit, 20);
    }

    #[test]
    fn edit_field_parses_drafts() {
        assert_eq!(
            EditField::Status.patch("in progress").unwrap().status,
            Some(OutlineStatus::InProgress)
        );
        assert!(EditField::SectionType.patch("appendix").is_err());
        assert!(EditField::Header.patch("   ").is_err());
        assert_eq!(EditField::parse("sectiontype"), Some(EditField::SectionType));
        assert_eq!(Column::SectionType.cell(&outline("x", 0)), "EXECUTIVE SUMMARY");
    }
}
