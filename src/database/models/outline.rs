use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Kind of proposal section an outline row describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "section_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectionType {
    TableOfContents,
    ExecutiveSummary,
    TechnicalApproach,
    Design,
    Capabilities,
    FocusDocument,
    Narrative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "outline_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutlineStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "reviewer", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reviewer {
    Assim,
    Bini,
    Mami,
}

/// Closed string enumerations accepted on the wire
pub trait WireEnum: Sized + Copy + 'static {
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == value)
    }

    fn allowed() -> String {
        Self::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>().join(", ")
    }
}

impl WireEnum for SectionType {
    const ALL: &'static [Self] = &[
        SectionType::TableOfContents,
        SectionType::ExecutiveSummary,
        SectionType::TechnicalApproach,
        SectionType::Design,
        SectionType::Capabilities,
        SectionType::FocusDocument,
        SectionType::Narrative,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            SectionType::TableOfContents => "TABLE_OF_CONTENTS",
            SectionType::ExecutiveSummary => "EXECUTIVE_SUMMARY",
            SectionType::TechnicalApproach => "TECHNICAL_APPROACH",
            SectionType::Design => "DESIGN",
            SectionType::Capabilities => "CAPABILITIES",
            SectionType::FocusDocument => "FOCUS_DOCUMENT",
            SectionType::Narrative => "NARRATIVE",
        }
    }
}

impl WireEnum for OutlineStatus {
    const ALL: &'static [Self] = &[
        OutlineStatus::Pending,
        OutlineStatus::InProgress,
        OutlineStatus::Completed,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            OutlineStatus::Pending => "PENDING",
            OutlineStatus::InProgress => "IN_PROGRESS",
            OutlineStatus::Completed => "COMPLETED",
        }
    }
}

impl WireEnum for Reviewer {
    const ALL: &'static [Self] = &[Reviewer::Assim, Reviewer::Bini, Reviewer::Mami];

    fn as_str(&self) -> &'static str {
        match self {
            Reviewer::Assim => "ASSIM",
            Reviewer::Bini => "BINI",
            Reviewer::Mami => "MAMI",
        }
    }
}

/// A proposal-section record owned by exactly one organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Outline {
    pub id: Uuid,
    pub header: String,
    pub section_type: SectionType,
    pub status: OutlineStatus,
    pub target: i32,
    pub limit: i32,
    pub reviewer: Reviewer,
    pub organization_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Business fields of an outline, everything except identity and timestamps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineFields {
    pub header: String,
    pub section_type: SectionType,
    pub status: OutlineStatus,
    pub target: i32,
    pub limit: i32,
    pub reviewer: Reviewer,
}

/// Partial outline update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlinePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_type: Option<SectionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OutlineStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<Reviewer>,
}

impl Outline {
    pub fn fields(&self) -> OutlineFields {
        OutlineFields {
            header: self.header.clone(),
            section_type: self.section_type,
            status: self.status,
            target: self.target,
            limit: self.limit,
            reviewer: self.reviewer,
        }
    }

    /// Business fields for a copy of this outline
    pub fn duplicate_fields(&self) -> OutlineFields {
        OutlineFields {
            header: format!("{} (Copy)", self.header),
            ..self.fields()
        }
    }

    /// Apply a patch in place, returning true when any field was present
    pub fn apply(&mut self, patch: &OutlinePatch) -> bool {
        let mut touched = false;
        if let Some(header) = &patch.header {
            self.header = header.clone();
            touched = true;
        }
        if let Some(section_type) = patch.section_type {
            self.section_type = section_type;
            touched = true;
        }
        if let Some(status) = patch.status {
            self.status = status;
            touched = true;
        }
        if let Some(target) = patch.target {
            self.target = target;
            touched = true;
        }
        if let Some(limit) = patch.limit {
            self.limit = limit;
            touched = true;
        }
        if let Some(reviewer) = patch.reviewer {
            self.reviewer = reviewer;
            touched = true;
        }
        touched
    }
}

impl OutlinePatch {
    pub fn is_empty(&self) -> bool {
        self == &OutlinePatch::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Outline {
        let now = Utc::now();
        Outline {
            id: Uuid::new_v4(),
            header: "Intro".into(),
            section_type: SectionType::ExecutiveSummary,
            status: OutlineStatus::Pending,
            target: 10,
            limit: 20,
            reviewer: Reviewer::Assim,
            organization_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn serializes_with_wire_names() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["sectionType"], "EXECUTIVE_SUMMARY");
        assert_eq!(value["status"], "PENDING");
        assert_eq!(value["reviewer"], "ASSIM");
        assert!(value.get("organizationId").is_some());
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn wire_enum_parse_matches_serde_names() {
        for section in SectionType::ALL {
            let json = serde_json::to_value(section).unwrap();
            assert_eq!(json.as_str(), Some(section.as_str()));
            assert_eq!(SectionType::parse(section.as_str()), Some(*section));
        }
        assert_eq!(OutlineStatus::parse("IN_PROGRESS"), Some(OutlineStatus::InProgress));
        assert_eq!(Reviewer::parse("assim"), None);
    }

    #[test]
    fn apply_only_touches_present_fields() {
        let mut outline = sample();
        let before = outline.clone();
        let patch = OutlinePatch {
            status: Some(OutlineStatus::Completed),
            ..Default::default()
        };
        assert!(outline.apply(&patch));
        assert_eq!(outline.status, OutlineStatus::Completed);
        assert_eq!(outline.header, before.header);
        assert_eq!(outline.target, before.target);
        assert_eq!(outline.limit, before.limit);
        assert_eq!(outline.reviewer, before.reviewer);
        assert!(!outline.apply(&OutlinePatch::default()));
    }

    #[test]
    fn duplicate_fields_suffix_header_once() {
        let outline = sample();
        let copy = outline.duplicate_fields();
        assert_eq!(copy.header, "Intro (Copy)");
        assert_eq!(copy.section_type, outline.section_type);
        assert_eq!(copy.target, outline.target);
    }
}
