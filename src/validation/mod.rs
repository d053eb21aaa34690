//! Request payload validation.
//!
//! Every endpoint accepts a loosely-typed JSON body and turns it into a typed
//! input here before any business logic runs. Failures are collected for all
//! fields in one pass so clients can highlight every offending input at once.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::database::models::{MemberRole, OutlineFields, OutlinePatch, OutlineStatus, Reviewer, SectionType, WireEnum};

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").expect("slug regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static NON_SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9-]").expect("non-slug regex"));

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![FieldError::new(field, message)])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.field.as_str()).collect()
    }

    pub fn into_inner(self) -> Vec<FieldError> {
        self.0
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|e| format!("{}: {}", e.field, e.message)).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Collects per-field failures while reading values out of a JSON object
struct Validator<'a> {
    object: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> Validator<'a> {
    fn new(value: &'a Value) -> Result<Self, ValidationErrors> {
        match value {
            Value::Object(object) => Ok(Self {
                object,
                errors: Vec::new(),
            }),
            _ => Err(ValidationErrors::single("body", "Expected a JSON object")),
        }
    }

    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Present, non-null value for a field. Missing required fields are recorded.
    fn lookup(&mut self, field: &str, required: bool) -> Option<&'a Value> {
        let object = self.object;
        match object.get(field) {
            Some(Value::Null) | None => {
                if required {
                    self.fail(field, "Required");
                }
                None
            }
            Some(value) => Some(value),
        }
    }

    fn string(&mut self, field: &str, required: bool, empty_message: &str) -> Option<String> {
        match self.lookup(field, required)? {
            Value::String(s) if s.is_empty() => {
                self.fail(field, empty_message);
                None
            }
            Value::String(s) => Some(s.clone()),
            _ => {
                self.fail(field, "Expected string");
                None
            }
        }
    }

    fn choice<E: WireEnum>(&mut self, field: &str, required: bool) -> Option<E> {
        let raw = match self.lookup(field, required)? {
            Value::String(s) => s.clone(),
            _ => {
                self.fail(field, format!("Expected one of: {}", E::allowed()));
                return None;
            }
        };
        match E::parse(&raw) {
            Some(v) => Some(v),
            None => {
                self.fail(
                    field,
                    format!("Invalid value '{}', expected one of: {}", raw, E::allowed()),
                );
                None
            }
        }
    }

    /// Non-negative integer that fits the storage column
    fn count(&mut self, field: &str, required: bool) -> Option<i32> {
        let number = match self.lookup(field, required)? {
            Value::Number(n) => n.clone(),
            _ => {
                self.fail(field, "Expected number");
                return None;
            }
        };

        let value = if let Some(i) = number.as_i64() {
            i
        } else if number.is_u64() {
            self.fail(field, format!("Must be at most {}", i32::MAX));
            return None;
        } else {
            match number.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => f as i64,
                _ => {
                    self.fail(field, "Expected integer");
                    return None;
                }
            }
        };

        if value < 0 {
            self.fail(field, "Must be greater than or equal to 0");
            return None;
        }
        if value > i32::MAX as i64 {
            self.fail(field, format!("Must be at most {}", i32::MAX));
            return None;
        }
        Some(value as i32)
    }

    fn email(&mut self, field: &str) -> Option<String> {
        let email = self.string(field, true, "Invalid email address")?;
        if !is_valid_email(&email) {
            self.fail(field, "Invalid email address");
            return None;
        }
        Some(email.trim().to_lowercase())
    }

    fn uuid(&mut self, field: &str, required: bool) -> Option<Uuid> {
        let raw = self.string(field, required, "Required")?;
        match Uuid::parse_str(&raw) {
            Ok(id) => Some(id),
            Err(_) => {
                self.fail(field, "Invalid identifier");
                None
            }
        }
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, ValidationErrors> {
        match value {
            Some(v) if self.errors.is_empty() => Ok(v),
            _ => Err(ValidationErrors(self.errors)),
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_RE.is_match(slug)
}

/// Suggest a slug from an organization name: lowercase, whitespace to hyphens,
/// anything outside `[a-z0-9-]` dropped.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let hyphenated = WHITESPACE_RE.replace_all(&lowered, "-");
    NON_SLUG_RE.replace_all(&hyphenated, "").into_owned()
}

/// Full outline payload for create
pub fn create_outline(body: &Value) -> Result<OutlineFields, ValidationErrors> {
    let mut v = Validator::new(body)?;
    let header = v.string("header", true, "Header is required");
    let section_type = v.choice::<SectionType>("sectionType", true);
    let status = v.choice::<OutlineStatus>("status", true);
    let target = v.count("target", true);
    let limit = v.count("limit", true);
    let reviewer = v.choice::<Reviewer>("reviewer", true);

    let fields = match (header, section_type, status, target, limit, reviewer) {
        (Some(header), Some(section_type), Some(status), Some(target), Some(limit), Some(reviewer)) => {
            Some(OutlineFields {
                header,
                section_type,
                status,
                target,
                limit,
                reviewer,
            })
        }
        _ => None,
    };
    v.finish(fields)
}

/// Any subset of outline fields, same per-field rules as create
pub fn update_outline(body: &Value) -> Result<OutlinePatch, ValidationErrors> {
    let mut v = Validator::new(body)?;
    let patch = OutlinePatch {
        header: v.string("header", false, "Header is required"),
        section_type: v.choice::<SectionType>("sectionType", false),
        status: v.choice::<OutlineStatus>("status", false),
        target: v.count("target", false),
        limit: v.count("limit", false),
        reviewer: v.choice::<Reviewer>("reviewer", false),
    };
    v.finish(Some(patch))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrganization {
    pub name: String,
    pub slug: String,
}

pub fn create_organization(body: &Value) -> Result<CreateOrganization, ValidationErrors> {
    let mut v = Validator::new(body)?;
    let name = v.string("name", true, "Organization name is required");
    let slug = v.string("slug", true, "Slug is required").and_then(|slug| {
        if is_valid_slug(&slug) {
            Some(slug)
        } else {
            v.fail(
                "slug",
                "Slug must contain only lowercase letters, numbers, and hyphens",
            );
            None
        }
    });
    let input = match (name, slug) {
        (Some(name), Some(slug)) => Some(CreateOrganization { name, slug }),
        _ => None,
    };
    v.finish(input)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteMember {
    pub email: String,
    pub role: MemberRole,
    pub organization_id: Option<Uuid>,
}

pub fn invite_member(body: &Value) -> Result<InviteMember, ValidationErrors> {
    let mut v = Validator::new(body)?;
    let email = v.email("email");
    let role = match v.lookup("role", true) {
        Some(Value::String(role)) if role == "member" => Some(MemberRole::Member),
        Some(_) => {
            v.fail("role", "Invalid literal value, expected \"member\"");
            None
        }
        None => None,
    };
    let organization_id = v.uuid("organizationId", false);
    let input = match (email, role) {
        (Some(email), Some(role)) => Some(InviteMember {
            email,
            role,
            organization_id,
        }),
        _ => None,
    };
    v.finish(input)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUp {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub fn sign_up(body: &Value) -> Result<SignUp, ValidationErrors> {
    let mut v = Validator::new(body)?;
    let name = v.string("name", true, "Name is required");
    let email = v.email("email");
    let password = v.string("password", true, "Password is required").and_then(|password| {
        let len = password.chars().count();
        if len < MIN_PASSWORD_LENGTH {
            v.fail("password", format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH));
            None
        } else if len > MAX_PASSWORD_LENGTH {
            v.fail("password", format!("Password must be at most {} characters", MAX_PASSWORD_LENGTH));
            None
        } else {
            Some(password)
        }
    });
    let input = match (name, email, password) {
        (Some(name), Some(email), Some(password)) => Some(SignUp { name, email, password }),
        _ => None,
    };
    v.finish(input)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignIn {
    pub email: String,
    pub password: String,
}

pub fn sign_in(body: &Value) -> Result<SignIn, ValidationErrors> {
    let mut v = Validator::new(body)?;
    let email = v.string("email", true, "Email is required");
    let password = v.string("password", true, "Password is required");
    let input = match (email, password) {
        (Some(email), Some(password)) => Some(SignIn {
            email: email.trim().to_lowercase(),
            password,
        }),
        _ => None,
    };
    v.finish(input)
}

/// Required identifier field, e.g. `invitationId` or `memberId`
pub fn required_id(body: &Value, field: &str) -> Result<Uuid, ValidationErrors> {
    let mut v = Validator::new(body)?;
    let id = v.uuid(field, true);
    v.finish(id)
}

/// Optional identifier field. Explicit `null` reads as `None`.
pub fn optional_id(body: &Value, field: &str) -> Result<Option<Uuid>, ValidationErrors> {
    let mut v = Validator::new(body)?;
    let id = v.uuid(field, false);
    v.finish(Some(id))
}
