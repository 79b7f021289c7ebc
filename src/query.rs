//! Search query values and their domain validation.

use tracing::error;

use crate::portal::{PortalError, SearchOptions};

/// One immutable catalog query. Every request carries all of its fields;
/// empty substrings and the `"0"` codes mean "match everything".
#[derive(Debug, Clone)]
pub struct Query {
    /// Course name substring.
    pub coursename: String,
    /// Teacher name substring.
    pub teachername: String,
    /// Term code like `24-25-2`.
    pub yearandseme: String,
    /// Course type code.
    pub coursetype: String,
    /// Department code.
    pub yuanxi: String,
}

impl Query {
    /// The POST form body for one page request, in the field order the
    /// portal expects.
    pub fn form_body(&self, startrow: u64, vercode: &str) -> Vec<(&'static str, String)> {
        vec![
            ("coursename", self.coursename.clone()),
            ("teachername", self.teachername.clone()),
            ("yearandseme", self.yearandseme.clone()),
            ("coursetype", self.coursetype.clone()),
            ("yuanxi", self.yuanxi.clone()),
            ("startrow", startrow.to_string()),
            ("vercode", vercode.to_owned()),
        ]
    }

    /// Deterministic output file name encoding every query field.
    pub fn output_file(&self) -> String {
        format!(
            "CN{}_TN{}_YS{}_CT{}_YX{}.csv",
            self.coursename, self.teachername, self.yearandseme, self.coursetype, self.yuanxi
        )
    }

    /// Check the code fields against the portal's option tables and the term
    /// code against its format. Enumerates the valid codes to the log before
    /// failing, so the user can correct the query without another lookup.
    pub fn validate(&self, options: &SearchOptions) -> Result<(), PortalError> {
        if !options.departments.contains_key(&self.yuanxi) {
            error!("valid yuanxi codes and meanings are:");
            for (code, label) in &options.departments {
                error!("  {code}: {label}");
            }
            return Err(PortalError::Validation(format!(
                "unknown yuanxi code: {}",
                self.yuanxi
            )));
        }

        if !options.course_types.contains_key(&self.coursetype) {
            error!("valid coursetype codes and meanings are:");
            for (code, label) in &options.course_types {
                error!("  {code}: {label}");
            }
            return Err(PortalError::Validation(format!(
                "unknown coursetype code: {}",
                self.coursetype
            )));
        }

        match TermCode::parse(&self.yearandseme) {
            Some(term) if term.is_valid() => Ok(()),
            Some(term) => {
                error!("invalid yearandseme: {}", self.yearandseme);
                error!("did you mean {}?", term.suggestion());
                Err(PortalError::Validation(format!(
                    "invalid term code {}, did you mean {}?",
                    self.yearandseme,
                    term.suggestion()
                )))
            }
            None => Err(PortalError::Validation(format!(
                "malformed term code: {}",
                self.yearandseme
            ))),
        }
    }
}

/// A parsed `start-end-semester` term code, e.g. `24-25-2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermCode {
    pub start: i32,
    pub end: i32,
    pub semester: i32,
}

impl TermCode {
    /// Parse the three `-`-separated integers without range checks.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split('-').map(str::parse::<i32>);
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(Ok(start)), Some(Ok(end)), Some(Ok(semester)), None) => Some(Self {
                start,
                end,
                semester,
            }),
            _ => None,
        }
    }

    /// A term spans consecutive academic years and one of three semesters.
    pub fn is_valid(&self) -> bool {
        self.end == self.start + 1 && (1..=3).contains(&self.semester)
    }

    /// Closest valid term code, offered in validation error messages.
    pub fn suggestion(&self) -> String {
        let start = self.start.min(self.end);
        format!("{}-{}-{}", start, start + 1, self.semester.clamp(1, 3))
    }
}
