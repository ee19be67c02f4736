//! Filtering, search and ordering for the expertise listing

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite};

use crate::models::ExpertiseStatus;

/// Query string accepted by the expertise listing
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ExpertiseQuery {
    pub date_of_last_change: Option<DateTime<Utc>>,
    pub expertise_status: Option<ExpertiseStatus>,
    pub work_program_title: Option<String>,
    pub work_program_qualification: Option<String>,
    pub work_program_discipline_code: Option<String>,
    pub editor_first_name: Option<String>,
    pub editor_last_name: Option<String>,
    pub expert_first_name: Option<String>,
    pub expert_last_name: Option<String>,
    /// Whitespace or comma separated terms, all of which must match
    pub search: Option<String>,
    /// Comma separated fields, `-` prefix for descending
    pub ordering: Option<String>,
}

/// Columns a client may order by
const ORDERING_FIELDS: &[(&str, &str)] = &[
    ("id", "e.id"),
    ("date_of_last_change", "e.date_of_last_change"),
    ("expertise_status", "e.expertise_status"),
    ("work_program_title", "wp.title"),
];

impl ExpertiseQuery {
    /// Append exact filters and search terms to a query over `expertises e`
    /// joined with `work_programs wp`.
    pub fn push_filters(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        if let Some(date) = self.date_of_last_change {
            builder.push(" AND e.date_of_last_change = ").push_bind(date);
        }
        if let Some(status) = self.expertise_status {
            builder
                .push(" AND e.expertise_status = ")
                .push_bind(status.as_str());
        }

        let program_columns = [
            ("wp.title", &self.work_program_title),
            ("wp.qualification", &self.work_program_qualification),
            ("wp.discipline_code", &self.work_program_discipline_code),
        ];
        for (column, value) in program_columns {
            if let Some(value) = value {
                builder
                    .push(format!(" AND {} = ", column))
                    .push_bind(value.clone());
            }
        }

        let people_columns = [
            (Person::Editor, "first_name", &self.editor_first_name),
            (Person::Editor, "last_name", &self.editor_last_name),
            (Person::Expert, "first_name", &self.expert_first_name),
            (Person::Expert, "last_name", &self.expert_last_name),
        ];
        for (person, column, value) in people_columns {
            if let Some(value) = value {
                builder
                    .push(" AND ")
                    .push(person.exists_prefix())
                    .push(format!("pu.{} = ", column))
                    .push_bind(value.clone())
                    .push(")");
            }
        }

        for term in self.search_terms() {
            let pattern = like_pattern(term);
            builder.push(" AND (");
            push_like(builder, "wp.title", &pattern);
            builder.push(" OR ");
            push_like(builder, "wp.qualification", &pattern);
            builder.push(" OR ");
            push_like(builder, "wp.discipline_code", &pattern);
            for person in [Person::Editor, Person::Expert] {
                builder.push(" OR ").push(person.exists_prefix()).push("(");
                push_like(builder, "pu.first_name", &pattern);
                builder.push(" OR ");
                push_like(builder, "pu.last_name", &pattern);
                builder.push("))");
            }
            builder.push(")");
        }
    }

    /// Append the ORDER BY clause. Unknown fields are ignored and the id
    /// always breaks ties.
    pub fn push_ordering(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        let mut clauses = Vec::new();
        let mut has_id = false;

        for field in self
            .ordering
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
        {
            let (name, direction) = match field.strip_prefix('-') {
                Some(name) => (name, "DESC"),
                None => (field, "ASC"),
            };
            if let Some((_, column)) = ORDERING_FIELDS.iter().find(|(f, _)| *f == name) {
                has_id |= name == "id";
                clauses.push(format!("{} {}", column, direction));
            }
        }

        if !has_id {
            clauses.push("e.id ASC".to_string());
        }

        builder.push(" ORDER BY ").push(clauses.join(", "));
    }

    pub fn search_terms(&self) -> impl Iterator<Item = &str> {
        self.search
            .as_deref()
            .unwrap_or_default()
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|term| !term.is_empty())
    }
}

#[derive(Clone, Copy)]
enum Person {
    Editor,
    Expert,
}

impl Person {
    /// Opens an EXISTS subquery binding the person's user row as `pu`
    fn exists_prefix(&self) -> &'static str {
        match self {
            Person::Editor => {
                "EXISTS (SELECT 1 FROM work_program_editors pe \
                 JOIN users pu ON pu.id = pe.user_id \
                 WHERE pe.work_program_id = wp.id AND "
            }
            Person::Expert => {
                "EXISTS (SELECT 1 FROM user_expertises px \
                 JOIN users pu ON pu.id = px.expert_id \
                 WHERE px.expertise_id = e.id AND "
            }
        }
    }
}

fn push_like(builder: &mut QueryBuilder<'_, Sqlite>, column: &str, pattern: &str) {
    builder
        .push(column)
        .push(" LIKE ")
        .push_bind(pattern.to_string())
        .push(" ESCAPE '\\'");
}

/// Substring pattern for LIKE with wildcards in the term escaped
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
