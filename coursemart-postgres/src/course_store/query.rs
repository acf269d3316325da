use coursemart::{CourseFilter, PageRequest, TextQuery};
use sqlx::{Postgres, QueryBuilder};

use super::row::COURSE_COLUMNS;

/// SQL Query Builder
///
/// Builds the listing queries of a course filter. Every filter value is bound;
/// only the text search configuration, validated when the store is configured, is
/// written into the SQL.
pub struct FilterQueryBuilder<'a> {
    filter: &'a CourseFilter,
    text_search_config: &'a str,
}

impl<'a> FilterQueryBuilder<'a> {
    pub fn new(filter: &'a CourseFilter, text_search_config: &'a str) -> Self {
        Self {
            filter,
            text_search_config,
        }
    }

    /// `SELECT COUNT(*)` over the matching courses.
    pub fn count(&self) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM course WHERE true");
        self.push_criteria(&mut builder);
        builder
    }

    /// One page of the matching courses, oldest first.
    pub fn page(&self, request: PageRequest) -> QueryBuilder<'static, Postgres> {
        let mut builder =
            QueryBuilder::new(format!("SELECT {COURSE_COLUMNS} FROM course WHERE true"));
        self.push_criteria(&mut builder);
        builder.push(" ORDER BY created_at ASC, course_id ASC LIMIT ");
        builder.push_bind(request.page_size());
        builder.push(" OFFSET ");
        builder.push_bind(request.offset());
        builder
    }

    fn push_criteria(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        if let Some(field) = self.filter.field {
            builder.push(" AND field_id = ");
            builder.push_bind(field.as_uuid());
        }
        if let Some(instructor) = self.filter.instructor {
            builder.push(" AND instructor_id = ");
            builder.push_bind(instructor.as_uuid());
        }
        if let Some(is_complete) = self.filter.is_complete {
            builder.push(" AND is_complete = ");
            builder.push_bind(is_complete);
        }
        if let Some(query) = self.filter.text_query() {
            if query.is_empty() {
                builder.push(" AND false");
            } else {
                builder.push(" AND ");
                push_text_match(builder, self.text_search_config, &query);
            }
        }
    }
}

/// Ranked text search over course titles, most relevant first.
///
/// `query` must not be empty.
pub fn text_search(query: &TextQuery, config: &str) -> QueryBuilder<'static, Postgres> {
    let mut builder =
        QueryBuilder::new(format!("SELECT {COURSE_COLUMNS} FROM course WHERE "));
    push_text_match(&mut builder, config, query);
    builder.push(format!(" ORDER BY ts_rank(to_tsvector('{config}', title), "));
    push_text_rank(&mut builder, config, query);
    builder.push(") DESC, created_at ASC, course_id ASC");
    builder
}

/// `to_tsvector(title) @@ <query>`.
///
/// Bare terms are alternatives unless phrases are given, in which case every
/// phrase is required and the terms only weigh in the rank. Each excluded term is
/// negated.
fn push_text_match(
    builder: &mut QueryBuilder<'static, Postgres>,
    config: &str,
    query: &TextQuery,
) {
    builder.push(format!("to_tsvector('{config}', title) @@ ("));
    if query.phrases().is_empty() {
        builder.push("(");
        push_each(builder, config, "plainto_tsquery", query.terms(), " || ");
        builder.push(")");
    } else {
        push_each(builder, config, "phraseto_tsquery", query.phrases(), " && ");
    }
    for excluded in query.excluded() {
        builder.push(" && (!!");
        push_each(
            builder,
            config,
            "plainto_tsquery",
            std::slice::from_ref(excluded),
            "",
        );
        builder.push(")");
    }
    builder.push(")");
}

/// Any of the positive terms and phrases, for `ts_rank`.
fn push_text_rank(builder: &mut QueryBuilder<'static, Postgres>, config: &str, query: &TextQuery) {
    push_each(builder, config, "plainto_tsquery", query.terms(), " || ");
    if !query.terms().is_empty() && !query.phrases().is_empty() {
        builder.push(" || ");
    }
    push_each(builder, config, "phraseto_tsquery", query.phrases(), " || ");
}

fn push_each(
    builder: &mut QueryBuilder<'static, Postgres>,
    config: &str,
    function: &str,
    values: &[String],
    separator: &str,
) {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            builder.push(separator);
        }
        builder.push(format!("{function}('{config}', "));
        builder.push_bind(value.clone());
        builder.push(")");
    }
}
