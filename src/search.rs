use crate::enrich::parse_tags;
use crate::error::{BoardError, Result};
use crate::model::Ticket;
use regex::Regex;

/// Ticket search query.
///
/// - `login` matches a case-insensitive substring in any text field
/// - `title:login` limits the match to one field
/// - `regex:^T-00` matches a regular expression
/// - `stage:regex:Ready.*` combines both
#[derive(Debug, Clone)]
pub enum SearchQuery {
    Simple(String),
    Regex(Regex),
    Field {
        field: SearchField,
        pattern: Box<SearchQuery>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Id,
    Name,
    Title,
    Description,
    Tag,
    Stage,
    Priority,
    Intention,
}

const TEXT_FIELDS: [SearchField; 5] = [
    SearchField::Id,
    SearchField::Name,
    SearchField::Title,
    SearchField::Description,
    SearchField::Tag,
];

impl SearchQuery {
    pub fn parse(query: &str) -> Result<Self> {
        let query = query.trim();
        if query.is_empty() {
            return Err(BoardError::Parse("Empty search query".to_string()));
        }

        if let Some((prefix, rest)) = query.split_once(':') {
            if let Ok(field) = prefix.parse::<SearchField>() {
                return Ok(SearchQuery::Field {
                    field,
                    pattern: Box::new(Self::parse(rest)?),
                });
            }
            if prefix.eq_ignore_ascii_case("regex") {
                let regex = Regex::new(rest)
                    .map_err(|e| BoardError::Parse(format!("Invalid regex: {}", e)))?;
                return Ok(SearchQuery::Regex(regex));
            }
        }

        Ok(SearchQuery::Simple(query.to_lowercase()))
    }

    pub fn matches(&self, ticket: &Ticket) -> bool {
        match self {
            SearchQuery::Field { field, pattern } => pattern.matches_values(&field_values(ticket, *field)),
            _ => TEXT_FIELDS
                .iter()
                .any(|field| self.matches_values(&field_values(ticket, *field))),
        }
    }

    fn matches_values(&self, values: &[String]) -> bool {
        match self {
            SearchQuery::Simple(needle) => values.iter().any(|v| v.to_lowercase().contains(needle)),
            SearchQuery::Regex(regex) => values.iter().any(|v| regex.is_match(v)),
            // Nested field prefixes are not meaningful.
            SearchQuery::Field { .. } => false,
        }
    }
}

fn field_values(ticket: &Ticket, field: SearchField) -> Vec<String> {
    match field {
        SearchField::Id => vec![ticket.id.clone()],
        SearchField::Name => vec![ticket.name.clone()],
        SearchField::Title => vec![ticket.title.clone()],
        SearchField::Description => vec![ticket.description.clone()],
        SearchField::Tag => parse_tags(ticket.tags.as_deref()),
        SearchField::Stage => vec![ticket.stage.to_string()],
        SearchField::Priority => vec![ticket.priority.to_string()],
        SearchField::Intention => ticket.intention.iter().cloned().collect(),
    }
}

impl std::str::FromStr for SearchField {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "id" => Ok(SearchField::Id),
            "name" | "number" => Ok(SearchField::Name),
            "title" => Ok(SearchField::Title),
            "description" | "desc" | "details" => Ok(SearchField::Description),
            "tag" | "tags" => Ok(SearchField::Tag),
            "stage" => Ok(SearchField::Stage),
            "priority" => Ok(SearchField::Priority),
            "intention" => Ok(SearchField::Intention),
            _ => Err(BoardError::Parse(format!("Unknown search field: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, Stage};

    fn sample() -> Ticket {
        Ticket::new("a1b2c3".into(), "T-0042".into(), "Checkout page times out".into())
            .with_description("Payment provider call blocks the request thread")
            .with_tags("payments, perf")
            .with_stage(Stage::QaInProgress)
            .with_priority(Priority::High)
            .with_intention("Will Do")
    }

    #[test]
    fn test_simple_search_covers_text_fields() {
        let ticket = sample();
        for term in ["checkout", "PROVIDER", "t-0042", "perf", "a1b2"] {
            assert!(SearchQuery::parse(term).unwrap().matches(&ticket), "{term}");
        }
        assert!(!SearchQuery::parse("refund").unwrap().matches(&ticket));
    }

    #[test]
    fn test_simple_search_ignores_facets() {
        // Stage and priority only match when asked for explicitly.
        let ticket = sample();
        assert!(!SearchQuery::parse("high").unwrap().matches(&ticket));
        assert!(SearchQuery::parse("priority:high").unwrap().matches(&ticket));
    }

    #[test]
    fn test_field_search() {
        let ticket = sample();
        assert!(SearchQuery::parse("title:checkout").unwrap().matches(&ticket));
        assert!(!SearchQuery::parse("title:payment").unwrap().matches(&ticket));
        assert!(SearchQuery::parse("desc:payment").unwrap().matches(&ticket));
        assert!(SearchQuery::parse("tag:payments").unwrap().matches(&ticket));
        assert!(SearchQuery::parse("stage:qa in").unwrap().matches(&ticket));
        assert!(SearchQuery::parse("intention:will").unwrap().matches(&ticket));
    }

    #[test]
    fn test_regex_search() {
        let ticket = sample();
        assert!(SearchQuery::parse("regex:^T-\\d{4}$").unwrap().matches(&ticket));
        assert!(SearchQuery::parse("name:regex:0042").unwrap().matches(&ticket));
        assert!(!SearchQuery::parse("title:regex:^Payment").unwrap().matches(&ticket));
        assert!(SearchQuery::parse("regex:[broken").is_err());
    }

    #[test]
    fn test_empty_query_is_rejected() {
        assert!(SearchQuery::parse("   ").is_err());
    }

    #[test]
    fn test_unknown_prefix_is_plain_text() {
        let ticket = sample().with_description("see http://status.example");
        assert!(SearchQuery::parse("http://status").unwrap().matches(&ticket));
    }
}
