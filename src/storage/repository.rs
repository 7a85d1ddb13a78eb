use super::eta::EtaScheduler;
use super::fields::{self, FieldMap, RawRecord};
use crate::{
    backend::BoardBackend,
    config::BoardConfig,
    error::{BoardError, Result},
    model::{
        AiSuggestions, BlockerCandidate, Dependency, EtaResponse, FieldSpec, NewTicket, Stage,
        Ticket,
    },
    validation,
};
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tempfile::NamedTempFile;

const TICKETS_FILE: &str = "tickets.json";
const DEPENDENCIES_FILE: &str = "dependencies.json";
const COMMENTS_FILE: &str = "comments.json";
const COUNTER_FILE: &str = ".id";

/// A status comment left alongside a stage change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusComment {
    pub ticket_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Raw records and edges as last read from disk. `None` means not loaded.
#[derive(Default)]
struct BoardCache {
    records: Option<Vec<RawRecord>>,
    dependencies: Option<Vec<Dependency>>,
}

impl BoardCache {
    fn invalidate(&mut self) {
        self.records = None;
        self.dependencies = None;
    }
}

pub struct FileBackend {
    data_path: PathBuf,
    fields: FieldMap,
    name_prefix: String,
    id_length: usize,
    required_fields: BTreeMap<Stage, Vec<FieldSpec>>,
    today: Option<NaiveDate>,
    cache: Mutex<BoardCache>,
}

impl FileBackend {
    pub fn new(config: &BoardConfig, project_root: &Path) -> Self {
        Self {
            data_path: config.data_path(project_root),
            fields: FieldMap::new(config.board.field_prefix.clone()),
            name_prefix: config.board.name_prefix.clone(),
            id_length: config.board.id_length,
            required_fields: config.required_fields.clone(),
            today: None,
            cache: Mutex::new(BoardCache::default()),
        }
    }

    /// Pin the scheduling date instead of using the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Create the data directory and empty data files if missing.
    pub fn init(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_path)?;
        for file in [TICKETS_FILE, DEPENDENCIES_FILE, COMMENTS_FILE] {
            let path = self.data_path.join(file);
            if !path.exists() {
                self.atomic_write(&path, "[]\n")?;
            }
        }
        Ok(())
    }

    pub fn invalidate_cache(&self) {
        self.cache().invalidate();
    }

    fn cache(&self) -> MutexGuard<'_, BoardCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn records(&self) -> Result<Vec<RawRecord>> {
        if let Some(records) = &self.cache().records {
            return Ok(records.clone());
        }

        let values: Vec<Value> = self.read_json(TICKETS_FILE)?;
        let records: Vec<RawRecord> = values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match value {
                Value::Object(record) => Some(record),
                other => {
                    tracing::warn!(index, kind = %json_kind(&other), "Skipping non-object ticket record");
                    None
                }
            })
            .collect();

        self.cache().records = Some(records.clone());
        Ok(records)
    }

    fn dependencies(&self) -> Result<Vec<Dependency>> {
        if let Some(dependencies) = &self.cache().dependencies {
            return Ok(dependencies.clone());
        }
        let dependencies: Vec<Dependency> = self.read_json(DEPENDENCIES_FILE)?;
        self.cache().dependencies = Some(dependencies.clone());
        Ok(dependencies)
    }

    /// Decoded tickets without dependency links. Undecodable records are
    /// skipped with a warning.
    fn decoded(&self) -> Result<Vec<Ticket>> {
        Ok(self
            .records()?
            .iter()
            .filter_map(|record| match self.fields.decode_ticket(record) {
                Ok(ticket) => Some(ticket),
                Err(e) => {
                    tracing::warn!(
                        id = self.fields.get_str(record, fields::ID).unwrap_or("?"),
                        error = %e,
                        "Failed to decode ticket record"
                    );
                    None
                }
            })
            .collect())
    }

    pub fn tickets(&self) -> Result<Vec<Ticket>> {
        let mut tickets = self.decoded()?;
        super::link_tickets(&mut tickets, &self.dependencies()?);
        Ok(tickets)
    }

    pub fn get(&self, id: &str) -> Result<Ticket> {
        self.tickets()?
            .into_iter()
            .find(|t| t.id == id || t.name == id)
            .ok_or_else(|| BoardError::NotFound(id.to_string()))
    }

    pub fn comments(&self) -> Result<Vec<StatusComment>> {
        self.read_json(COMMENTS_FILE)
    }

    fn update_record(&self, id: &str, apply: impl FnOnce(&mut RawRecord)) -> Result<()> {
        let mut records = self.records()?;
        let record = records
            .iter_mut()
            .find(|r| self.fields.get_str(r, fields::ID) == Some(id))
            .ok_or_else(|| BoardError::NotFound(id.to_string()))?;
        apply(record);
        self.write_records(records)
    }

    fn write_records(&self, records: Vec<RawRecord>) -> Result<()> {
        let values: Vec<Value> = records.iter().cloned().map(Value::Object).collect();
        self.write_json(TICKETS_FILE, &values)?;
        self.cache().records = Some(records);
        Ok(())
    }

    fn write_dependencies(&self, dependencies: Vec<Dependency>) -> Result<()> {
        self.write_json(DEPENDENCIES_FILE, &dependencies)?;
        self.cache().dependencies = Some(dependencies);
        Ok(())
    }

    fn read_json<T: serde::de::DeserializeOwned + Default>(&self, file: &str) -> Result<T> {
        let path = self.data_path.join(file);
        if !path.exists() {
            return Ok(T::default());
        }
        let content = std::fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(T::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_json<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.data_path)?;
        let mut content = serde_json::to_string_pretty(value)?;
        content.push('\n');
        self.atomic_write(&self.data_path.join(file), &content)
    }

    fn generate_id(&self) -> String {
        const ALPHABET: [char; 36] = [
            '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g',
            'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x',
            'y', 'z',
        ];
        nanoid::format(nanoid::rngs::default, &ALPHABET, self.id_length)
    }

    fn next_number(&self) -> Result<u64> {
        let counter_path = self.data_path.join(COUNTER_FILE);
        std::fs::create_dir_all(&self.data_path)?;

        let current = if counter_path.exists() {
            let content = std::fs::read_to_string(&counter_path)?;
            content.trim().parse::<u64>().unwrap_or(0)
        } else {
            0
        };

        let next = current + 1;
        self.atomic_write(&counter_path, &next.to_string())?;
        Ok(next)
    }

    fn scheduling_date(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Write through a temp file in the same directory, then rename over the target.
    fn atomic_write(&self, target_path: &Path, content: &str) -> Result<()> {
        let target_dir = target_path.parent().ok_or_else(|| {
            BoardError::Storage("Target path has no parent directory".to_string())
        })?;

        let mut temp_file = NamedTempFile::new_in(target_dir)
            .map_err(|e| BoardError::Storage(format!("Failed to create temp file: {}", e)))?;

        use std::io::Write;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| BoardError::Storage(format!("Failed to write to temp file: {}", e)))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| BoardError::Storage(format!("Failed to sync temp file: {}", e)))?;
        temp_file
            .persist(target_path)
            .map_err(|e| BoardError::Storage(format!("Failed to persist temp file: {}", e)))?;

        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl BoardBackend for FileBackend {
    async fn fetch_tickets(&self) -> Result<Vec<Ticket>> {
        self.tickets()
    }

    async fn fetch_etas(
        &self,
        dev_count: u32,
        prioritized: Option<&[String]>,
    ) -> Result<EtaResponse> {
        let tickets = self.decoded()?;
        Ok(EtaScheduler::new(dev_count, self.scheduling_date()).schedule(&tickets, prioritized))
    }

    async fn required_fields_for_stage(&self, stage: Stage) -> Result<Vec<FieldSpec>> {
        Ok(self.required_fields.get(&stage).cloned().unwrap_or_default())
    }

    async fn search_potential_blockers(
        &self,
        term: &str,
        current_id: &str,
        exclude_ids: &[String],
    ) -> Result<Vec<BlockerCandidate>> {
        super::find_blockers(&self.decoded()?, term, current_id, exclude_ids)
    }

    async fn update_ticket_stage(
        &self,
        ticket_id: &str,
        stage: Stage,
        sort_order: Option<f64>,
    ) -> Result<()> {
        if let Some(sort_order) = sort_order {
            validation::validate_sort_order(sort_order)?;
        }
        tracing::info!(ticket_id, stage = %stage, ?sort_order, "Writing stage");
        self.update_record(ticket_id, |record| {
            self.fields
                .set(record, fields::STAGE, Value::from(stage.label()));
            if let Some(sort_order) = sort_order {
                self.fields
                    .set(record, fields::SORT_ORDER, Value::from(sort_order));
            }
        })
    }

    async fn update_ticket_sort_order(&self, ticket_id: &str, sort_order: f64) -> Result<()> {
        validation::validate_sort_order(sort_order)?;
        tracing::debug!(ticket_id, sort_order, "Writing sort order");
        self.update_record(ticket_id, |record| {
            self.fields
                .set(record, fields::SORT_ORDER, Value::from(sort_order));
        })
    }

    async fn save_transition_fields(
        &self,
        ticket_id: &str,
        stage: Stage,
        values: &BTreeMap<String, String>,
    ) -> Result<()> {
        tracing::info!(ticket_id, stage = %stage, fields = values.len(), "Writing guided transition");
        self.update_record(ticket_id, |record| {
            for (name, value) in values {
                self.fields
                    .set(record, name, Value::from(value.trim().to_string()));
            }
            self.fields
                .set(record, fields::STAGE, Value::from(stage.label()));
        })
    }

    async fn create_dependency(&self, blocked_id: &str, blocking_id: &str) -> Result<Dependency> {
        let mut dependencies = self.dependencies()?;
        super::check_edge(&self.decoded()?, &dependencies, blocked_id, blocking_id)?;

        let dependency = Dependency {
            id: self.generate_id(),
            blocking_ticket_id: blocking_id.to_string(),
            blocked_ticket_id: blocked_id.to_string(),
        };
        dependencies.push(dependency.clone());
        self.write_dependencies(dependencies)?;
        Ok(dependency)
    }

    async fn remove_dependency(&self, dependency_id: &str) -> Result<()> {
        let mut dependencies = self.dependencies()?;
        let before = dependencies.len();
        dependencies.retain(|d| d.id != dependency_id);
        if dependencies.len() == before {
            return Err(BoardError::DependencyNotFound(dependency_id.to_string()));
        }
        self.write_dependencies(dependencies)
    }

    async fn post_status_comment(&self, ticket_id: &str, body: &str) -> Result<()> {
        validation::validate_comment(body)?;
        if !self.decoded()?.iter().any(|t| t.id == ticket_id) {
            return Err(BoardError::NotFound(ticket_id.to_string()));
        }
        let mut comments = self.comments()?;
        comments.push(StatusComment {
            ticket_id: ticket_id.to_string(),
            body: body.to_string(),
            created_at: Utc::now(),
        });
        self.write_json(COMMENTS_FILE, &comments)
    }

    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket> {
        let tickets = self.decoded()?;
        let sort_order = super::next_sort_order(&tickets);
        // Validate before the counter moves.
        validation::validate_title(&ticket.title)?;
        let name = super::format_name(&self.name_prefix, self.next_number()?);
        let created = super::build_ticket(self.generate_id(), name, ticket, sort_order)?;

        let mut records = self.records()?;
        records.push(self.fields.encode_ticket(&created));
        self.write_records(records)?;
        tracing::info!(id = %created.id, name = %created.name, "Created ticket");
        Ok(created)
    }

    async fn ai_enhance(&self, _title: &str, _description: &str) -> Result<AiSuggestions> {
        Err(BoardError::Unsupported(
            "AI enhancement is not available for file-backed boards".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup() -> (FileBackend, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = BoardConfig::default();
        config.required_fields.insert(
            Stage::ReadyForDevelopment,
            vec![FieldSpec::new("Budget__c", "Budget")],
        );
        let backend = FileBackend::new(&config, temp_dir.path());
        backend.init().unwrap();
        (backend, temp_dir)
    }

    fn write_raw(backend: &FileBackend, records: Value) {
        std::fs::write(
            backend.data_path().join(TICKETS_FILE),
            serde_json::to_string(&records).unwrap(),
        )
        .unwrap();
        backend.invalidate_cache();
    }

    #[tokio::test]
    async fn test_create_assigns_name_and_sort_order() {
        let (backend, _dir) = setup();
        let first = backend.create_ticket(NewTicket::new("First")).await.unwrap();
        let second = backend.create_ticket(NewTicket::new("Second")).await.unwrap();

        assert_eq!(first.name, "T-0001");
        assert_eq!(second.name, "T-0002");
        assert_eq!(first.sort_order, 1.0);
        assert_eq!(second.sort_order, 2.0);
        assert_eq!(first.id.len(), 12);
        assert_eq!(second.stage, Stage::Backlog);

        backend.invalidate_cache();
        let tickets = backend.fetch_tickets().await.unwrap();
        assert_eq!(tickets.len(), 2);
        assert_eq!(backend.get("T-0002").unwrap().title, "Second");
    }

    #[tokio::test]
    async fn test_invalid_title_does_not_consume_a_number() {
        let (backend, _dir) = setup();
        assert!(backend.create_ticket(NewTicket::new("  ")).await.is_err());
        let ticket = backend.create_ticket(NewTicket::new("Real")).await.unwrap();
        assert_eq!(ticket.name, "T-0001");
    }

    #[tokio::test]
    async fn test_bad_records_are_skipped() {
        let (backend, _dir) = setup();
        write_raw(
            &backend,
            json!([
                { "Id": "ok", "Name": "T-1", "delivery__StageNamePk__c": "Merging" },
                { "Id": "bad", "Name": "T-2", "StageNamePk__c": "Limbo" },
                "not a record",
                { "Name": "no id" }
            ]),
        );
        let tickets = backend.fetch_tickets().await.unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].stage, Stage::Merging);
    }

    #[tokio::test]
    async fn test_stage_write_keeps_prefixed_keys() {
        let (backend, dir) = setup();
        write_raw(
            &backend,
            json!([{ "Id": "a", "delivery__StageNamePk__c": "Backlog", "Custom__c": 1 }]),
        );
        backend
            .update_ticket_stage("a", Stage::ScopingInProgress, Some(7.5))
            .await
            .unwrap();

        let raw = std::fs::read_to_string(dir.path().join(".delivery-hub").join(TICKETS_FILE)).unwrap();
        let records: Vec<Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(records[0]["delivery__StageNamePk__c"], json!("Scoping In Progress"));
        assert_eq!(records[0]["SortOrderNumber__c"], json!(7.5));
        assert_eq!(records[0]["Custom__c"], json!(1));
        assert!(records[0].get("StageNamePk__c").is_none());

        let err = backend
            .update_ticket_stage("missing", Stage::Done, None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_guided_save_writes_values_and_stage() {
        let (backend, _dir) = setup();
        let ticket = backend.create_ticket(NewTicket::new("Guided")).await.unwrap();
        let required = backend
            .required_fields_for_stage(Stage::ReadyForDevelopment)
            .await
            .unwrap();
        assert_eq!(required.len(), 1);

        let values = BTreeMap::from([("Budget__c".to_string(), " 1200 ".to_string())]);
        backend
            .save_transition_fields(&ticket.id, Stage::ReadyForDevelopment, &values)
            .await
            .unwrap();
        backend.invalidate_cache();
        let records = backend.records().unwrap();
        assert_eq!(records[0]["Budget__c"], json!("1200"));
        assert_eq!(backend.get(&ticket.id).unwrap().stage, Stage::ReadyForDevelopment);
    }

    #[tokio::test]
    async fn test_dependency_lifecycle() {
        let (backend, _dir) = setup();
        let a = backend.create_ticket(NewTicket::new("Schema")).await.unwrap();
        let b = backend.create_ticket(NewTicket::new("Report")).await.unwrap();

        let edge = backend.create_dependency(&b.id, &a.id).await.unwrap();
        assert!(matches!(
            backend.create_dependency(&b.id, &a.id).await,
            Err(BoardError::InvalidDependency(_))
        ));

        let b_loaded = backend.get(&b.id).unwrap();
        assert!(b_loaded.is_blocked());
        assert_eq!(b_loaded.blocked_by[0].ticket_name.as_deref(), Some("T-0001"));
        assert_eq!(backend.get(&a.id).unwrap().blocking[0].dependency_id, edge.id);

        backend.remove_dependency(&edge.id).await.unwrap();
        assert!(!backend.get(&b.id).unwrap().is_blocked());
        assert!(matches!(
            backend.remove_dependency(&edge.id).await,
            Err(BoardError::DependencyNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_comments_are_appended() {
        let (backend, _dir) = setup();
        let ticket = backend.create_ticket(NewTicket::new("Commented")).await.unwrap();
        backend.post_status_comment(&ticket.id, "first").await.unwrap();
        backend.post_status_comment(&ticket.id, "second").await.unwrap();
        let bodies: Vec<String> = backend.comments().unwrap().into_iter().map(|c| c.body).collect();
        assert_eq!(bodies, vec!["first", "second"]);
        assert!(backend.post_status_comment("nope", "x").await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_etas_uses_pinned_date() {
        let (backend, _dir) = setup();
        let backend = backend.with_today(NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
        let mut new = NewTicket::new("Sized");
        new.developer_days_size = Some(2.0);
        let ticket = backend.create_ticket(new).await.unwrap();
        let etas = backend.fetch_etas(1, None).await.unwrap();
        assert_eq!(etas.eta_for(&ticket.id), NaiveDate::from_ymd_opt(2025, 3, 4));
    }

    #[tokio::test]
    async fn test_ai_enhance_is_unsupported() {
        let (backend, _dir) = setup();
        assert!(matches!(
            backend.ai_enhance("title", "").await,
            Err(BoardError::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_files_read_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(&BoardConfig::default(), temp_dir.path());
        assert!(backend.fetch_tickets().await.unwrap().is_empty());
        assert!(backend.comments().unwrap().is_empty());
    }
}
