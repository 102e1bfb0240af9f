//! Messages and schedules.
//!
//! These are transient work items rather than authoritative state. They
//! are written straight to `type/id` with no revision check, and the last
//! write wins.

use chrono::{DateTime, Utc};
use revdoc_kv::KvSubstrate;
use revdoc_types::{
    format_utc, parse_utc, pointer_key, validate_doc_id, DocBody, DocType, Document, Fields,
    Message, Schedule, ScheduleFlavour, ScheduleSpec,
};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::codec;
use crate::error::StoreResult;
use crate::outcome::GetManyOptions;
use crate::store::DocumentStore;

impl<S: KvSubstrate> DocumentStore<S> {
    /// Store a message for `action` carrying `fields`. Returns the
    /// generated message id (a time-ordered UUID).
    ///
    /// An `action` entry in `fields` is dropped; the argument wins.
    pub fn put_msg(&self, action: &str, mut fields: Fields) -> StoreResult<String> {
        fields.remove("action");
        let id = Uuid::now_v7().to_string();
        let doc = Document::new(
            DocType::msgs(),
            id.clone(),
            DocBody::Message(Message {
                action: action.to_string(),
                fields,
            }),
        );
        self.write_direct(&doc)?;
        debug!(id = %id, action, "stored message");
        Ok(id)
    }

    /// Store a timer for `owner` that emits `msg` when due.
    ///
    /// Returns the schedule id, or `None` (writing nothing) if the spec has
    /// no upcoming firing time. The id is derived from flavour, owner and
    /// firing time, so re-scheduling the same timer overwrites it.
    pub fn put_schedule(
        &self,
        flavour: ScheduleFlavour,
        owner: &str,
        spec: &ScheduleSpec,
        msg: Value,
    ) -> StoreResult<Option<String>> {
        validate_doc_id(owner)?;
        let Some(at) = spec.next_fire(Utc::now())? else {
            debug!(owner, spec = %spec, "schedule never fires; not stored");
            return Ok(None);
        };

        let id = format!("{flavour}-{owner}-{}", at.format("%Y%m%d%H%M%S"));
        let doc = Document::new(
            DocType::schedules(),
            id.clone(),
            DocBody::Schedule(Schedule {
                flavour,
                original: spec.to_string(),
                at: format_utc(at),
                owner: owner.to_string(),
                msg,
                extra: Fields::new(),
            }),
        );
        self.write_direct(&doc)?;
        debug!(id = %id, "stored schedule");
        Ok(Some(id))
    }

    /// Remove a schedule. Returns `true` if it existed.
    pub fn delete_schedule(&self, id: &str) -> StoreResult<bool> {
        if validate_doc_id(id).is_err() {
            return Ok(false);
        }
        Ok(self.kv.delete(&pointer_key(DocType::SCHEDULES, id))? > 0)
    }

    /// Every stored message.
    pub fn get_msgs(&self) -> StoreResult<Vec<Document>> {
        self.get_many(DocType::MSGS, None, GetManyOptions::default())
    }

    /// Schedules due at or before `now`, earliest first.
    pub fn due_schedules(&self, now: DateTime<Utc>) -> StoreResult<Vec<Document>> {
        let mut due: Vec<(DateTime<Utc>, Document)> = Vec::new();
        for doc in self.get_many(DocType::SCHEDULES, None, GetManyOptions::default())? {
            let DocBody::Schedule(schedule) = &doc.body else {
                continue;
            };
            match parse_utc(&schedule.at) {
                Ok(at) if at <= now => due.push((at, doc)),
                Ok(_) => {}
                Err(e) => {
                    warn!(id = %doc.id, error = %e, "skipping schedule with unreadable time")
                }
            }
        }
        due.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(due.into_iter().map(|(_, doc)| doc).collect())
    }

    fn write_direct(&self, doc: &Document) -> StoreResult<()> {
        let payload = codec::encode(doc, None)?;
        self.kv.set(&doc.pointer_key(), &payload)?;
        Ok(())
    }
}
