use anyhow::{bail, Context};
use chrono::Utc;
use colored::Colorize;
use regex::Regex;
use revdoc_kv::FileKv;
use revdoc_store::{
    ConflictReason, DeleteOutcome, DocumentStore, GetManyOptions, PutOptions, PutOutcome,
    StoreConfig,
};
use revdoc_types::{DocBody, Document, Fields, ScheduleFlavour, ScheduleSpec};
use serde_json::{json, Value};

use crate::cli::*;

type Store = DocumentStore<FileKv>;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let store = open_store(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Put(args) => cmd_put(&store, args, format),
        Command::Get(args) => cmd_get(&store, args, format),
        Command::Delete(args) => cmd_delete(&store, args, format),
        Command::List(args) => cmd_list(&store, args, format),
        Command::Ids(args) => cmd_ids(&store, args, format),
        Command::History(args) => cmd_history(&store, args, format),
        Command::Msg(args) => cmd_msg(&store, args, format),
        Command::Schedule(args) => cmd_schedule(&store, args, format),
        Command::Due => cmd_due(&store, format),
        Command::Purge(args) => cmd_purge(&store, args, format),
    }
}

fn open_store(cli: &Cli) -> anyhow::Result<Store> {
    let config = match &cli.config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default(),
    };
    let kv = FileKv::open(&cli.data)
        .with_context(|| format!("opening {}", cli.data.display()))?;
    Ok(DocumentStore::open(kv, config)?)
}

fn cmd_put(store: &Store, args: PutArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut fields = parse_object(&args.body)?;
    fields.insert("type".into(), json!(args.doc_type));
    fields.insert("_id".into(), json!(args.id));
    if let Some(rev) = args.rev {
        fields.insert("_rev".into(), json!(rev));
    }
    let mut doc = Document::from_fields(fields)?;
    let key = doc.pointer_key();

    match store.put(&mut doc, PutOptions::default())? {
        PutOutcome::Stored { rev } => {
            match format {
                OutputFormat::Json => println!("{}", json!({"key": key, "rev": rev})),
                OutputFormat::Text => println!(
                    "{} Stored {} at revision {}",
                    "✓".green().bold(),
                    key.bold(),
                    rev.to_string().yellow()
                ),
            }
            Ok(())
        }
        PutOutcome::ConflictWith(current) => {
            print_doc(&current, format)?;
            bail!("conflict: {key} is at revision {}", current.rev.unwrap_or(0))
        }
        PutOutcome::Conflict(reason) => bail!("conflict on {key}: {}", describe(reason)),
    }
}

fn cmd_get(store: &Store, args: GetArgs, format: OutputFormat) -> anyhow::Result<()> {
    match store.get(&args.doc_type, &args.id)? {
        Some(doc) => print_doc(&doc, format),
        None => bail!("{}/{} not found", args.doc_type, args.id),
    }
}

fn cmd_delete(store: &Store, args: DeleteArgs, format: OutputFormat) -> anyhow::Result<()> {
    let doc = Document::state(args.doc_type, args.id, Fields::new()).with_rev(args.rev);
    let key = doc.pointer_key();
    match store.delete(&doc)? {
        DeleteOutcome::Deleted => {
            match format {
                OutputFormat::Json => println!("{}", json!({"key": key, "deleted": true})),
                OutputFormat::Text => println!("{} Deleted {}", "✓".green().bold(), key.bold()),
            }
            Ok(())
        }
        DeleteOutcome::Conflict => bail!("conflict: {key} is not at revision {}", args.rev),
    }
}

fn cmd_list(store: &Store, args: ListArgs, format: OutputFormat) -> anyhow::Result<()> {
    let filter = args
        .filter
        .as_deref()
        .map(Regex::new)
        .transpose()
        .context("invalid --filter")?;
    let options = GetManyOptions {
        limit: args.limit,
        skip: args.skip,
        sorted: args.sorted,
        descending: args.descending,
    };
    let docs = store.get_many(&args.doc_type, filter.as_ref(), options)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&docs)?),
        OutputFormat::Text => {
            for doc in &docs {
                println!("{}  {}", doc.id.bold(), rev_label(doc));
            }
            println!("{} document(s)", docs.len());
        }
    }
    Ok(())
}

fn cmd_ids(store: &Store, args: IdsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ids = store.ids(&args.doc_type)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&ids)?),
        OutputFormat::Text => ids.iter().for_each(|id| println!("{id}")),
    }
    Ok(())
}

fn cmd_history(store: &Store, args: GetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let revs = store.revisions(&args.doc_type, &args.id)?;
    let current = store.get(&args.doc_type, &args.id)?.and_then(|d| d.rev);

    match format {
        OutputFormat::Json => println!("{}", json!({"revisions": revs, "current": current})),
        OutputFormat::Text => {
            if revs.is_empty() {
                println!("No revisions of {}/{}.", args.doc_type, args.id);
            }
            for rev in revs {
                let put_at = store
                    .get_revision(&args.doc_type, &args.id, rev)?
                    .and_then(|d| d.put_at)
                    .unwrap_or_default();
                if Some(rev) == current {
                    println!(
                        "{} {}  {}",
                        "*".green().bold(),
                        rev.to_string().yellow().bold(),
                        put_at.dimmed()
                    );
                } else {
                    println!("  {}  {}", rev.to_string().yellow(), put_at.dimmed());
                }
            }
        }
    }
    Ok(())
}

fn cmd_msg(store: &Store, args: MsgArgs, format: OutputFormat) -> anyhow::Result<()> {
    let fields = match &args.fields {
        Some(text) => parse_object(text)?,
        None => Fields::new(),
    };
    let id = store.put_msg(&args.action, fields)?;
    match format {
        OutputFormat::Json => println!("{}", json!({"id": id})),
        OutputFormat::Text => println!(
            "{} Queued {} as {}",
            "✓".green().bold(),
            args.action.bold(),
            id.cyan()
        ),
    }
    Ok(())
}

fn cmd_schedule(store: &Store, args: ScheduleArgs, format: OutputFormat) -> anyhow::Result<()> {
    let flavour: ScheduleFlavour = args.flavour.parse()?;
    let spec = ScheduleSpec::parse(&args.spec)?;
    let msg = match &args.msg {
        Some(text) => serde_json::from_str(text).context("message is not valid JSON")?,
        None => Value::Null,
    };

    let id = store.put_schedule(flavour, &args.owner, &spec, msg)?;
    match (format, id) {
        (OutputFormat::Json, id) => println!("{}", json!({"id": id})),
        (OutputFormat::Text, Some(id)) => {
            println!("{} Scheduled {}", "✓".green().bold(), id.cyan())
        }
        (OutputFormat::Text, None) => {
            println!("{} never fires; nothing scheduled", spec.to_string().yellow())
        }
    }
    Ok(())
}

fn cmd_due(store: &Store, format: OutputFormat) -> anyhow::Result<()> {
    let due = store.due_schedules(Utc::now())?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&due)?),
        OutputFormat::Text => {
            if due.is_empty() {
                println!("No schedules due.");
            }
            for doc in &due {
                if let DocBody::Schedule(s) = &doc.body {
                    println!("{}  {}  owner {}", s.at.dimmed(), doc.id.cyan(), s.owner.bold());
                }
            }
        }
    }
    Ok(())
}

fn cmd_purge(store: &Store, args: PurgeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let removed = match &args.doc_type {
        Some(doc_type) => store.purge_type(doc_type)?,
        None => store.purge()?,
    };
    match format {
        OutputFormat::Json => println!("{}", json!({"removed": removed})),
        OutputFormat::Text => println!("{} Purged {} key(s)", "✓".green().bold(), removed),
    }
    Ok(())
}

fn print_doc(doc: &Document, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(doc)?),
        OutputFormat::Text => {
            println!("{}  {}", doc.pointer_key().bold(), rev_label(doc));
            if let Some(put_at) = &doc.put_at {
                println!("  put_at: {}", put_at.dimmed());
            }
            for (name, value) in body_fields(doc)? {
                println!("  {}: {}", name.cyan(), value);
            }
        }
    }
    Ok(())
}

fn body_fields(doc: &Document) -> anyhow::Result<Fields> {
    let mut fields = doc.to_fields()?;
    for header in ["type", "_id", "_rev", "put_at"] {
        fields.remove(header);
    }
    Ok(fields)
}

fn rev_label(doc: &Document) -> String {
    match doc.rev {
        Some(rev) => format!("rev {}", rev).yellow().to_string(),
        None => "unversioned".dimmed().to_string(),
    }
}

fn describe(reason: ConflictReason) -> &'static str {
    match reason {
        ConflictReason::Stale => "document does not exist at that revision",
        ConflictReason::Race => "another writer stored the next revision first",
        ConflictReason::Vanished => "current revision disappeared while reading it",
    }
}

fn parse_object(text: &str) -> anyhow::Result<Fields> {
    match serde_json::from_str(text).context("body is not valid JSON")? {
        Value::Object(fields) => Ok(fields),
        other => bail!("expected a JSON object, got {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(dir: &tempfile::TempDir, args: &[&str]) -> Cli {
        let data = dir.path().join("kv.json");
        let mut argv = vec!["revdoc", "--data", data.to_str().unwrap()];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn reopen(dir: &tempfile::TempDir) -> Store {
        DocumentStore::new(FileKv::open(dir.path().join("kv.json")).unwrap()).unwrap()
    }

    #[test]
    fn put_get_delete_through_the_file_substrate() {
        let dir = tempfile::tempdir().unwrap();
        run_command(cli(&dir, &["put", "wi", "a", r#"{"participant":"alice"}"#])).unwrap();
        let update = ["put", "wi", "a", r#"{"participant":"bob"}"#, "--rev", "1"];
        run_command(cli(&dir, &update)).unwrap();

        let doc = reopen(&dir).get("wi", "a").unwrap().unwrap();
        assert_eq!(doc.rev, Some(2));
        assert_eq!(doc.field("participant"), Some(json!("bob")));

        assert!(run_command(cli(&dir, &["delete", "wi", "a", "--rev", "1"])).is_err());
        run_command(cli(&dir, &["delete", "wi", "a", "--rev", "2"])).unwrap();
        assert!(reopen(&dir).get("wi", "a").unwrap().is_none());
    }

    #[test]
    fn stale_put_fails() {
        let dir = tempfile::tempdir().unwrap();
        run_command(cli(&dir, &["put", "wi", "a", "{}"])).unwrap();
        let err = run_command(cli(&dir, &["put", "wi", "a", "{}"])).unwrap_err();
        assert!(err.to_string().contains("revision 1"), "{err}");
    }

    #[test]
    fn put_rejects_non_object_body() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run_command(cli(&dir, &["put", "wi", "a", "[1,2]"])).is_err());
        assert!(run_command(cli(&dir, &["put", "wi", "a", "not json"])).is_err());
    }

    #[test]
    fn msg_and_purge() {
        let dir = tempfile::tempdir().unwrap();
        run_command(cli(&dir, &["msg", "launch", r#"{"wfid":"w1"}"#])).unwrap();
        run_command(cli(&dir, &["msg", "reply"])).unwrap();
        assert_eq!(reopen(&dir).get_msgs().unwrap().len(), 2);

        run_command(cli(&dir, &["purge", "--type", "msgs"])).unwrap();
        let store = reopen(&dir);
        assert!(store.get_msgs().unwrap().is_empty());
        assert!(store.configuration().unwrap().is_some());
    }

    #[test]
    fn schedule_then_due() {
        let dir = tempfile::tempdir().unwrap();
        run_command(cli(&dir, &["schedule", "at", "0_0", "2000-01-01T00:00:00Z"])).unwrap();
        run_command(cli(&dir, &["schedule", "at", "0_1", "1h"])).unwrap();
        assert!(run_command(cli(&dir, &["schedule", "sometimes", "0_2", "1h"])).is_err());

        let due = reopen(&dir).due_schedules(Utc::now()).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, "at-0_0-20000101000000");
        run_command(cli(&dir, &["due", "--format", "json"])).unwrap();
    }

    #[test]
    fn config_file_feeds_bootstrap() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("revdoc.toml");
        std::fs::write(&config, "[engine]\nrestless_worker = true\n").unwrap();

        run_command(cli(&dir, &["ids", "wi", "--config", config.to_str().unwrap()])).unwrap();
        let engine = reopen(&dir).configuration().unwrap().unwrap();
        assert_eq!(engine.field("restless_worker"), Some(json!(true)));
    }
}
