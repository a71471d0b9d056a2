// src/main.rs

use std::env;

use anyhow::{bail, Context as _, Result};
use sqlfilestore::core::path;
use sqlfilestore::{Context, Record, RecordQueryOptions, RecordType, Store, StoreConfig};
use tokio_util::sync::CancellationToken;

const USAGE: &str = "Usage: sqlfilestore <command> [args]

Commands:
  init                      create the table and root directory
  mkdir <path>              create a directory under an existing parent
  touch <path> [contents]   create a file under an existing parent
  ls [prefix]               list live records whose path starts with prefix
  stat <path>               print one record
  mv <path> <new_path>      rename or move, rewriting every descendant path
  trash <path>              soft delete
  rm <path>                 delete permanently (directories must be empty)

Configuration: FILESTORE_DB_PATH, FILESTORE_TABLE, FILESTORE_DEBUG, FILESTORE_AUTOMIGRATE";

#[tokio::main]
async fn main() -> Result<()> {
    let config = StoreConfig::from_env()?;
    sqlfilestore::logging::init_logging(config.debug);

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first().cloned() else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    tracing::debug!("Database: {}", config.db_path.display());

    // Ctrl-C cancels whatever store call is in flight.
    let token = CancellationToken::new();
    let ctx = Context::with_token(token.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            token.cancel();
        }
    });

    // The store is synchronous; keep it off the runtime threads.
    let output = tokio::task::spawn_blocking(move || -> Result<Vec<String>> {
        let store = Store::open(&config)?;
        run(&store, &ctx, &command, &args[1..])
    })
    .await??;

    for line in output {
        println!("{}", line);
    }
    Ok(())
}

fn run(store: &Store, ctx: &Context, command: &str, args: &[String]) -> Result<Vec<String>> {
    let arg = |idx: usize| {
        args.get(idx)
            .map(String::as_str)
            .with_context(|| format!("missing argument for `{}`\n\n{}", command, USAGE))
    };

    match command {
        "init" => {
            store.bootstrap(ctx)?;
            Ok(vec![format!("initialized table {}", store.table_name())])
        }
        "mkdir" => {
            let record = create_node(store, ctx, arg(0)?, RecordType::Directory, "")?;
            Ok(vec![serde_json::to_string(&record)?])
        }
        "touch" => {
            let contents = args.get(1).map(String::as_str).unwrap_or("");
            let record = create_node(store, ctx, arg(0)?, RecordType::File, contents)?;
            Ok(vec![serde_json::to_string(&record)?])
        }
        "ls" => {
            let options = RecordQueryOptions {
                path_starts_with: args.first().map(|p| path::normalize(p)),
                order_by: Some(sqlfilestore::Column::Path),
                sort_order: Some("asc".to_string()),
                ..Default::default()
            };
            store
                .list(ctx, &options)?
                .iter()
                .map(|r| Ok::<_, anyhow::Error>(serde_json::to_string(r)?))
                .collect()
        }
        "stat" => {
            let record = find_existing(store, ctx, arg(0)?, false)?;
            Ok(vec![serde_json::to_string_pretty(&record)?])
        }
        "mv" => {
            let record = move_node(store, ctx, arg(0)?, arg(1)?)?;
            Ok(vec![serde_json::to_string(&record)?])
        }
        "trash" => {
            let mut record = find_existing(store, ctx, arg(0)?, false)?;
            store.soft_delete(ctx, &mut record)?;
            Ok(vec![format!("trashed {}", record.path())])
        }
        "rm" => {
            let record = find_existing(store, ctx, arg(0)?, true)?;
            store.delete(ctx, &record)?;
            Ok(vec![format!("removed {}", record.path())])
        }
        other => bail!("unknown command `{}`\n\n{}", other, USAGE),
    }
}

fn find_existing(store: &Store, ctx: &Context, raw_path: &str, with_soft_deleted: bool) -> Result<Record> {
    let target = path::normalize(raw_path);
    let options = RecordQueryOptions {
        with_soft_deleted,
        ..Default::default()
    };
    store
        .find_by_path(ctx, &target, options)?
        .with_context(|| format!("{} does not exist", target))
}

fn find_directory(store: &Store, ctx: &Context, dir_path: &str) -> Result<Record> {
    let dir = find_existing(store, ctx, dir_path, false)?;
    if !dir.is_directory() {
        bail!("{} is not a directory", dir.path());
    }
    Ok(dir)
}

fn create_node(
    store: &Store,
    ctx: &Context,
    raw_path: &str,
    record_type: RecordType,
    contents: &str,
) -> Result<Record> {
    let target = path::normalize(raw_path);
    let (parent_path, name) = match (path::parent_of(&target), path::file_name(&target)) {
        (Some(parent), Some(name)) => (parent, name),
        _ => bail!("the root directory already exists"),
    };

    let parent = find_directory(store, ctx, &parent_path)?;
    if store.find_by_path(ctx, &target, RecordQueryOptions::default())?.is_some() {
        bail!("{} already exists", target);
    }

    let mut record = match record_type {
        RecordType::Directory => Record::new_directory(),
        RecordType::File => Record::new_file(),
    };
    record
        .set_parent_id(parent.id())
        .set_name(name.as_str())
        .set_path(&path::child_path(parent.path(), &name));

    if record_type == RecordType::File {
        let extension = name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
        record
            .set_contents(contents)
            .set_size(contents.len() as u64)
            .set_extension(extension);
    }

    store.create(ctx, &mut record)?;
    tracing::info!("Created {} {}", record_type, record.path());
    Ok(record)
}

fn move_node(store: &Store, ctx: &Context, from: &str, to: &str) -> Result<Record> {
    let mut record = find_existing(store, ctx, from, false)?;

    let target = path::normalize(to);
    let (parent_path, name) = match (path::parent_of(&target), path::file_name(&target)) {
        (Some(parent), Some(name)) => (parent, name),
        _ => bail!("cannot move onto the root directory"),
    };
    if path::parent_of(record.path()).is_none() {
        bail!("cannot move the root directory");
    }

    let subtree_prefix = format!("{}/", record.path());
    if parent_path == record.path() || parent_path.starts_with(&subtree_prefix) {
        bail!("cannot move {} into its own subtree", record.path());
    }
    if store.find_by_path(ctx, &target, RecordQueryOptions::default())?.is_some() {
        bail!("{} already exists", target);
    }

    let parent = find_directory(store, ctx, &parent_path)?;
    record.set_parent_id(parent.id()).set_name(name.as_str());
    store.recalculate_path_atomic(ctx, &mut record, Some(&parent))?;

    tracing::info!("Moved {} to {}", from, record.path());
    Ok(record)
}
