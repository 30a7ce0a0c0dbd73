use std::{env, fs::File, path::Path};

use issuance_engine::dlq::StdErrDlq;
use issuance_engine::ingestion::CsvReader;
use issuance_engine::sinks::{DigestHasher, LogAuditSink, LogNotificationSink};
use issuance_engine::{Context, CoreConfig, Engine, MemoryStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Diagnostics on stderr; stdout is reserved for the account report.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args();
    let file_path = args.nth(1).expect("No operations file was provided");
    let file = File::open(Path::new(&file_path))?;

    let ingestion = CsvReader::new(file)?;
    let ctx = Context::new(
        MemoryStore::new(),
        LogNotificationSink::default(),
        LogAuditSink::default(),
        Box::new(DigestHasher::default()),
    )
    .with_config(CoreConfig::default());

    let mut engine = Engine::new(ingestion, ctx, StdErrDlq::default());
    engine.process().await?;
    engine.flush();

    Ok(())
}
