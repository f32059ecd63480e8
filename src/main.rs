use hbase_pouch::config::Settings;
use hbase_pouch::{input, verify, Session};
use log::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let settings = Settings::new()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&settings.rust_log))
        .init();
    info!("using endpoint {} as {}", settings.endpoint, settings.access_key_id);

    let session = Session::open(&settings).await?;
    if settings.create_table {
        session.ensure_table(&settings.table).await?;
    }

    let pairs = input::load_pairs(&settings.input_file)?;
    let report = verify::run(&session, &settings.table, &pairs, settings.seed).await?;
    info!(
        "verified {} keys: {} ok, {} mismatched, {} missing",
        report.ok.len() + report.mismatched.len() + report.missing.len(),
        report.ok.len(),
        report.mismatched.len(),
        report.missing.len()
    );

    if settings.scan {
        let rows = session
            .scan_all(&settings.table, "", "", settings.page_size)
            .await?;
        info!("Scan result: {} rows in {}", rows.len(), settings.table);
        for row in &rows {
            match row.value() {
                Ok(value) => println!("{} {}", row.key_str(), value),
                Err(e) => error!("{}", e),
            }
        }
    }

    session.close().await;

    if !report.is_clean() {
        return Err("verification found mismatched or missing rows".into());
    }
    Ok(())
}
