use courier_dispatch::{DispatchConfig, EmailBackend, SmtpBackend};

pub async fn run(config: &DispatchConfig) -> anyhow::Result<()> {
    let backend = SmtpBackend::new(config.smtp.clone())?;
    match backend.health_check().await {
        Ok(()) => {
            println!(
                "SMTP relay {}:{} ({}) is reachable.",
                config.smtp.host, config.smtp.port, config.smtp.security
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("SMTP health check failed: {e}");
            std::process::exit(1);
        }
    }
}
