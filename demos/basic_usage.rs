//! Basic example of using the audit API

use naudit::{run_audit, AuditConfig, NoProgress};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Audit the current directory with the default layout
    let config = AuditConfig::default();
    println!("Auditing: {}", config.target.display());

    let outcome = run_audit(&config, &NoProgress).await?;

    println!("\n=== Audit Results ===");
    for line in &outcome.summary {
        println!("{}", line);
    }
    println!();
    println!("Rating: {} / 10", outcome.rating);

    if outcome.had_history {
        println!("Since last audit: {}", outcome.diff);
    } else {
        println!("First recorded audit");
    }
    println!("Report: {}", outcome.report_path.display());

    Ok(())
}
