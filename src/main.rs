use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use pwrgate_monitor::serial::SerialInterface;
use pwrgate_monitor::{aggregate, Aggregator, MonitorConfig, SessionBuilder, Summary};

fn log_summary(summary: &Summary) {
  let (Some(avg), Some(last)) = (summary.average, summary.latest) else {
    log::info!("No recent telemetry");
    return;
  };

  log::info!(
    "{} over {} readings, charging={}: temp {:.0} F (avg {:.2} F), bat {:.2} V (avg {:.2} V), chg {:.2} A (avg {:.2} A), sol {:.2} V (avg {:.2} V), pow {:.2} W (avg {:.2} W)",
    avg.power_state.as_str(),
    summary.samples,
    summary.is_charging(),
    last.reading.temp_f, avg.temp_f,
    last.reading.battery_volts, avg.battery_volts,
    last.reading.charge_amps, avg.charge_amps,
    last.reading.solar_volts, avg.solar_volts,
    last.reading.charge_power, avg.charge_power,
  );

  match serde_json::to_string(summary) {
    Ok(json) => log::debug!("summary {}", json),
    Err(e) => log::warn!("Failed to encode summary: {}", e),
  }
}

async fn report_loop(aggregator: Arc<Aggregator>, every: Duration) {
  let mut ticker = tokio::time::interval(every);
  ticker.tick().await;
  loop {
    ticker.tick().await;
    log_summary(&aggregator.summarize());
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let config = MonitorConfig::from_args_or_env(std::env::args().nth(1))
    .context("Failed to load configuration")?;

  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level.as_str())).init();

  let port = SerialInterface::open(&config.port, config.baud_rate, config.read_timeout())
    .with_context(|| format!("Failed to open charge controller on {}", config.port))?;

  let aggregator = Arc::new(Aggregator::new(config.window()));
  let (mut session, readings) = SessionBuilder::new(port)
    .pacing(config.pacing())
    .queue_capacity(config.queue_capacity)
    .spawn();
  log::info!("Monitoring {} in session {}", config.port, session.id());

  let consumer = {
    let aggregator = aggregator.clone();
    tokio::spawn(async move { aggregate::consume(readings, &aggregator).await })
  };
  let reporter = tokio::spawn(report_loop(aggregator.clone(), config.report_interval()));

  let finished = tokio::select! {
    result = session.wait() => Some(result),
    _ = tokio::signal::ctrl_c() => None,
  };
  let result = match finished {
    Some(result) => result,
    None => {
      log::info!("Interrupted, stopping session");
      session.stop();
      session.wait().await
    }
  };

  consumer.await.context("Reading consumer failed")?;
  reporter.abort();
  log_summary(&aggregator.summarize());

  result.context("Session ended")?;
  log::info!("PWRgate monitor stopped");
  Ok(())
}
