//! Демонстрация брокера Courier
//!
//! Запускает N подписчиков на задачах tokio и одного издателя, который
//! отправляет M сообщений с фиксированным интервалом, после чего брокер
//! останавливается и печатается итоговая статистика.

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use courier::{
    init_logging, Broker, RecvError, ResultExt, Settings, StackError, SubscriptionHandle,
};
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "courier-demo")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("COURIER_GIT_COMMIT"), ", built ", env!("COURIER_BUILD_DATE"), ")"))]
#[command(about = "Courier demo - fan-out of published messages to concurrent subscribers", long_about = None)]
struct Cli {
    /// Количество подписчиков
    #[arg(short, long, default_value_t = 2, env = "COURIER_DEMO_SUBSCRIBERS")]
    subscribers: usize,
    /// Количество публикуемых сообщений
    #[arg(short, long, default_value_t = 10, env = "COURIER_DEMO_MESSAGES")]
    messages: usize,
    /// Пауза между публикациями в миллисекундах
    #[arg(long, default_value_t = 100)]
    interval_ms: u64,
    /// Ёмкость очереди каждого подписчика (перекрывает конфигурацию)
    #[arg(long, conflicts_with = "unbounded")]
    capacity: Option<usize>,
    /// Неограниченные очереди вместо drop-политики
    #[arg(long)]
    unbounded: bool,
    /// Задержка обработки одного сообщения подписчиком, чтобы
    /// увидеть переполнение очередей
    #[arg(long, default_value_t = 0)]
    consumer_delay_ms: u64,
    /// Файл конфигурации (toml/yaml/json)
    #[arg(short, long, env = "COURIER_CONFIG")]
    config: Option<PathBuf>,
}

/// Итог работы одного подписчика.
#[derive(Debug, Serialize)]
struct ConsumerSummary {
    subscriber: usize,
    id: u64,
    received: u64,
    dropped: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Settings::load().context("loading config"),
    }
    .map_err(report_error)?;
    if cli.unbounded {
        settings.broker.unbounded = true;
    }
    if let Some(capacity) = cli.capacity {
        settings.broker.unbounded = false;
        settings.broker.default_capacity = capacity;
    }

    let logging = init_logging(settings.logging.clone()).map_err(report_error)?;

    let broker = Broker::<String>::from_config(&settings.broker)
        .context("building broker")
        .map_err(report_error)?;
    info!(
        subscribers = cli.subscribers,
        messages = cli.messages,
        capacity = %broker.default_capacity(),
        "starting demo"
    );

    let consumer_delay = Duration::from_millis(cli.consumer_delay_ms);
    let mut consumers = Vec::with_capacity(cli.subscribers);
    for n in 1..=cli.subscribers {
        let sub = broker
            .subscribe()
            .with_context(|| format!("subscribing consumer {n}"))
            .map_err(report_error)?;
        consumers.push(tokio::spawn(consume(n, sub, consumer_delay)));
    }

    let publisher = {
        let broker = broker.clone();
        let messages = cli.messages;
        let interval = Duration::from_millis(cli.interval_ms);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            for i in 0..messages {
                ticker.tick().await;
                let report = broker.publish(format!("Message {i}"));
                if report.dropped > 0 {
                    warn!(message = i, dropped = report.dropped, "slow subscribers skipped a message");
                }
            }
        })
    };

    publisher
        .await
        .map_err(|e| anyhow::Error::new(e).context("publisher task failed"))?;
    broker.shutdown();

    let mut summaries = Vec::with_capacity(consumers.len());
    for consumer in consumers {
        let summary = consumer
            .await
            .map_err(|e| anyhow::Error::new(e).context("subscriber task failed"))?;
        summaries.push(summary);
    }

    let report = serde_json::json!({
        "broker": broker.stats(),
        "subscribers": summaries,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    logging.shutdown_async(Duration::from_secs(5)).await;
    Ok(())
}

/// Печатает ошибку в stderr как JSON `{code, message, contexts}`.
fn report_error(err: StackError) -> anyhow::Error {
    match serde_json::to_string(&err.to_response()) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!("{err}"),
    }
    anyhow::Error::new(err)
}

async fn consume(
    n: usize,
    mut sub: SubscriptionHandle<String>,
    delay: Duration,
) -> ConsumerSummary {
    let mut received = 0;
    loop {
        match sub.recv().await {
            Ok(msg) => {
                received += 1;
                println!("Subscriber {n} received: {msg}");
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            Err(RecvError::Closed) => break,
            Err(RecvError::Timeout) => continue,
        }
    }
    debug!(subscriber = n, received, "subscription closed");

    ConsumerSummary {
        subscriber: n,
        id: sub.id().as_u64(),
        received,
        dropped: sub.dropped(),
    }
}
