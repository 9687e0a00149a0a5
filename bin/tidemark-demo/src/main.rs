use std::{
    collections::HashSet,
    process::ExitCode,
    sync::{Arc, Mutex},
    time::Duration,
};

use tidemark_core::{
    ConfigError, QueueConfig, QueueState, WaitableQueue,
    waitable_queue::consumer::{ConsumerReport, consume},
};
use tokio::{task::JoinError, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use tracing_subscriber::{EnvFilter, fmt};

const ITEMS: u32 = 60;

/// How fast each side runs, and how long after production starts the queue
/// is closed.
#[derive(Debug, Clone, Copy)]
struct Pacing {
    produce_every: Duration,
    consume_every: Duration,
    linger: Duration,
}

impl Pacing {
    // The consumer is slower than the producer, so the queue climbs through
    // the watermarks before draining.
    const DEMO: Pacing = Pacing {
        produce_every: Duration::from_millis(2),
        consume_every: Duration::from_millis(30),
        linger: Duration::from_secs(3),
    };
}

#[derive(Debug)]
struct DemoReport {
    consumer: ConsumerReport,
    sent: u32,
    states: HashSet<QueueState>,
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    real_main(QueueConfig::from_env(), Pacing::DEMO).await
}

async fn real_main(config: Result<QueueConfig, ConfigError>, pacing: Pacing) -> ExitCode {
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            error!(%err, kind = ?err, "failed to create waitable queue");
            return ExitCode::FAILURE;
        }
    };

    match run(config, pacing).await {
        Ok(report) => {
            info!(
                sent = report.sent,
                received = report.consumer.received,
                exit = ?report.consumer.exit,
                "consumer exited"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "demo task failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: QueueConfig, pacing: Pacing) -> Result<DemoReport, JoinError> {
    info!(?config, "starting producer/consumer demo");

    let queue = Arc::new(WaitableQueue::<u32>::with_config(&config));
    let token = CancellationToken::new();
    let states = Arc::new(Mutex::new(HashSet::new()));

    let consumer = {
        let queue = Arc::clone(&queue);
        let token = token.clone();
        let states = Arc::clone(&states);
        tokio::spawn(async move {
            consume(&queue, &token, |item, state| {
                if let Ok(mut states) = states.lock() {
                    states.insert(state);
                }
                async move {
                    info!(item, %state, "consumer received item");
                    sleep(pacing.consume_every).await;
                }
            })
            .await
        })
    };

    // Counted from the start of production, not its end.
    let linger = sleep(pacing.linger);

    // A plain thread: enqueue never blocks it.
    let producer = {
        let queue = Arc::clone(&queue);
        let states = Arc::clone(&states);
        tokio::task::spawn_blocking(move || {
            for item in 0..ITEMS {
                let state = queue.enqueue(item);
                info!(item, %state, "producer sent item");
                if let Ok(mut states) = states.lock() {
                    states.insert(state);
                }
                std::thread::sleep(pacing.produce_every);
            }
            ITEMS
        })
    };

    let sent = producer.await?;
    linger.await;

    info!(remaining = queue.len(), "closing queue");
    queue.close();

    let consumer = consumer.await?;
    let states = states.lock().map(|s| s.clone()).unwrap_or_default();

    Ok(DemoReport {
        consumer,
        sent,
        states,
    })
}
