use clap::Parser;
use color_eyre::Result;
use domain::core::PortfolioManager;
use domain::investment::{InvestmentType, NewInvestment, RiskLevel};
use domain::store::Stores;
use domain::suggestion::{SelectionPolicy, SuggestionEngine};
use domain::user::UserId;
use hdrhistogram::Histogram;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "portfolio-benchmark")]
#[command(about = "Load benchmark for the portfolio manager facade")]
struct Args {
    /// Number of concurrent clients
    #[arg(short, long, default_value_t = 10)]
    threads: usize,

    /// Duration of the test in seconds
    #[arg(short, long, default_value_t = 30)]
    duration: u64,

    /// Target throughput (operations per second)
    #[arg(long, default_value_t = 300)]
    target_throughput: u64,

    /// Number of test users to create
    #[arg(long, default_value_t = 50)]
    test_users: usize,

    /// Share of operations that generate a report, in percent
    #[arg(long, default_value_t = 20)]
    report_ratio: u8,

    /// Suggestion selection policy (random or relevant)
    #[arg(long, default_value_t = SelectionPolicy::RandomSample)]
    policy: SelectionPolicy,

    /// Seed for the suggestion engine and the workers
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    AddInvestment,
    GenerateReport,
    RecordTick,
}

impl Operation {
    fn label(self) -> &'static str {
        match self {
            Operation::AddInvestment => "add investment",
            Operation::GenerateReport => "generate report",
            Operation::RecordTick => "record tick",
        }
    }
}

#[derive(Debug)]
struct OperationMetrics {
    completed: AtomicU64,
    failed: AtomicU64,
    latency_us: Mutex<Histogram<u64>>,
}

impl OperationMetrics {
    fn new() -> Result<Self> {
        Ok(Self {
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            latency_us: Mutex::new(Histogram::new_with_bounds(1, 60_000_000, 3)?),
        })
    }

    fn record_success(&self, latency: Duration) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut hist) = self.latency_us.lock() {
            let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
            let _ = hist.record(micros.max(1));
        }
    }

    fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug)]
struct BenchmarkMetrics {
    investments: OperationMetrics,
    reports: OperationMetrics,
    ticks: OperationMetrics,
    start_time: Instant,
}

impl BenchmarkMetrics {
    fn new() -> Result<Self> {
        Ok(Self {
            investments: OperationMetrics::new()?,
            reports: OperationMetrics::new()?,
            ticks: OperationMetrics::new()?,
            start_time: Instant::now(),
        })
    }

    fn for_operation(&self, operation: Operation) -> &OperationMetrics {
        match operation {
            Operation::AddInvestment => &self.investments,
            Operation::GenerateReport => &self.reports,
            Operation::RecordTick => &self.ticks,
        }
    }

    fn totals(&self) -> (u64, u64) {
        [&self.investments, &self.reports, &self.ticks]
            .iter()
            .fold((0, 0), |(ok, failed), m| {
                (
                    ok + m.completed.load(Ordering::Relaxed),
                    failed + m.failed.load(Ordering::Relaxed),
                )
            })
    }

    fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let (completed, _) = self.totals();
        if elapsed > 0.0 {
            completed as f64 / elapsed
        } else {
            0.0
        }
    }

    fn print_report(&self) {
        let (completed, failed) = self.totals();
        let attempted = completed + failed;
        let success_rate = if attempted > 0 {
            completed as f64 / attempted as f64 * 100.0
        } else {
            0.0
        };

        println!("\n=== PORTFOLIO MANAGER BENCHMARK RESULTS ===");
        println!("Test Duration: {:.2} seconds", self.start_time.elapsed().as_secs_f64());
        println!("Operations Attempted: {attempted}");
        println!("Operations Completed: {completed}");
        println!("Operations Failed: {failed}");
        println!("Success Rate: {success_rate:.2}%");
        println!("Throughput: {:.2} ops/s", self.get_throughput());

        for operation in [
            Operation::AddInvestment,
            Operation::GenerateReport,
            Operation::RecordTick,
        ] {
            let metrics = self.for_operation(operation);
            let Ok(hist) = metrics.latency_us.lock() else {
                continue;
            };
            println!("\n=== {} ===", operation.label().to_uppercase());
            println!(
                "Completed: {}, Failed: {}",
                metrics.completed.load(Ordering::Relaxed),
                metrics.failed.load(Ordering::Relaxed)
            );
            if hist.is_empty() {
                println!("No samples");
                continue;
            }
            println!("Min: {} us", hist.min());
            println!("P50: {} us", hist.value_at_quantile(0.50));
            println!("P90: {} us", hist.value_at_quantile(0.90));
            println!("P95: {} us", hist.value_at_quantile(0.95));
            println!("P99: {} us", hist.value_at_quantile(0.99));
            println!("Max: {} us", hist.max());
        }
    }
}

const SECTORS: [&str; 6] = [
    "Technology",
    "Finance",
    "Healthcare",
    "Energy",
    "Real Estate",
    "Consumer",
];

const SYMBOLS: [(&str, f64, f64); 6] = [
    ("AAPL", 150.0, 200.0),
    ("MSFT", 300.0, 400.0),
    ("GOOGL", 100.0, 150.0),
    ("AMZN", 120.0, 180.0),
    ("NVDA", 400.0, 900.0),
    ("TSLA", 200.0, 300.0),
];

const RISKS: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

fn random_investment(rng: &mut StdRng) -> NewInvestment {
    let kind = InvestmentType::ALL[rng.random_range(0..InvestmentType::ALL.len())];
    let sector = SECTORS[rng.random_range(0..SECTORS.len())];
    NewInvestment {
        asset_name: format!("{kind} holding {}", rng.random_range(0..1000)),
        kind,
        value: f64::from(rng.random_range(100..100_000u32)),
        risk: RISKS[rng.random_range(0..RISKS.len())],
        sector: sector.to_string(),
    }
}

async fn setup_test_users(manager: &PortfolioManager, num_users: usize) -> Result<Vec<UserId>> {
    info!("Setting up {} test users...", num_users);
    let mut users = Vec::with_capacity(num_users);

    for i in 0..num_users {
        let email = format!("bench_user_{i}@benchmark.test");
        let user_id = manager
            .sign_up(&email, "password123")
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to create user {}: {}", i, e))?;
        users.push(user_id);
    }

    info!("Successfully created {} test users", users.len());
    Ok(users)
}

fn pick_operation(rng: &mut StdRng, report_ratio: u8) -> Operation {
    let roll = rng.random_range(0..100u8);
    if roll < report_ratio {
        Operation::GenerateReport
    } else if roll < report_ratio.saturating_add(10) {
        Operation::RecordTick
    } else {
        Operation::AddInvestment
    }
}

#[allow(clippy::too_many_arguments)]
async fn benchmark_worker(
    worker_id: usize,
    manager: Arc<PortfolioManager>,
    users: Arc<Vec<UserId>>,
    metrics: Arc<BenchmarkMetrics>,
    should_stop: Arc<AtomicBool>,
    target_rate_per_thread: f64,
    report_ratio: u8,
    seed: Option<u64>,
) {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(worker_id as u64)),
        None => StdRng::from_os_rng(),
    };

    let interval = Duration::from_secs_f64(1.0 / target_rate_per_thread);
    let mut next_op_time = Instant::now();

    info!(
        "Worker {} started with target rate {:.2} ops/s",
        worker_id, target_rate_per_thread
    );

    while !should_stop.load(Ordering::Relaxed) {
        if Instant::now() < next_op_time {
            sleep(Duration::from_millis(1)).await;
            continue;
        }
        next_op_time += interval;

        let user_id = users[rng.random_range(0..users.len())];
        let operation = pick_operation(&mut rng, report_ratio);

        let started = Instant::now();
        let result = match operation {
            Operation::AddInvestment => manager
                .add_investment(user_id, random_investment(&mut rng))
                .await
                .map(|_| ()),
            Operation::GenerateReport => manager.generate_report(user_id).await.map(|_| ()),
            Operation::RecordTick => {
                let (symbol, low, high) = SYMBOLS[rng.random_range(0..SYMBOLS.len())];
                let price = rng.random_range(low..high);
                manager.record_market_tick(symbol, price, None).await.map(|_| ())
            }
        };

        let op_metrics = metrics.for_operation(operation);
        match result {
            Ok(()) => op_metrics.record_success(started.elapsed()),
            Err(e) => {
                warn!("Worker {} {} failed: {}", worker_id, operation.label(), e);
                op_metrics.record_failure();
            }
        }
    }

    info!("Worker {} stopped", worker_id);
}

async fn run_benchmark(args: Args) -> Result<()> {
    info!(
        "Starting portfolio benchmark with {} clients for {}s",
        args.threads, args.duration
    );

    let engine = SuggestionEngine::new(args.policy);
    let manager = match args.seed {
        Some(seed) => PortfolioManager::with_seed(Stores::in_memory(), engine, seed),
        None => PortfolioManager::new(Stores::in_memory(), engine),
    };

    let users = Arc::new(setup_test_users(&manager, args.test_users.max(1)).await?);
    let manager = Arc::new(manager);

    let metrics = Arc::new(BenchmarkMetrics::new()?);
    let should_stop = Arc::new(AtomicBool::new(false));

    let threads = args.threads.max(1);
    let target_rate_per_thread = args.target_throughput.max(1) as f64 / threads as f64;
    let report_ratio = args.report_ratio.min(90);

    info!("Target rate per client: {:.2} ops/s", target_rate_per_thread);

    let mut handles = Vec::new();
    for worker_id in 0..threads {
        let handle = tokio::spawn(benchmark_worker(
            worker_id,
            Arc::clone(&manager),
            Arc::clone(&users),
            Arc::clone(&metrics),
            Arc::clone(&should_stop),
            target_rate_per_thread,
            report_ratio,
            args.seed,
        ));
        handles.push(handle);
    }

    let status_handle = {
        let metrics = Arc::clone(&metrics);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(5));
            loop {
                interval.tick().await;
                let (completed, failed) = metrics.totals();
                info!(
                    "Status: {} completed, {} failed, {:.2} ops/s",
                    completed,
                    failed,
                    metrics.get_throughput()
                );
            }
        })
    };

    sleep(Duration::from_secs(args.duration)).await;

    should_stop.store(true, Ordering::Relaxed);
    status_handle.abort();

    for handle in handles {
        let _ = handle.await;
    }

    metrics.print_report();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("benchmark=info".parse()?),
        )
        .init();

    let args = Args::parse();

    info!("Portfolio Manager Benchmark");
    info!("Configuration: {:?}", args);

    run_benchmark(args).await?;

    Ok(())
}
